use thiserror::Error;

/// Failures a tool call can produce. All of them are rendered as text by the
/// dispatcher; none reach the transport as a protocol fault.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("CV document unavailable at {path}: {reason}")]
    DocumentUnavailable { path: String, reason: String },

    #[error("API error: {0}")]
    InferenceFailure(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Failed to send email: {0}")]
    DeliveryFailed(String),
}

pub type Result<T> = std::result::Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference_failure_reads_as_api_error() {
        let err = ToolError::InferenceFailure("timeout".to_string());
        assert_eq!(err.to_string(), "API error: timeout");
    }

    #[test]
    fn test_unknown_tool_names_the_tool() {
        let err = ToolError::UnknownTool("delete_everything".to_string());
        assert_eq!(err.to_string(), "Unknown tool: delete_everything");
    }
}
