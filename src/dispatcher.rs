use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, ToolError};
use crate::registry;
use crate::tools::{ask_about_cv, send_email, AskAboutCv, SendEmail, Tool};

/// A `tools/call` request: tool name plus untyped arguments.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

/// Outcome of every tool call, success or failure alike.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub content: Vec<TextContent>,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![TextContent {
                kind: "text",
                text: text.into(),
            }],
        }
    }

    pub fn error(err: &ToolError) -> Self {
        Self::text(format!("Error: {}", err))
    }

    /// All text blocks joined.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Routes tool invocations and contains every tool failure.
pub struct Dispatcher {
    ask_about_cv: AskAboutCv,
    send_email: SendEmail,
}

impl Dispatcher {
    pub fn new(ask_about_cv: AskAboutCv, send_email: SendEmail) -> Self {
        Self {
            ask_about_cv,
            send_email,
        }
    }

    /// Never fails: errors come back as `Error: ...` text.
    pub async fn dispatch(&self, invocation: ToolInvocation) -> ToolResult {
        let name = invocation.name.clone();
        log::info!("Dispatcher: calling {}", name);

        match self.route(invocation).await {
            Ok(text) => {
                let result = ToolResult::text(text);
                log::debug!("Dispatcher: {} returned {:?}", name, result.joined_text());
                result
            }
            Err(e) => {
                log::warn!("Dispatcher: {} failed: {}", name, e);
                ToolResult::error(&e)
            }
        }
    }

    async fn route(&self, invocation: ToolInvocation) -> Result<String> {
        if !registry::is_registered(&invocation.name) {
            return Err(ToolError::UnknownTool(invocation.name));
        }

        let arguments = Value::Object(invocation.arguments);
        match invocation.name.as_str() {
            ask_about_cv::NAME => invoke(&self.ask_about_cv, arguments).await,
            send_email::NAME => {
                let id = invoke(&self.send_email, arguments).await?;
                Ok(format!("Email sent successfully. Message ID: {}", id))
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

/// Validate arguments into the tool's typed input, then run it.
async fn invoke<T>(tool: &T, arguments: Value) -> Result<T::Output>
where
    T: Tool,
    T::Input: DeserializeOwned,
{
    let input = serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool: tool.name().to_string(),
        reason: e.to_string(),
    })?;

    tool.run(input).await
}
