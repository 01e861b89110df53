use serde::Serialize;
use serde_json::Value;

use crate::tools::{ask_about_cv, send_email};

/// Static description of a callable tool, returned by `tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

pub fn tool_descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: ask_about_cv::NAME,
            description: "Answer a question about the CV using its extracted text.",
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "question": {
                        "type": "string",
                        "description": "Question about the CV (experience, skills, education...)"
                    }
                },
                "required": ["question"]
            }),
        },
        ToolDescriptor {
            name: send_email::NAME,
            description: "Send an email notification.",
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "recipient": {
                        "type": "string",
                        "description": "Recipient email address"
                    },
                    "subject": {
                        "type": "string",
                        "description": "Email subject"
                    },
                    "body": {
                        "type": "string",
                        "description": "Plain text email body"
                    }
                },
                "required": ["recipient", "subject", "body"]
            }),
        },
    ]
}

const TOOL_NAMES: [&str; 2] = [ask_about_cv::NAME, send_email::NAME];

pub fn is_registered(name: &str) -> bool {
    TOOL_NAMES.contains(&name)
}
