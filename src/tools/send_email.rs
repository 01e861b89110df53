use serde::Deserialize;
use std::sync::Arc;

use super::Tool;
use crate::error::Result;
use crate::mailer::NotificationSender;

pub const NAME: &str = "send_email";

#[derive(Debug, Deserialize)]
pub struct SendEmailArgs {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Sends an email and yields the delivery id.
pub struct SendEmail {
    sender: Arc<NotificationSender>,
}

impl SendEmail {
    pub fn new(sender: Arc<NotificationSender>) -> Self {
        Self { sender }
    }
}

#[async_trait::async_trait]
impl Tool for SendEmail {
    type Input = SendEmailArgs;
    type Output = String;

    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, input: SendEmailArgs) -> Result<String> {
        self.sender
            .send(&input.recipient, &input.subject, &input.body)
            .await
    }
}
