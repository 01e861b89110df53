pub mod ask_about_cv;
pub mod send_email;

pub use ask_about_cv::AskAboutCv;
pub use send_email::SendEmail;

use crate::error::Result;

/// Tool trait for operations exposed to RPC callers.
///
/// Not object-safe (associated types); the dispatcher calls tools by
/// concrete type.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Typed arguments, deserialized from the caller's JSON object.
    type Input: Send;
    type Output: Send;

    fn name(&self) -> &str;
    async fn run(&self, input: Self::Input) -> Result<Self::Output>;
}
