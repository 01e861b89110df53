use serde::Deserialize;
use std::sync::Arc;

use super::Tool;
use crate::answer::AnswerEngine;
use crate::document::DocumentCache;
use crate::error::Result;

pub const NAME: &str = "ask_about_cv";

#[derive(Debug, Deserialize)]
pub struct AskArgs {
    pub question: String,
}

/// Answers questions against the cached CV text.
pub struct AskAboutCv {
    cache: Arc<DocumentCache>,
    engine: Arc<AnswerEngine>,
}

impl AskAboutCv {
    pub fn new(cache: Arc<DocumentCache>, engine: Arc<AnswerEngine>) -> Self {
        Self { cache, engine }
    }
}

#[async_trait::async_trait]
impl Tool for AskAboutCv {
    type Input = AskArgs;
    type Output = String;

    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, input: AskArgs) -> Result<String> {
        let document = self.cache.get_text().await?;
        let answer = self.engine.answer(&input.question, document).await;

        log::info!(
            "AskAboutCv: answered {:?} ({} chars)",
            input.question,
            answer.len()
        );
        Ok(answer)
    }
}
