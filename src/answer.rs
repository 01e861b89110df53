use std::sync::Arc;

use crate::config::Config;
use crate::error::ToolError;
use crate::llm::{ChatBackend, ChatRequest, OpenAiClient};

pub const NO_ANSWER: &str = "No answer found.";

/// Turns a question plus CV text into an answer.
///
/// Implementations never fail: upstream problems become the answer text.
#[async_trait::async_trait]
pub trait AnswerStrategy: Send + Sync {
    async fn answer(&self, question: &str, document: &str) -> String;

    /// Whether answers come from a model rather than the local fallback.
    fn is_live(&self) -> bool {
        false
    }
}

/// Asks a language model, restricted to a prefix of the CV.
pub struct LiveAnswer {
    backend: Arc<dyn ChatBackend>,
    prompt_chars: usize,
    max_tokens: u32,
}

impl LiveAnswer {
    pub fn new(backend: Arc<dyn ChatBackend>, prompt_chars: usize, max_tokens: u32) -> Self {
        Self {
            backend,
            prompt_chars,
            max_tokens,
        }
    }

    fn system_prompt(&self, document: &str) -> String {
        format!(
            "You answer questions about a candidate using only the CV below. \
            If the CV does not contain the answer, say that it is not mentioned.\n\n\
            CV:\n{}",
            char_prefix(document, self.prompt_chars)
        )
    }
}

#[async_trait::async_trait]
impl AnswerStrategy for LiveAnswer {
    fn is_live(&self) -> bool {
        true
    }

    async fn answer(&self, question: &str, document: &str) -> String {
        let request = ChatRequest {
            system_prompt: self.system_prompt(document),
            user_prompt: question.to_string(),
            max_tokens: self.max_tokens,
        };

        match self.backend.chat(request).await {
            Ok(Some(answer)) => answer,
            Ok(None) => NO_ANSWER.to_string(),
            Err(e) => {
                let err = ToolError::InferenceFailure(format!("{:#}", e));
                log::warn!("LiveAnswer: {}", err);
                err.to_string()
            }
        }
    }
}

/// Deterministic answer used when no inference credential is configured.
pub struct FallbackAnswer {
    preview_chars: usize,
}

impl FallbackAnswer {
    pub fn new(preview_chars: usize) -> Self {
        Self { preview_chars }
    }
}

#[async_trait::async_trait]
impl AnswerStrategy for FallbackAnswer {
    async fn answer(&self, question: &str, document: &str) -> String {
        format!(
            "[Demo mode: no inference API key configured]\n\
            Question: {}\n\
            CV preview: {}...",
            question,
            char_prefix(document, self.preview_chars)
        )
    }
}

/// Answer engine with its strategy fixed at construction.
pub struct AnswerEngine {
    strategy: Box<dyn AnswerStrategy>,
}

impl AnswerEngine {
    pub fn new(strategy: Box<dyn AnswerStrategy>) -> Self {
        Self { strategy }
    }

    /// Pick the live strategy when an inference key is present, the fallback otherwise.
    pub fn from_config(config: &Config) -> Self {
        match &config.ai_model.api_key {
            Some(key) => {
                let client = OpenAiClient::new(
                    config.ai_model.endpoint.clone(),
                    config.ai_model.model.clone(),
                    key.clone(),
                );
                Self::new(Box::new(LiveAnswer::new(
                    Arc::new(client),
                    config.document.prompt_chars,
                    config.ai_model.max_tokens,
                )))
            }
            None => Self::new(Box::new(FallbackAnswer::new(
                config.document.preview_chars,
            ))),
        }
    }

    pub fn is_live(&self) -> bool {
        self.strategy.is_live()
    }

    pub async fn answer(&self, question: &str, document: &str) -> String {
        self.strategy.answer(question, document).await
    }
}

/// The first `max_chars` characters of `text`, never splitting a character.
fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records the last request and replies with a canned result.
    struct ScriptedBackend {
        reply: fn() -> anyhow::Result<Option<String>>,
        last: Mutex<Option<ChatRequest>>,
    }

    impl ScriptedBackend {
        fn new(reply: fn() -> anyhow::Result<Option<String>>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                last: Mutex::new(None),
            })
        }
    }

    #[async_trait::async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn chat(&self, request: ChatRequest) -> anyhow::Result<Option<String>> {
            *self.last.lock().unwrap() = Some(request);
            (self.reply)()
        }
    }

    #[tokio::test]
    async fn test_fallback_is_deterministic() {
        let document = format!("Senior Engineer with 10 years...{}", "z".repeat(200));
        let engine = AnswerEngine::new(Box::new(FallbackAnswer::new(100)));

        let first = engine.answer("What is your experience?", &document).await;
        let second = engine.answer("What is your experience?", &document).await;

        assert_eq!(first, second);
        assert!(first.contains("What is your experience?"));
        assert!(first.contains(&document[..100]));
        assert!(!first.contains(&document[..101]));
    }

    #[tokio::test]
    async fn test_fallback_with_short_document() {
        let answer = FallbackAnswer::new(100).answer("Skills?", "Rust").await;
        assert!(answer.contains("CV preview: Rust..."));
    }

    #[tokio::test]
    async fn test_live_prompt_is_truncated() {
        let backend = ScriptedBackend::new(|| Ok(Some("Ten years.".to_string())));
        let strategy = LiveAnswer::new(backend.clone(), 3000, 500);
        let document = format!("{}TAIL", "#".repeat(5000));

        let answer = strategy.answer("How long?", &document).await;
        assert_eq!(answer, "Ten years.");

        let request = backend.last.lock().unwrap().clone().unwrap();
        assert_eq!(request.system_prompt.matches('#').count(), 3000);
        assert!(!request.system_prompt.contains("TAIL"));
        assert_eq!(request.user_prompt, "How long?");
        assert_eq!(request.max_tokens, 500);
    }

    #[tokio::test]
    async fn test_live_empty_completion() {
        let backend = ScriptedBackend::new(|| Ok(None));
        let answer = LiveAnswer::new(backend, 3000, 500).answer("Q", "CV").await;
        assert_eq!(answer, NO_ANSWER);
    }

    #[tokio::test]
    async fn test_live_failure_becomes_answer_text() {
        let backend = ScriptedBackend::new(|| Err(anyhow::anyhow!("401 Unauthorized")));
        let answer = LiveAnswer::new(backend, 3000, 500).answer("Q", "CV").await;
        assert_eq!(answer, "API error: 401 Unauthorized");
    }

    #[test]
    fn test_strategy_follows_inference_key() {
        let mut config = Config::default();
        assert!(!AnswerEngine::from_config(&config).is_live());

        config.ai_model.api_key = Some("sk-test".to_string());
        assert!(AnswerEngine::from_config(&config).is_live());
    }

    #[test]
    fn test_liveness_follows_injected_strategy() {
        let backend = ScriptedBackend::new(|| Ok(None));
        assert!(AnswerEngine::new(Box::new(LiveAnswer::new(backend, 3000, 500))).is_live());
        assert!(!AnswerEngine::new(Box::new(FallbackAnswer::new(100))).is_live());
    }

    #[test]
    fn test_char_prefix_respects_char_boundaries() {
        assert_eq!(char_prefix("héllo", 2), "hé");
        assert_eq!(char_prefix("abc", 10), "abc");
        assert_eq!(char_prefix("abc", 0), "");
    }
}
