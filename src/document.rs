use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::sync::OnceCell;

use crate::error::ToolError;

/// Where the CV text comes from.
#[async_trait::async_trait]
pub trait DocumentSource: Send + Sync {
    /// Human-readable location, reported when loading fails.
    fn location(&self) -> String;
    async fn extract_text(&self) -> Result<String>;
}

/// A PDF file on disk.
pub struct PdfDocument {
    path: PathBuf,
}

impl PdfDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl DocumentSource for PdfDocument {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn extract_text(&self) -> Result<String> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;

        let text = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
        })
        .await
        .context("PDF extraction task failed")?
        .map_err(|e| anyhow::anyhow!("Failed to extract PDF text: {}", e))?;

        Ok(text)
    }
}

/// Holds the extracted CV text for the life of the process.
///
/// The first successful load populates the slot; concurrent callers wait on
/// the in-flight load instead of extracting again. A failed load leaves the
/// slot empty so the next call retries.
pub struct DocumentCache {
    source: Box<dyn DocumentSource>,
    text: OnceCell<String>,
}

impl DocumentCache {
    pub fn new(source: Box<dyn DocumentSource>) -> Self {
        Self {
            source,
            text: OnceCell::new(),
        }
    }

    pub async fn get_text(&self) -> Result<&str, ToolError> {
        let text = self
            .text
            .get_or_try_init(|| async {
                let location = self.source.location();
                let text = self.source.extract_text().await.map_err(|e| {
                    log::warn!("DocumentCache: failed to load {}: {:#}", location, e);
                    ToolError::DocumentUnavailable {
                        path: location.clone(),
                        reason: format!("{:#}", e),
                    }
                })?;

                log::info!(
                    "DocumentCache: loaded CV from {} ({} chars)",
                    location,
                    text.chars().count()
                );
                Ok::<_, ToolError>(text)
            })
            .await?;

        Ok(text.as_str())
    }

    #[cfg(test)]
    pub fn is_loaded(&self) -> bool {
        self.text.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSource {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl DocumentSource for CountingSource {
        fn location(&self) -> String {
            "memory://cv".to_string()
        }

        async fn extract_text(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Give a concurrent caller the chance to race the load.
            tokio::task::yield_now().await;
            Ok("Senior Engineer with 10 years of Rust".to_string())
        }
    }

    /// Fails until `available` is flipped, like a file that is mounted late.
    struct LateSource {
        available: Arc<AtomicBool>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl DocumentSource for LateSource {
        fn location(&self) -> String {
            "/mnt/cv.pdf".to_string()
        }

        async fn extract_text(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.available.load(Ordering::SeqCst) {
                anyhow::bail!("No such file or directory");
            }
            Ok("CV text".to_string())
        }
    }

    #[tokio::test]
    async fn test_text_is_extracted_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = DocumentCache::new(Box::new(CountingSource {
            calls: calls.clone(),
        }));

        for _ in 0..5 {
            let text = cache.get_text().await.unwrap();
            assert_eq!(text, "Senior Engineer with 10 years of Rust");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_callers_share_one_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = DocumentCache::new(Box::new(CountingSource {
            calls: calls.clone(),
        }));

        let (a, b, c) = tokio::join!(cache.get_text(), cache.get_text(), cache.get_text());
        assert_eq!(a.unwrap(), b.unwrap());
        assert!(c.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let available = Arc::new(AtomicBool::new(false));
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = DocumentCache::new(Box::new(LateSource {
            available: available.clone(),
            calls: calls.clone(),
        }));

        let err = cache.get_text().await.unwrap_err();
        assert!(matches!(err, ToolError::DocumentUnavailable { ref path, .. } if path == "/mnt/cv.pdf"));
        assert!(!cache.is_loaded());

        available.store(true, Ordering::SeqCst);
        assert_eq!(cache.get_text().await.unwrap(), "CV text");
        assert!(cache.is_loaded());

        cache.get_text().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_pdf_reports_path() {
        let path = std::env::temp_dir().join("cv-assistant-missing-cv.pdf");
        let cache = DocumentCache::new(Box::new(PdfDocument::new(&path)));

        let err = cache.get_text().await.unwrap_err();
        assert!(err.to_string().contains(&path.display().to_string()));
    }
}
