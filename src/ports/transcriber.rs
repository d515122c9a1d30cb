//! Transcriber Port - speech to text.

use std::path::Path;

use async_trait::async_trait;

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribes a local audio file.
    async fn transcribe(&self, audio: &Path) -> Result<String, TranscriptionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("audio file not found: {0}")]
    MissingFile(String),

    #[error("transcriber failed: {0}")]
    Failed(String),

    #[error("transcriber is not configured")]
    NotConfigured,
}
