//! Oracle Port - language-model operations on tasks.
//!
//! Every operation is fallible. Callers pick the fallback explicitly:
//! an empty result for `extract`, the prior value for `refine` and the
//! validators, no answer for `answer`, a canned text for `refusal`, and the
//! raw message for `personalize`.

use async_trait::async_trait;

use crate::domain::extraction::ExtractionResult;
use crate::domain::projects::ProjectDirectory;
use crate::domain::resolver::TaskRecord;
use crate::ports::completion::AIError;

pub const FALLBACK_REFUSAL: &str = "Go away... you are not welcome here.";

#[async_trait]
pub trait Oracle: Send + Sync {
    /// Understands a (possibly accumulated) user input.
    async fn extract(&self, text: &str) -> Result<ExtractionResult, OracleError>;

    /// Applies free-form corrections to `current`.
    async fn refine(
        &self,
        original: &str,
        current: &ExtractionResult,
        corrections: &str,
    ) -> Result<ExtractionResult, OracleError>;

    /// Second-opinion check of an extraction against its input.
    async fn validate(
        &self,
        original: &str,
        candidate: &ExtractionResult,
    ) -> Result<ExtractionResult, OracleError>;

    /// Answers a question using only `records`.
    async fn answer(
        &self,
        question: &str,
        records: &[TaskRecord],
        projects: &ProjectDirectory,
        timezone: &str,
    ) -> Result<String, OracleError>;

    /// Second-opinion check of a drafted answer.
    async fn validate_answer(
        &self,
        question: &str,
        records: &[TaskRecord],
        draft: &str,
    ) -> Result<String, OracleError>;

    /// Refusal text for an unauthorized user.
    async fn refusal(&self, user_name: &str) -> Result<String, OracleError>;

    /// Rephrases a summary in the configured agent persona.
    async fn personalize(&self, message: &str, context: &str) -> Result<String, OracleError>;
}

/// Oracle errors.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// Every model failed at the transport level; holds the last error.
    #[error("provider error: {0}")]
    Provider(#[from] AIError),

    /// A model answered but not with the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The capability is switched off (no validator model, no persona, no key).
    #[error("{0} is disabled")]
    Disabled(&'static str),
}

impl OracleError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, OracleError::Disabled(_))
    }
}
