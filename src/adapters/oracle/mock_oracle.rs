//! Mock oracle for testing handlers without prompts or JSON.
//!
//! Each operation has its own queue. An empty queue fails the call with
//! `Malformed`, except the validators and `personalize`, which report
//! `Disabled` like an oracle without a validator model or persona.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::domain::extraction::ExtractionResult;
use crate::domain::projects::ProjectDirectory;
use crate::domain::resolver::TaskRecord;
use crate::ports::{Oracle, OracleError};

#[derive(Debug, Default)]
struct Script {
    extractions: VecDeque<ExtractionResult>,
    refinements: VecDeque<ExtractionResult>,
    validations: VecDeque<ExtractionResult>,
    answers: VecDeque<String>,
    personalized: VecDeque<String>,
}

/// One recorded oracle call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleCall {
    Extract(String),
    Refine { original: String, corrections: String },
    Validate(String),
    Answer { question: String, records: usize },
    ValidateAnswer(String),
    Refusal(String),
    Personalize(String),
}

#[derive(Debug, Clone, Default)]
pub struct MockOracle {
    script: Arc<Mutex<Script>>,
    calls: Arc<Mutex<Vec<OracleCall>>>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self, f: impl FnOnce(&mut Script)) {
        if let Ok(mut script) = self.script.lock() {
            f(&mut script);
        }
    }

    pub fn with_extraction(self, result: ExtractionResult) -> Self {
        self.script(|s| s.extractions.push_back(result));
        self
    }

    pub fn with_refinement(self, result: ExtractionResult) -> Self {
        self.script(|s| s.refinements.push_back(result));
        self
    }

    pub fn with_validation(self, result: ExtractionResult) -> Self {
        self.script(|s| s.validations.push_back(result));
        self
    }

    pub fn with_answer(self, answer: impl Into<String>) -> Self {
        let answer = answer.into();
        self.script(|s| s.answers.push_back(answer));
        self
    }

    pub fn with_personalized(self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.script(|s| s.personalized.push_back(text));
        self
    }

    pub fn calls(&self) -> Vec<OracleCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: OracleCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn pop<T>(&self, pick: impl FnOnce(&mut Script) -> Option<T>) -> Option<T> {
        self.script.lock().ok().and_then(|mut s| pick(&mut s))
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn extract(&self, text: &str) -> Result<ExtractionResult, OracleError> {
        self.record(OracleCall::Extract(text.to_string()));
        self.pop(|s| s.extractions.pop_front())
            .ok_or_else(|| OracleError::malformed("no scripted extraction"))
    }

    async fn refine(
        &self,
        original: &str,
        _current: &ExtractionResult,
        corrections: &str,
    ) -> Result<ExtractionResult, OracleError> {
        self.record(OracleCall::Refine {
            original: original.to_string(),
            corrections: corrections.to_string(),
        });
        self.pop(|s| s.refinements.pop_front())
            .ok_or_else(|| OracleError::malformed("no scripted refinement"))
    }

    async fn validate(
        &self,
        original: &str,
        _candidate: &ExtractionResult,
    ) -> Result<ExtractionResult, OracleError> {
        self.record(OracleCall::Validate(original.to_string()));
        self.pop(|s| s.validations.pop_front())
            .ok_or(OracleError::Disabled("validator"))
    }

    async fn answer(
        &self,
        question: &str,
        records: &[TaskRecord],
        _projects: &ProjectDirectory,
        _timezone: &str,
    ) -> Result<String, OracleError> {
        self.record(OracleCall::Answer {
            question: question.to_string(),
            records: records.len(),
        });
        self.pop(|s| s.answers.pop_front())
            .ok_or_else(|| OracleError::malformed("no scripted answer"))
    }

    async fn validate_answer(
        &self,
        question: &str,
        _records: &[TaskRecord],
        _draft: &str,
    ) -> Result<String, OracleError> {
        self.record(OracleCall::ValidateAnswer(question.to_string()));
        Err(OracleError::Disabled("validator"))
    }

    async fn refusal(&self, user_name: &str) -> Result<String, OracleError> {
        self.record(OracleCall::Refusal(user_name.to_string()));
        Err(OracleError::malformed("no scripted refusal"))
    }

    async fn personalize(&self, message: &str, _context: &str) -> Result<String, OracleError> {
        self.record(OracleCall::Personalize(message.to_string()));
        self.pop(|s| s.personalized.pop_front())
            .ok_or(OracleError::Disabled("personalization"))
    }
}
