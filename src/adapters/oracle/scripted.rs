//! Scripted completion client for testing.
//!
//! Responses are consumed in order; once the script runs out every call
//! returns an empty JSON object.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::ports::{AIError, CompletionClient, CompletionRequest, CompletionResponse, ProviderInfo};

#[derive(Debug)]
enum Scripted {
    Content(String),
    Error(AIError),
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedCompletionClient {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push(Scripted::Content(content.into()));
        self
    }

    pub fn with_error(self, error: AIError) -> Self {
        self.push(Scripted::Error(error));
        self
    }

    fn push(&self, item: Scripted) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(item);
        }
    }

    /// Every request received, in order.
    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let model = request.model.clone().unwrap_or_else(|| "scripted".to_string());
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request);
        }
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(Scripted::Content(content)) => Ok(CompletionResponse { content, model }),
            Some(Scripted::Error(err)) => Err(err),
            None => Ok(CompletionResponse {
                content: "{}".to_string(),
                model,
            }),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("scripted", "scripted")
    }
}
