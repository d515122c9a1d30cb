//! Oracle backed by a chat-completion client and an ordered model list.
//!
//! Each call is tried per model until one both responds and parses. The
//! validator calls use a dedicated model at temperature 0 and report
//! `Disabled` when no validator is configured.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::prompts::{self, PromptProfile};
use crate::domain::extraction::ExtractionResult;
use crate::domain::projects::ProjectDirectory;
use crate::domain::resolver::TaskRecord;
use crate::ports::{
    AIError, CompletionClient, CompletionRequest, MessageRole, Oracle, OracleError,
};

const EXTRACT_TEMPERATURE: f32 = 0.1;
const REFUSAL_TEMPERATURE: f32 = 0.8;
const PERSONALIZE_TEMPERATURE: f32 = 0.7;

pub struct LlmOracle {
    client: Arc<dyn CompletionClient>,
    models: Vec<String>,
    validator_model: Option<String>,
    profile: PromptProfile,
}

impl LlmOracle {
    pub fn new(client: Arc<dyn CompletionClient>, models: Vec<String>) -> Self {
        let models = models
            .into_iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        Self {
            client,
            models,
            validator_model: None,
            profile: PromptProfile::default(),
        }
    }

    /// `None` switches validation off.
    pub fn with_validator(mut self, model: Option<String>) -> Self {
        self.validator_model = model.filter(|m| !m.trim().is_empty());
        self
    }

    pub fn with_profile(mut self, profile: PromptProfile) -> Self {
        self.profile = profile;
        self
    }

    fn request(system: &str, user: String, temperature: f32) -> CompletionRequest {
        CompletionRequest::new()
            .with_system_prompt(system)
            .with_message(MessageRole::User, user)
            .with_temperature(temperature)
    }

    /// Runs `request` against each model in order, returning the first
    /// response that `parse` accepts.
    async fn first_success<T, F>(
        &self,
        operation: &'static str,
        request: CompletionRequest,
        parse: F,
    ) -> Result<T, OracleError>
    where
        F: Fn(&str) -> Result<T, OracleError>,
    {
        let mut last_error = OracleError::Disabled("model list");
        for (index, model) in self.models.iter().enumerate() {
            if index > 0 {
                warn!(operation, model = %model, error = %last_error, "Falling back to next model");
            }
            let attempt = self
                .client
                .complete(request.clone().with_model(model.clone()))
                .await
                .map_err(OracleError::from)
                .and_then(|response| parse(&response.content));
            match attempt {
                Ok(value) => {
                    debug!(operation, model = %model, "Oracle call succeeded");
                    return Ok(value);
                }
                Err(err) => last_error = err,
            }
        }
        Err(last_error)
    }

    async fn validator_call<T, F>(
        &self,
        operation: &'static str,
        request: CompletionRequest,
        parse: F,
    ) -> Result<T, OracleError>
    where
        F: Fn(&str) -> Result<T, OracleError>,
    {
        let model = self
            .validator_model
            .as_ref()
            .ok_or(OracleError::Disabled("validator"))?;
        let response = self
            .client
            .complete(request.with_model(model.clone()))
            .await?;
        debug!(operation, model = %model, "Validator call succeeded");
        parse(&response.content)
    }
}

/// Removes a surrounding Markdown code fence, with or without a language tag.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = inner.strip_suffix("```") else {
        return trimmed;
    };
    match inner.split_once('\n') {
        Some((tag, body)) if !tag.contains('{') => body.trim(),
        _ => inner.trim(),
    }
}

/// Parses the outermost JSON object found in model output.
pub fn parse_json_object<T: DeserializeOwned>(content: &str) -> Result<T, OracleError> {
    let text = strip_code_fences(content);
    let object = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => return Err(OracleError::malformed("no JSON object in response")),
    };
    serde_json::from_str(object).map_err(|e| OracleError::malformed(e.to_string()))
}

fn parse_extraction(content: &str) -> Result<ExtractionResult, OracleError> {
    let mut result: ExtractionResult = parse_json_object(content)?;
    let now = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    if result.meta.parsed_at.is_none() {
        result.meta.parsed_at = Some(now.clone());
    }
    for task in &mut result.tasks_new {
        if task.created_at.is_none() {
            task.created_at = Some(now.clone());
        }
    }
    Ok(result)
}

fn parse_text(content: &str) -> Result<String, OracleError> {
    let text = content.trim();
    if text.is_empty() {
        return Err(OracleError::Provider(AIError::parse("empty completion")));
    }
    Ok(text.to_string())
}

#[async_trait]
impl Oracle for LlmOracle {
    async fn extract(&self, text: &str) -> Result<ExtractionResult, OracleError> {
        let request = Self::request(
            &self.profile.system_prompt(),
            prompts::extract_prompt(text),
            EXTRACT_TEMPERATURE,
        );
        self.first_success("extract", request, parse_extraction).await
    }

    async fn refine(
        &self,
        original: &str,
        current: &ExtractionResult,
        corrections: &str,
    ) -> Result<ExtractionResult, OracleError> {
        info!(corrections, "Refining extraction");
        let request = Self::request(
            &self.profile.system_prompt(),
            prompts::refine_prompt(original, current, corrections),
            EXTRACT_TEMPERATURE,
        );
        self.first_success("refine", request, parse_extraction).await
    }

    async fn validate(
        &self,
        original: &str,
        candidate: &ExtractionResult,
    ) -> Result<ExtractionResult, OracleError> {
        let request = Self::request(
            prompts::VALIDATOR_SYSTEM,
            prompts::validate_prompt(original, candidate),
            0.0,
        );
        self.validator_call("validate", request, parse_extraction).await
    }

    async fn answer(
        &self,
        question: &str,
        records: &[TaskRecord],
        projects: &ProjectDirectory,
        timezone: &str,
    ) -> Result<String, OracleError> {
        let request = Self::request(
            prompts::ANSWER_SYSTEM,
            prompts::answer_prompt(question, records, projects, timezone),
            EXTRACT_TEMPERATURE,
        );
        self.first_success("answer", request, parse_text).await
    }

    async fn validate_answer(
        &self,
        question: &str,
        records: &[TaskRecord],
        draft: &str,
    ) -> Result<String, OracleError> {
        let request = Self::request(
            prompts::ANSWER_VALIDATOR_SYSTEM,
            prompts::validate_answer_prompt(question, records, draft),
            0.0,
        );
        self.validator_call("validate_answer", request, parse_text).await
    }

    async fn refusal(&self, user_name: &str) -> Result<String, OracleError> {
        let request = Self::request(
            prompts::REFUSAL_SYSTEM,
            prompts::refusal_prompt(user_name),
            REFUSAL_TEMPERATURE,
        );
        self.first_success("refusal", request, parse_text).await
    }

    async fn personalize(&self, message: &str, context: &str) -> Result<String, OracleError> {
        let role = self
            .profile
            .agent_role
            .as_deref()
            .ok_or(OracleError::Disabled("personalization"))?;
        let request = Self::request(
            prompts::PERSONALIZE_SYSTEM,
            prompts::personalize_prompt(role, message, context, self.profile.user_name.as_deref()),
            PERSONALIZE_TEMPERATURE,
        );
        self.first_success("personalize", request, parse_text).await
    }
}
