//! ExtractionOrchestrator - drives extract, validate, refine and query answering.
//!
//! Every Oracle call is fallible; this handler decides the fallback for each
//! one explicitly:
//!
//! | Call              | On failure                          |
//! |-------------------|-------------------------------------|
//! | `extract`         | empty result                        |
//! | `validate`        | keep the unvalidated candidate      |
//! | `refine`          | keep the current pending result     |
//! | `answer`          | keep any answer already present     |
//! | `validate_answer` | keep the draft answer               |

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::extraction::{ExtractionResult, QueryIntent};
use crate::domain::projects::ProjectDirectory;
use crate::domain::resolver::TaskRecord;
use crate::domain::session::ConversationMode;
use crate::ports::{Oracle, OracleError, TaskStore};

const CLARIFICATION_PREFIX: &str = "\n\nUser clarification: project=";

/// Outcome of one extraction round.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub result: ExtractionResult,
    /// `AwaitingClarification` when questions remain, otherwise `Previewing`.
    pub next_mode: ConversationMode,
}

impl Extraction {
    pub fn needs_clarification(&self) -> bool {
        self.next_mode == ConversationMode::AwaitingClarification
    }
}

pub struct ExtractionOrchestrator {
    oracle: Arc<dyn Oracle>,
    store: Option<Arc<dyn TaskStore>>,
    projects: ProjectDirectory,
    timezone: String,
}

impl ExtractionOrchestrator {
    pub fn new(oracle: Arc<dyn Oracle>, projects: ProjectDirectory, timezone: impl Into<String>) -> Self {
        Self {
            oracle,
            store: None,
            projects,
            timezone: timezone.into(),
        }
    }

    /// Enables query answering against the store.
    pub fn with_store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Extracts and validates `input`, then either asks questions or prepares
    /// a preview (answering any query intent on the way).
    pub async fn extract(&self, input: &str) -> Extraction {
        let candidate = match self.oracle.extract(input).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Extraction failed, continuing with an empty result");
                ExtractionResult::default()
            }
        };
        let mut result = self.validated(input, candidate).await;

        if result.needs_clarification() {
            info!(
                questions = result.open_questions().len(),
                "Extraction needs clarification"
            );
            return Extraction {
                result,
                next_mode: ConversationMode::AwaitingClarification,
            };
        }

        self.prepare_query_answer(&mut result).await;
        Extraction {
            result,
            next_mode: ConversationMode::Previewing,
        }
    }

    /// Applies free-form corrections. Never loses the current result.
    pub async fn refine(
        &self,
        original: &str,
        current: &ExtractionResult,
        corrections: &str,
    ) -> ExtractionResult {
        let refined = match self.oracle.refine(original, current, corrections).await {
            Ok(refined) => refined,
            Err(e) => {
                warn!(error = %e, "Refinement failed, keeping the current result");
                return current.clone();
            }
        };
        let mut result = self.validated(original, refined).await;
        self.prepare_query_answer(&mut result).await;
        result
    }

    /// Re-runs extraction with a project chosen from the clarification
    /// keyboard (`None` is "skip"). Returns the combined input and the outcome.
    pub async fn clarify_with_project(
        &self,
        original: &str,
        project: Option<&str>,
    ) -> (String, Extraction) {
        let combined = format!(
            "{original}{CLARIFICATION_PREFIX}{}\n",
            project.unwrap_or("null")
        );
        let extraction = self.extract(&combined).await;
        (combined, extraction)
    }

    async fn validated(&self, original: &str, candidate: ExtractionResult) -> ExtractionResult {
        match self.oracle.validate(original, &candidate).await {
            Ok(validated) => validated,
            Err(OracleError::Disabled(_)) => candidate,
            Err(e) => {
                warn!(error = %e, "Validation failed, keeping the unvalidated result");
                candidate
            }
        }
    }

    /// Answers the first query intent of `result`, if any, from store data.
    ///
    /// An answer already on `result` is only replaced by a new one.
    pub async fn prepare_query_answer(&self, result: &mut ExtractionResult) {
        let Some(intent) = result.query_intent() else {
            return;
        };
        let records = self.query_records(&intent).await;
        debug!(
            question = %intent.question,
            records = records.len(),
            "Answering task query"
        );

        let draft = match self
            .oracle
            .answer(&intent.question, &records, &self.projects, &self.timezone)
            .await
        {
            Ok(draft) if !draft.trim().is_empty() => draft,
            Ok(_) => return,
            Err(e) => {
                warn!(error = %e, "Query answer failed");
                return;
            }
        };

        let answer = match self
            .oracle
            .validate_answer(&intent.question, &records, &draft)
            .await
        {
            Ok(checked) if !checked.trim().is_empty() => checked,
            Ok(_) => draft,
            Err(OracleError::Disabled(_)) => draft,
            Err(e) => {
                warn!(error = %e, "Answer validation failed, keeping the draft");
                draft
            }
        };
        result.query_answer = Some(answer);
    }

    async fn query_records(&self, intent: &QueryIntent) -> Vec<TaskRecord> {
        let Some(store) = &self.store else {
            return Vec::new();
        };
        let query = intent.server_query(&self.projects);
        match store.get_tasks(&query).await {
            Ok(records) => intent.apply_local_filters(records),
            Err(e) => {
                warn!(error = %e, "Query fetch failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryTaskStore, StoreCall};
    use crate::adapters::oracle::{MockOracle, OracleCall};
    use crate::domain::extraction::{NewTask, TaskQuery};
    use crate::domain::foundation::TaskId;
    use serde_json::json;

    fn orchestrator(oracle: &MockOracle) -> ExtractionOrchestrator {
        ExtractionOrchestrator::new(
            Arc::new(oracle.clone()),
            ProjectDirectory::parse("Work:77,Home:88"),
            "Europe/Moscow",
        )
    }

    fn with_task(title: &str) -> ExtractionResult {
        ExtractionResult {
            tasks_new: vec![NewTask::titled(title)],
            ..Default::default()
        }
    }

    fn query_result(question: &str) -> ExtractionResult {
        let mut result = ExtractionResult::default();
        result.meta.intents = vec![json!({
            "type": "query",
            "question": question,
            "filters": {"project": {"names": ["Work"]}, "priority": {"in": ["high"]}}
        })];
        result
    }

    #[tokio::test]
    async fn questions_lead_to_clarification() {
        let oracle = MockOracle::new().with_extraction(ExtractionResult {
            clarifying_questions: vec!["Which project?".into()],
            ..Default::default()
        });
        let extraction = orchestrator(&oracle).extract("call Bob").await;

        assert!(extraction.needs_clarification());
        assert_eq!(extraction.result.open_questions(), vec!["Which project?"]);
    }

    #[tokio::test]
    async fn validated_candidate_replaces_extraction() {
        let oracle = MockOracle::new()
            .with_extraction(with_task("Cal Bob"))
            .with_validation(with_task("Call Bob"));
        let extraction = orchestrator(&oracle).extract("call bob").await;

        assert_eq!(extraction.next_mode, ConversationMode::Previewing);
        assert_eq!(extraction.result.tasks_new[0].title, "Call Bob");
    }

    #[tokio::test]
    async fn failed_extraction_yields_empty_preview() {
        let oracle = MockOracle::new();
        let extraction = orchestrator(&oracle).extract("???").await;

        assert_eq!(extraction.next_mode, ConversationMode::Previewing);
        assert!(!extraction.result.has_actions());
    }

    #[tokio::test]
    async fn refine_failure_keeps_current_result() {
        let oracle = MockOracle::new();
        let current = with_task("Buy milk");
        let refined = orchestrator(&oracle)
            .refine("buy milk", &current, "make it oat milk")
            .await;

        assert_eq!(refined, current);
        assert!(matches!(
            &oracle.calls()[0],
            OracleCall::Refine { corrections, .. } if corrections == "make it oat milk"
        ));
    }

    #[tokio::test]
    async fn refine_failure_keeps_the_pending_answer() {
        let oracle = MockOracle::new();
        let mut current = query_result("What is due today?");
        current.tasks_new = vec![NewTask::titled("Buy milk")];
        current.query_answer = Some("You have 3 tasks today".into());

        let refined = orchestrator(&oracle)
            .refine("buy milk, what is due today?", &current, "oat milk")
            .await;

        assert_eq!(refined, current);
        assert_eq!(refined.answer(), Some("You have 3 tasks today"));
        assert!(!oracle
            .calls()
            .iter()
            .any(|c| matches!(c, OracleCall::Answer { .. })));
    }

    #[tokio::test]
    async fn failed_answer_keeps_an_existing_answer() {
        let oracle = MockOracle::new();
        let mut result = query_result("Anything due?");
        result.query_answer = Some("Nothing is due.".into());

        orchestrator(&oracle).prepare_query_answer(&mut result).await;

        assert_eq!(result.answer(), Some("Nothing is due."));
    }

    #[tokio::test]
    async fn refine_uses_the_refined_result() {
        let oracle = MockOracle::new().with_refinement(with_task("Buy oat milk"));
        let refined = orchestrator(&oracle)
            .refine("buy milk", &with_task("Buy milk"), "oat milk")
            .await;
        assert_eq!(refined.tasks_new[0].title, "Buy oat milk");
    }

    #[tokio::test]
    async fn project_choice_is_appended_to_input() {
        let oracle = MockOracle::new().with_extraction(with_task("Report"));
        let (combined, _) = orchestrator(&oracle)
            .clarify_with_project("write report", Some("Work"))
            .await;
        assert_eq!(combined, "write report\n\nUser clarification: project=Work\n");

        let oracle = MockOracle::new().with_extraction(with_task("Report"));
        let (skipped, _) = orchestrator(&oracle).clarify_with_project("write report", None).await;
        assert!(skipped.ends_with("project=null\n"));
    }

    #[tokio::test]
    async fn query_intent_is_answered_from_filtered_store_data() {
        let store = InMemoryTaskStore::new()
            .with_task(TaskRecord {
                project_id: Some("77".into()),
                priority: Some(3),
                ..TaskRecord::new(TaskId::new("1").unwrap(), "Ship release")
            })
            .with_task(TaskRecord {
                project_id: Some("77".into()),
                priority: Some(1),
                ..TaskRecord::new(TaskId::new("2").unwrap(), "Tidy desk")
            });
        let oracle = MockOracle::new()
            .with_extraction(query_result("What is urgent at work?"))
            .with_answer("Ship release is your only high-priority task.");
        let orchestrator = orchestrator(&oracle).with_store(Arc::new(store.clone()));

        let extraction = orchestrator.extract("what is urgent at work?").await;

        assert!(extraction.result.is_query_only());
        assert_eq!(
            extraction.result.answer(),
            Some("Ship release is your only high-priority task.")
        );
        assert_eq!(
            store.calls(),
            vec![StoreCall::GetTasks(TaskQuery {
                filter: None,
                project_id: Some("77".into()),
                label: None,
            })]
        );
        assert!(oracle.calls().contains(&OracleCall::Answer {
            question: "What is urgent at work?".into(),
            records: 1,
        }));
    }

    #[tokio::test]
    async fn failed_answer_leaves_no_answer() {
        let oracle = MockOracle::new().with_extraction(query_result("Anything due?"));
        let extraction = orchestrator(&oracle).extract("anything due?").await;

        assert_eq!(extraction.result.answer(), None);
        assert!(!extraction.result.is_query_only());
    }
}
