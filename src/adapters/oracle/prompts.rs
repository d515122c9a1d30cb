//! Prompt texts for the language-model oracle.

use crate::domain::extraction::ExtractionResult;
use crate::domain::projects::ProjectDirectory;
use crate::domain::resolver::TaskRecord;

/// Records beyond this are left out of answer prompts.
pub const ANSWER_CONTEXT_LIMIT: usize = 500;
/// Validator context is smaller; it carries full JSON per record.
pub const VALIDATOR_CONTEXT_LIMIT: usize = 300;

const EXTRACT_SYSTEM: &str = "You are a task extraction engine. The user writes in Russian or \
English about tasks, updates to existing tasks, and reminders. The message may be forwarded or \
addressed to someone else; extract the tasks anyway. Return ONLY one JSON object matching the \
schema, with no markdown and no commentary. Dates are ISO 8601. Missing values are null or empty \
arrays. If information required to act is missing, add short clarifying questions in the input \
language. Always fill meta.intents with an ordered list of objects whose `type` is one of: \
clarify, create, update, move, status, reminder, query. A message may contain several requests; \
extract all of them.";

const EXTRACT_INSTRUCTIONS: &str = "Fill tasks_new, tasks_updates, reminders, \
clarifying_questions and meta.\n\
QUERY vs CREATE: asking to find, show or list existing tasks is a `query` intent and must not fill \
tasks_new. For a query intent add `question` and `filters` with optional keys: \
time.due (today|tomorrow|overdue|this_week|next_week), time.due_on (YYYY-MM-DD), \
project.names [string], labels.include / labels.exclude [string], \
priority.in [low|medium|high|urgent], text.contains [string].\n\
Changing an existing task fills tasks_updates; extra information goes to changes.description and \
is appended to the task. Reminder requests fill reminders.\n\
tasks_new.project is always null; never ask about projects.\n\
direction is `to_me` when the speaker will do the task and `from_me` when it is assigned to a \
named third person. If unclear, leave it null and ask; if still unclear, use `to_me`.\n\
Infer 1-5 short lowercase labels per task when sensible.";

const SCHEMA_HINT: &str = r#"{
  "tasks_new": [{"title": "string", "body": "string|null", "created_at": "ISO 8601",
    "project": null, "labels": ["string"], "priority": "low|medium|high|urgent|null",
    "deadline": "ISO 8601|null", "direction": "from_me|to_me|null", "source_text": "string"}],
  "tasks_updates": [{"target": "task id, url or title", "changes": {
    "status": "todo|in_progress|blocked|done|null", "title": "string|null",
    "description": "string|null", "priority": "low|medium|high|urgent|null",
    "labels_add": ["string"], "labels_remove": ["string"], "assignee": "string|null",
    "deadline": "ISO 8601|null", "project": "string|null"}, "source_text": "string"}],
  "reminders": [{"title": "string", "at": "ISO 8601|null", "offset": "PT15M|null",
    "repeat": "none|daily|weekly|monthly|null", "source_text": "string"}],
  "clarifying_questions": ["string"],
  "meta": {"language": "ru|en", "parsed_at": "ISO 8601", "confidence": 0.0, "intents": []}
}"#;

const REFINE_INSTRUCTIONS: &str = "You get the original input, the CURRENT JSON extraction and \
the user's free-form corrections. Apply every requested change: a new time updates the deadline, \
extra details are appended to the body. Keep unspecified fields and the same schema. Return ONLY \
the full corrected JSON object.";

pub const VALIDATOR_SYSTEM: &str = "Return ONLY the full corrected JSON object. No prose.";

pub const ANSWER_SYSTEM: &str =
    "Answer concisely in the language of the question. No markdown.";

pub const ANSWER_VALIDATOR_SYSTEM: &str = "Return ONLY the final answer text. No markdown.";

pub const REFUSAL_SYSTEM: &str = "You are a spooky guardian AI. Answer in the user's language.";

pub const PERSONALIZE_SYSTEM: &str = "Be creative but concise.";

/// Identity and user details appended to the extraction system prompt.
#[derive(Debug, Clone, Default)]
pub struct PromptProfile {
    pub agent_role: Option<String>,
    pub user_name: Option<String>,
    pub user_role: Option<String>,
    pub timezone: Option<String>,
    /// Free-form profile, typically JSON.
    pub user_profile: Option<String>,
}

impl PromptProfile {
    pub fn system_prompt(&self) -> String {
        let mut sections = Vec::new();
        if let Some(role) = &self.agent_role {
            sections.push(format!("AGENT ROLE: {role}"));
        }
        let profile: Vec<String> = [
            ("name", &self.user_name),
            ("role", &self.user_role),
            ("timezone", &self.timezone),
            ("extra", &self.user_profile),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| format!("{key}={v}")))
        .collect();
        if !profile.is_empty() {
            sections.push(format!("USER PROFILE: {}", profile.join("; ")));
        }

        if sections.is_empty() {
            EXTRACT_SYSTEM.to_string()
        } else {
            format!("{EXTRACT_SYSTEM}\n\n{}", sections.join("\n"))
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

pub fn extract_prompt(text: &str) -> String {
    format!("{EXTRACT_INSTRUCTIONS}\n\nSCHEMA:\n{SCHEMA_HINT}\n\nTEXT:\n{text}")
}

pub fn refine_prompt(original: &str, current: &ExtractionResult, corrections: &str) -> String {
    format!(
        "REFINE INSTRUCTIONS:\n{REFINE_INSTRUCTIONS}\n\nORIGINAL INPUT:\n{original}\n\n\
         CURRENT JSON:\n{}\n\nUSER CORRECTIONS:\n{corrections}\n",
        to_json(current)
    )
}

pub fn validate_prompt(original: &str, candidate: &ExtractionResult) -> String {
    format!(
        "You are a strict validator. Given ORIGINAL INPUT and CANDIDATE JSON, check faithfulness, \
         missing required fields and inconsistent dates, priorities or projects, and return ONLY \
         the corrected full JSON.\n\nORIGINAL INPUT:\n{original}\n\nCANDIDATE JSON:\n{}",
        to_json(candidate)
    )
}

fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    short.push('…');
    short
}

/// One compact line per record.
pub fn answer_context(records: &[TaskRecord], projects: &ProjectDirectory) -> String {
    records
        .iter()
        .take(ANSWER_CONTEXT_LIMIT)
        .map(|record| {
            let project = record
                .project_id
                .as_deref()
                .and_then(|id| projects.name_for(id))
                .unwrap_or("");
            format!(
                "- id={} | project={} | prio={} | labels=[{}] | due={} | title={} | desc={}",
                record.id,
                project,
                record.priority.map(|p| p.to_string()).unwrap_or_default(),
                record.labels.join(", "),
                record.due_value().unwrap_or(""),
                shorten(&record.content, 160),
                shorten(&record.description, 120),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn answer_prompt(
    question: &str,
    records: &[TaskRecord],
    projects: &ProjectDirectory,
    timezone: &str,
) -> String {
    let timezone = if timezone.trim().is_empty() { "UTC" } else { timezone };
    format!(
        "You answer questions about the user's tasks. Use ONLY the TASKS CONTEXT. If unsure, say \
         so briefly. Answer concisely in the language of the question.\n\n\
         USER TIMEZONE: {timezone}\n\nQUESTION:\n{question}\n\n\
         TASKS CONTEXT (active tasks):\n{}\n",
        answer_context(records, projects)
    )
}

pub fn validate_answer_prompt(question: &str, records: &[TaskRecord], draft: &str) -> String {
    let context = records
        .iter()
        .take(VALIDATOR_CONTEXT_LIMIT)
        .map(to_json)
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Given QUESTION, TASKS JSON CONTEXT and DRAFT ANSWER, verify the facts and fix numbers or \
         lists if needed. Return ONLY the corrected answer text.\n\nQUESTION:\n{question}\n\n\
         DRAFT ANSWER:\n{draft}\n\nTASKS JSON CONTEXT:\n{context}\n"
    )
}

pub fn refusal_prompt(user_name: &str) -> String {
    format!(
        "A stranger named '{user_name}' tried to use your owner's assistant. Write a short, eerie \
         but funny message telling them to leave. Say this place is not for them."
    )
}

pub fn personalize_prompt(
    role: &str,
    message: &str,
    context: &str,
    user_name: Option<&str>,
) -> String {
    let mut prompt = format!(
        "You are {role}. Rewrite the following message in your own voice. Keep it to one or two \
         sentences.\n\nOriginal message: {message}\n"
    );
    if !context.is_empty() {
        prompt.push_str(&format!("Context: {context}\n"));
    }
    if let Some(name) = user_name {
        prompt.push_str(&format!("User name: {name}\n"));
    }
    prompt
}
