//! Tasktalk command line.
//!
//! `tasktalk run` (the default) talks to the assistant over stdin/stdout;
//! `tasktalk projects` lists store projects for the mapping string.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tasktalk::adapters::oracle::PromptProfile;
use tasktalk::adapters::{
    CommandTranscriber, ConsoleChat, LlmOracle, OpenRouterClient, OpenRouterConfig, TodoistConfig,
    TodoistStore,
};
use tasktalk::application::{
    ApplyEngine, Assistant, EntityResolver, EventKind, ExtractionOrchestrator, InboundEvent,
    PreviewRenderer, Sender, SessionManager,
};
use tasktalk::config::{AppConfig, LogFormat, LoggingConfig};
use tasktalk::domain::datetime::DateTimeNormalizer;
use tasktalk::domain::foundation::{ChatId, UserId};
use tasktalk::ports::{Oracle, TaskStore};

const CONSOLE_CHAT: i64 = 0;

#[derive(Debug, Parser)]
#[command(name = "tasktalk", version, about = "Conversational task assistant")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Chat with the assistant on stdin/stdout
    Run,
    /// Print `name: id` for every store project
    Projects {
        /// Print JSON instead
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config.logging);
    config.validate().context("validating configuration")?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::Projects { json } => list_projects(&config, json).await,
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

fn build_store(config: &AppConfig) -> anyhow::Result<Option<Arc<dyn TaskStore>>> {
    let Some(token) = config.store.api_token() else {
        return Ok(None);
    };
    let store = TodoistStore::new(
        TodoistConfig::new(token)
            .with_base_url(config.store.base_url.as_str())
            .with_timeout(config.store.timeout()),
    )?;
    Ok(Some(Arc::new(store)))
}

fn build_oracle(config: &AppConfig) -> anyhow::Result<Arc<dyn Oracle>> {
    let Some(api_key) = config.oracle.api_key() else {
        bail!("TASKTALK__ORACLE__API_KEY is required to run the assistant");
    };
    let models = config.oracle.model_list();
    let mut client_config = OpenRouterConfig::new(api_key)
        .with_base_url(config.oracle.base_url.as_str())
        .with_timeout(config.oracle.timeout())
        .with_app(
            config.oracle.app_url.clone().unwrap_or_default(),
            config.oracle.app_title.clone().unwrap_or_default(),
        );
    if let Some(model) = models.first() {
        client_config = client_config.with_model(model.as_str());
    }
    let client = OpenRouterClient::new(client_config)?;

    let assistant = &config.assistant;
    let profile = PromptProfile {
        agent_role: assistant.agent_role.clone(),
        user_name: assistant.user_name.clone(),
        user_role: assistant.user_role.clone(),
        timezone: Some(assistant.timezone.clone()),
        user_profile: assistant.user_profile.clone(),
    };
    let oracle = LlmOracle::new(Arc::new(client), models)
        .with_validator(config.oracle.active_validator())
        .with_profile(profile);
    Ok(Arc::new(oracle))
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let oracle = build_oracle(&config)?;
    let store = build_store(&config)?;
    let settings = &config.assistant;
    let projects = settings.project_directory();
    let normalizer = DateTimeNormalizer::from_name(&settings.timezone);
    let chat = Arc::new(ConsoleChat::new());

    let sessions = Arc::new(SessionManager::new(chat.clone(), settings.session_timeout()));
    let mut orchestrator =
        ExtractionOrchestrator::new(oracle.clone(), projects.clone(), settings.timezone.as_str());
    let mut renderer = PreviewRenderer::new(normalizer, projects.clone());
    let mut applier = None;

    if let Some(store) = &store {
        let resolver = Arc::new(
            EntityResolver::new(store.clone(), projects.clone(), normalizer)
                .with_cache_ttl(settings.cache_ttl())
                .with_min_score(f64::from(settings.min_fuzzy_score)),
        );
        orchestrator = orchestrator.with_store(store.clone());
        renderer = renderer.with_resolver(resolver.clone());
        applier = Some(
            ApplyEngine::new(store.clone(), resolver, oracle.clone())
                .with_max_matches(settings.max_auto_apply_matches),
        );
    } else {
        warn!("No store token configured; confirmed results are printed as JSON");
    }

    let mut assistant = Assistant::new(sessions, orchestrator, renderer, oracle, chat)
        .with_allowed_user(settings.allowed_user());
    if let Some(applier) = applier {
        assistant = assistant.with_applier(applier);
    }
    if let Some(transcriber) = config
        .transcriber
        .command_line()
        .and_then(CommandTranscriber::parse)
    {
        assistant = assistant.with_transcriber(Arc::new(transcriber));
    }

    let sender = Sender {
        id: settings.allowed_user().unwrap_or(UserId::new(0)),
        name: std::env::var("USER").unwrap_or_else(|_| "console".to_string()),
    };
    info!(
        timezone = %settings.timezone,
        projects = projects.names().count(),
        "Assistant ready; type a message, /voice <path> or /cb <data>"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(kind) = parse_console_line(&line) else {
            continue;
        };
        let event = InboundEvent {
            chat: ChatId::new(CONSOLE_CHAT),
            sender: sender.clone(),
            kind,
        };
        if let Err(e) = assistant.handle(event).await {
            warn!(error = %e, "Failed to handle event");
        }
    }
    Ok(())
}

async fn list_projects(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let Some(store) = build_store(config)? else {
        bail!("TASKTALK__STORE__API_TOKEN is required to list projects");
    };
    let projects = store.list_projects().await?;
    if json {
        let pairs: Vec<_> = projects
            .iter()
            .map(|p| serde_json::json!({ "name": p.name, "id": p.id }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&pairs)?);
    } else {
        for project in &projects {
            println!("{}: {}", project.name, project.id);
        }
    }
    Ok(())
}

/// `/voice <path>` and `/cb <data>` are commands; anything else is text.
fn parse_console_line(line: &str) -> Option<EventKind> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if let Some(path) = line.strip_prefix("/voice ") {
        return Some(EventKind::Voice(PathBuf::from(path.trim())));
    }
    if let Some(data) = line.strip_prefix("/cb ") {
        return Some(EventKind::Callback(data.trim().to_string()));
    }
    Some(EventKind::Text(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_commands_map_to_events() {
        assert_eq!(
            parse_console_line("/voice /tmp/a.ogg"),
            Some(EventKind::Voice(PathBuf::from("/tmp/a.ogg")))
        );
        assert_eq!(
            parse_console_line("/cb confirm"),
            Some(EventKind::Callback("confirm".into()))
        );
        assert_eq!(
            parse_console_line("  buy milk "),
            Some(EventKind::Text("buy milk".into()))
        );
        assert_eq!(parse_console_line("   "), None);
    }

    #[test]
    fn cli_defaults_to_run() {
        let cli = Cli::parse_from(["tasktalk"]);
        assert!(cli.command.is_none());

        let cli = Cli::parse_from(["tasktalk", "projects", "--json"]);
        assert!(matches!(cli.command, Some(Command::Projects { json: true })));
    }
}
