//! Apply-time guards: the mass-update cap and partial create failures.

use std::sync::Arc;

use tasktalk::adapters::{InMemoryTaskStore, MockOracle, StoreCall};
use tasktalk::application::{ApplyEngine, EntityResolver};
use tasktalk::domain::datetime::DateTimeNormalizer;
use tasktalk::domain::extraction::{ExtractionResult, NewTask, Priority, TaskChanges, TaskUpdate};
use tasktalk::domain::foundation::TaskId;
use tasktalk::domain::projects::ProjectDirectory;
use tasktalk::domain::resolver::TaskRecord;
use tasktalk::ports::TaskStore;

fn engine(store: &InMemoryTaskStore) -> (ApplyEngine, Arc<EntityResolver>) {
    let port: Arc<dyn TaskStore> = Arc::new(store.clone());
    let resolver = Arc::new(EntityResolver::new(
        port.clone(),
        ProjectDirectory::default(),
        DateTimeNormalizer::from_name("UTC"),
    ));
    let engine = ApplyEngine::new(port, resolver.clone(), Arc::new(MockOracle::new()))
        .with_max_matches(10);
    (engine, resolver)
}

#[tokio::test]
async fn update_matching_more_than_the_cap_is_refused() {
    let mut store = InMemoryTaskStore::new();
    for n in 1..=11 {
        store = store.with_task(TaskRecord::new(
            TaskId::new(n.to_string()).unwrap(),
            format!("Invoice {n}"),
        ));
    }
    let (engine, _) = engine(&store);
    let result = ExtractionResult {
        tasks_updates: vec![TaskUpdate {
            target: "invoice".into(),
            changes: TaskChanges {
                priority: Some(Priority::Urgent),
                ..Default::default()
            },
            ..Default::default()
        }],
        ..Default::default()
    };

    let report = engine.apply(&result, "make all invoices urgent").await;

    assert_eq!(
        report.updated,
        vec!["⚠️ Too many matches (11) for: invoice. Narrow your request."]
    );
    assert!(!store
        .calls()
        .iter()
        .any(|c| matches!(c, StoreCall::Update(..) | StoreCall::Close(_))));
}

#[tokio::test]
async fn update_at_the_cap_is_applied_to_every_match() {
    let mut store = InMemoryTaskStore::new();
    for n in 1..=10 {
        store = store.with_task(TaskRecord::new(
            TaskId::new(n.to_string()).unwrap(),
            format!("Invoice {n}"),
        ));
    }
    let (engine, _) = engine(&store);
    let result = ExtractionResult {
        tasks_updates: vec![TaskUpdate {
            target: "invoice".into(),
            changes: TaskChanges {
                priority: Some(Priority::Low),
                ..Default::default()
            },
            ..Default::default()
        }],
        ..Default::default()
    };

    let report = engine.apply(&result, "lower all invoices").await;

    assert_eq!(report.updated.len(), 10);
    assert!(store.active_tasks().iter().all(|t| t.priority == Some(1)));
}

#[tokio::test]
async fn failed_create_does_not_stop_the_next_one() {
    let store = InMemoryTaskStore::new().failing_create("Book flights");
    let (engine, resolver) = engine(&store);
    let result = ExtractionResult {
        tasks_new: vec![NewTask::titled("Book flights"), NewTask::titled("Book hotel")],
        ..Default::default()
    };

    let report = engine.apply(&result, "book flights and hotel").await;

    assert_eq!(report.created.len(), 2);
    assert!(report.created[0].starts_with("❌ Failed to create: Book flights:"));
    assert!(report.created[1].starts_with("✅ Created: Book hotel (1000)"));
    assert_eq!(
        resolver.last_created().await.map(|id| id.to_string()),
        Some("1000".to_string())
    );
}
