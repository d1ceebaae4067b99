//! Apply integration tests.

use crate::common::fixtures::{GROUP_BLUEPRINT, UNKNOWN_MODEL_BLUEPRINT};
use crate::common::{FlakyStorage, RecordingDispatcher, TestRoot, engine};
use idp_engine::blueprints::hashing::digest;
use idp_engine::blueprints::{
    BlueprintEngine, BlueprintInstance, BlueprintInstanceStatus, TaskStatus,
};
use idp_engine::storage::{StorageKey, StorageProvider};
use futures::future::join_all;
use serde_json::{Map, json};
use std::sync::Arc;
use uuid::Uuid;

const TENANT: &str = "default";

async fn groups<S: StorageProvider>(storage: &S) -> Vec<serde_json::Value> {
    storage
        .list(StorageKey::prefix(TENANT, "idp_core.group"), 0, 100)
        .await
        .unwrap()
        .into_iter()
        .map(|(_, value)| value)
        .collect()
}

#[tokio::test]
async fn test_apply_records_success_on_instance() {
    let root = TestRoot::new();
    root.write("system/admin.yaml", GROUP_BLUEPRINT);
    let engine = engine(&root, RecordingDispatcher::new());
    let instance = BlueprintInstance::new("Admin", "system/admin.yaml");
    engine.store().save(TENANT, &instance).await.unwrap();

    let result = engine.apply(TENANT, instance.instance_uuid).await;

    assert_eq!(result.status, TaskStatus::Successful);
    assert_eq!(result.uid.as_deref(), Some("admin"));

    let stored = engine.store().get(TENANT, instance.instance_uuid).await.unwrap().unwrap();
    assert_eq!(stored.status, BlueprintInstanceStatus::Successful);
    assert_eq!(stored.last_applied_hash, digest(GROUP_BLUEPRINT.as_bytes()));
    assert!(stored.last_applied.is_some());
    assert_eq!(stored.managed_models, vec!["idp_core.group"]);
    assert_eq!(stored.metadata["name"], "Default - Admin group");

    assert_eq!(
        groups(engine.store().storage()).await,
        vec![json!({"name": "admins", "superuser": true})]
    );
    // Successful applies are not kept in the result log.
    assert!(engine.results().results().await.is_empty());
}

#[tokio::test]
async fn test_apply_twice_is_idempotent() {
    let root = TestRoot::new();
    root.write("system/admin.yaml", GROUP_BLUEPRINT);
    let engine = engine(&root, RecordingDispatcher::new());
    let instance = BlueprintInstance::new("Admin", "system/admin.yaml");
    engine.store().save(TENANT, &instance).await.unwrap();

    engine.apply(TENANT, instance.instance_uuid).await;
    let first = engine.store().get(TENANT, instance.instance_uuid).await.unwrap().unwrap();
    let result = engine.apply(TENANT, instance.instance_uuid).await;
    let second = engine.store().get(TENANT, instance.instance_uuid).await.unwrap().unwrap();

    assert_eq!(result.status, TaskStatus::Successful);
    assert_eq!(second.status, BlueprintInstanceStatus::Successful);
    assert_eq!(first.last_applied_hash, second.last_applied_hash);
    assert_eq!(groups(engine.store().storage()).await.len(), 1);
}

#[tokio::test]
async fn test_apply_missing_or_disabled_instance_is_noop() {
    let root = TestRoot::new();
    root.write("system/admin.yaml", GROUP_BLUEPRINT);
    let engine = engine(&root, RecordingDispatcher::new());

    let result = engine.apply(TENANT, Uuid::new_v4()).await;
    assert_eq!(result.status, TaskStatus::Successful);
    assert!(engine.store().list(TENANT).await.unwrap().is_empty());

    let disabled = BlueprintInstance::new("Admin", "system/admin.yaml").disabled();
    engine.store().save(TENANT, &disabled).await.unwrap();
    let result = engine.apply(TENANT, disabled.instance_uuid).await;
    assert_eq!(result.status, TaskStatus::Successful);
    assert!(engine.results().results().await.is_empty());

    let stored = engine.store().get(TENANT, disabled.instance_uuid).await.unwrap().unwrap();
    assert_eq!(stored, disabled);
    assert!(groups(engine.store().storage()).await.is_empty());
}

#[tokio::test]
async fn test_invalid_blueprint_sets_error_and_keeps_logs() {
    let root = TestRoot::new();
    root.write("broken.yaml", UNKNOWN_MODEL_BLUEPRINT);
    let engine = engine(&root, RecordingDispatcher::new());
    let instance = BlueprintInstance::new("Broken widget", "broken.yaml");
    engine.store().save(TENANT, &instance).await.unwrap();

    let result = engine.apply(TENANT, instance.instance_uuid).await;

    assert_eq!(result.status, TaskStatus::Error);
    assert!(result.messages.iter().any(|m| m.contains("unknown model")));

    let stored = engine.store().get(TENANT, instance.instance_uuid).await.unwrap().unwrap();
    assert_eq!(stored.status, BlueprintInstanceStatus::Error);
    assert!(stored.last_applied_hash.is_empty());

    let logged = engine
        .results()
        .latest("apply_blueprint", Some("broken-widget"))
        .await
        .unwrap();
    assert_eq!(logged, result);
}

#[tokio::test]
async fn test_missing_file_sets_error() {
    let root = TestRoot::new();
    let engine = engine(&root, RecordingDispatcher::new());
    let instance = BlueprintInstance::new("Gone", "gone.yaml");
    engine.store().save(TENANT, &instance).await.unwrap();

    let result = engine.apply(TENANT, instance.instance_uuid).await;

    assert_eq!(result.status, TaskStatus::Error);
    assert!(result.messages[0].contains("gone.yaml"));
    let stored = engine.store().get(TENANT, instance.instance_uuid).await.unwrap().unwrap();
    assert_eq!(stored.status, BlueprintInstanceStatus::Error);
}

#[tokio::test]
async fn test_unparseable_content_sets_error() {
    let root = TestRoot::new();
    let engine = engine(&root, RecordingDispatcher::new());
    let instance = BlueprintInstance::with_content("Inline", "version: 1\nentries: [");
    engine.store().save(TENANT, &instance).await.unwrap();

    let result = engine.apply(TENANT, instance.instance_uuid).await;

    assert_eq!(result.status, TaskStatus::Error);
    assert!(result.messages[0].starts_with("Failed to parse blueprint"));
}

#[tokio::test]
async fn test_instance_context_overrides_blueprint_context() {
    let root = TestRoot::new();
    root.write("system/admin.yaml", GROUP_BLUEPRINT);
    let engine = engine(&root, RecordingDispatcher::new());
    let mut context = Map::new();
    context.insert("group_name".to_string(), json!("operators"));
    let instance = BlueprintInstance::new("Admin", "system/admin.yaml").with_context(context);
    engine.store().save(TENANT, &instance).await.unwrap();

    engine.apply(TENANT, instance.instance_uuid).await;

    assert_eq!(
        groups(engine.store().storage()).await,
        vec![json!({"name": "operators", "superuser": true})]
    );
}

#[tokio::test]
async fn test_storage_failure_is_reported() {
    let root = TestRoot::new();
    root.write("system/admin.yaml", GROUP_BLUEPRINT);
    let storage = FlakyStorage::new();
    let engine = BlueprintEngine::new(root.config(), storage.clone(), RecordingDispatcher::new());
    let instance = BlueprintInstance::new("Admin", "system/admin.yaml");
    engine.store().save(TENANT, &instance).await.unwrap();

    storage.fail_writes(true);
    let result = engine.apply(TENANT, instance.instance_uuid).await;
    storage.fail_writes(false);

    assert_eq!(result.status, TaskStatus::Error);
    let stored = engine.store().get(TENANT, instance.instance_uuid).await.unwrap().unwrap();
    assert_eq!(stored.status, BlueprintInstanceStatus::Unknown);
    assert!(groups(&storage).await.is_empty());
}

#[tokio::test]
async fn test_concurrent_duplicate_applies_settle() {
    let root = TestRoot::new();
    root.write("system/admin.yaml", GROUP_BLUEPRINT);
    let engine = Arc::new(engine(&root, RecordingDispatcher::new()));
    let instance = BlueprintInstance::new("Admin", "system/admin.yaml");
    engine.store().save(TENANT, &instance).await.unwrap();

    let handles = (0..4).map(|_| {
        let engine = Arc::clone(&engine);
        let id = instance.instance_uuid;
        tokio::spawn(async move { engine.apply(TENANT, id).await })
    });
    for result in join_all(handles).await {
        let result = result.unwrap();
        assert!(matches!(result.status, TaskStatus::Successful | TaskStatus::Error));
    }

    let stored = engine.store().get(TENANT, instance.instance_uuid).await.unwrap().unwrap();
    assert!(matches!(
        stored.status,
        BlueprintInstanceStatus::Successful | BlueprintInstanceStatus::Error
    ));
    assert_eq!(groups(engine.store().storage()).await.len(), 1);
}
