//! Cleanup and remote retrieval integration tests.

use crate::common::fixtures::GROUP_BLUEPRINT;
use crate::common::{RecordingDispatcher, TestRoot, engine};
use async_trait::async_trait;
use idp_engine::blueprints::{
    BlueprintInstance, BlueprintInstanceStatus, RemoteFetcher, RetrievalError, SourceRetriever,
    TaskStatus,
};
use std::sync::Arc;

const TENANT: &str = "default";

/// Serves one blueprint for every reference and fails for anything else.
struct StaticRegistry {
    reference: &'static str,
}

#[async_trait]
impl RemoteFetcher for StaticRegistry {
    async fn fetch(&self, reference: &str) -> Result<String, RetrievalError> {
        if reference == self.reference {
            Ok(GROUP_BLUEPRINT.to_string())
        } else {
            Err(RetrievalError::Unavailable {
                reference: reference.to_string(),
                message: "registry timeout".to_string(),
            })
        }
    }
}

#[tokio::test]
async fn test_clear_failed_removes_only_missing_local_instances() {
    let root = TestRoot::new();
    root.write("system/admin.yaml", GROUP_BLUEPRINT);
    let engine = engine(&root, RecordingDispatcher::new());

    let present = BlueprintInstance::new("Present", "system/admin.yaml");
    let missing = BlueprintInstance::new("Missing", "system/removed.yaml");
    let remote = BlueprintInstance::new("Remote", "oci://registry.example.com/blueprints:latest");
    let inline = BlueprintInstance::with_content("Inline", GROUP_BLUEPRINT);
    for instance in [&present, &missing, &remote, &inline] {
        engine.store().save(TENANT, instance).await.unwrap();
    }

    let result = engine.clear_failed(TENANT).await;

    assert_eq!(result.status, TaskStatus::Successful);
    assert_eq!(result.messages, vec!["Removed 1 blueprint instances."]);

    let mut names: Vec<_> = engine
        .store()
        .list(TENANT)
        .await
        .unwrap()
        .into_iter()
        .map(|instance| instance.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["Inline", "Present", "Remote"]);
}

#[tokio::test]
async fn test_clear_failed_removes_deleted_blueprint() {
    let root = TestRoot::new();
    root.write("system/admin.yaml", GROUP_BLUEPRINT);
    let dispatcher = RecordingDispatcher::new();
    let engine = engine(&root, dispatcher.clone());
    engine.discover(TENANT, None).await;
    assert_eq!(engine.store().list(TENANT).await.unwrap().len(), 1);

    root.remove("system/admin.yaml");
    engine.clear_failed(TENANT).await;

    assert!(engine.store().list(TENANT).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_paths_outside_root_are_removed() {
    let root = TestRoot::new();
    let outside = TestRoot::new();
    outside.write("secret.yaml", GROUP_BLUEPRINT);
    let escaping = format!(
        "../{}/secret.yaml",
        outside.path().file_name().unwrap().to_string_lossy()
    );
    let engine = engine(&root, RecordingDispatcher::new());
    let instance = BlueprintInstance::new("Escaping", escaping);
    engine.store().save(TENANT, &instance).await.unwrap();

    let result = engine.apply(TENANT, instance.instance_uuid).await;
    assert_eq!(result.status, TaskStatus::Error);
    assert!(result.messages[0].contains("outside the blueprint root"));

    engine.clear_failed(TENANT).await;
    assert!(engine.store().list(TENANT).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_remote_blueprints_apply_through_fetcher() {
    let root = TestRoot::new();
    let config = root.config();
    let retriever = SourceRetriever::from_config(&config).with_remote(Arc::new(StaticRegistry {
        reference: "oci://registry.example.com/admin:1",
    }));
    let engine = engine(&root, RecordingDispatcher::new()).with_retriever(Arc::new(retriever));

    let reachable = BlueprintInstance::new("Reachable", "oci://registry.example.com/admin:1");
    let flaky = BlueprintInstance::new("Flaky", "oci://registry.example.com/other:1");
    engine.store().save(TENANT, &reachable).await.unwrap();
    engine.store().save(TENANT, &flaky).await.unwrap();

    assert_eq!(
        engine.apply(TENANT, reachable.instance_uuid).await.status,
        TaskStatus::Successful
    );
    assert_eq!(engine.apply(TENANT, flaky.instance_uuid).await.status, TaskStatus::Error);

    let stored = engine.store().get(TENANT, flaky.instance_uuid).await.unwrap().unwrap();
    assert_eq!(stored.status, BlueprintInstanceStatus::Error);

    // Remote instances survive cleanup even when the registry is down.
    engine.clear_failed(TENANT).await;
    assert_eq!(engine.store().list(TENANT).await.unwrap().len(), 2);
}
