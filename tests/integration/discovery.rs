//! Discovery integration tests.
//!
//! Discovery must create one instance per instantiable blueprint and
//! schedule an apply only when the file content changed since the last
//! successful apply.

use crate::common::fixtures::{
    ANONYMOUS_BLUEPRINT, GROUP_BLUEPRINT, MANUAL_BLUEPRINT, VERSION_TWO_BLUEPRINT,
};
use crate::common::{RecordingDispatcher, TestRoot, engine};
use idp_engine::blueprints::hashing::digest;
use idp_engine::blueprints::{BlueprintInstance, BlueprintInstanceStatus, TaskStatus};

const TENANT: &str = "default";

#[tokio::test]
async fn test_discovery_creates_instances_and_schedules_applies() {
    let root = TestRoot::new();
    root.write("system/admin.yaml", GROUP_BLUEPRINT);
    root.write("flows/authentication.yaml", ANONYMOUS_BLUEPRINT);
    let dispatcher = RecordingDispatcher::new();
    let engine = engine(&root, dispatcher.clone());

    let result = engine.discover(TENANT, None).await;

    assert_eq!(result.status, TaskStatus::Successful);
    assert_eq!(result.messages, vec!["Successfully imported 2 files."]);

    let mut instances = engine.store().list(TENANT).await.unwrap();
    instances.sort_by(|a, b| a.path.cmp(&b.path));
    assert_eq!(instances.len(), 2);
    assert_eq!(instances[0].path, "flows/authentication.yaml");
    assert_eq!(instances[0].name, "flows/authentication.yaml");
    assert_eq!(instances[1].path, "system/admin.yaml");
    assert_eq!(instances[1].name, "Default - Admin group");
    assert!(instances.iter().all(|i| i.status == BlueprintInstanceStatus::Unknown));

    let mut scheduled = dispatcher.applies();
    scheduled.sort();
    let mut expected: Vec<_> = instances.iter().map(|i| i.instance_uuid).collect();
    expected.sort();
    assert_eq!(scheduled, expected);
}

#[tokio::test]
async fn test_rediscovery_after_apply_schedules_nothing() {
    let root = TestRoot::new();
    root.write("system/admin.yaml", GROUP_BLUEPRINT);
    let dispatcher = RecordingDispatcher::new();
    let engine = engine(&root, dispatcher.clone());

    engine.discover(TENANT, None).await;
    for instance_id in dispatcher.applies() {
        engine.apply(TENANT, instance_id).await;
    }
    dispatcher.clear();

    let result = engine.discover(TENANT, None).await;
    assert_eq!(result.status, TaskStatus::Successful);
    assert!(dispatcher.applies().is_empty());
    assert_eq!(engine.store().list(TENANT).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_changed_hash_schedules_exactly_one_apply() {
    let root = TestRoot::new();
    root.write("system/admin.yaml", GROUP_BLUEPRINT);
    let dispatcher = RecordingDispatcher::new();
    let engine = engine(&root, dispatcher.clone());

    let mut existing = BlueprintInstance::new("Admin group", "system/admin.yaml");
    existing.last_applied_hash = digest(b"an older revision");
    existing.status = BlueprintInstanceStatus::Successful;
    engine.store().save(TENANT, &existing).await.unwrap();

    engine.discover(TENANT, None).await;

    assert_eq!(dispatcher.applies(), vec![existing.instance_uuid]);
    let instances = engine.store().list(TENANT).await.unwrap();
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].name, "Admin group");
}

#[tokio::test]
async fn test_instantiate_false_never_creates_instance() {
    let root = TestRoot::new();
    root.write("examples/manual.yaml", MANUAL_BLUEPRINT);
    let dispatcher = RecordingDispatcher::new();
    let engine = engine(&root, dispatcher.clone());

    let found = engine.scanner().find().unwrap();
    assert_eq!(found.len(), 1);
    assert!(found[0].meta.as_ref().unwrap().instantiate_disabled());

    let result = engine.discover(TENANT, None).await;
    assert_eq!(result.status, TaskStatus::Successful);
    assert!(engine.store().list(TENANT).await.unwrap().is_empty());
    assert!(dispatcher.tasks().is_empty());
}

#[tokio::test]
async fn test_other_versions_are_excluded() {
    let root = TestRoot::new();
    root.write("future.yaml", VERSION_TWO_BLUEPRINT);
    root.write("current.yaml", GROUP_BLUEPRINT);
    let dispatcher = RecordingDispatcher::new();
    let engine = engine(&root, dispatcher.clone());

    let paths: Vec<_> = engine
        .scanner()
        .find()
        .unwrap()
        .into_iter()
        .map(|file| file.path)
        .collect();
    assert_eq!(paths, vec!["current.yaml"]);

    let result = engine.discover(TENANT, None).await;
    assert_eq!(result.messages, vec!["Successfully imported 1 files."]);
    assert!(engine.store().find_by_path(TENANT, "future.yaml").await.unwrap().is_none());
}

#[tokio::test]
async fn test_discovery_restricted_to_path() {
    let root = TestRoot::new();
    root.write("a.yaml", GROUP_BLUEPRINT);
    root.write("b.yaml", ANONYMOUS_BLUEPRINT);
    let dispatcher = RecordingDispatcher::new();
    let engine = engine(&root, dispatcher.clone());

    let result = engine.discover(TENANT, Some("b.yaml")).await;

    assert_eq!(result.messages, vec!["Successfully imported 1 files."]);
    let instances = engine.store().list(TENANT).await.unwrap();
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].path, "b.yaml");
    assert_eq!(dispatcher.applies().len(), 1);
}

#[tokio::test]
async fn test_rescanning_unchanged_files_gives_identical_digests() {
    let root = TestRoot::new();
    root.write("system/admin.yaml", GROUP_BLUEPRINT);
    root.write("flows/authentication.yaml", ANONYMOUS_BLUEPRINT);
    let engine = engine(&root, RecordingDispatcher::new());

    let first = engine.scanner().find().unwrap();
    let second = engine.scanner().find().unwrap();

    assert_eq!(first, second);
    assert_eq!(first[0].hash, digest(ANONYMOUS_BLUEPRINT.as_bytes()));
}

#[tokio::test]
async fn test_malformed_metadata_fails_discovery() {
    let root = TestRoot::new();
    root.write("broken.yaml", "version: 1\nmetadata:\n  labels: [not, a, map]\nentries: []\n");
    let engine = engine(&root, RecordingDispatcher::new());

    let result = engine.discover(TENANT, None).await;

    assert_eq!(result.status, TaskStatus::Error);
    assert!(engine.results().latest("blueprints_discovery", None).await.is_some());
}

#[tokio::test]
async fn test_tenants_are_isolated() {
    let root = TestRoot::new();
    root.write("system/admin.yaml", GROUP_BLUEPRINT);
    let dispatcher = RecordingDispatcher::new();
    let engine = engine(&root, dispatcher.clone());

    engine.discover("tenant-a", None).await;
    engine.discover("tenant-b", None).await;

    let a = engine.store().list("tenant-a").await.unwrap();
    let b = engine.store().list("tenant-b").await.unwrap();
    assert_eq!(a.len(), 1);
    assert_eq!(b.len(), 1);
    assert_ne!(a[0].instance_uuid, b[0].instance_uuid);

    let tenants: Vec<_> = dispatcher.tasks().iter().map(|t| t.tenant().to_string()).collect();
    assert_eq!(tenants, vec!["tenant-a", "tenant-b"]);
}
