//! Worker integration tests.
//!
//! Discovery scheduled through a [`ChannelDispatcher`] must lead to applied
//! instances without any further calls.

use crate::common::fixtures::{ANONYMOUS_BLUEPRINT, GROUP_BLUEPRINT};
use crate::common::{TestRoot, eventually};
use idp_engine::blueprints::{
    BlueprintEngine, BlueprintInstanceStatus, BlueprintTask, BlueprintWorker, ChannelDispatcher,
    TaskDispatcher,
};
use idp_engine::storage::InMemoryStorage;
use std::sync::Arc;
use tokio::sync::oneshot;

const TENANT: &str = "default";

#[tokio::test]
async fn test_worker_runs_discovery_then_applies() {
    let root = TestRoot::new();
    root.write("system/admin.yaml", GROUP_BLUEPRINT);
    root.write("flows/authentication.yaml", ANONYMOUS_BLUEPRINT);

    let (dispatcher, receiver) = ChannelDispatcher::new();
    let dispatcher = Arc::new(dispatcher);
    let engine = Arc::new(BlueprintEngine::new(
        root.config(),
        InMemoryStorage::new(),
        dispatcher.clone(),
    ));
    let (stop, stopped) = oneshot::channel::<()>();
    let worker = tokio::spawn(BlueprintWorker::new(Arc::clone(&engine), receiver).run_until(
        async move {
            let _ = stopped.await;
        },
    ));

    dispatcher.schedule(BlueprintTask::Discovery {
        tenant: TENANT.to_string(),
        path: None,
    });

    let applied = eventually(|| {
        let engine = Arc::clone(&engine);
        async move {
            let instances = engine.store().list(TENANT).await.unwrap_or_default();
            instances.len() == 2
                && instances
                    .iter()
                    .all(|i| i.status == BlueprintInstanceStatus::Successful)
        }
    })
    .await;
    assert!(applied, "instances were not applied by the worker");

    stop.send(()).unwrap();
    worker.await.unwrap();
}

#[tokio::test]
async fn test_worker_stops_when_channel_closes() {
    let root = TestRoot::new();
    let (dispatcher, receiver) = ChannelDispatcher::new();
    let engine = Arc::new(BlueprintEngine::new(
        root.config(),
        InMemoryStorage::new(),
        crate::common::RecordingDispatcher::new(),
    ));
    let worker = tokio::spawn(BlueprintWorker::new(engine, receiver).run());

    drop(dispatcher);
    tokio::time::timeout(std::time::Duration::from_secs(5), worker)
        .await
        .expect("worker did not stop")
        .unwrap();
}
