//! # Blueprint Engine Example
//!
//! Runs the engine the way a single-process deployment would: a worker fed
//! by a channel dispatcher, a filesystem watcher fanning changes out to
//! tenants, and an initial discovery pass. The engine only logs through the
//! `log` facade, so any backend works; this example uses env_logger.
//!
//! ```bash
//! IDP_BLUEPRINTS_DIR=./blueprints cargo run --example engine_demo
//! ```
//!
//! Without `IDP_BLUEPRINTS_DIR` a temporary root with one blueprint is used.

use idp_engine::multi_tenant::{StaticTenantResolver, TenantContext};
use idp_engine::storage::InMemoryStorage;
use idp_engine::{BlueprintEngine, BlueprintWatcher, BlueprintWorker, ChannelDispatcher, EngineConfig};
use std::sync::Arc;
use std::time::Duration;

const BOOTSTRAP: &str = "\
version: 1
metadata:
  name: Example - Bootstrap
entries:
  - model: idp_core.group
    identifiers:
      name: admins
    attrs:
      superuser: true
  - model: idp_core.user
    identifiers:
      username: akadmin
    attrs:
      email: admin@example.com
";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .format_timestamp_secs()
        .init();

    let scratch = tempfile::TempDir::new()?;
    let config = match std::env::var_os(idp_engine::config::ENV_BLUEPRINTS_DIR) {
        Some(_) => EngineConfig::from_env()?,
        None => {
            std::fs::write(scratch.path().join("bootstrap.yaml"), BOOTSTRAP)?;
            EngineConfig::builder().blueprints_dir(scratch.path()).build()?
        }
    };
    log::info!("Using blueprint root {}", config.blueprints_dir.display());

    let tenants = Arc::new(StaticTenantResolver::new());
    tenants.add_tenant(TenantContext::default_tenant()).await;
    tenants.add_tenant(TenantContext::new("acme")).await;

    let (dispatcher, receiver) = ChannelDispatcher::new();
    let engine = Arc::new(BlueprintEngine::new(
        config,
        InMemoryStorage::new(),
        Arc::new(dispatcher),
    ));
    tokio::spawn(BlueprintWorker::new(Arc::clone(&engine), receiver).run());

    let watcher = BlueprintWatcher::new();
    if engine.config().watch {
        watcher.start(
            Arc::clone(&engine),
            Arc::clone(&tenants),
            tokio::runtime::Handle::current(),
        )?;
    }

    engine.schedule_discovery(tenants.as_ref()).await?;
    engine.schedule_clear_failed(tenants.as_ref()).await?;
    tokio::time::sleep(Duration::from_secs(2)).await;

    for tenant in ["default", "acme"] {
        for instance in engine.store().list(tenant).await? {
            log::info!(
                "[{}] {} ({}) -> {:?}, models {:?}",
                tenant,
                instance.name,
                instance.path,
                instance.status,
                instance.managed_models
            );
        }
    }
    for result in engine.results().results().await {
        log::warn!("{} {:?}: {:?}", result.name, result.status, result.messages);
    }

    Ok(())
}
