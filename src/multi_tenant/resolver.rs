//! Tenant enumeration.
//!
//! Blueprint work triggered by the filesystem watcher is replicated into every
//! active tenant. The `TenantResolver` trait is how the engine finds them.

use super::tenant::TenantContext;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Trait for enumerating and validating tenants.
///
/// # Example Implementation
///
/// ```rust,no_run
/// use idp_engine::multi_tenant::{TenantContext, TenantResolver};
///
/// struct SingleTenant;
///
/// impl TenantResolver for SingleTenant {
///     type Error = std::convert::Infallible;
///
///     async fn list_tenants(&self) -> Result<Vec<TenantContext>, Self::Error> {
///         Ok(vec![TenantContext::default_tenant()])
///     }
/// }
/// ```
pub trait TenantResolver: Send + Sync {
    /// Error type for resolver operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// List every known tenant, ready or not.
    fn list_tenants(&self) -> impl Future<Output = Result<Vec<TenantContext>, Self::Error>> + Send;

    /// List tenants that are ready to receive work.
    fn active_tenants(
        &self,
    ) -> impl Future<Output = Result<Vec<TenantContext>, Self::Error>> + Send {
        async move {
            Ok(self
                .list_tenants()
                .await?
                .into_iter()
                .filter(|tenant| tenant.ready)
                .collect())
        }
    }

    /// Validate that a tenant exists and is ready.
    fn validate_tenant(
        &self,
        tenant_id: &str,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send {
        async move {
            Ok(self
                .active_tenants()
                .await?
                .iter()
                .any(|tenant| tenant.tenant_id == tenant_id))
        }
    }
}

/// Static in-memory tenant resolver for tests and single-process deployments.
#[derive(Debug, Clone, Default)]
pub struct StaticTenantResolver {
    tenants: Arc<RwLock<BTreeMap<String, TenantContext>>>,
}

impl StaticTenantResolver {
    /// Create a new empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver holding only the ready default tenant.
    pub async fn single_tenant() -> Self {
        let resolver = Self::new();
        resolver.add_tenant(TenantContext::default_tenant()).await;
        resolver
    }

    /// Add or replace a tenant.
    pub async fn add_tenant(&self, tenant: TenantContext) {
        let mut tenants = self.tenants.write().await;
        tenants.insert(tenant.tenant_id.clone(), tenant);
    }

    /// Mark a tenant as ready. Returns `false` if it is unknown.
    pub async fn mark_ready(&self, tenant_id: &str) -> bool {
        let mut tenants = self.tenants.write().await;
        match tenants.get_mut(tenant_id) {
            Some(tenant) => {
                tenant.ready = true;
                true
            }
            None => false,
        }
    }

    /// Remove a tenant.
    pub async fn remove_tenant(&self, tenant_id: &str) -> Option<TenantContext> {
        self.tenants.write().await.remove(tenant_id)
    }

    /// Get the number of configured tenants.
    pub async fn tenant_count(&self) -> usize {
        self.tenants.read().await.len()
    }
}

impl TenantResolver for StaticTenantResolver {
    type Error = std::convert::Infallible;

    async fn list_tenants(&self) -> Result<Vec<TenantContext>, Self::Error> {
        let tenants = self.tenants.read().await;
        Ok(tenants.values().cloned().collect())
    }
}
