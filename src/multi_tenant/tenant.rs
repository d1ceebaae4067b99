//! Tenant context types.

use serde::{Deserialize, Serialize};

/// The tenant used when a deployment runs without tenancy.
pub const DEFAULT_TENANT: &str = "default";

/// One tenant (schema/namespace) of the identity provider.
///
/// Only `ready` tenants take part in watcher-triggered blueprint work; a
/// tenant that is still being provisioned has no tables to apply into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    pub tenant_id: String,
    pub ready: bool,
}

impl TenantContext {
    /// Create a ready tenant context.
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            ready: true,
        }
    }

    /// Create a tenant context that is not yet ready.
    pub fn provisioning(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            ready: false,
        }
    }

    /// The single-tenant default context.
    pub fn default_tenant() -> Self {
        Self::new(DEFAULT_TENANT)
    }
}
