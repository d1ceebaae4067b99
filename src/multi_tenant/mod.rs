//! Multi-tenant support.
//!
//! Every blueprint task runs inside exactly one tenant; the tenant id is the
//! first segment of every [`StorageKey`](crate::storage::StorageKey) the task
//! touches. Watcher-triggered work fans out to all active tenants through a
//! [`TenantResolver`].

pub mod resolver;
pub mod tenant;

pub use resolver::{StaticTenantResolver, TenantResolver};
pub use tenant::{DEFAULT_TENANT, TenantContext};
