//! Flow plans and their shared context.

use crate::users::PendingUser;
use serde_json::{Map, Value};

/// Values stages hand to the stages after them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanContext {
    /// The identity the flow is currently about.
    pub pending_user: Option<PendingUser>,
    /// Raw identifier, set when the matched user must not be revealed.
    pub pending_user_identifier: Option<String>,
    pub extra: Map<String, Value>,
}

/// The planned execution of one flow.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowPlan {
    pub flow_slug: String,
    pub context: PlanContext,
}

impl FlowPlan {
    pub fn new(flow_slug: impl Into<String>) -> Self {
        Self {
            flow_slug: flow_slug.into(),
            context: PlanContext::default(),
        }
    }
}
