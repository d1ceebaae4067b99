//! Per-request flow executor handed to stages.

use crate::flows::planner::FlowPlan;
use crate::flows::request::FlowRequest;
use crate::flows::Flow;

/// What a stage asks the executor to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageResult {
    /// The stage is done; continue with the next one.
    Ok,
}

/// Carries the flow, its plan and the current request through a stage.
#[derive(Debug, Clone)]
pub struct FlowExecutor {
    pub flow: Flow,
    pub plan: FlowPlan,
    pub request: FlowRequest,
    completed_stages: usize,
}

impl FlowExecutor {
    pub fn new(flow: Flow, request: FlowRequest) -> Self {
        Self {
            plan: FlowPlan::new(flow.slug.clone()),
            flow,
            request,
            completed_stages: 0,
        }
    }

    /// Mark the current stage as completed.
    pub fn stage_ok(&mut self) -> StageResult {
        self.completed_stages += 1;
        StageResult::Ok
    }

    pub fn completed_stages(&self) -> usize {
        self.completed_stages
    }
}
