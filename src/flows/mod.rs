//! Flow execution context consumed by stages.
//!
//! A flow is an ordered set of stages driven by a [`FlowExecutor`]. Stages
//! read the incoming [`FlowRequest`], render challenges and write their
//! results into the [`PlanContext`] for later stages.

pub mod challenge;
pub mod executor;
pub mod planner;
pub mod request;
pub mod signals;

pub use challenge::{ChallengeError, ChallengeRegistry, LoginChallenge, RedirectChallenge};
pub use executor::{FlowExecutor, StageResult};
pub use planner::{FlowPlan, PlanContext};
pub use request::FlowRequest;
pub use signals::Signal;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a flow is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowDesignation {
    Authentication,
    Authorization,
    Invalidation,
    Enrollment,
    Unenrollment,
    Recovery,
    StageConfiguration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flow {
    pub slug: String,
    pub name: String,
    pub designation: FlowDesignation,
}

impl Flow {
    pub fn new(slug: impl Into<String>, designation: FlowDesignation) -> Self {
        let slug = slug.into();
        Self {
            name: slug.clone(),
            slug,
            designation,
        }
    }
}

/// URL of the flow interface for `slug`, carrying `query` if non-empty.
pub fn flow_url(slug: &str, query: &BTreeMap<String, String>) -> String {
    let base = format!("/if/flow/{}/", slug);
    if query.is_empty() {
        return base;
    }

    let encoded: Vec<String> = query
        .iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect();
    format!("{}?{}", base, encoded.join("&"))
}

fn encode_component(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
