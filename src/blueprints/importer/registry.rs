//! Models that blueprint entries may declare.

use std::collections::BTreeMap;

/// Maps blueprint model names to storage kinds.
///
/// Entries naming a model that is not registered fail validation.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: BTreeMap<String, String>,
}

impl ModelRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            models: BTreeMap::new(),
        }
    }

    /// Register a model stored under its own name.
    pub fn with_model(self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.with_model_kind(model.clone(), model)
    }

    /// Register a model stored under a specific kind.
    pub fn with_model_kind(mut self, model: impl Into<String>, kind: impl Into<String>) -> Self {
        self.models.insert(model.into(), kind.into());
        self
    }

    /// Storage kind for a model, `None` if the model is unknown.
    pub fn kind_for(&self, model: &str) -> Option<&str> {
        self.models.get(model).map(String::as_str)
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::empty()
            .with_model_kind("idp_core.user", crate::users::USER_KIND)
            .with_model("idp_core.group")
            .with_model("idp_core.application")
            .with_model("idp_flows.flow")
            .with_model("idp_flows.flowstagebinding")
            .with_model("idp_stages_identification.identificationstage")
            .with_model("idp_stages_password.passwordstage")
            .with_model("idp_stages_captcha.captchastage")
    }
}
