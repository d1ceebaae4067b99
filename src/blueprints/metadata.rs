//! Blueprint metadata block.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Label controlling whether discovery creates an instance for a blueprint.
///
/// Setting it to `"false"` keeps the blueprint discoverable but never
/// auto-applied.
pub const LABEL_INSTANTIATE: &str = "blueprints.idp.dev/instantiate";

/// Optional `metadata` block of a blueprint document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintMetadata {
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl BlueprintMetadata {
    /// Whether the instantiate label is set to a falsy value.
    pub fn instantiate_disabled(&self) -> bool {
        self.labels
            .get(LABEL_INSTANTIATE)
            .is_some_and(|value| value.eq_ignore_ascii_case("false"))
    }

    /// The metadata as a JSON object, as stored on instances.
    pub fn to_map(&self) -> Map<String, Value> {
        let labels = self
            .labels
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect();

        let mut map = Map::new();
        map.insert("name".to_string(), Value::String(self.name.clone()));
        map.insert("labels".to_string(), Value::Object(labels));
        map
    }
}
