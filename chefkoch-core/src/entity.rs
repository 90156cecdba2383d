//! Sensor entities: projection of published refresh data.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::coordinator::{Coordinator, CoordinatorState};
use crate::types::{RecipeAttributes, SensorSpec, SensorType};

pub const ICON: &str = "mdi:chef-hat";

/// Fields shown as the primary value or already implied by it.
const EXCLUDED_ATTRIBUTES: [&str; 2] = ["title", "status"];

/// One recipe sensor of an entry. Its `SensorSpec` decides which recipe it tracks.
#[derive(Clone)]
pub struct SensorEntity {
    entry_id: String,
    spec: SensorSpec,
    coordinator: Arc<Coordinator>,
}

/// Serializable view of a sensor at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SensorSnapshot {
    pub unique_id: String,
    pub entry_id: String,
    pub sensor_id: String,
    pub sensor_type: SensorType,
    pub name: String,
    pub icon: String,
    /// Recipe title, absent until the first successful cycle.
    pub state: Option<String>,
    pub available: bool,
    #[schema(value_type = Object)]
    pub attributes: Map<String, Value>,
}

impl SensorEntity {
    pub fn new(entry_id: &str, spec: SensorSpec, coordinator: Arc<Coordinator>) -> Self {
        Self {
            entry_id: entry_id.to_string(),
            spec,
            coordinator,
        }
    }

    pub fn unique_id(&self) -> String {
        format!("{}_{}", self.entry_id, self.spec.id)
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn icon(&self) -> &'static str {
        ICON
    }

    pub fn spec(&self) -> &SensorSpec {
        &self.spec
    }

    pub fn available(&self) -> bool {
        self.coordinator.state().last_update_success
    }

    pub fn native_value(&self) -> Option<String> {
        let state = self.coordinator.state();
        self.recipe(&state).map(|r| r.title.clone())
    }

    pub fn extra_state_attributes(&self) -> Map<String, Value> {
        let state = self.coordinator.state();
        self.recipe(&state)
            .map(recipe_attributes)
            .unwrap_or_default()
    }

    /// Everything above read from a single published state.
    pub fn snapshot(&self) -> SensorSnapshot {
        let state = self.coordinator.state();
        let recipe = self.recipe(&state);

        SensorSnapshot {
            unique_id: self.unique_id(),
            entry_id: self.entry_id.clone(),
            sensor_id: self.spec.id.clone(),
            sensor_type: self.spec.sensor_type,
            name: self.spec.name.clone(),
            icon: ICON.to_string(),
            state: recipe.map(|r| r.title.clone()),
            available: state.last_update_success,
            attributes: recipe.map(recipe_attributes).unwrap_or_default(),
        }
    }

    fn recipe<'a>(&self, state: &'a CoordinatorState) -> Option<&'a RecipeAttributes> {
        state.data.get(&self.spec.id)
    }
}

/// Non-empty attributes of a recipe, without title and status.
///
/// Null, empty strings and empty lists are dropped; numeric zeros stay.
pub fn recipe_attributes(recipe: &RecipeAttributes) -> Map<String, Value> {
    let Ok(Value::Object(fields)) = serde_json::to_value(recipe) else {
        return Map::new();
    };

    fields
        .into_iter()
        .filter(|(key, _)| !EXCLUDED_ATTRIBUTES.contains(&key.as_str()))
        .filter(|(_, value)| match value {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            _ => true,
        })
        .collect()
}
