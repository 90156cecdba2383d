use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Retrieval strategy of a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    Random,
    Daily,
    Vegan,
    Baking,
    Search,
    /// Any type string this build does not know. Resolves to "no recipe".
    #[serde(other)]
    Unknown,
}

impl SensorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Random => "random",
            SensorType::Daily => "daily",
            SensorType::Vegan => "vegan",
            SensorType::Baking => "baking",
            SensorType::Search => "search",
            SensorType::Unknown => "unknown",
        }
    }
}

/// Query and filters of a `search` sensor. Ignored for every other type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchParams {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub query: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub health: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub countries: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meal_type: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

/// A user-configured request for one tracked recipe feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SensorSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    pub name: String,
    #[serde(flatten)]
    pub search: SearchParams,
}

impl SensorSpec {
    pub fn new(id: &str, sensor_type: SensorType, name: &str) -> Self {
        Self {
            id: id.to_string(),
            sensor_type,
            name: name.to_string(),
            search: SearchParams::default(),
        }
    }

    pub fn search(id: &str, name: &str, search: SearchParams) -> Self {
        Self {
            id: id.to_string(),
            sensor_type: SensorType::Search,
            name: name.to_string(),
            search,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecipeStatus {
    Success,
    Error,
}

/// Flat attributes of one recipe as published for a sensor.
///
/// Times are whole minutes; 0 means unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecipeAttributes {
    pub title: String,
    pub url: String,
    pub image_url: String,
    pub total_time: u32,
    pub prep_time: u32,
    pub cook_time: u32,
    pub rest_time: u32,
    pub calories: Option<u32>,
    pub difficulty: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
    pub category: String,
    pub servings: u32,
    pub rating: f64,
    pub rating_count: u32,
    pub status: RecipeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

pub const TITLE_UNKNOWN: &str = "Unknown";
pub const TITLE_NOT_FOUND: &str = "No recipe found";
pub const TITLE_DETAIL_ERROR: &str = "Error loading recipe details";
pub const TITLE_ERROR: &str = "Error";

impl RecipeAttributes {
    /// Attributes with every field at its default, for the given url.
    pub fn empty(url: &str) -> Self {
        Self {
            title: TITLE_UNKNOWN.to_string(),
            url: url.to_string(),
            image_url: String::new(),
            total_time: 0,
            prep_time: 0,
            cook_time: 0,
            rest_time: 0,
            calories: None,
            difficulty: String::new(),
            ingredients: Vec::new(),
            instructions: String::new(),
            category: String::new(),
            servings: 0,
            rating: 0.0,
            rating_count: 0,
            status: RecipeStatus::Success,
            error_message: None,
        }
    }

    /// No recipe url could be resolved for the sensor.
    pub fn not_found() -> Self {
        Self {
            title: TITLE_NOT_FOUND.to_string(),
            status: RecipeStatus::Error,
            ..Self::empty("")
        }
    }

    /// The detail page for `url` could not be loaded or parsed.
    pub fn detail_error(url: &str, message: String) -> Self {
        Self {
            title: TITLE_DETAIL_ERROR.to_string(),
            status: RecipeStatus::Error,
            error_message: Some(message),
            ..Self::empty(url)
        }
    }

    /// Processing the sensor failed outside of detail extraction.
    pub fn failed(message: String) -> Self {
        Self {
            title: TITLE_ERROR.to_string(),
            status: RecipeStatus::Error,
            error_message: Some(message),
            ..Self::empty("")
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RecipeStatus::Success
    }
}

/// Result of one refresh cycle, keyed by sensor id.
pub type RefreshResult = BTreeMap<String, RecipeAttributes>;

/// A url-bearing record returned by recipe list pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeLink {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl RecipeLink {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            title: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_spec_flattens_filters() {
        let spec: SensorSpec = serde_json::from_str(
            r#"{"id": "s1", "type": "search", "name": "Pasta", "query": "pasta", "health": ["Vegetarisch"], "sort": "rating"}"#,
        )
        .unwrap();

        assert_eq!(spec.sensor_type, SensorType::Search);
        assert_eq!(spec.search.query, "pasta");
        assert_eq!(spec.search.health, vec!["Vegetarisch".to_string()]);
        assert_eq!(spec.search.sort.as_deref(), Some("rating"));
        assert!(spec.search.countries.is_empty());
    }

    #[test]
    fn unrecognized_type_is_unknown() {
        let spec: SensorSpec =
            serde_json::from_str(r#"{"id": "x", "type": "dessert", "name": "X"}"#).unwrap();
        assert_eq!(spec.sensor_type, SensorType::Unknown);
    }

    #[test]
    fn placeholders_are_errors() {
        let not_found = RecipeAttributes::not_found();
        assert_eq!(not_found.title, "No recipe found");
        assert_eq!(not_found.status, RecipeStatus::Error);
        assert!(not_found.error_message.is_none());

        let failed = RecipeAttributes::failed("boom".to_string());
        assert_eq!(failed.title, "Error");
        assert_eq!(failed.error_message.as_deref(), Some("boom"));

        let detail = RecipeAttributes::detail_error("http://x/1", "bad page".to_string());
        assert_eq!(detail.title, "Error loading recipe details");
        assert_eq!(detail.url, "http://x/1");
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_value(RecipeAttributes::empty("http://x/1")).unwrap();
        assert_eq!(json["status"], "success");
        assert!(json.get("error_message").is_none());
    }
}
