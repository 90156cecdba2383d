pub mod aggregator;
pub mod config;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod extract;
pub mod http;
pub mod integration;
pub mod source;
pub mod types;

pub use aggregator::Aggregator;
pub use config::{ConfigError, EntryConfig, IntegrationConfig};
pub use coordinator::{Coordinator, CoordinatorState};
pub use entity::{SensorEntity, SensorSnapshot};
pub use error::{ExtractError, FetchError, FieldError, RefreshError, SourceError};
pub use extract::{extract_attributes, RecipeDetail};
pub use http::{
    CacheStats, CachingClient, CachingClientBuilder, DiskCache, HttpClient, MockClient,
    MockResponse,
};
pub use integration::{setup_entry, unload_entry, EntryHandle, EntryRegistry};
pub use source::{ChefkochSource, FakeSource, RecipeSource, SearchFilters};
pub use types::{
    RecipeAttributes, RecipeLink, RecipeStatus, RefreshResult, SearchParams, SensorSpec,
    SensorType,
};
