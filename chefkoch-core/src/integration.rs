//! Entry lifecycle: set up coordinators and sensors per configured entry,
//! tear them down again on unload or reload.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::aggregator::Aggregator;
use crate::config::{EntryConfig, IntegrationConfig};
use crate::coordinator::Coordinator;
use crate::entity::SensorEntity;
use crate::source::RecipeSource;

/// A running entry. Returned by [`setup_entry`], consumed by [`unload_entry`].
pub struct EntryHandle {
    config: EntryConfig,
    coordinator: Arc<Coordinator>,
    sensors: Vec<SensorEntity>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl EntryHandle {
    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn config(&self) -> &EntryConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn sensors(&self) -> &[SensorEntity] {
        &self.sensors
    }
}

/// Build the coordinator and sensors of an entry, refresh once, and start
/// the refresh loop.
///
/// A failing first refresh is logged; the entry still starts and retries on
/// schedule.
pub async fn setup_entry(entry: &EntryConfig, source: Arc<dyn RecipeSource>) -> EntryHandle {
    let coordinator = Arc::new(Coordinator::new(
        &entry.id,
        entry.sensors.clone(),
        Aggregator::new(source),
        entry.update_interval(),
    ));

    let sensors = entry
        .sensors
        .iter()
        .map(|spec| SensorEntity::new(&entry.id, spec.clone(), coordinator.clone()))
        .collect();

    if let Err(e) = coordinator.refresh().await {
        tracing::warn!(
            entry = %entry.id,
            error = %e,
            "first refresh failed, retrying on schedule"
        );
    }

    let cancel = CancellationToken::new();
    let task = tokio::spawn(coordinator.clone().run(cancel.clone()));

    tracing::info!(entry = %entry.id, sensors = entry.sensors.len(), "entry set up");

    EntryHandle {
        config: entry.clone(),
        coordinator,
        sensors,
        cancel,
        task,
    }
}

/// Stop an entry's refresh loop and wait for it to finish.
pub async fn unload_entry(handle: EntryHandle) {
    handle.cancel.cancel();
    if let Err(e) = handle.task.await {
        tracing::error!(entry = %handle.config.id, error = %e, "refresh loop ended abnormally");
    }
    tracing::info!(entry = %handle.config.id, "entry unloaded");
}

/// Running entries keyed by entry id.
#[derive(Default)]
pub struct EntryRegistry {
    entries: BTreeMap<String, EntryHandle>,
}

impl EntryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set up every entry of the configuration concurrently. An entry whose
    /// id is already running is replaced.
    pub async fn setup_all(&mut self, config: &IntegrationConfig, source: Arc<dyn RecipeSource>) {
        let handles = join_all(
            config
                .entries
                .iter()
                .map(|entry| setup_entry(entry, source.clone())),
        )
        .await;

        for handle in handles {
            if let Some(previous) = self.entries.insert(handle.id().to_string(), handle) {
                unload_entry(previous).await;
            }
        }
    }

    /// React to a configuration change: unload everything, set up again.
    pub async fn reload(&mut self, config: &IntegrationConfig, source: Arc<dyn RecipeSource>) {
        tracing::info!(entries = config.entries.len(), "reloading entries");
        self.unload_all().await;
        self.setup_all(config, source).await;
    }

    pub async fn unload(&mut self, id: &str) -> bool {
        match self.entries.remove(id) {
            Some(handle) => {
                unload_entry(handle).await;
                true
            }
            None => false,
        }
    }

    pub async fn unload_all(&mut self) {
        let handles = std::mem::take(&mut self.entries);
        join_all(handles.into_values().map(unload_entry)).await;
    }

    pub fn get(&self, id: &str) -> Option<&EntryHandle> {
        self.entries.get(id)
    }

    pub fn handles(&self) -> impl Iterator<Item = &EntryHandle> {
        self.entries.values()
    }

    /// Every sensor of every entry.
    pub fn sensors(&self) -> impl Iterator<Item = &SensorEntity> {
        self.entries.values().flat_map(|h| h.sensors.iter())
    }

    pub fn sensor(&self, unique_id: &str) -> Option<&SensorEntity> {
        self.sensors().find(|s| s.unique_id() == unique_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
