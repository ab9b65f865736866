//! Background refresh of mapping snapshots and index settings
//!
//! A single tokio task owns every write to the registries. Change events
//! arrive over a channel; each one is applied by building the new state off
//! the request path and swapping it in, after which the cached source-field
//! defaults of the index are recomputed.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::mapping::IndexMapping;
use super::registry::MappingRegistry;
use crate::compiler::source::SourceFieldCompiler;
use crate::config::{IndexSettings, SettingsRegistry};
use crate::error::GatewayError;
use crate::metrics::GatewayMetrics;
use crate::Result;

const CHANNEL_CAPACITY: usize = 64;

/// A change to apply to the registries
#[derive(Clone, Debug)]
pub enum RefreshEvent {
    MappingChanged { index: String, mapping: IndexMapping },
    SettingsChanged { index: String, settings: IndexSettings },
    IndexRemoved { index: String },
}

impl RefreshEvent {
    pub fn index(&self) -> &str {
        match self {
            RefreshEvent::MappingChanged { index, .. }
            | RefreshEvent::SettingsChanged { index, .. }
            | RefreshEvent::IndexRemoved { index } => index,
        }
    }
}

/// Sending side of the refresh task
///
/// The task stops once every handle is dropped or shut down.
#[derive(Clone)]
pub struct RefreshHandle {
    tx: mpsc::Sender<RefreshEvent>,
}

impl RefreshHandle {
    /// Queue an event, waiting for channel space
    pub async fn send(&self, event: RefreshEvent) -> Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| GatewayError::Config("refresh task stopped".to_string()))
    }

    /// Queue an event without waiting
    pub fn try_send(&self, event: RefreshEvent) -> Result<()> {
        self.tx.try_send(event).map_err(|e| {
            GatewayError::Config(format!("refresh event not queued: {e}"))
        })
    }

    /// Close this handle's side of the channel
    pub fn shutdown(self) {
        drop(self.tx);
    }
}

/// Start the refresh task
pub fn spawn_refresh_task(
    mappings: Arc<MappingRegistry>,
    settings: Arc<SettingsRegistry>,
    sources: Arc<SourceFieldCompiler>,
    metrics: Option<Arc<GatewayMetrics>>,
) -> (RefreshHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);

    let task = tokio::spawn(async move {
        info!("mapping refresh task started");
        while let Some(event) = rx.recv().await {
            apply(&event, &mappings, &settings, &sources);
            if let Some(metrics) = &metrics {
                metrics.record_refresh();
            }
        }
        info!("mapping refresh task stopped");
    });

    (RefreshHandle { tx }, task)
}

/// Apply one event to the registries
pub fn apply(
    event: &RefreshEvent,
    mappings: &MappingRegistry,
    settings: &SettingsRegistry,
    sources: &SourceFieldCompiler,
) {
    debug!(index = %event.index(), ?event, "applying refresh event");

    match event {
        RefreshEvent::MappingChanged { index, mapping } => {
            let snapshot = mappings.publish(index, mapping.clone());
            sources.refresh(&snapshot, &settings.get(index));
        }
        RefreshEvent::SettingsChanged {
            index,
            settings: new_settings,
        } => {
            if let Err(e) = new_settings.validate() {
                warn!(index = %index, error = %e, "ignoring invalid settings");
                return;
            }
            let current = settings.update(index, new_settings.clone());
            match mappings.snapshot(index) {
                Ok(snapshot) => {
                    sources.refresh(&snapshot, &current);
                }
                Err(_) => sources.invalidate(index, mappings.generation()),
            }
            info!(index = %index, "updated index settings");
        }
        RefreshEvent::IndexRemoved { index } => {
            mappings.remove(index);
            settings.remove(index);
            sources.invalidate(index, mappings.generation());
        }
    }
}
