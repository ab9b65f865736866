pub mod compiler;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod query;
pub mod schema;

pub use compiler::SearchCompiler;
pub use config::{GatewayConfig, IndexSettings, SettingsRegistry};
pub use error::{GatewayError, Result};
pub use metrics::GatewayMetrics;
pub use models::*;
pub use schema::{spawn_refresh_task, IndexMapping, MappingRegistry, RefreshEvent, RefreshHandle};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
