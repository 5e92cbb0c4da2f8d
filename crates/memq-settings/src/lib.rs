//! Layered configuration for memq.
//!
//! Compiled defaults, then `~/.memq/settings.json` (merged key by key), then
//! environment variables. See [`loader`] for the exact precedence.

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{load_settings, load_settings_from_path, settings_path};
pub use types::{
    GraphSettings, LoggingSettings, MemqSettings, QueueSettings, ServerSettings,
    GRAPH_TIMEOUT_MS_RANGE, MAX_SEMAPHORE_LIMIT,
};
