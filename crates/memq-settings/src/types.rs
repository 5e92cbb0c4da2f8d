//! Settings type definitions.
//!
//! Field names are camelCase on the wire. Every section is `#[serde(default)]`
//! so a partial file only overrides what it names.

use serde::{Deserialize, Serialize};

/// Largest accepted permit pool size.
pub const MAX_SEMAPHORE_LIMIT: usize = 10_000;

/// Accepted per-episode graph request timeout, in milliseconds.
pub const GRAPH_TIMEOUT_MS_RANGE: std::ops::RangeInclusive<u64> = 100..=3_600_000;

/// Root settings type.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemqSettings {
    /// Settings schema version.
    pub version: String,
    pub queue: QueueSettings,
    pub graph: GraphSettings,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

impl Default for MemqSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            queue: QueueSettings::default(),
            graph: GraphSettings::default(),
            server: ServerSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl MemqSettings {
    /// Correct out-of-range values in place.
    ///
    /// Called automatically during loading. Invalid values are corrected with
    /// a warning rather than rejected.
    pub fn validate(&mut self) {
        let q = &mut self.queue;
        if q.semaphore_limit == 0 {
            tracing::warn!("semaphore_limit is 0, correcting to 1");
            q.semaphore_limit = 1;
        } else if q.semaphore_limit > MAX_SEMAPHORE_LIMIT {
            tracing::warn!(
                "semaphore_limit ({}) above {MAX_SEMAPHORE_LIMIT}, clamping",
                q.semaphore_limit
            );
            q.semaphore_limit = MAX_SEMAPHORE_LIMIT;
        }

        let timeout = self.graph.timeout_ms;
        let clamped = timeout.clamp(
            *GRAPH_TIMEOUT_MS_RANGE.start(),
            *GRAPH_TIMEOUT_MS_RANGE.end(),
        );
        if clamped != timeout {
            tracing::warn!("graph.timeoutMs ({timeout}) out of range, using {clamped}");
            self.graph.timeout_ms = clamped;
        }

        if self.graph.group_id.trim().is_empty() {
            tracing::warn!("graph.groupId is blank, falling back to \"main\"");
            self.graph.group_id = default_group_id();
        }
    }
}

/// Concurrency settings for the ingestion queue.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueSettings {
    /// Process-wide cap on job bodies executing at once. Sized to stay under
    /// the graph engine's upstream LLM rate limits.
    pub semaphore_limit: usize,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self { semaphore_limit: 10 }
    }
}

/// Knowledge-graph engine settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphSettings {
    /// Namespace used when a request names no group.
    pub group_id: String,
    /// URL episodes are POSTed to.
    pub endpoint: String,
    /// Per-episode request timeout.
    pub timeout_ms: u64,
}

fn default_group_id() -> String {
    "main".to_string()
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            group_id: default_group_id(),
            endpoint: "http://localhost:8001/episodes".to_string(),
            timeout_ms: 120_000,
        }
    }
}

/// Status/ingest HTTP listener.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
