/// Errors visible to a submitter. Everything after enqueue is logged, not returned.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("invalid namespace: {0:?}")]
    InvalidNamespace(String),

    #[error("invalid limiter capacity: {0} (must be at least 1)")]
    InvalidCapacity(usize),

    #[error("concurrency limiter closed")]
    LimiterClosed,

    #[error("invalid episode: {0}")]
    InvalidEpisode(String),

    #[error("no tokio runtime to run namespace workers on")]
    NoRuntime,
}

/// Failures reported by an execution target (the knowledge-graph engine).
#[derive(Clone, Debug, thiserror::Error)]
pub enum TargetError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("graph engine returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("target unavailable: {0}")]
    Unavailable(String),
}

impl TargetError {
    /// Short classification string for logging/metrics.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Status { .. } => "status",
            Self::Serialization(_) => "serialization",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

impl From<serde_json::Error> for TargetError {
    fn from(e: serde_json::Error) -> Self {
        TargetError::Serialization(e.to_string())
    }
}
