use std::path::PathBuf;

use thiserror::Error;

/// Why a settings file could not be turned into [`MemqSettings`](crate::MemqSettings).
///
/// Every variant names the file so the operator knows which one to fix.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid settings JSON: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} must hold a JSON object at the top level", .path.display())]
    NotAnObject { path: PathBuf },
}

impl SettingsError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::NotAnObject { path } => {
                path
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SettingsError>;
