pub mod episode;
pub mod errors;
pub mod ids;
pub mod target;

pub use episode::{Episode, EpisodeRequest, EpisodeSource};
pub use errors::{QueueError, TargetError};
pub use ids::{JobId, NamespaceKey};
pub use target::EpisodeTarget;
