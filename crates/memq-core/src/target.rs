use async_trait::async_trait;

use crate::episode::Episode;
use crate::errors::TargetError;

/// The knowledge-graph engine an episode job ultimately calls into.
///
/// The queue never inspects what happens inside; it only observes success
/// or a `TargetError`.
#[async_trait]
pub trait EpisodeTarget: Send + Sync {
    fn name(&self) -> &str;

    async fn add_episode(&self, episode: &Episode) -> Result<(), TargetError>;
}
