//! The "add memory" path: episodes become jobs namespaced by group id.

use std::sync::Arc;

use anyhow::Context;
use memq_core::{Episode, EpisodeRequest, EpisodeTarget, NamespaceKey, QueueError};
use tracing::info;

use crate::job::Job;
use crate::router::QueueRouter;

/// Queues episodes for the graph engine, one ordered lane per group.
///
/// Episodes in the same group are applied strictly in arrival order, so
/// later facts never race earlier ones about the same entities.
#[derive(Clone)]
pub struct EpisodeQueue {
    router: QueueRouter,
    target: Arc<dyn EpisodeTarget>,
    default_group: NamespaceKey,
}

impl EpisodeQueue {
    pub fn new(
        router: QueueRouter,
        target: Arc<dyn EpisodeTarget>,
        default_group: impl Into<NamespaceKey>,
    ) -> Self {
        Self {
            router,
            target,
            default_group: default_group.into(),
        }
    }

    /// Validate, enqueue, and return the acknowledgment message.
    ///
    /// Only validation errors surface here; a failing graph call is logged by
    /// the worker.
    pub fn add_episode(&self, request: EpisodeRequest) -> Result<String, QueueError> {
        let episode = Episode::from_request(request, self.default_group.as_str())?;
        let name = episode.name.clone();
        let group = episode.group_id.clone();

        let target = Arc::clone(&self.target);
        let job = Job::new(format!("episode '{name}'"), move || async move {
            target
                .add_episode(&episode)
                .await
                .with_context(|| format!("{} rejected episode '{}'", target.name(), episode.name))
        });

        let receipt = self.router.submit(group.clone(), job)?;
        info!(
            namespace = %group,
            job_id = %receipt.job_id,
            depth = receipt.depth,
            "episode queued"
        );
        Ok(format!(
            "Episode '{name}' queued for processing in group '{group}'"
        ))
    }

    pub fn router(&self) -> &QueueRouter {
        &self.router
    }

    pub fn default_group(&self) -> &NamespaceKey {
        &self.default_group
    }
}
