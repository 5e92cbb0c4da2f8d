use std::time::Duration;

use async_trait::async_trait;
use memq_core::{Episode, EpisodeTarget, TargetError};
use reqwest::Client;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Response bodies longer than this are cut before landing in an error.
const MAX_ERROR_BODY: usize = 512;

/// Sends each episode to the graph engine as a JSON POST.
pub struct HttpGraphTarget {
    client: Client,
    endpoint: String,
}

impl HttpGraphTarget {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TargetError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .map_err(|e| TargetError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EpisodeTarget for HttpGraphTarget {
    fn name(&self) -> &str {
        "http-graph"
    }

    async fn add_episode(&self, episode: &Episode) -> Result<(), TargetError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            group_id = %episode.group_id,
            name = %episode.name,
            "posting episode"
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .json(episode)
            .send()
            .await
            .map_err(|e| TargetError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let mut body = resp.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(TargetError::Status { status, body });
        }
        Ok(())
    }
}
