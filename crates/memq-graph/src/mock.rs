use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use memq_core::{Episode, EpisodeTarget, TargetError};
use parking_lot::Mutex;

/// Scripted result for one call.
#[derive(Clone, Debug)]
pub enum MockOutcome {
    Ok,
    Fail(TargetError),
    /// Wait, then resolve to the inner outcome.
    Delay(Duration, Box<MockOutcome>),
}

/// In-process target for tests. Records every episode it receives and
/// replays scripted outcomes in call order; once the script runs out every
/// call succeeds.
#[derive(Default)]
pub struct MockTarget {
    outcomes: Vec<MockOutcome>,
    call_count: AtomicUsize,
    received: Mutex<Vec<Episode>>,
}

impl MockTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outcomes(outcomes: Vec<MockOutcome>) -> Self {
        Self {
            outcomes,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Episodes in the order calls started.
    pub fn episodes(&self) -> Vec<Episode> {
        self.received.lock().clone()
    }
}

#[async_trait]
impl EpisodeTarget for MockTarget {
    fn name(&self) -> &str {
        "mock"
    }

    async fn add_episode(&self, episode: &Episode) -> Result<(), TargetError> {
        let idx = self.call_count.fetch_add(1, Ordering::Relaxed);
        self.received.lock().push(episode.clone());

        let mut outcome = self.outcomes.get(idx).cloned().unwrap_or(MockOutcome::Ok);
        loop {
            match outcome {
                MockOutcome::Ok => return Ok(()),
                MockOutcome::Fail(e) => return Err(e),
                MockOutcome::Delay(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    outcome = *inner;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memq_core::EpisodeRequest;

    fn episode(name: &str) -> Episode {
        let request: EpisodeRequest = serde_json::from_value(serde_json::json!({
            "name": name,
            "episode_body": "",
        }))
        .unwrap();
        Episode::from_request(request, "main").unwrap()
    }

    #[tokio::test]
    async fn replays_script_then_succeeds() {
        let target = MockTarget::with_outcomes(vec![
            MockOutcome::Fail(TargetError::Unavailable("down".into())),
            MockOutcome::Ok,
        ]);

        assert!(target.add_episode(&episode("a")).await.is_err());
        assert!(target.add_episode(&episode("b")).await.is_ok());
        assert!(target.add_episode(&episode("c")).await.is_ok());

        assert_eq!(target.call_count(), 3);
        let names: Vec<_> = target.episodes().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_wraps_inner_outcome() {
        let target = MockTarget::with_outcomes(vec![MockOutcome::Delay(
            Duration::from_secs(30),
            Box::new(MockOutcome::Fail(TargetError::Transport("reset".into()))),
        )]);

        let started = tokio::time::Instant::now();
        let err = target.add_episode(&episode("slow")).await.unwrap_err();
        assert!(started.elapsed() >= Duration::from_secs(30));
        assert_eq!(err.error_kind(), "transport");
    }
}
