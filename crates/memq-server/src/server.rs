use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use memq_engine::EpisodeQueue;
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Server configuration.
pub struct ServerConfig {
    pub host: String,
    /// 0 picks a free port; read the bound one from [`ServerHandle::port`].
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub episodes: EpisodeQueue,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .route("/queues/{namespace}", get(handlers::queue))
        .route("/episodes", post(handlers::add_episode))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve in the background.
pub async fn start(config: ServerConfig, state: AppState) -> Result<ServerHandle, std::io::Error> {
    let router = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(addr = %local_addr, "memq server started");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let shutdown = async {
            let _ = shutdown_rx.await;
        };
        if let Err(e) = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
        {
            tracing::error!(error = %e, "server stopped with error");
        }
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        addr: local_addr,
        shutdown: Some(shutdown_tx),
        server,
    })
}

/// Handle returned by `start()`; keeps the server task alive.
pub struct ServerHandle {
    pub port: u16,
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    server: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Stop accepting connections and wait for in-progress requests.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.server).await {
            tracing::warn!(error = %e, "server task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use memq_engine::{ConcurrencyLimiter, QueueRouter};
    use memq_graph::{MockOutcome, MockTarget};
    use memq_telemetry::MetricsRecorder;

    fn state(target: Arc<MockTarget>) -> AppState {
        let router = QueueRouter::new(
            ConcurrencyLimiter::new(2).unwrap(),
            Arc::new(MetricsRecorder::new()),
        );
        AppState {
            episodes: EpisodeQueue::new(router, target, "main"),
        }
    }

    async fn serve(state: AppState) -> ServerHandle {
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
        };
        start(config, state).await.unwrap()
    }

    #[tokio::test]
    async fn server_starts_and_serves_health() {
        let handle = serve(state(Arc::new(MockTarget::new()))).await;
        assert!(handle.port > 0);

        let url = format!("http://127.0.0.1:{}/health", handle.port);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "memq");
        handle.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn posted_episode_is_acknowledged_and_processed() {
        let target = Arc::new(MockTarget::new());
        let state = state(Arc::clone(&target));
        let router = state.episodes.router().clone();
        let handle = serve(state).await;

        let client = reqwest::Client::new();
        let resp = client
            .post(format!("http://127.0.0.1:{}/episodes", handle.port))
            .json(&serde_json::json!({
                "name": "planning",
                "episode_body": "Q3 roadmap agreed",
                "group_id": "product",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 202);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(
            body["message"],
            "Episode 'planning' queued for processing in group 'product'"
        );

        tokio::time::timeout(Duration::from_secs(5), router.wait_idle())
            .await
            .unwrap();
        assert_eq!(target.call_count(), 1);

        let status: serde_json::Value =
            reqwest::get(format!("http://127.0.0.1:{}/status", handle.port))
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
        assert_eq!(status["status"], "ok");
        assert_eq!(status["queue"]["capacity"], 2);
        assert_eq!(status["queue"]["completed"], 1);
        assert_eq!(status["queue"]["job_duration_ms"]["count"], 1);
        assert_eq!(status["queue"]["namespaces"][0]["namespace"], "product");
        handle.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn queue_endpoint_reports_backlog() {
        let target = Arc::new(MockTarget::with_outcomes(vec![MockOutcome::Delay(
            Duration::from_millis(300),
            Box::new(MockOutcome::Ok),
        )]));
        let state = state(Arc::clone(&target));
        for name in ["one", "two", "three"] {
            let request = serde_json::from_value(serde_json::json!({
                "name": name,
                "episode_body": "",
                "group_id": "busy",
            }))
            .unwrap();
            state.episodes.add_episode(request).unwrap();
        }
        let handle = serve(state).await;

        let body: serde_json::Value =
            reqwest::get(format!("http://127.0.0.1:{}/queues/busy", handle.port))
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
        assert_eq!(body["namespace"], "busy");
        assert_eq!(body["worker_active"], true);
        assert!(body["depth"].as_u64().unwrap() >= 1);

        let body: serde_json::Value =
            reqwest::get(format!("http://127.0.0.1:{}/queues/nobody", handle.port))
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
        assert_eq!(body["depth"], 0);
        assert_eq!(body["worker_active"], false);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn invalid_episodes_get_400() {
        let handle = serve(state(Arc::new(MockTarget::new()))).await;
        let client = reqwest::Client::new();
        let url = format!("http://127.0.0.1:{}/episodes", handle.port);

        let resp = client
            .post(&url)
            .json(&serde_json::json!({ "name": "", "episode_body": "x" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("name"));

        let resp = client
            .post(&url)
            .header("content-type", "application/json")
            .body("{\"name\": 1}")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        handle.shutdown().await;
    }
}
