//! Namespace registry and the `submit` entry point.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use memq_core::{JobId, NamespaceKey, QueueError};
use memq_telemetry::{
    MetricsRecorder, JOBS_COMPLETED_TOTAL, JOBS_FAILED_TOTAL, JOBS_SUBMITTED_TOTAL,
    JOB_DURATION_MS,
};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::debug;

use crate::job::Job;
use crate::limiter::ConcurrencyLimiter;
use crate::status::{NamespaceStatus, QueueStatus};
use crate::worker;

/// Queue plus worker flag for one namespace. Entries are created on first
/// submission and never removed.
#[derive(Default)]
pub(crate) struct NamespaceState {
    pub(crate) queue: VecDeque<Job>,
    pub(crate) worker_active: bool,
}

pub(crate) struct RouterInner {
    pub(crate) namespaces: DashMap<NamespaceKey, NamespaceState>,
    pub(crate) limiter: ConcurrencyLimiter,
    pub(crate) metrics: Arc<MetricsRecorder>,
    /// Signalled whenever a worker exits.
    pub(crate) idle: Notify,
}

/// Acknowledgment returned by [`QueueRouter::submit`]. Not a completion handle.
#[derive(Clone, Debug)]
pub struct SubmitReceipt {
    pub job_id: JobId,
    pub namespace: NamespaceKey,
    /// Pending jobs in the namespace right after this one was appended.
    pub depth: usize,
    /// Whether this submission started a new worker.
    pub spawned_worker: bool,
}

/// Routes jobs to per-namespace FIFO queues, starting a worker for a
/// namespace whenever it goes from idle to having work.
///
/// Cloning shares the same registry.
#[derive(Clone)]
pub struct QueueRouter {
    inner: Arc<RouterInner>,
}

impl QueueRouter {
    pub fn new(limiter: ConcurrencyLimiter, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            inner: Arc::new(RouterInner {
                namespaces: DashMap::new(),
                limiter,
                metrics,
                idle: Notify::new(),
            }),
        }
    }

    /// Append `job` to the namespace's queue and return immediately.
    ///
    /// Must be called from within a Tokio runtime, since a worker task is
    /// spawned when the namespace has none. A blank namespace, or a call with
    /// no runtime, is rejected before the registry is touched.
    pub fn submit(
        &self,
        namespace: impl Into<NamespaceKey>,
        job: Job,
    ) -> Result<SubmitReceipt, QueueError> {
        let namespace = namespace.into();
        if namespace.is_blank() {
            return Err(QueueError::InvalidNamespace(namespace.to_string()));
        }
        let runtime = Handle::try_current().map_err(|_| QueueError::NoRuntime)?;
        let job_id = job.id().clone();

        let (depth, spawned_worker) = {
            let mut state = self.inner.namespaces.entry(namespace.clone()).or_default();
            state.queue.push_back(job);
            let spawn = !state.worker_active;
            state.worker_active = true;
            (state.queue.len(), spawn)
        };

        self.inner.metrics.counter_inc(
            JOBS_SUBMITTED_TOTAL,
            &[("namespace", namespace.as_str())],
            1,
        );
        if spawned_worker {
            worker::spawn(&runtime, Arc::clone(&self.inner), namespace.clone());
        }
        debug!(namespace = %namespace, job_id = %job_id, depth, "job submitted");

        Ok(SubmitReceipt {
            job_id,
            namespace,
            depth,
            spawned_worker,
        })
    }

    /// Pending jobs for `namespace`; 0 if it was never used.
    pub fn queue_depth(&self, namespace: &str) -> usize {
        self.inner
            .namespaces
            .get(namespace)
            .map_or(0, |state| state.queue.len())
    }

    pub fn is_worker_active(&self, namespace: &str) -> bool {
        self.inner
            .namespaces
            .get(namespace)
            .is_some_and(|state| state.worker_active)
    }

    /// Depth and worker flag read under one entry lock.
    pub fn namespace_status(&self, namespace: &str) -> NamespaceStatus {
        let (depth, worker_active) = self
            .inner
            .namespaces
            .get(namespace)
            .map_or((0, false), |state| (state.queue.len(), state.worker_active));
        NamespaceStatus {
            namespace: namespace.to_string(),
            depth,
            worker_active,
        }
    }

    pub fn status(&self) -> QueueStatus {
        let mut namespaces: Vec<NamespaceStatus> = self
            .inner
            .namespaces
            .iter()
            .map(|entry| NamespaceStatus {
                namespace: entry.key().to_string(),
                depth: entry.queue.len(),
                worker_active: entry.worker_active,
            })
            .collect();
        namespaces.sort_by(|a, b| a.namespace.cmp(&b.namespace));

        let metrics = &self.inner.metrics;
        QueueStatus {
            capacity: self.inner.limiter.capacity(),
            in_flight: self.inner.limiter.in_flight(),
            namespaces,
            submitted: metrics.counter_total(JOBS_SUBMITTED_TOTAL),
            completed: metrics.counter_total(JOBS_COMPLETED_TOTAL),
            failed: metrics.counter_total(JOBS_FAILED_TOTAL),
            job_duration_ms: metrics.histogram_summary(JOB_DURATION_MS, &[]),
        }
    }

    /// Resolve once no namespace has an active worker.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if !self.has_active_workers() {
                return;
            }
            notified.await;
        }
    }

    pub fn has_active_workers(&self) -> bool {
        self.inner
            .namespaces
            .iter()
            .any(|entry| entry.worker_active)
    }

    /// Stop starting new job bodies. Running jobs finish; workers then exit
    /// and leave whatever is still queued in place.
    pub fn close(&self) {
        self.inner.limiter.close();
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.inner.limiter
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        Arc::clone(&self.inner.metrics)
    }
}
