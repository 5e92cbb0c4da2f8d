//! Per-namespace drain loop.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use memq_core::NamespaceKey;
use memq_telemetry::{
    JOBS_COMPLETED_TOTAL, JOBS_FAILED_TOTAL, JOB_DURATION_MS, WORKERS_SPAWNED_TOTAL,
};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::job::Job;
use crate::router::RouterInner;

/// Start a worker for `namespace`. The caller must already have flipped the
/// namespace's `worker_active` flag under the registry entry lock.
pub(crate) fn spawn(runtime: &Handle, inner: Arc<RouterInner>, namespace: NamespaceKey) {
    inner.metrics.counter_inc(WORKERS_SPAWNED_TOTAL, &[], 1);
    debug!(namespace = %namespace, "worker spawned");
    let _ = runtime.spawn(run(inner, namespace));
}

async fn run(inner: Arc<RouterInner>, namespace: NamespaceKey) {
    let mut processed = 0u64;

    while let Some(job) = next_job(&inner, &namespace) {
        let permit = match inner.limiter.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                requeue_and_deactivate(&inner, &namespace, job);
                warn!(namespace = %namespace, error = %e, "worker stopping, jobs left queued");
                break;
            }
        };
        execute(&inner, &namespace, job).await;
        drop(permit);
        processed += 1;
    }

    debug!(namespace = %namespace, processed, "worker exited");
    inner.idle.notify_waiters();
}

/// Pop the oldest job, or mark the namespace inactive if there is none.
///
/// Both happen under the entry lock so a concurrent `submit` either lands
/// before the pop or observes the flag already cleared and spawns a new worker.
fn next_job(inner: &RouterInner, namespace: &NamespaceKey) -> Option<Job> {
    let mut state = inner.namespaces.get_mut(namespace)?;
    let job = state.queue.pop_front();
    if job.is_none() {
        state.worker_active = false;
    }
    job
}

fn requeue_and_deactivate(inner: &RouterInner, namespace: &NamespaceKey, job: Job) {
    if let Some(mut state) = inner.namespaces.get_mut(namespace) {
        state.queue.push_front(job);
        state.worker_active = false;
    }
}

async fn execute(inner: &RouterInner, namespace: &NamespaceKey, job: Job) {
    let (job_id, description, operation) = job.into_parts();
    let labels = [("namespace", namespace.as_str())];

    let started = Instant::now();
    // The closure call sits inside the guarded future so a panic while
    // building the future is caught too.
    let outcome = AssertUnwindSafe(async move { operation().await })
        .catch_unwind()
        .await;
    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
    inner
        .metrics
        .histogram_observe(JOB_DURATION_MS, &[], duration_ms);

    match outcome {
        Ok(Ok(())) => {
            inner.metrics.counter_inc(JOBS_COMPLETED_TOTAL, &labels, 1);
            debug!(
                namespace = %namespace,
                job_id = %job_id,
                job = %description,
                duration_ms,
                "job completed"
            );
        }
        Ok(Err(e)) => {
            inner.metrics.counter_inc(JOBS_FAILED_TOTAL, &labels, 1);
            warn!(
                namespace = %namespace,
                job_id = %job_id,
                job = %description,
                error = %format!("{e:#}"),
                "job failed"
            );
        }
        Err(payload) => {
            inner.metrics.counter_inc(JOBS_FAILED_TOTAL, &labels, 1);
            warn!(
                namespace = %namespace,
                job_id = %job_id,
                job = %description,
                error = %panic_message(payload.as_ref()),
                "job panicked"
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
