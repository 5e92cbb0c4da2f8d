use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;
use memq_core::JobId;

/// The future a job body resolves to.
pub type JobFuture = BoxFuture<'static, anyhow::Result<()>>;

type Operation = Box<dyn FnOnce() -> JobFuture + Send + Sync>;

/// One unit of submitted work: a deferred async operation plus a description
/// used in logs. The operation is not started until a worker dequeues it.
///
/// Queued jobs sit in the shared registry, so the operation must be `Sync`
/// as well as `Send`; the future it returns only needs `Send`.
pub struct Job {
    id: JobId,
    description: String,
    operation: Operation,
}

impl Job {
    pub fn new<F, Fut>(description: impl Into<String>, operation: F) -> Self
    where
        F: FnOnce() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            id: JobId::generate(),
            description: description.into(),
            operation: Box::new(move || operation().boxed()),
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub(crate) fn into_parts(self) -> (JobId, String, Operation) {
        (self.id, self.description, self.operation)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
