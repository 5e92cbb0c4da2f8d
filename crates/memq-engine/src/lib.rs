//! Namespace-ordered job execution.
//!
//! Jobs submitted under the same [`NamespaceKey`](memq_core::NamespaceKey) run
//! one at a time in submission order; jobs under different namespaces run
//! concurrently. Every job body, whatever its namespace, first takes a permit
//! from one shared [`ConcurrencyLimiter`].

pub mod ingest;
pub mod job;
pub mod limiter;
pub mod router;
pub mod status;
mod worker;

pub use ingest::EpisodeQueue;
pub use job::{Job, JobFuture};
pub use limiter::{ConcurrencyLimiter, JobPermit};
pub use router::{QueueRouter, SubmitReceipt};
pub use status::{NamespaceStatus, QueueStatus};
