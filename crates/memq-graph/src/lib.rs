//! Knowledge-graph engine clients implementing [`memq_core::EpisodeTarget`].

pub mod http;
pub mod mock;

pub use http::HttpGraphTarget;
pub use mock::{MockOutcome, MockTarget};
