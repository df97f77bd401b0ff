//! Log stream purging for logsweep
//!
//! This crate provides the purge pipeline: log group discovery, the stream
//! eligibility check, per-group stream processing and the bounded fan-out
//! that ties them together.

mod discovery;
mod eligibility;
mod error;
mod orchestrator;
mod policy;
mod processor;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use discovery::list_all_groups;
pub use eligibility::is_eligible;
pub use error::PurgeError;
pub use orchestrator::{PurgeOrchestrator, PurgeOutcome};
pub use policy::{
    GROUP_PAGE_SIZE, MAX_CONCURRENT_GROUPS, PURGE_AGE_MS, PurgePolicy, STREAM_PAGE_SIZE,
    THROTTLE_DELAY,
};
pub use processor::GroupProcessor;

// Re-export types used in our public API
pub use logsweep_types::{ClientError, LogGroup, LogStream, LogStreamClient};
