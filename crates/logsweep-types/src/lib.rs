//! Shared types for logsweep
//!
//! This crate contains the log group and stream snapshots used across the
//! logsweep crates, plus the [`LogStreamClient`] contract every log service
//! backend implements.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

// ============================================================================
// Log Service Resource Types
// ============================================================================

/// Log group information
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogGroup {
    pub name: String,
}

impl LogGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Snapshot of a log stream's metadata as reported by the service
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogStream {
    pub name: String,
    /// Bytes currently stored in the stream
    pub stored_bytes: u64,
    /// Epoch milliseconds of the most recent event, if any was ever written
    pub last_event_timestamp: Option<i64>,
    /// Epoch milliseconds at which the stream was created
    pub creation_timestamp: i64,
}

impl LogStream {
    pub fn new(name: impl Into<String>, stored_bytes: u64, creation_timestamp: i64) -> Self {
        Self {
            name: name.into(),
            stored_bytes,
            last_event_timestamp: None,
            creation_timestamp,
        }
    }

    pub fn with_last_event(mut self, timestamp: i64) -> Self {
        self.last_event_timestamp = Some(timestamp);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.stored_bytes == 0
    }

    /// The instant age is measured from: last event, falling back to creation
    pub fn reference_timestamp(&self) -> i64 {
        self.last_event_timestamp.unwrap_or(self.creation_timestamp)
    }

    /// Reference timestamp as a UTC instant, for display
    pub fn reference_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.reference_timestamp())
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// One page of log groups
#[derive(Clone, Debug, Default)]
pub struct GroupPage {
    pub groups: Vec<LogGroup>,
    /// Continuation token for the next page; absent on the last page
    pub next_token: Option<String>,
}

/// One page of log streams within a group
#[derive(Clone, Debug, Default)]
pub struct StreamPage {
    pub streams: Vec<LogStream>,
    pub next_token: Option<String>,
}

// ============================================================================
// Client Contract
// ============================================================================

/// Error returned by a log service backend
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// The service rejected or failed the named operation
    #[error("{operation} failed: {message}")]
    Api {
        operation: &'static str,
        message: String,
    },
}

impl ClientError {
    pub fn api(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Api {
            operation,
            message: message.into(),
        }
    }
}

/// Remote log service operations the purge pipeline relies on
#[async_trait]
pub trait LogStreamClient: Send + Sync {
    /// Fetch one page of log groups
    async fn list_groups(
        &self,
        limit: i32,
        next_token: Option<String>,
    ) -> Result<GroupPage, ClientError>;

    /// Fetch one page of streams belonging to `group`
    async fn list_streams(
        &self,
        group: &str,
        limit: i32,
        next_token: Option<String>,
    ) -> Result<StreamPage, ClientError>;

    /// Delete a single stream
    async fn delete_stream(&self, group: &str, stream: &str) -> Result<(), ClientError>;
}
