//! AWS CloudWatch Logs client for logsweep
//!
//! This crate provides the CloudWatch Logs implementation of
//! [`LogStreamClient`], used to list log groups and streams and to delete
//! streams.

mod client;

pub use client::{CloudWatchConfig, CloudWatchLogsClient};

// Re-export types that are used in our public API
pub use logsweep_types::{ClientError, GroupPage, LogGroup, LogStream, LogStreamClient, StreamPage};
