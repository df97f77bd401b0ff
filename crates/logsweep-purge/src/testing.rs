//! In-memory log service for exercising the purge pipeline
//!
//! [`MockLogClient`] serves scripted pages, fails chosen calls, and records
//! what the pipeline did to it.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use parking_lot::Mutex;

use logsweep_types::{ClientError, GroupPage, LogGroup, LogStream, LogStreamClient, StreamPage};

/// Empty stream whose only timestamp is its creation `days` ago
pub fn empty_stream_aged(name: &str, days: i64) -> LogStream {
    let created = (Utc::now() - TimeDelta::days(days)).timestamp_millis();
    LogStream::new(name, 0, created)
}

/// Stream holding data, created `days` ago
pub fn stored_stream_aged(name: &str, days: i64, stored_bytes: u64) -> LogStream {
    let created = (Utc::now() - TimeDelta::days(days)).timestamp_millis();
    LogStream::new(name, stored_bytes, created)
}

#[derive(Default)]
struct Recorded {
    group_tokens: Vec<Option<String>>,
    visited: Vec<String>,
    delete_attempts: Vec<(String, String)>,
    deleted: Vec<(String, String)>,
}

/// Scripted [`LogStreamClient`] with call instrumentation
#[derive(Default)]
pub struct MockLogClient {
    group_pages: Vec<Vec<String>>,
    failing_group_page: Option<usize>,
    stream_pages: HashMap<String, Vec<Vec<LogStream>>>,
    failing_stream_pages: HashMap<String, usize>,
    failing_deletes: HashSet<(String, String)>,
    latency: Duration,
    recorded: Mutex<Recorded>,
    listings_in_flight: AtomicUsize,
    peak_listings: AtomicUsize,
}

impl MockLogClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve all groups on a single page
    pub fn with_groups(self, groups: &[&str]) -> Self {
        self.with_group_pages(vec![groups.to_vec()])
    }

    /// Serve groups across several pages, in order
    pub fn with_group_pages(mut self, pages: Vec<Vec<&str>>) -> Self {
        self.group_pages = pages
            .into_iter()
            .map(|page| page.into_iter().map(str::to_string).collect())
            .collect();
        self
    }

    /// Serve a group's streams across several pages, in order
    pub fn with_stream_pages(mut self, group: &str, pages: Vec<Vec<LogStream>>) -> Self {
        self.stream_pages.insert(group.to_string(), pages);
        self
    }

    /// Serve a group's streams on a single page
    pub fn with_streams(self, group: &str, streams: Vec<LogStream>) -> Self {
        self.with_stream_pages(group, vec![streams])
    }

    /// Fail the group listing page at zero-based `index`
    pub fn fail_group_page(mut self, index: usize) -> Self {
        self.failing_group_page = Some(index);
        self
    }

    /// Fail the stream listing page at zero-based `index` for `group`
    pub fn fail_stream_page(mut self, group: &str, index: usize) -> Self {
        self.failing_stream_pages.insert(group.to_string(), index);
        self
    }

    pub fn fail_delete(mut self, group: &str, stream: &str) -> Self {
        self.failing_deletes
            .insert((group.to_string(), stream.to_string()));
        self
    }

    /// Delay every stream listing and deletion by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Tokens passed to each group listing call, in call order
    pub fn group_tokens(&self) -> Vec<Option<String>> {
        self.recorded.lock().group_tokens.clone()
    }

    /// Groups whose first stream page was requested, in call order
    pub fn visited_groups(&self) -> Vec<String> {
        self.recorded.lock().visited.clone()
    }

    pub fn delete_attempts(&self) -> Vec<(String, String)> {
        self.recorded.lock().delete_attempts.clone()
    }

    pub fn deleted(&self) -> Vec<(String, String)> {
        self.recorded.lock().deleted.clone()
    }

    /// Highest number of stream listings observed in flight at once
    pub fn peak_concurrent_listings(&self) -> usize {
        self.peak_listings.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn page_index(token: Option<&str>) -> usize {
    token.and_then(|t| t.parse().ok()).unwrap_or(0)
}

fn next_token(index: usize, pages: usize) -> Option<String> {
    (index + 1 < pages).then(|| (index + 1).to_string())
}

#[async_trait]
impl LogStreamClient for MockLogClient {
    async fn list_groups(
        &self,
        _limit: i32,
        next_token_in: Option<String>,
    ) -> Result<GroupPage, ClientError> {
        let index = page_index(next_token_in.as_deref());
        self.recorded.lock().group_tokens.push(next_token_in);

        if self.failing_group_page == Some(index) {
            return Err(ClientError::api("DescribeLogGroups", "ServiceUnavailable"));
        }

        let groups = self
            .group_pages
            .get(index)
            .map(|page| page.iter().map(LogGroup::new).collect())
            .unwrap_or_default();

        Ok(GroupPage {
            groups,
            next_token: next_token(index, self.group_pages.len()),
        })
    }

    async fn list_streams(
        &self,
        group: &str,
        _limit: i32,
        next_token_in: Option<String>,
    ) -> Result<StreamPage, ClientError> {
        let index = page_index(next_token_in.as_deref());
        if index == 0 {
            self.recorded.lock().visited.push(group.to_string());
        }

        let in_flight = self.listings_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_listings.fetch_max(in_flight, Ordering::SeqCst);
        self.simulate_latency().await;
        self.listings_in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_stream_pages.get(group) == Some(&index) {
            return Err(ClientError::api("DescribeLogStreams", "ThrottlingException"));
        }

        let pages = self.stream_pages.get(group);
        let streams = pages
            .and_then(|pages| pages.get(index))
            .cloned()
            .unwrap_or_default();

        Ok(StreamPage {
            streams,
            next_token: next_token(index, pages.map_or(0, Vec::len)),
        })
    }

    async fn delete_stream(&self, group: &str, stream: &str) -> Result<(), ClientError> {
        let key = (group.to_string(), stream.to_string());
        self.recorded.lock().delete_attempts.push(key.clone());
        self.simulate_latency().await;

        if self.failing_deletes.contains(&key) {
            return Err(ClientError::api("DeleteLogStream", "ResourceNotFoundException"));
        }

        self.recorded.lock().deleted.push(key);
        Ok(())
    }
}
