use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tracing::{debug, info, warn};

use logsweep_types::{LogStream, LogStreamClient};

use crate::eligibility::is_eligible;
use crate::error::PurgeError;
use crate::policy::PurgePolicy;

/// Purges eligible streams from one log group at a time
#[derive(Clone)]
pub struct GroupProcessor {
    client: Arc<dyn LogStreamClient>,
    policy: PurgePolicy,

    /// Streams deleted so far, shared by every worker of a run
    purged: Arc<AtomicU64>,
}

impl GroupProcessor {
    pub fn new(
        client: Arc<dyn LogStreamClient>,
        policy: PurgePolicy,
        purged: Arc<AtomicU64>,
    ) -> Self {
        Self {
            client,
            policy,
            purged,
        }
    }

    /// Walk every stream page of `group`, deleting eligible streams.
    ///
    /// A failed page listing ends the group with that error. Failed deletions
    /// do not stop the walk; the last one to complete is returned once every
    /// page has been handled. Each fetched page is followed by the throttle
    /// pause.
    pub async fn process_group(&self, group: &str) -> Result<(), PurgeError> {
        let mut next_token: Option<String> = None;
        let mut delete_error = None;

        loop {
            let page = self
                .client
                .list_streams(group, self.policy.stream_page_size, next_token.take())
                .await
                .map_err(|source| PurgeError::ListStreams {
                    group: group.to_string(),
                    source,
                })?;

            if let Some(err) = self.purge_page(group, &page.streams).await {
                delete_error = Some(err);
            }

            tokio::time::sleep(self.policy.throttle).await;

            match page.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        delete_error.map_or(Ok(()), Err)
    }

    /// Delete the eligible streams of one page concurrently, waiting for all
    async fn purge_page(&self, group: &str, streams: &[LogStream]) -> Option<PurgeError> {
        let now = Utc::now();

        let mut deletions: FuturesUnordered<_> = streams
            .iter()
            .filter(|stream| {
                let eligible = is_eligible(stream, now, self.policy.max_age);
                if !eligible {
                    debug!(
                        group,
                        stream = %stream.name,
                        stored_bytes = stream.stored_bytes,
                        "Retaining log stream"
                    );
                }
                eligible
            })
            .map(|stream| self.delete_stream(group, stream))
            .collect();

        let mut last_error = None;
        while let Some(result) = deletions.next().await {
            if let Err(err) = result {
                warn!(group, error = %err, "Log stream deletion failed");
                last_error = Some(err);
            }
        }
        last_error
    }

    async fn delete_stream(&self, group: &str, stream: &LogStream) -> Result<(), PurgeError> {
        info!(
            group,
            stream = %stream.name,
            last_activity = ?stream.reference_time(),
            "Purging log stream"
        );

        self.client
            .delete_stream(group, &stream.name)
            .await
            .map_err(|source| PurgeError::Delete {
                group: group.to_string(),
                stream: stream.name.clone(),
                source,
            })?;

        self.purged.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
