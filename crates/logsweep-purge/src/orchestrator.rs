use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{info, warn};

use logsweep_types::{LogGroup, LogStreamClient};

use crate::discovery::list_all_groups;
use crate::error::PurgeError;
use crate::policy::PurgePolicy;
use crate::processor::GroupProcessor;

/// Result of one purge run
#[derive(Debug, Default)]
pub struct PurgeOutcome {
    /// Streams successfully deleted
    pub purged: u64,

    /// Groups found during discovery, each attempted once
    pub groups_discovered: usize,

    /// Error from the failing group that finished last, or the discovery error
    pub error: Option<PurgeError>,
}

impl PurgeOutcome {
    fn failed(error: PurgeError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Shared slot holding the most recently recorded group failure
#[derive(Default)]
struct ErrorSlot(Mutex<Option<PurgeError>>);

impl ErrorSlot {
    fn record(&self, error: PurgeError) {
        *self.0.lock() = Some(error);
    }

    fn take(&self) -> Option<PurgeError> {
        self.0.lock().take()
    }
}

/// Runs group discovery, then purges every group under a concurrency cap
pub struct PurgeOrchestrator {
    client: Arc<dyn LogStreamClient>,
    policy: PurgePolicy,
}

impl PurgeOrchestrator {
    pub fn new(client: Arc<dyn LogStreamClient>) -> Self {
        Self::with_policy(client, PurgePolicy::default())
    }

    pub fn with_policy(client: Arc<dyn LogStreamClient>, policy: PurgePolicy) -> Self {
        Self { client, policy }
    }

    /// Purge empty, aged streams across all log groups.
    ///
    /// Never fails outright: a discovery failure yields an outcome with no
    /// purges, and group failures are folded into the outcome's error while
    /// the remaining groups carry on.
    pub async fn purge(&self) -> PurgeOutcome {
        let discovered = list_all_groups(self.client.as_ref(), self.policy.group_page_size).await;
        let groups = match discovered {
            Ok(groups) => groups,
            Err(err) => {
                warn!(error = %err, "Log group discovery failed");
                return PurgeOutcome::failed(err);
            }
        };

        if groups.is_empty() {
            info!("No log groups found");
            return PurgeOutcome::default();
        }

        let groups_discovered = groups.len();
        info!(groups = groups_discovered, "Discovered log groups");

        let purged = Arc::new(AtomicU64::new(0));
        let errors = Arc::new(ErrorSlot::default());
        let limiter = Arc::new(Semaphore::new(self.policy.max_concurrent_groups.max(1)));
        let processor = GroupProcessor::new(
            Arc::clone(&self.client),
            self.policy.clone(),
            Arc::clone(&purged),
        );

        let mut workers = JoinSet::new();
        for group in groups {
            // Admit groups in discovery order, one per free permit
            let permit = match admit(&limiter, &group).await {
                Ok(permit) => permit,
                Err(err) => {
                    warn!(error = %err, "Stopped admitting log groups");
                    errors.record(err);
                    break;
                }
            };

            let processor = processor.clone();
            let errors = Arc::clone(&errors);
            workers.spawn(async move {
                let _permit = permit;
                if let Err(err) = processor.process_group(&group.name).await {
                    warn!(group = %group.name, error = %err, "Log group purge failed");
                    errors.record(err);
                }
            });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(join_err) = joined {
                warn!(error = %join_err, "Log group worker stopped unexpectedly");
                errors.record(PurgeError::Worker {
                    message: join_err.to_string(),
                });
            }
        }

        PurgeOutcome {
            purged: purged.load(Ordering::SeqCst),
            groups_discovered,
            error: errors.take(),
        }
    }
}

/// Wait for a free slot for `group`; fails only once the limiter is closed
async fn admit(
    limiter: &Arc<Semaphore>,
    group: &LogGroup,
) -> Result<OwnedSemaphorePermit, PurgeError> {
    Arc::clone(limiter)
        .acquire_owned()
        .await
        .map_err(|_| PurgeError::Worker {
            message: format!("group limiter closed before {} was admitted", group.name),
        })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::{MockLogClient, empty_stream_aged, stored_stream_aged};

    fn fast_policy() -> PurgePolicy {
        PurgePolicy {
            throttle: Duration::ZERO,
            ..PurgePolicy::default()
        }
    }

    fn orchestrator(client: &Arc<MockLogClient>) -> PurgeOrchestrator {
        let client = Arc::clone(client) as Arc<dyn LogStreamClient>;
        PurgeOrchestrator::with_policy(client, fast_policy())
    }

    #[tokio::test]
    async fn test_purges_eligible_stream_across_groups() {
        let client = Arc::new(
            MockLogClient::new()
                .with_groups(&["group-a", "group-b"])
                .with_streams(
                    "group-a",
                    vec![empty_stream_aged("stale", 20), empty_stream_aged("fresh", 5)],
                ),
        );

        let outcome = orchestrator(&client).purge().await;

        assert_eq!(outcome.purged, 1);
        assert!(outcome.is_success());
        assert_eq!(outcome.groups_discovered, 2);

        let mut visited = client.visited_groups();
        visited.sort();
        assert_eq!(visited, ["group-a", "group-b"]);
    }

    #[tokio::test]
    async fn test_discovery_failure_processes_nothing() {
        let client = Arc::new(
            MockLogClient::new()
                .with_group_pages(vec![vec!["a"], vec!["b"]])
                .with_streams("a", vec![empty_stream_aged("stale", 30)])
                .fail_group_page(1),
        );

        let outcome = orchestrator(&client).purge().await;

        assert_eq!(outcome.purged, 0);
        assert_eq!(outcome.groups_discovered, 0);
        assert!(matches!(outcome.error, Some(PurgeError::Discovery(_))));
        assert!(client.visited_groups().is_empty());
    }

    #[tokio::test]
    async fn test_no_groups_is_success() {
        let client = Arc::new(MockLogClient::new());

        let outcome = orchestrator(&client).purge().await;

        assert_eq!(outcome.purged, 0);
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_failing_group_does_not_stop_others() {
        let client = Arc::new(
            MockLogClient::new()
                .with_groups(&["X", "Y"])
                .with_stream_pages(
                    "X",
                    vec![
                        vec![empty_stream_aged("x1", 30)],
                        vec![empty_stream_aged("x2", 30)],
                    ],
                )
                .fail_stream_page("X", 1)
                .with_streams(
                    "Y",
                    vec![empty_stream_aged("y1", 30), empty_stream_aged("y2", 30)],
                ),
        );

        let outcome = orchestrator(&client).purge().await;

        assert_eq!(outcome.purged, 3);
        let error = outcome.error.expect("group X failure is reported");
        assert!(matches!(error, PurgeError::ListStreams { .. }));
        assert_eq!(error.group(), Some("X"));
    }

    #[tokio::test]
    async fn test_failed_delete_not_counted() {
        let client = Arc::new(
            MockLogClient::new()
                .with_groups(&["app"])
                .with_streams(
                    "app",
                    vec![
                        empty_stream_aged("a", 30),
                        empty_stream_aged("locked", 30),
                        empty_stream_aged("c", 30),
                    ],
                )
                .fail_delete("app", "locked"),
        );

        let outcome = orchestrator(&client).purge().await;

        assert_eq!(outcome.purged, 2);
        assert_eq!(client.delete_attempts().len(), 3);
        assert!(matches!(
            outcome.error,
            Some(PurgeError::Delete { ref stream, .. }) if stream == "locked"
        ));
    }

    #[tokio::test]
    async fn test_never_more_than_five_groups_in_flight() {
        let names: Vec<String> = (0..12).map(|i| format!("group-{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();

        let mut mock = MockLogClient::new()
            .with_groups(&refs)
            .with_latency(Duration::from_millis(20));
        for name in &refs {
            mock = mock.with_stream_pages(
                name,
                vec![
                    vec![empty_stream_aged("old", 30)],
                    vec![stored_stream_aged("busy", 30, 10)],
                ],
            );
        }
        let client = Arc::new(mock);

        let outcome = orchestrator(&client).purge().await;

        assert!(outcome.is_success());
        assert_eq!(outcome.purged, 12);
        assert_eq!(client.visited_groups(), names);
        let peak = client.peak_concurrent_listings();
        assert!(peak <= 5, "peak concurrency was {peak}");
        assert!(peak > 1, "groups never overlapped");
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_failing_group_to_finish_is_reported() {
        // A fails on its first listing; B fails on its third, throttled page
        let client = Arc::new(
            MockLogClient::new()
                .with_groups(&["B", "A"])
                .with_stream_pages(
                    "B",
                    vec![
                        vec![empty_stream_aged("b1", 30)],
                        vec![empty_stream_aged("b2", 30)],
                        vec![empty_stream_aged("b3", 30)],
                    ],
                )
                .fail_stream_page("B", 2)
                .with_streams("A", vec![empty_stream_aged("a1", 30)])
                .fail_stream_page("A", 0),
        );
        let orchestrator =
            PurgeOrchestrator::new(Arc::clone(&client) as Arc<dyn LogStreamClient>);

        let outcome = orchestrator.purge().await;

        assert_eq!(outcome.purged, 2);
        let error = outcome.error.expect("a group failure is reported");
        assert!(matches!(error, PurgeError::ListStreams { .. }));
        assert_eq!(error.group(), Some("B"));
    }

    #[tokio::test]
    async fn test_closed_limiter_refuses_admission() {
        let limiter = Arc::new(Semaphore::new(1));
        limiter.close();

        let err = admit(&limiter, &LogGroup::new("late")).await.unwrap_err();

        assert!(matches!(err, PurgeError::Worker { ref message } if message.contains("late")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_counter_has_no_lost_updates() {
        let names: Vec<String> = (0..8).map(|i| format!("group-{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();

        let mut mock = MockLogClient::new().with_groups(&refs);
        for name in &refs {
            let streams = (0..25)
                .map(|i| empty_stream_aged(&format!("s-{i}"), 30))
                .collect();
            mock = mock.with_streams(name, streams);
        }
        mock = mock.fail_delete("group-3", "s-7");
        let client = Arc::new(mock);

        let outcome = orchestrator(&client).purge().await;

        assert_eq!(outcome.purged, 8 * 25 - 1);
        assert_eq!(outcome.purged as usize, client.deleted().len());
    }
}
