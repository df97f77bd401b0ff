//! Entry point shared by scheduled and standalone runs

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use logsweep_purge::{LogStreamClient, PurgeOrchestrator, PurgeOutcome};

/// What a run reports back to its caller
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PurgeReport {
    pub summary_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Purge empty, stale log streams and summarise the run
pub async fn purge_log_streams(client: Arc<dyn LogStreamClient>) -> PurgeReport {
    let outcome = PurgeOrchestrator::new(client).purge().await;
    report(outcome)
}

fn report(outcome: PurgeOutcome) -> PurgeReport {
    let error = outcome.error.map(|err| {
        let rendered = format!("{:#}", anyhow::Error::new(err));
        error!("{rendered}");
        rendered
    });

    let summary_message = format!("Number of log streams purged: {}", outcome.purged);
    info!(groups = outcome.groups_discovered, "{summary_message}");

    PurgeReport {
        summary_message,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logsweep_purge::testing::{MockLogClient, empty_stream_aged};

    #[tokio::test(start_paused = true)]
    async fn test_report_for_clean_run() {
        let client = MockLogClient::new()
            .with_groups(&["a", "b"])
            .with_streams("a", vec![empty_stream_aged("old", 20), empty_stream_aged("new", 5)]);

        let report = purge_log_streams(Arc::new(client)).await;

        assert_eq!(report.summary_message, "Number of log streams purged: 1");
        assert_eq!(report.error, None);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "summaryMessage": "Number of log streams purged: 1" })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_carries_error_chain() {
        let client = MockLogClient::new()
            .with_groups(&["app"])
            .with_streams("app", vec![empty_stream_aged("stuck", 30)])
            .fail_delete("app", "stuck");

        let report = purge_log_streams(Arc::new(client)).await;

        assert_eq!(report.summary_message, "Number of log streams purged: 0");
        let error = report.error.unwrap();
        assert!(error.starts_with("failed to delete log stream app stuck"));
        assert!(error.contains("DeleteLogStream failed"));
    }

    #[tokio::test]
    async fn test_report_for_discovery_failure() {
        let client = MockLogClient::new().with_groups(&["app"]).fail_group_page(0);

        let report = purge_log_streams(Arc::new(client)).await;

        assert_eq!(report.summary_message, "Number of log streams purged: 0");
        assert!(report.error.unwrap().starts_with("failed to describe log groups"));
    }
}
