use tracing::debug;

use logsweep_types::{LogGroup, LogStreamClient};

use crate::error::PurgeError;

/// Collect every log group, following continuation tokens until exhausted.
///
/// Any failed page aborts discovery; groups gathered so far are dropped.
pub async fn list_all_groups(
    client: &dyn LogStreamClient,
    page_size: i32,
) -> Result<Vec<LogGroup>, PurgeError> {
    let mut groups = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let page = client
            .list_groups(page_size, next_token.take())
            .await
            .map_err(PurgeError::Discovery)?;

        debug!(count = page.groups.len(), "Fetched log group page");
        groups.extend(page.groups);

        match page.next_token {
            Some(token) => next_token = Some(token),
            None => break,
        }
    }

    Ok(groups)
}
