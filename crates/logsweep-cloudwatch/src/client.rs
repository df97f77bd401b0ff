//! CloudWatch Logs client for logsweep

use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::Client;
use aws_sdk_cloudwatchlogs::error::DisplayErrorContext;
use aws_sdk_cloudwatchlogs::types as sdk;
use tracing::debug;

use logsweep_types::{ClientError, GroupPage, LogGroup, LogStream, LogStreamClient, StreamPage};

/// Connection settings for CloudWatch Logs.
///
/// Every field is optional; unset fields fall back to the standard AWS
/// provider chain (environment, shared config files, instance profile).
#[derive(Debug, Clone, Default)]
pub struct CloudWatchConfig {
    /// AWS region (e.g., "us-east-1")
    pub region: Option<String>,
    /// Named profile from the shared AWS config files
    pub profile: Option<String>,
    /// Custom endpoint URL (useful for localstack testing)
    pub endpoint_url: Option<String>,
}

/// CloudWatch Logs client wrapper
pub struct CloudWatchLogsClient {
    client: Client,
}

impl CloudWatchLogsClient {
    /// Create a new client by loading AWS configuration
    pub async fn new(config: CloudWatchConfig) -> Self {
        let mut loader = aws_config::from_env();

        if let Some(region) = &config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }

        let aws_config = loader.load().await;

        let mut logs_config = aws_sdk_cloudwatchlogs::config::Builder::from(&aws_config);
        if let Some(endpoint_url) = &config.endpoint_url {
            logs_config = logs_config.endpoint_url(endpoint_url);
        }

        debug!(
            region = ?aws_config.region(),
            endpoint = ?config.endpoint_url,
            "CloudWatch Logs client configured"
        );

        Self {
            client: Client::from_conf(logs_config.build()),
        }
    }
}

#[async_trait]
impl LogStreamClient for CloudWatchLogsClient {
    async fn list_groups(
        &self,
        limit: i32,
        next_token: Option<String>,
    ) -> Result<GroupPage, ClientError> {
        let output = self
            .client
            .describe_log_groups()
            .limit(limit)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| api_error("DescribeLogGroups", e))?;

        Ok(GroupPage {
            groups: output.log_groups().iter().filter_map(group_to_info).collect(),
            next_token: continuation(output.next_token()),
        })
    }

    async fn list_streams(
        &self,
        group: &str,
        limit: i32,
        next_token: Option<String>,
    ) -> Result<StreamPage, ClientError> {
        let output = self
            .client
            .describe_log_streams()
            .log_group_name(group)
            .limit(limit)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| api_error("DescribeLogStreams", e))?;

        Ok(StreamPage {
            streams: output
                .log_streams()
                .iter()
                .filter_map(stream_to_info)
                .collect(),
            next_token: continuation(output.next_token()),
        })
    }

    async fn delete_stream(&self, group: &str, stream: &str) -> Result<(), ClientError> {
        self.client
            .delete_log_stream()
            .log_group_name(group)
            .log_stream_name(stream)
            .send()
            .await
            .map_err(|e| api_error("DeleteLogStream", e))?;
        Ok(())
    }
}

fn api_error<E>(operation: &'static str, err: E) -> ClientError
where
    E: std::error::Error,
{
    ClientError::api(operation, DisplayErrorContext(err).to_string())
}

/// The service can hand back an empty token on the final page
fn continuation(token: Option<&str>) -> Option<String> {
    token.filter(|t| !t.is_empty()).map(str::to_string)
}

fn group_to_info(group: &sdk::LogGroup) -> Option<LogGroup> {
    group.log_group_name().map(LogGroup::new)
}

/// Convert an SDK stream, skipping entries missing the fields eligibility needs
#[allow(deprecated)]
fn stream_to_info(stream: &sdk::LogStream) -> Option<LogStream> {
    let name = stream.log_stream_name()?;
    let creation_timestamp = stream.creation_time()?;
    let stored_bytes = stream
        .stored_bytes()
        .and_then(|bytes| u64::try_from(bytes).ok());

    let Some(stored_bytes) = stored_bytes else {
        debug!(stream = name, "Skipping log stream without a stored bytes figure");
        return None;
    };

    Some(LogStream {
        name: name.to_string(),
        stored_bytes,
        last_event_timestamp: stream.last_event_timestamp(),
        creation_timestamp,
    })
}
