use logsweep_types::ClientError;

/// Failure raised while purging log streams
#[derive(Debug, thiserror::Error)]
pub enum PurgeError {
    /// Listing log groups failed, so no group was processed
    #[error("failed to describe log groups")]
    Discovery(#[source] ClientError),

    /// Listing the streams of one group failed
    #[error("failed to describe log streams in {group}")]
    ListStreams {
        group: String,
        #[source]
        source: ClientError,
    },

    /// Deleting a single stream failed
    #[error("failed to delete log stream {group} {stream}")]
    Delete {
        group: String,
        stream: String,
        #[source]
        source: ClientError,
    },

    /// A group worker task panicked or was cancelled
    #[error("group worker stopped unexpectedly: {message}")]
    Worker { message: String },
}

impl PurgeError {
    /// Name of the group the failure belongs to, if any
    pub fn group(&self) -> Option<&str> {
        match self {
            Self::ListStreams { group, .. } | Self::Delete { group, .. } => Some(group),
            Self::Discovery(_) | Self::Worker { .. } => None,
        }
    }
}
