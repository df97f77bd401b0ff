use chrono::{DateTime, TimeDelta, Utc};

use logsweep_types::LogStream;

/// Whether a stream is empty and older than `max_age` at `now`.
///
/// Age is measured from the last event, or from creation when the stream
/// never received one. A stream exactly `max_age` old is kept.
pub fn is_eligible(stream: &LogStream, now: DateTime<Utc>, max_age: TimeDelta) -> bool {
    if !stream.is_empty() {
        return false;
    }

    let age_ms = now
        .timestamp_millis()
        .saturating_sub(stream.reference_timestamp());
    age_ms > max_age.num_milliseconds()
}
