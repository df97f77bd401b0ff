use std::time::Duration;

use chrono::TimeDelta;

/// Age past which an empty stream is purged, in milliseconds (14 days)
pub const PURGE_AGE_MS: i64 = 1_209_600_000;

/// Pause after each stream page fetch to stay under the service rate limit
pub const THROTTLE_DELAY: Duration = Duration::from_millis(1000);

/// Log groups requested per page
pub const GROUP_PAGE_SIZE: i32 = 50;

/// Log streams requested per page
pub const STREAM_PAGE_SIZE: i32 = 50;

/// Groups processed at the same time
pub const MAX_CONCURRENT_GROUPS: usize = 5;

/// Thresholds governing a purge run
#[derive(Clone, Debug)]
pub struct PurgePolicy {
    pub max_age: TimeDelta,
    pub throttle: Duration,
    pub group_page_size: i32,
    pub stream_page_size: i32,
    pub max_concurrent_groups: usize,
}

impl Default for PurgePolicy {
    fn default() -> Self {
        Self {
            max_age: TimeDelta::milliseconds(PURGE_AGE_MS),
            throttle: THROTTLE_DELAY,
            group_page_size: GROUP_PAGE_SIZE,
            stream_page_size: STREAM_PAGE_SIZE,
            max_concurrent_groups: MAX_CONCURRENT_GROUPS,
        }
    }
}
