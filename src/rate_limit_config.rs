use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Fixed-window quota: at most `limit` requests per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub limit: u64,
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            limit: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitPolicy {
    pub fn new(limit: u64, window: Duration) -> Self {
        Self { limit, window }
    }

    pub fn window_secs(&self) -> u64 {
        self.window.as_secs()
    }

    /// Index of the window containing `now`: `floor(unix_seconds / window_secs)`.
    pub fn window_index(&self, now: SystemTime) -> u64 {
        let secs = now
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        secs / self.window_secs().max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_window_index() {
        let policy = RateLimitPolicy::new(10, Duration::from_secs(60));
        assert_eq!(policy.window_index(at(0)), 0);
        assert_eq!(policy.window_index(at(59)), 0);
        assert_eq!(policy.window_index(at(60)), 1);
        assert_eq!(policy.window_index(at(1_700_000_000)), 28_333_333);
    }

    #[test]
    fn test_window_boundary_splits_adjacent_seconds() {
        let policy = RateLimitPolicy::default();
        assert_ne!(policy.window_index(at(119)), policy.window_index(at(120)));
    }

    #[test]
    fn test_subsecond_times_truncate() {
        let policy = RateLimitPolicy::default();
        let now = UNIX_EPOCH + Duration::from_millis(59_999);
        assert_eq!(policy.window_index(now), 0);
    }
}
