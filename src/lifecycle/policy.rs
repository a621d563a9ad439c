use chrono::{DateTime, Duration, Utc};

use crate::error::{AppError, Result};
use crate::models::{parse_timestamp, LifecycleDates};

pub const DEFAULT_EXPIRE_HOURS: i64 = 48;
pub const DEFAULT_GONE_DAYS: i64 = 7;
pub const DEFAULT_DELETE_DAYS: i64 = 30;

/// Offsets from an article's anchor time to each lifecycle stage.
///
/// Always satisfies `0 < expire_after < gone_after < delete_after`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    expire_after: Duration,
    gone_after: Duration,
    delete_after: Duration,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            expire_after: Duration::hours(DEFAULT_EXPIRE_HOURS),
            gone_after: Duration::days(DEFAULT_GONE_DAYS),
            delete_after: Duration::days(DEFAULT_DELETE_DAYS),
        }
    }
}

impl LifecyclePolicy {
    pub fn new(expire_after: Duration, gone_after: Duration, delete_after: Duration) -> Result<Self> {
        if expire_after <= Duration::zero() {
            return Err(AppError::Config(
                "lifecycle expiry offset must be positive".to_string(),
            ));
        }
        if !(expire_after < gone_after && gone_after < delete_after) {
            return Err(AppError::Config(format!(
                "lifecycle offsets must be strictly increasing (expire {}h, gone {}h, delete {}h)",
                expire_after.num_hours(),
                gone_after.num_hours(),
                delete_after.num_hours()
            )));
        }

        Ok(Self {
            expire_after,
            gone_after,
            delete_after,
        })
    }

    pub fn expire_after(&self) -> Duration {
        self.expire_after
    }

    pub fn delete_after(&self) -> Duration {
        self.delete_after
    }

    /// Lifecycle timestamps for a new article, anchored on its publish time
    /// when that parses and on `now` otherwise.
    pub fn compute_lifecycle(&self, published_at: Option<&str>, now: DateTime<Utc>) -> LifecycleDates {
        let anchor = published_at.and_then(parse_timestamp).unwrap_or(now);
        self.dates_from(anchor)
    }

    pub fn dates_from(&self, anchor: DateTime<Utc>) -> LifecycleDates {
        LifecycleDates {
            expired_at: anchor + self.expire_after,
            gone_at: anchor + self.gone_after,
            deleted_at: anchor + self.delete_after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_offsets_are_ordered() {
        let now = Utc::now();
        let dates = LifecyclePolicy::default().compute_lifecycle(None, now);

        assert!(dates.expired_at < dates.gone_at);
        assert!(dates.gone_at < dates.deleted_at);
        assert_eq!(dates.expired_at - now, Duration::hours(48));
        assert_eq!(dates.gone_at - dates.expired_at, Duration::days(5));
        assert_eq!(dates.deleted_at - dates.gone_at, Duration::days(23));
    }

    #[test]
    fn test_anchors_on_published_at() {
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let dates = LifecyclePolicy::default().compute_lifecycle(Some("2024-01-01T12:00:00Z"), now);

        assert_eq!(
            dates.expired_at,
            Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap()
        );
        assert_eq!(
            dates.deleted_at,
            Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_unparseable_published_at_falls_back_to_now() {
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let policy = LifecyclePolicy::default();

        assert_eq!(
            policy.compute_lifecycle(Some("last tuesday"), now),
            policy.compute_lifecycle(None, now)
        );
    }

    #[test]
    fn test_rejects_unordered_offsets() {
        assert!(LifecyclePolicy::new(Duration::days(7), Duration::days(7), Duration::days(30)).is_err());
        assert!(LifecyclePolicy::new(Duration::hours(48), Duration::days(40), Duration::days(30)).is_err());
        assert!(LifecyclePolicy::new(Duration::zero(), Duration::days(1), Duration::days(2)).is_err());
        assert!(LifecyclePolicy::new(Duration::hours(18), Duration::hours(19), Duration::hours(20)).is_ok());
    }
}
