//! Freshness policy for cached successful attempts

use crate::attempt::AttemptLog;
use chrono::{DateTime, Duration, Utc};

/// Whether `log` is still usable as a cached answer under `ttl_days`
///
/// See [`is_fresh_at`] for the rules; this variant measures against the
/// current wall clock.
pub fn is_fresh(log: &AttemptLog, ttl_days: u32) -> bool {
    is_fresh_at(log, ttl_days, Utc::now())
}

/// Pure freshness check against an explicit `now`
///
/// - `ttl_days == 0` disables caching: never fresh, however recent the log.
/// - Otherwise fresh iff elapsed wall-clock time since `created_at` is at most
///   `ttl_days` whole days. Partial days count, so 30.1 days under a 30-day
///   TTL is stale.
/// - Failed attempts are never fresh.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use regula_domain::{is_fresh_at, AttemptLog, Endpoint, QueryKind, QueryNormalizer};
///
/// let normalizer: QueryNormalizer = QueryNormalizer::default();
/// let query = normalizer.normalize(QueryKind::Plate, "ABC1234").unwrap();
/// let now = Utc::now();
/// let log = AttemptLog::succeeded(&query, Endpoint::Regional, serde_json::json!({}))
///     .with_created_at(now - Duration::days(5));
///
/// assert!(is_fresh_at(&log, 30, now));
/// assert!(!is_fresh_at(&log, 0, now));
/// ```
pub fn is_fresh_at(log: &AttemptLog, ttl_days: u32, now: DateTime<Utc>) -> bool {
    if ttl_days == 0 || !log.is_success() {
        return false;
    }
    let elapsed = now.signed_duration_since(log.created_at);
    elapsed <= Duration::days(i64::from(ttl_days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Endpoint, ErrorClass, QueryKind, QueryNormalizer};
    use proptest::prelude::*;
    use serde_json::json;

    fn log_aged(now: DateTime<Utc>, age: Duration) -> AttemptLog {
        let normalizer: QueryNormalizer = QueryNormalizer::default();
        let query = normalizer.normalize(QueryKind::Chassis, "9BWZZZ377VT004251").unwrap();
        AttemptLog::succeeded(&query, Endpoint::Regional, json!({"modelo": "GOL"}))
            .with_created_at(now - age)
    }

    #[test]
    fn test_exact_ttl_boundary_is_fresh() {
        let now = Utc::now();
        let log = log_aged(now, Duration::days(30));
        assert!(is_fresh_at(&log, 30, now));
    }

    #[test]
    fn test_just_past_ttl_is_stale() {
        let now = Utc::now();
        // 30.1 days
        let log = log_aged(now, Duration::days(30) + Duration::hours(2) + Duration::minutes(24));
        assert!(!is_fresh_at(&log, 30, now));
    }

    #[test]
    fn test_fractional_days_count() {
        let now = Utc::now();
        // 30.4 days
        let log = log_aged(now, Duration::days(30) + Duration::minutes(576));
        assert!(!is_fresh_at(&log, 30, now));
    }

    #[test]
    fn test_zero_ttl_disables_caching() {
        let now = Utc::now();
        let log = log_aged(now, Duration::seconds(1));
        assert!(!is_fresh_at(&log, 0, now));
        assert!(!is_fresh(&log, 0));
    }

    #[test]
    fn test_failed_attempt_never_fresh() {
        let now = Utc::now();
        let normalizer: QueryNormalizer = QueryNormalizer::default();
        let query = normalizer.normalize(QueryKind::Plate, "ABC1234").unwrap();
        let log = AttemptLog::failed(&query, Endpoint::Regional, "boom", ErrorClass::ProviderFault)
            .with_created_at(now);
        assert!(!is_fresh_at(&log, 30, now));
    }

    #[test]
    fn test_recent_log_is_fresh_against_wall_clock() {
        let log = log_aged(Utc::now(), Duration::days(5));
        assert!(is_fresh(&log, 30));
    }

    proptest! {
        /// Property: a zero TTL never serves a cached answer
        #[test]
        fn test_zero_ttl_never_fresh(age_secs in 0i64..(400 * 86_400)) {
            let now = Utc::now();
            let log = log_aged(now, Duration::seconds(age_secs));
            prop_assert!(!is_fresh_at(&log, 0, now));
        }

        /// Property: fresh exactly when the age is within the TTL
        #[test]
        fn test_fresh_iff_within_ttl(ttl in 1u32..365, age_secs in 0i64..(400 * 86_400)) {
            let now = Utc::now();
            let log = log_aged(now, Duration::seconds(age_secs));
            prop_assert_eq!(is_fresh_at(&log, ttl, now), age_secs <= i64::from(ttl) * 86_400);
        }
    }
}
