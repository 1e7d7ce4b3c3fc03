//! Failure memoization
//!
//! Decides, from history alone, whether a query is already known to fail on
//! the requested endpoint. Nothing here touches the network or writes logs.

use crate::ResolveError;
use regula_domain::{AttemptLog, Endpoint, ErrorClass, VehicleQuery};

/// Short-circuit a query that history says will fail on `endpoint`
///
/// Only entries that match `query` are considered. Rules, in order:
///
/// 1. A `WrongEndpoint` failure on `endpoint` yields
///    [`ResolveError::WrongEndpoint`] pointing at the other endpoint.
/// 2. Any other failure on `endpoint` replays the newest one as
///    [`ResolveError::RepeatedFailure`].
/// 3. Failures recorded on other endpoints never short-circuit.
///
/// # Examples
///
/// ```
/// use regula_domain::{AttemptLog, Endpoint, ErrorClass, QueryKind, QueryNormalizer};
/// use regula_resolver::{check_history, ResolveError};
///
/// let normalizer: QueryNormalizer = QueryNormalizer::default();
/// let query = normalizer.normalize(QueryKind::Plate, "ABC1234").unwrap();
/// let history = vec![AttemptLog::failed(
///     &query,
///     Endpoint::Regional,
///     "Veículo de outra UF",
///     ErrorClass::WrongEndpoint,
/// )];
///
/// // Same endpoint: rejected locally
/// assert!(matches!(
///     check_history(&query, Endpoint::Regional, &history),
///     Err(ResolveError::WrongEndpoint { suggested: Endpoint::National, .. })
/// ));
///
/// // The user switched: go ahead
/// assert!(check_history(&query, Endpoint::National, &history).is_ok());
/// ```
pub fn check_history(
    query: &VehicleQuery,
    endpoint: Endpoint,
    history: &[AttemptLog],
) -> Result<(), ResolveError> {
    if let Some(wrong) = newest_failure(query, endpoint, history, Some(ErrorClass::WrongEndpoint)) {
        let suggested = endpoint.alternative();
        let conflicting_history =
            newest_failure(query, suggested, history, Some(ErrorClass::WrongEndpoint)).is_some();
        if conflicting_history {
            tracing::warn!(
                query = %query,
                "both {} and {} reported the query as belonging to the other registry",
                endpoint,
                suggested
            );
        }
        tracing::debug!(query = %query, attempt = %wrong.id, "short-circuit: wrong endpoint");

        return Err(ResolveError::WrongEndpoint {
            requested: endpoint,
            suggested,
            message: format!(
                "{} is not registered on {}; select {} and try again",
                query, endpoint, suggested
            ),
            conflicting_history,
        });
    }

    if let Some(failure) = newest_failure(query, endpoint, history, None) {
        let error_class = failure.error_class().unwrap_or(ErrorClass::Unknown);
        let original_message = failure.error_message().unwrap_or_default().to_string();
        let message = match error_class {
            ErrorClass::NotFound => format!(
                "{} was not found on {} when last checked at {}; check the selected registry and region before trying again",
                query,
                endpoint,
                failure.created_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            _ => original_message.clone(),
        };
        tracing::debug!(query = %query, attempt = %failure.id, class = %error_class, "short-circuit: repeated failure");

        return Err(ResolveError::RepeatedFailure {
            endpoint,
            error_class,
            message,
            original_message,
            failed_at: failure.created_at,
            attempt_log_id: failure.id,
        });
    }

    Ok(())
}

/// Newest failed entry for `query` on `endpoint`, optionally of one class
fn newest_failure<'a>(
    query: &VehicleQuery,
    endpoint: Endpoint,
    history: &'a [AttemptLog],
    class: Option<ErrorClass>,
) -> Option<&'a AttemptLog> {
    history
        .iter()
        .filter(|log| log.matches(query) && log.endpoint == endpoint)
        .filter(|log| match (log.error_class(), class) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(found), Some(wanted)) => found == wanted,
        })
        .max_by_key(|log| log.created_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use regula_domain::{QueryKind, QueryNormalizer};
    use serde_json::json;

    fn plate() -> VehicleQuery {
        let normalizer: QueryNormalizer = QueryNormalizer::default();
        normalizer.normalize(QueryKind::Plate, "ABC1234").unwrap()
    }

    #[test]
    fn test_empty_history_passes() {
        assert!(check_history(&plate(), Endpoint::Regional, &[]).is_ok());
    }

    #[test]
    fn test_success_only_history_passes() {
        let history = vec![AttemptLog::succeeded(&plate(), Endpoint::Regional, json!({"modelo": "GOL"}))];
        assert!(check_history(&plate(), Endpoint::Regional, &history).is_ok());
    }

    #[test]
    fn test_not_found_is_replayed_with_time() {
        let failed_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let log = AttemptLog::failed(&plate(), Endpoint::Regional, "Veículo não encontrado", ErrorClass::NotFound)
            .with_created_at(failed_at);
        let id = log.id;

        let err = check_history(&plate(), Endpoint::Regional, &[log]).unwrap_err();
        match err {
            ResolveError::RepeatedFailure {
                error_class,
                message,
                original_message,
                failed_at: replayed_at,
                attempt_log_id,
                ..
            } => {
                assert_eq!(error_class, ErrorClass::NotFound);
                assert!(message.contains("2024-03-01 12:30:00 UTC"));
                assert!(message.contains("region"));
                assert_eq!(original_message, "Veículo não encontrado");
                assert_eq!(replayed_at, failed_at);
                assert_eq!(attempt_log_id, id);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_newest_failure_is_replayed() {
        let now = Utc::now();
        let older = AttemptLog::failed(&plate(), Endpoint::National, "first", ErrorClass::ProviderFault)
            .with_created_at(now - Duration::days(3));
        let newer = AttemptLog::failed(&plate(), Endpoint::National, "second", ErrorClass::Unknown)
            .with_created_at(now - Duration::days(1));

        let err = check_history(&plate(), Endpoint::National, &[older, newer]).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::RepeatedFailure { ref message, error_class: ErrorClass::Unknown, .. } if message == "second"
        ));
    }

    #[test]
    fn test_failure_on_other_endpoint_is_ignored() {
        let history = vec![AttemptLog::failed(&plate(), Endpoint::National, "boom", ErrorClass::ProviderFault)];
        assert!(check_history(&plate(), Endpoint::Regional, &history).is_ok());
    }

    #[test]
    fn test_wrong_endpoint_wins_over_other_failures() {
        let now = Utc::now();
        let history = vec![
            AttemptLog::failed(&plate(), Endpoint::Regional, "timeout", ErrorClass::ProviderFault).with_created_at(now),
            AttemptLog::failed(&plate(), Endpoint::Regional, "outra UF", ErrorClass::WrongEndpoint)
                .with_created_at(now - Duration::days(2)),
        ];

        let err = check_history(&plate(), Endpoint::Regional, &history).unwrap_err();
        match err {
            ResolveError::WrongEndpoint {
                requested,
                suggested,
                message,
                conflicting_history,
            } => {
                assert_eq!(requested, Endpoint::Regional);
                assert_eq!(suggested, Endpoint::National);
                assert!(message.contains("national-registry"));
                assert!(!conflicting_history);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_oscillating_history_is_flagged() {
        let history = vec![
            AttemptLog::failed(&plate(), Endpoint::Regional, "outra UF", ErrorClass::WrongEndpoint),
            AttemptLog::failed(&plate(), Endpoint::National, "base estadual", ErrorClass::WrongEndpoint),
        ];

        for endpoint in Endpoint::ALL {
            let err = check_history(&plate(), endpoint, &history).unwrap_err();
            assert!(matches!(
                err,
                ResolveError::WrongEndpoint { conflicting_history: true, .. }
            ));
        }
    }

    #[test]
    fn test_other_queries_are_ignored() {
        let normalizer: QueryNormalizer = QueryNormalizer::default();
        let other = normalizer.normalize(QueryKind::Plate, "XYZ9876").unwrap();
        let history = vec![AttemptLog::failed(&other, Endpoint::Regional, "nope", ErrorClass::NotFound)];
        assert!(check_history(&plate(), Endpoint::Regional, &history).is_ok());
    }
}
