//! Resolve command implementation.

use crate::cli::ResolveArgs;
use crate::commands::open_store;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use regula_domain::Endpoint;
use regula_provider::{HttpRegistryProvider, RecordingProvider, RegistryRouter};
use regula_resolver::{LookupSettings, ResolveRequest, Resolver};
use std::sync::Arc;

/// Execute the resolve command.
pub async fn execute_resolve(args: ResolveArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let endpoint: Endpoint = args.endpoint.into();
    let request = build_request(&args);
    let settings = build_settings(&args, config, endpoint);

    let store = Arc::new(open_store(config)?);
    let provider = RecordingProvider::new(build_router(config)?, Arc::clone(&store));
    let resolver = Resolver::new(store, provider).with_config(&config.resolver);

    if args.dry_run {
        let decision = resolver.decide(&request, &settings)?;
        println!("{}", formatter.format_decision(&decision)?);
        return Ok(());
    }

    if config.endpoint(endpoint).is_none() {
        return Err(CliError::Config(format!(
            "No registry configured for {}; add an [endpoints.{}] section",
            endpoint,
            match endpoint {
                Endpoint::Regional => "regional",
                Endpoint::National => "national",
            }
        )));
    }

    let outcome = resolver.resolve(&request, &settings).await;
    resolver.provider().flush().await;

    let result = outcome?;
    println!("{}", formatter.format_result(&result)?);
    Ok(())
}

fn build_request(args: &ResolveArgs) -> ResolveRequest {
    let endpoint = args.endpoint.into();
    let request = match args.kind {
        Some(kind) => ResolveRequest::new(kind.into(), args.value.clone(), endpoint),
        None => ResolveRequest::inferred(args.value.clone(), endpoint),
    };
    match &args.region {
        Some(region) => request.with_region(region.clone()),
        None => request,
    }
}

fn build_settings(args: &ResolveArgs, config: &Config, endpoint: Endpoint) -> LookupSettings {
    let mut settings = LookupSettings::from_config(&config.resolver);
    if let Some(ttl_days) = args.ttl_days {
        settings.ttl_days = ttl_days;
    }
    if let Some(credentials) = config.endpoint(endpoint).and_then(|e| e.credentials()) {
        settings = settings.with_credentials(credentials);
    }
    settings
}

/// One HTTP provider per configured endpoint
fn build_router(config: &Config) -> Result<RegistryRouter<HttpRegistryProvider>> {
    let mut router = RegistryRouter::new();
    for endpoint in Endpoint::ALL {
        if let Some(settings) = config.endpoint(endpoint) {
            let provider = HttpRegistryProvider::new(settings.base_url.clone(), settings.timeout())?;
            router = router.with_route(endpoint, provider);
        }
    }
    Ok(router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{EndpointArg, KindArg};
    use crate::config::{EndpointSettings, OutputFormat};
    use regula_domain::traits::{AttemptLogStore, AttemptLogWriter};
    use regula_domain::{AttemptLog, ErrorClass, QueryKind, QueryNormalizer};
    use regula_resolver::ResolveError;

    fn args(value: &str, endpoint: EndpointArg) -> ResolveArgs {
        ResolveArgs {
            kind: Some(KindArg::Plate),
            value: value.to_string(),
            endpoint,
            region: Some("SP".to_string()),
            ttl_days: None,
            dry_run: false,
        }
    }

    fn config_in(dir: &tempfile::TempDir) -> Config {
        let mut config = Config::default();
        config.store.path = Some(dir.path().join("attempts.db"));
        // Nothing listens on the discard port; any real call fails fast
        config.endpoints.regional = Some(EndpointSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: Some("secret".to_string()),
            timeout_secs: 2,
        });
        config
    }

    #[test]
    fn test_settings_override_ttl_and_pick_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let mut resolve_args = args("ABC1234", EndpointArg::Regional);
        resolve_args.ttl_days = Some(0);

        let settings = build_settings(&resolve_args, &config, Endpoint::Regional);
        assert_eq!(settings.ttl_days, 0);
        assert!(settings.credentials.is_some());

        let national = build_settings(&resolve_args, &config, Endpoint::National);
        assert!(national.credentials.is_none());
    }

    #[test]
    fn test_request_carries_region() {
        let request = build_request(&args("abc-1234", EndpointArg::Regional));
        assert_eq!(request.kind, Some(QueryKind::Plate));
        assert_eq!(request.region_hint.as_deref(), Some("SP"));
    }

    #[tokio::test]
    async fn test_memoized_failure_makes_no_call() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        let normalizer: QueryNormalizer = QueryNormalizer::default();
        let query = normalizer.normalize(QueryKind::Plate, "ABC1234").unwrap();
        open_store(&config)
            .unwrap()
            .append(AttemptLog::failed(&query, Endpoint::Regional, "Veículo não encontrado", ErrorClass::NotFound))
            .unwrap();

        let formatter = Formatter::new(OutputFormat::Table, false);
        let result = execute_resolve(args("ABC1234", EndpointArg::Regional), &config, &formatter).await;
        assert!(matches!(
            result,
            Err(CliError::Resolve(ResolveError::RepeatedFailure { .. }))
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let formatter = Formatter::new(OutputFormat::Table, false);

        let result = execute_resolve(args("ABC1234", EndpointArg::National), &config, &formatter).await;
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[tokio::test]
    async fn test_dry_run_needs_no_registry() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let formatter = Formatter::new(OutputFormat::Json, false);

        let mut resolve_args = args("ABC1234", EndpointArg::National);
        resolve_args.dry_run = true;
        assert!(execute_resolve(resolve_args, &config, &formatter).await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_registry_can_be_retried() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let formatter = Formatter::new(OutputFormat::Table, false);

        let first = execute_resolve(args("XYZ9876", EndpointArg::Regional), &config, &formatter).await;
        assert!(matches!(first, Err(CliError::Resolve(ResolveError::ProviderFailure { .. }))));

        // Nothing reached the registry, so nothing was logged and the retry calls out again
        let logged = open_store(&config).unwrap().find_attempts(QueryKind::Plate, "XYZ9876").unwrap();
        assert!(logged.is_empty());

        let second = execute_resolve(args("XYZ9876", EndpointArg::Regional), &config, &formatter).await;
        assert!(matches!(second, Err(CliError::Resolve(ResolveError::ProviderFailure { .. }))));
    }
}
