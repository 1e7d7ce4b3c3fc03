//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use regula_domain::{Endpoint, QueryKind};
use std::path::PathBuf;

/// Regula CLI - Resolve vehicle identifiers against registries, with caching.
#[derive(Debug, Parser)]
#[command(name = "regula")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "REGULA_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve an identifier, from cache when possible
    Resolve(ResolveArgs),

    /// Show recorded attempts for an identifier
    History(HistoryArgs),

    /// Show which kind an identifier would be treated as
    Infer(InferArgs),
}

/// Arguments for the resolve command.
#[derive(Debug, Parser)]
pub struct ResolveArgs {
    /// Identifier kind (inferred from the value when omitted)
    #[arg(short, long, value_enum)]
    pub kind: Option<KindArg>,

    /// Identifier value
    #[arg(short, long)]
    pub value: String,

    /// Registry to resolve against
    #[arg(short, long, value_enum)]
    pub endpoint: EndpointArg,

    /// Region (state code) forwarded to the registry
    #[arg(short, long)]
    pub region: Option<String>,

    /// Cache TTL in days (0 disables the cache); overrides the config file
    #[arg(long)]
    pub ttl_days: Option<u32>,

    /// Only report what would happen; never calls the registry
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the history command.
#[derive(Debug, Parser)]
pub struct HistoryArgs {
    /// Identifier kind (inferred from the value when omitted)
    #[arg(short, long, value_enum)]
    pub kind: Option<KindArg>,

    /// Identifier value
    #[arg(short, long)]
    pub value: String,
}

/// Arguments for the infer command.
#[derive(Debug, Parser)]
pub struct InferArgs {
    /// Raw identifier
    pub value: String,
}

/// Identifier kind argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum KindArg {
    /// Vehicle chassis number (VIN)
    #[value(aliases = ["chassi", "vin"])]
    Chassis,
    /// License plate
    #[value(alias = "placa")]
    Plate,
    /// National registration number
    Renavam,
}

/// Registry argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum EndpointArg {
    /// State-level registry
    #[value(alias = "estadual")]
    Regional,
    /// Federal registry
    #[value(alias = "nacional")]
    National,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}

impl From<KindArg> for QueryKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Chassis => QueryKind::Chassis,
            KindArg::Plate => QueryKind::Plate,
            KindArg::Renavam => QueryKind::Renavam,
        }
    }
}

impl From<EndpointArg> for Endpoint {
    fn from(endpoint: EndpointArg) -> Self {
        match endpoint {
            EndpointArg::Regional => Endpoint::Regional,
            EndpointArg::National => Endpoint::National,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_command() {
        let cli = Cli::parse_from([
            "regula",
            "resolve",
            "--kind",
            "chassis",
            "--value",
            "9BWZZZ377VT004251",
            "--endpoint",
            "regional",
            "--ttl-days",
            "7",
        ]);
        match cli.command {
            Command::Resolve(args) => {
                assert!(matches!(args.kind, Some(KindArg::Chassis)));
                assert!(matches!(args.endpoint, EndpointArg::Regional));
                assert_eq!(args.ttl_days, Some(7));
                assert!(!args.dry_run);
            }
            _ => panic!("Expected Resolve command"),
        }
    }

    #[test]
    fn test_kind_aliases() {
        let cli = Cli::parse_from(["regula", "history", "--kind", "placa", "--value", "ABC1234"]);
        match cli.command {
            Command::History(args) => assert!(matches!(args.kind, Some(KindArg::Plate))),
            _ => panic!("Expected History command"),
        }
    }

    #[test]
    fn test_global_format() {
        let cli = Cli::parse_from(["regula", "infer", "ABC1234", "--format", "json"]);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert!(matches!(cli.command, Command::Infer(_)));
    }

    #[test]
    fn test_endpoint_is_required() {
        assert!(Cli::try_parse_from(["regula", "resolve", "--value", "ABC1234"]).is_err());
    }

    #[test]
    fn test_conversions() {
        assert_eq!(QueryKind::from(KindArg::Renavam), QueryKind::Renavam);
        assert_eq!(Endpoint::from(EndpointArg::National), Endpoint::National);
    }
}
