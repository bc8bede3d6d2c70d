use crate::config::RunnerKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

// Display order for log level option (placed at end of help text)
const LOG_LEVEL_DISPLAY_ORDER: usize = 100;

/// Scan found nothing, or batch had no failed job
pub const EXIT_CLEAN: i32 = 0;
/// Execution error: unreadable file, bad config, unknown rule id
pub const EXIT_ERROR: i32 = 1;
/// Scan found at least one violation
pub const EXIT_VIOLATIONS: i32 = 3;
/// At least one batch job failed
pub const EXIT_BATCH_FAILED: i32 = 3;

/// CLI arguments
#[derive(Parser)]
#[command(name = "a11yscan", version, about = "Accessibility violation scanner for markup, components and stylesheets", long_about = None)]
pub struct Cli {
    /// Log level (see https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
    /// [env: A11YSCAN_LOG=] [default: info]
    #[arg(
        long,
        env = "A11YSCAN_LOG",
        default_value = "info",
        global = true,
        hide_default_value = true,
        hide_env = true,
        display_order = LOG_LEVEL_DISPLAY_ORDER,
        verbatim_doc_comment
    )]
    pub log_level: String,

    /// Path to config file (initialize with `a11yscan init`)
    #[arg(long, default_value = "a11yscan.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Scan one file and print its report
    Scan(ScanArgs),
    /// Scan many files concurrently, writing per-file report artifacts
    ScanParallel(ScanParallelArgs),
    /// Suggest a fix for a rule id and offending code
    Suggest(SuggestArgs),
    /// List the detector catalog
    Rules,
    /// Print the JSON schema of the structured report
    Schema,
    /// Initialize a default a11yscan.toml config file
    Init(InitArgs),
}

/// Arguments for the scan command
#[derive(Parser, Debug)]
pub struct ScanArgs {
    /// File to scan (prints usage when omitted)
    pub file: Option<PathBuf>,

    /// Print the structured JSON report instead of the human report
    #[arg(long)]
    pub structured: bool,
}

/// Arguments for the scan-parallel command
#[derive(Parser, Debug)]
pub struct ScanParallelArgs {
    /// Maximum number of jobs running at once
    #[arg(value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub concurrency: usize,

    /// Directory receiving <name>.json and reports/<name>.txt artifacts
    pub artifact_dir: PathBuf,

    /// Files to scan
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// How each job produces its reports [default: from config]
    #[arg(long, value_enum)]
    pub runner: Option<RunnerKind>,
}

/// Arguments for the suggest command
#[derive(Parser, Debug)]
pub struct SuggestArgs {
    /// Rule id, as listed by `a11yscan rules`
    pub rule_id: String,

    /// Offending code excerpt
    pub code: String,

    /// Print the suggestion as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Override existing config file
    #[arg(long)]
    pub r#override: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_scan_parallel_args() {
        let cli = Cli::try_parse_from([
            "a11yscan",
            "scan-parallel",
            "4",
            "out",
            "a.html",
            "b.css",
            "--runner",
            "process",
        ])
        .unwrap();
        let Commands::ScanParallel(args) = cli.command else {
            panic!("expected scan-parallel");
        };
        assert_eq!(args.concurrency, 4);
        assert_eq!(args.artifact_dir, PathBuf::from("out"));
        assert_eq!(args.files.len(), 2);
        assert_eq!(args.runner, Some(RunnerKind::Process));
    }

    #[test]
    fn test_scan_parallel_requires_files() {
        let err = Cli::try_parse_from(["a11yscan", "scan-parallel", "2", "out"])
            .err()
            .unwrap();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_scan_parallel_rejects_zero_concurrency() {
        assert!(Cli::try_parse_from(["a11yscan", "scan-parallel", "0", "out", "a.css"]).is_err());
    }

    #[test]
    fn test_scan_file_is_optional() {
        let cli = Cli::try_parse_from(["a11yscan", "scan"]).unwrap();
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert!(args.file.is_none());
        assert!(!args.structured);
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "a11yscan",
            "rules",
            "--config",
            "custom.toml",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert_eq!(cli.log_level, "debug");
    }
}
