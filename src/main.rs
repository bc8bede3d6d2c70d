use a11yscan::batch::worker::{ArtifactLayout, InProcessRunner, JobRunner, ProcessRunner};
use a11yscan::cli::{
    Cli, Commands, EXIT_BATCH_FAILED, EXIT_CLEAN, EXIT_ERROR, EXIT_VIOLATIONS, InitArgs,
    ScanArgs, ScanParallelArgs, SuggestArgs,
};
use a11yscan::config::{Config, RunnerKind};
use a11yscan::render::{self, ReportFormat};
use a11yscan::{batch, rule, scan};
use anyhow::Context;
use clap::{CommandFactory, Parser};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cli.log_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            EXIT_ERROR
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Scan(args) => scan(args),
        Commands::ScanParallel(args) => scan_parallel(args, &cli.config).await,
        Commands::Suggest(args) => suggest(args),
        Commands::Rules => {
            for detector in rule::CATALOG {
                for id in detector.ids {
                    println!("{:<36} {:<14} {}", id, detector.group.as_str(), detector.name);
                }
            }
            Ok(EXIT_CLEAN)
        }
        Commands::Schema => {
            println!("{}", render::structured_schema()?);
            Ok(EXIT_CLEAN)
        }
        Commands::Init(args) => init(args, &cli.config),
    }
}

fn scan(args: ScanArgs) -> anyhow::Result<i32> {
    let Some(file) = args.file else {
        let mut command = Cli::command();
        if let Some(scan) = command.find_subcommand_mut("scan") {
            scan.print_help()?;
        }
        return Ok(EXIT_CLEAN);
    };

    let result = match scan::scan_file(&file) {
        Ok(result) => result,
        Err(e) => {
            error!("{}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let format = if args.structured {
        ReportFormat::Structured
    } else {
        ReportFormat::Human
    };
    println!("{}", render::render(&result, format)?);

    Ok(if result.has_violations() {
        EXIT_VIOLATIONS
    } else {
        EXIT_CLEAN
    })
}

async fn scan_parallel(args: ScanParallelArgs, config_path: &Path) -> anyhow::Result<i32> {
    let config = Config::load_or_default(config_path)?;
    debug!("Loaded config: {:?}", config);

    let files = batch::orchestrator::filter_excluded(args.files, &config.batch.exclude);

    let artifacts = ArtifactLayout::new(&args.artifact_dir);
    artifacts.prepare().with_context(|| {
        format!(
            "Failed to create artifact directory {}",
            args.artifact_dir.display()
        )
    })?;

    let runner: Arc<dyn JobRunner> = match args.runner.unwrap_or(config.batch.runner) {
        RunnerKind::InProcess => Arc::new(InProcessRunner),
        RunnerKind::Process => {
            Arc::new(ProcessRunner::current_exe().context("Failed to locate current executable")?)
        }
    };

    let summary =
        batch::orchestrator::run(files, args.concurrency, runner, Arc::new(artifacts)).await;
    info!("Artifacts written to {}", args.artifact_dir.display());

    Ok(if summary.is_success() {
        EXIT_CLEAN
    } else {
        EXIT_BATCH_FAILED
    })
}

fn suggest(args: SuggestArgs) -> anyhow::Result<i32> {
    let Some(fix) = rule::fix::suggest_fix(&args.rule_id, &args.code) else {
        error!(
            "Unknown rule id '{}' (see `a11yscan rules`)",
            args.rule_id
        );
        return Ok(EXIT_ERROR);
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&fix)?);
    } else {
        if let Some(fixed) = &fix.fixed_code {
            println!("Fixed code:\n{}\n", fixed);
        }
        println!("Suggestions:");
        for suggestion in &fix.suggestions {
            println!("  - {}", suggestion);
        }
    }
    Ok(EXIT_CLEAN)
}

fn init(args: InitArgs, config_path: &Path) -> anyhow::Result<i32> {
    if config_path.exists() && !args.r#override {
        error!(
            "Config file already exists: {} (use --override to replace it)",
            config_path.display()
        );
        return Ok(EXIT_ERROR);
    }

    std::fs::write(config_path, Config::default().to_toml()?)
        .with_context(|| format!("Failed to write config {}", config_path.display()))?;
    info!("Config written to {}", config_path.display());
    Ok(EXIT_CLEAN)
}
