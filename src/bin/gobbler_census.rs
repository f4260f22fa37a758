use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use gobbler_census::app::{AnalyzeOptions, Analyzer, App};
use gobbler_census::config::{ConfigLoader, ResolvedConfig};
use gobbler_census::domain::QueryKind;
use gobbler_census::error::CensusError;
use gobbler_census::metadata::MetadataHttpClient;
use gobbler_census::output::{JsonOutput, OutputMode, TextOutput};
use gobbler_census::snapshot::read_snapshot;
use gobbler_census::supply::SupplyHttpClient;

#[derive(Parser)]
#[command(name = "gobbler-census")]
#[command(about = "Build metadata snapshots of a collectible collection and analyze them")]
#[command(version, author)]
struct Cli {
    /// Config file (defaults to census.json when present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Snapshot every token from 0 through END_ID")]
    Snapshot(SnapshotArgs),
    #[command(about = "Snapshot every token below the current total supply")]
    SnapshotSupply,
    #[command(about = "Run queries over a saved snapshot")]
    Analyze(AnalyzeArgs),
}

#[derive(Args)]
struct SnapshotArgs {
    end_id: u64,
}

#[derive(Args)]
struct AnalyzeArgs {
    file: Utf8PathBuf,

    /// Queries to run (repeatable); defaults to the configured set
    #[arg(long = "query", value_enum)]
    queries: Vec<QueryKind>,

    /// Generation used by the per-generation queries
    #[arg(long)]
    generation: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("program failed with error: {report:?}");
        if let Some(error) = report.downcast_ref::<CensusError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CensusError) -> u8 {
    match error {
        CensusError::ConfigRead(_)
        | CensusError::ConfigParse(_)
        | CensusError::MissingSupplyEndpoint
        | CensusError::MissingApiKey(_) => 2,
        CensusError::MetadataHttp(_)
        | CensusError::MetadataStatus { .. }
        | CensusError::SupplyHttp(_)
        | CensusError::SupplyStatus { .. }
        | CensusError::SupplyField(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };
    let config = ConfigLoader::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Snapshot(args) => run_snapshot(Some(args.end_id), &config, output_mode),
        Commands::SnapshotSupply => run_snapshot(None, &config, output_mode),
        Commands::Analyze(args) => run_analyze(args, &config, output_mode),
    }
}

fn run_snapshot(
    end_id: Option<u64>,
    config: &ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let metadata = MetadataHttpClient::new(&config.metadata_base_url, config.timeout)?;
    let app = App::new(metadata, config.snapshot_dir.clone());
    let today = chrono::Utc::now().date_naive();

    let result = match end_id {
        Some(end_id) => app.snapshot_through(end_id, today)?,
        None => {
            let endpoint = config
                .supply
                .as_ref()
                .ok_or(CensusError::MissingSupplyEndpoint)?;
            let supply = SupplyHttpClient::new(
                &endpoint.url,
                &endpoint.field,
                endpoint.api_key()?,
                config.timeout,
            )?;
            app.snapshot_supply(&supply, today)?
        }
    };

    match output_mode {
        OutputMode::Json => JsonOutput::print_snapshot(&result).into_diagnostic(),
        OutputMode::Text => TextOutput::print_snapshot(&result).into_diagnostic(),
    }
}

fn run_analyze(
    args: AnalyzeArgs,
    config: &ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let records = read_snapshot(&args.file)?;
    let analyzer = Analyzer::new(&records);
    let options = AnalyzeOptions {
        watch_list: config.watch_list.clone(),
        lineage_checks: config.lineage_checks.clone(),
        focus_generation: args
            .generation
            .unwrap_or_else(|| config.focus_generation.clone()),
    };
    let queries = if args.queries.is_empty() {
        config.queries.clone()
    } else {
        args.queries
    };

    let outcomes: Vec<_> = queries
        .into_iter()
        .map(|kind| {
            tracing::info!(query = %kind, "running query");
            analyzer.run(kind, &options)
        })
        .collect();

    match output_mode {
        OutputMode::Json => JsonOutput::print_outcomes(&outcomes).into_diagnostic(),
        OutputMode::Text => TextOutput::print_outcomes(&outcomes).into_diagnostic(),
    }
}
