// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

mod settings;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use serde::Deserialize;
use serde_json::Value;
use settings::Settings;
use st_metrics::{AttributionMetric, MetricAccumulator, MetricValue, Target};
use st_opinfo::{catalog, DTypeFormat, ImplyType, OperatorRegistry};
use std::error::Error;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

type DynError = Box<dyn Error>;

type Result<T> = std::result::Result<T, DynError>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Operator descriptor registry and attribution metric tooling for SpiralTorch"
)]
struct Cli {
    /// Directory holding base.toml / site.toml / run.json
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    config_root: Option<PathBuf>,

    /// Additional op-info catalog (JSON) to register; may be repeated
    #[arg(long, global = true, action = ArgAction::Append, value_hint = ValueHint::FilePath)]
    catalog: Vec<PathBuf>,

    /// Skip the built-in AiCPU catalog regardless of configuration
    #[arg(long, global = true)]
    no_builtin: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect the operator registry
    #[command(subcommand)]
    Ops(OpsCommand),

    /// Aggregate attribution metric results
    #[command(subcommand)]
    Metrics(MetricsCommand),
}

#[derive(Subcommand)]
enum OpsCommand {
    /// List registered operator names, sorted
    List(ListArgs),

    /// Print the op-info record of one operator
    Show(ShowArgs),

    /// Pick the kernel row matching the given input dtype/format pairs
    Select(SelectArgs),

    /// Write every registered descriptor as a JSON catalog
    Export(ExportArgs),
}

#[derive(Args)]
struct ListArgs {
    /// Only list operators of this implementation type (AiCPU, TBE, ...)
    #[arg(long)]
    imply_type: Option<String>,
}

#[derive(Args)]
struct ShowArgs {
    name: String,
}

#[derive(Args)]
struct SelectArgs {
    name: String,

    /// Input pair in short notation (e.g. F32_Default); `_` leaves an
    /// optional input unspecified
    #[arg(long = "input", action = ArgAction::Append)]
    inputs: Vec<String>,
}

#[derive(Args)]
struct ExportArgs {
    #[arg(long, value_hint = ValueHint::FilePath)]
    output: PathBuf,
}

#[derive(Subcommand)]
enum MetricsCommand {
    /// Aggregate `[{"result": .., "target": ..}]` samples per label
    Summarize(SummarizeArgs),
}

#[derive(Args)]
struct SummarizeArgs {
    /// JSON array of samples
    #[arg(long, value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Number of class labels; falls back to `[metrics] num_labels`
    #[arg(long)]
    num_labels: Option<usize>,

    /// Explainer name recorded in the summary
    #[arg(long)]
    explainer: Option<String>,

    /// Write the summary here instead of STDOUT
    #[arg(long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

#[derive(Deserialize)]
struct Sample {
    result: Value,
    target: Value,
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    spiral_config::tracing::init_tracing()?;
    let settings = Settings::load(cli.config_root.as_deref())?;
    let outcome = match &cli.command {
        Command::Ops(command) => {
            let registry = build_registry(&cli, &settings)?;
            run_ops(&registry, command)
        }
        Command::Metrics(MetricsCommand::Summarize(args)) => run_summarize(args, &settings),
    };
    spiral_config::tracing::flush_chrome_trace();
    outcome
}

fn build_registry(cli: &Cli, settings: &Settings) -> Result<OperatorRegistry> {
    let registry = OperatorRegistry::new();
    if settings.opinfo.builtin_catalog && !cli.no_builtin {
        catalog::register_aicpu(&registry)?;
    }
    for path in settings.opinfo.catalogs.iter().chain(&cli.catalog) {
        let data = fs::read_to_string(path)?;
        let handles = registry.load_catalog(&data)?;
        debug!(path = %path.display(), operators = handles.len(), "registered catalog file");
    }
    if settings.opinfo.seal {
        registry.seal();
    }
    Ok(registry)
}

fn run_ops(registry: &OperatorRegistry, command: &OpsCommand) -> Result<()> {
    match command {
        OpsCommand::List(args) => {
            let names: Vec<String> = match &args.imply_type {
                Some(raw) => {
                    let imply_type: ImplyType = raw.parse()?;
                    registry
                        .find_by_imply_type(imply_type)
                        .iter()
                        .map(|handle| handle.name().to_string())
                        .collect()
                }
                None => registry.names(),
            };
            for name in names {
                println!("{name}");
            }
            Ok(())
        }
        OpsCommand::Show(args) => {
            let handle = registry.lookup(&args.name)?;
            println!("{}", handle.to_json_pretty()?);
            Ok(())
        }
        OpsCommand::Select(args) => {
            let inputs = parse_inputs(&args.inputs)?;
            let selection = registry.select(&args.name, &inputs)?;
            info!(
                op = %selection.op_name,
                row = selection.combination_index,
                "selected kernel row"
            );
            println!("{}", serde_json::to_string_pretty(&selection)?);
            Ok(())
        }
        OpsCommand::Export(args) => {
            ensure_parent_dir(&args.output)?;
            fs::write(&args.output, registry.to_catalog_json()?)?;
            info!(
                path = %args.output.display(),
                operators = registry.len(),
                "exported operator catalog"
            );
            Ok(())
        }
    }
}

fn parse_inputs(raw: &[String]) -> Result<Vec<Option<DTypeFormat>>> {
    raw.iter()
        .map(|input| match input.trim() {
            "_" => Ok(None),
            pair => pair.parse::<DTypeFormat>().map(Some).map_err(DynError::from),
        })
        .collect()
}

fn run_summarize(args: &SummarizeArgs, settings: &Settings) -> Result<()> {
    let num_labels = args
        .num_labels
        .or(settings.metrics.num_labels)
        .ok_or_else(|| {
            io::Error::new(
                ErrorKind::InvalidInput,
                "--num-labels is required when [metrics] num_labels is not configured",
            )
        })?;

    let samples: Vec<Sample> = serde_json::from_str(&fs::read_to_string(&args.input)?)?;
    let mut metric = MetricAccumulator::new(num_labels)?;
    if let Some(explainer) = &args.explainer {
        metric.record_explainer(explainer);
    }
    for (position, sample) in samples.iter().enumerate() {
        let result = MetricValue::try_from(&sample.result)
            .map_err(|err| format!("sample {position}: {err}"))?;
        let target = Target::from_json(&sample.target, num_labels)
            .map_err(|err| format!("sample {position}: {err}"))?;
        metric
            .aggregate(result, target)
            .map_err(|err| format!("sample {position}: {err}"))?;
    }
    info!(
        samples = metric.sample_count(),
        num_labels, "aggregated metric results"
    );

    let payload = serde_json::to_string_pretty(&metric.summary())?;
    match &args.output {
        Some(path) => {
            ensure_parent_dir(path)?;
            fs::write(path, payload)?;
        }
        None => println!("{payload}"),
    }
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
