use std::num::{NonZeroU64, NonZeroUsize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::Serialize;

use cwas_batch::config::{DispatchConfig, PathsConfig};
use cwas_batch::logging::init_logging;
use cwas_batch::scheduler::job::DEFAULT_VEP;
use cwas_batch::scheduler::window::DEFAULT_END_IDX;
use cwas_batch::scheduler::{JobBuilder, JobSource, JobTemplate, ToolMode, Window};
use cwas_batch::worker::{Dispatcher, RunSummary};

#[derive(Parser, Debug)]
#[command(name = "cwas-batch")]
#[command(version)]
#[command(about = "Run CWAS annotation or categorization over a directory of VCFs")]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Annotate every VCF in a directory with VEP
    Annotate {
        #[command(flatten)]
        batch: BatchArgs,

        /// Path of the VEP executable passed to the annotator
        #[arg(long, default_value = DEFAULT_VEP)]
        vep: PathBuf,
    },

    /// Categorize every annotated VCF in a directory
    Categorize {
        #[command(flatten)]
        batch: BatchArgs,
    },
}

// =============================================================================
// Batch Arguments (shared by both tools)
// =============================================================================

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Directory of input VCFs
    #[arg(short = 'i', long = "in_dir")]
    in_dir: PathBuf,

    /// Directory of output files (created if missing)
    #[arg(short = 'o', long = "out_dir")]
    out_dir: PathBuf,

    /// Number of jobs to run at once
    #[arg(short = 'p', long = "num_proc", default_value = "1")]
    num_proc: NonZeroUsize,

    /// Start index of the sorted input list (0-based, inclusive)
    #[arg(long = "start_idx", default_value = "0", allow_negative_numbers = true)]
    start_idx: i64,

    /// End index of the sorted input list (exclusive)
    #[arg(long = "end_idx", default_value_t = DEFAULT_END_IDX, allow_negative_numbers = true)]
    end_idx: i64,

    /// Tool executable; overrides the paths file
    #[arg(long)]
    tool: Option<PathBuf>,

    /// YAML file with tool paths (default: ../conf/cwas_paths.yaml)
    #[arg(long)]
    paths_config: Option<PathBuf>,

    /// Kill a job that runs longer than this many seconds (at least 1)
    #[arg(long)]
    timeout_secs: Option<NonZeroU64>,

    /// Format of the final summary
    #[arg(long, default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

// =============================================================================
// JSON Output Types
// =============================================================================

#[derive(Serialize)]
struct RunSummaryOutput {
    total: usize,
    completed: usize,
    failed: usize,
    timed_out: usize,
    jobs: Vec<JobResultOutput>,
}

#[derive(Serialize)]
struct JobResultOutput {
    input: String,
    output: String,
    command: String,
    status: String,
    exit_code: Option<i32>,
    error: Option<String>,
    started_at: String,
    finished_at: String,
}

impl From<&RunSummary> for RunSummaryOutput {
    fn from(summary: &RunSummary) -> Self {
        Self {
            total: summary.total(),
            completed: summary.completed(),
            failed: summary.failed(),
            timed_out: summary.timed_out(),
            jobs: summary
                .results()
                .iter()
                .map(|r| JobResultOutput {
                    input: r.job.input_path().display().to_string(),
                    output: r.job.output_path().display().to_string(),
                    command: r.job.command().to_string(),
                    status: r.status.to_string(),
                    exit_code: r.exit_code,
                    error: r.error.clone(),
                    started_at: r.started_at.to_rfc3339(),
                    finished_at: r.finished_at.to_rfc3339(),
                })
                .collect(),
        }
    }
}

fn resolve_tool(
    batch: &BatchArgs,
    mode: &ToolMode,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(tool) = &batch.tool {
        return Ok(tool.clone());
    }

    let config_path = match &batch.paths_config {
        Some(path) => path.clone(),
        None => PathsConfig::default_path()?,
    };
    tracing::debug!(path = %config_path.display(), "Loading tool paths");
    let paths = PathsConfig::load(&config_path)?;
    Ok(paths.tool(mode.config_key())?.to_path_buf())
}

fn prepare_out_dir(out_dir: &Path) -> std::io::Result<()> {
    if !out_dir.is_dir() {
        tracing::info!(path = %out_dir.display(), "Creating output directory");
    }
    std::fs::create_dir_all(out_dir)
}

fn print_summary(
    summary: &RunSummary,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&RunSummaryOutput::from(summary))?);
        }
        OutputFormat::Table => {
            println!("{:<10} {:<6} INPUT", "STATUS", "EXIT");
            for r in summary.results() {
                let exit = r
                    .exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<10} {:<6} {}", r.status, exit, r.job.input_path().display());
            }
            println!(
                "\n{} jobs: {} completed, {} failed, {} timed out",
                summary.total(),
                summary.completed(),
                summary.failed(),
                summary.timed_out()
            );
        }
    }
    Ok(())
}

async fn run_batch(batch: BatchArgs, mode: ToolMode) -> Result<(), Box<dyn std::error::Error>> {
    // Everything that can fail on configuration happens before the first job starts
    let tool = resolve_tool(&batch, &mode)?;
    let template = JobTemplate::new(tool, mode)?;
    let window = Window::new(batch.start_idx, batch.end_idx)?;

    let inputs = JobSource::new(&batch.in_dir).scan()?;
    let builder = JobBuilder::new(template, &batch.out_dir);
    let jobs = window.select(builder.build_all(&inputs)?);
    tracing::info!(
        found = inputs.len(),
        selected = jobs.len(),
        start = window.start(),
        end = window.end(),
        "Built job list"
    );

    prepare_out_dir(&batch.out_dir)?;

    let mut config = DispatchConfig::new(batch.num_proc);
    if let Some(secs) = batch.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs.get()));
    }

    let summary = Dispatcher::new(config).run(jobs).await;
    print_summary(&summary, &batch.output)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    init_logging();

    let result = match args.command {
        Commands::Annotate { batch, vep } => run_batch(batch, ToolMode::Annotate { vep }).await,
        Commands::Categorize { batch } => run_batch(batch, ToolMode::Categorize).await,
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Batch run aborted");
    }
    result
}
