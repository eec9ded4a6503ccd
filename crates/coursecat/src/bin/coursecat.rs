use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use coursecat::config::{load_config, Config};
use coursecat::course::CourseRecord;
use coursecat::logging::init_tracing;
use coursecat::pipeline::{FnProgress, Pipeline, PipelineConfig, ProgressSnapshot, RunController};
use coursecat::{HttpCategoryService, SqliteCourseStore};

#[derive(Parser, Debug)]
#[command(
    name = "coursecat",
    version,
    about = "Categorize course records with a remote categorization service"
)]
struct Cli {
    /// Path to the JSON config file. Built-in defaults apply when omitted.
    #[arg(long, global = true, env = "COURSECAT_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Categorize every uncategorized record.
    Run,
    /// Suggest categories for a small sample without writing anything.
    Preview {
        /// Number of records to sample.
        #[arg(long)]
        sample: Option<usize>,
    },
    /// Print category counts for the whole collection.
    Stats,
    /// Rewrite categories that are not in the allowed list.
    Validate,
    /// Load course records from a JSON array file.
    Import { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    let db_path = config
        .resolved_database_path()
        .context("Could not determine the database path")?;
    let store = SqliteCourseStore::open(&db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    match cli.command {
        Command::Import { file } => {
            let imported = import_courses(&store, &file)?;
            let total = store.count().context("Failed to count course records")?;
            print_json(&serde_json::json!({ "imported": imported, "total": total }))?;
        }
        Command::Run => {
            let pipeline = build_pipeline(&config, store)?;
            let controller = RunController::new();
            let handle = controller.clone();
            ctrlc::set_handler(move || {
                eprintln!("Cancelling after the current record...");
                handle.cancel();
            })
            .context("Failed to install Ctrl-C handler")?;

            let progress = FnProgress(print_progress);
            let result = pipeline
                .run_categorization(&progress, &pipeline.config().retry, &controller)
                .await?;
            print_json(&result)?;
            if !result.success {
                bail!(
                    "{} of {} processed records failed",
                    result.failed,
                    result.processed
                );
            }
        }
        Command::Preview { sample } => {
            let pipeline = build_pipeline(&config, store)?;
            let sample = sample.unwrap_or(pipeline.config().preview_sample_size);
            print_json(&pipeline.preview_categorization(sample).await?)?;
        }
        Command::Stats => {
            let pipeline = build_pipeline(&config, store)?;
            print_json(&pipeline.category_statistics().await?)?;
        }
        Command::Validate => {
            let pipeline = build_pipeline(&config, store)?;
            print_json(&pipeline.validate_categories().await?)?;
        }
    }

    Ok(())
}

fn build_pipeline(config: &Config, store: SqliteCourseStore) -> Result<Pipeline> {
    let service = HttpCategoryService::new(
        config.endpoint.url.clone(),
        Duration::from_secs(config.endpoint.timeout_secs),
    )
    .context("Failed to build HTTP client")?;
    info!(endpoint = service.url(), "Using categorization endpoint");
    let pipeline_config = PipelineConfig::from_config(config)?;

    Ok(Pipeline::new(
        Arc::new(store),
        Arc::new(service),
        Arc::new(pipeline_config),
    ))
}

fn import_courses(store: &SqliteCourseStore, file: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let records: Vec<CourseRecord> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse course records from {}", file.display()))?;

    for record in &records {
        store
            .upsert(record)
            .with_context(|| format!("Failed to import course '{}'", record.id))?;
    }
    Ok(records.len())
}

fn print_progress(snapshot: ProgressSnapshot) {
    let eta = snapshot
        .estimated_millis_remaining
        .map(|ms| format!(", ~{}s left", ms / 1000))
        .unwrap_or_default();
    eprintln!(
        "[{}/{}] categorized={} failed={} skipped={}{}{}",
        snapshot.processed,
        snapshot.total,
        snapshot.categorized,
        snapshot.failed,
        snapshot.skipped,
        eta,
        snapshot
            .current_item_label
            .map(|label| format!(" ({})", label))
            .unwrap_or_default(),
    );
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
