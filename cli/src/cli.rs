use crate::progress::ExportProgress;
use raindump::api::RaindropApi;
use raindump::client::{HttpTransport, ResilientClient};
use raindump::config::{self, Config};
use raindump::error::Result;
use raindump::pipeline::{self, RunOptions, RunSummary};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None, disable_version_flag = true)]
pub struct Cli {
    /// Show the program version and exit
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Optional custom configuration file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory to write collections.csv and bookmarks.csv into
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Show debug information
    #[arg(short = 'g', long = "debug")]
    pub debug: bool,
}

/// Resolve configuration: file (explicit or default), then env overrides, then flags
pub fn load_config(args: &Cli) -> Result<Config> {
    let cfg = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load(),
    };
    let mut cfg = cfg.apply_env(config::process_env);
    if let Some(dir) = &args.output {
        cfg.output_dir = dir.clone();
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Run the export end to end
pub fn run(args: &Cli) -> Result<RunSummary> {
    config::load_dotenv();
    // Checked before anything touches the network
    let token = config::token_from(config::process_env)?;
    let cfg = load_config(args)?;

    info!(
        "Exporting from {} into {:?}",
        cfg.base_url, cfg.output_dir
    );

    let transport = HttpTransport::new(&cfg.base_url, &token, &cfg.user_agent, cfg.timeout())?;
    let api = RaindropApi::new(ResilientClient::new(transport, cfg.retry_policy()));
    let options = RunOptions {
        output_dir: cfg.output_dir.clone(),
        workers: cfg.effective_workers(),
    };

    let progress = ExportProgress::new();
    let summary = pipeline::run_export(
        &api,
        &options,
        |total| progress.start(total),
        |event| progress.update(&event),
    );

    match &summary {
        Ok(summary) => progress.finish(summary),
        Err(e) => progress.abandon(e),
    }
    let summary = summary?;

    for failure in &summary.failures {
        warn!(
            "Collection {} ({:?}) was not exported: {}",
            failure.collection_id, failure.title, failure.error
        );
    }
    Ok(summary)
}
