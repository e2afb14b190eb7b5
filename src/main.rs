use clap::Parser;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod batch;
mod config;
mod criteria;
mod datasets;
mod dispatch;
mod judge;
mod models;
mod output;
mod reduce;
mod resolver;
mod runner;
mod samples;

use crate::config::RunConfig;
use crate::criteria::JudgePrompts;
use crate::judge::OpenAiJudge;
use crate::output::OutputFormat;
use crate::runner::Runner;

/// Win-rate evaluation CLI - judge sampled model responses against reference
/// responses and aggregate per-model, per-criterion win rates
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML run configuration
    run_file: PathBuf,

    /// Output format: plain or json
    #[arg(short, long, default_value = "plain")]
    output: OutputFormat,

    /// Verbose output - loader and batch progress at info level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = RunConfig::from_file(&args.run_file)?;
    let prompts = JudgePrompts::load(&config.prompt_dir)?;
    let truth = datasets::load_reference(&config.dataset, &config.reference_file)?;
    let sampled = samples::load_samples(&config.sample_dir, config.sample_files.as_deref())?;
    let order = resolver::evaluation_order(&truth, config.seed);

    let judge = OpenAiJudge::from_env(config.lab_key)?;
    let mut runner = Runner::new(config, prompts, judge);
    if let Err(err) = runner.run(&truth, &order, &sampled).await {
        error!(
            judgments = runner.store().total(),
            "run halted before completion; judged batches stay in the shared cache"
        );
        return Err(err);
    }

    let store = runner.into_store();
    let rows = reduce::flatten(&store);
    let summary = reduce::summarize(&rows);
    output::print_results(&rows, &summary, args.output);

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
