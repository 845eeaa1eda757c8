//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging (stderr, so stdout carries only results)
//! - parses CLI arguments
//! - dispatches to the shared workflows in `pipeline`
//! - prints results

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, PredictArgs, ScoreArgs, ScoreBatchArgs, SampleArgs, TrainArgs};
use crate::domain::OutputFormat;
use crate::error::AppError;
use crate::report::{Explain, TemplateExplainer};
use crate::score::score_profile;

pub mod pipeline;

/// Entry point for the `uscore` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Predict(args) => handle_predict(args),
        Command::Train(args) => handle_train(args),
        Command::Score(args) => handle_score(args),
        Command::ScoreBatch(args) => handle_score_batch(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber may already be installed when embedded; keep going without ours.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let features = args.features()?;
    let value = pipeline::run_predict(&args.model.model_dir, &features)?;
    println!("{value:.2}");
    Ok(())
}

fn handle_train(args: TrainArgs) -> Result<(), AppError> {
    let config = args.to_config();
    let run = pipeline::run_train(&config)?;
    println!(
        "{}",
        crate::report::format_training_summary(
            &run.ingest,
            &run.state.diagnostics,
            run.state.forest.config(),
            &run.probe,
            &run.saved_to,
        )
    );
    Ok(())
}

fn handle_score(args: ScoreArgs) -> Result<(), AppError> {
    let report = score_profile(&args.profile(), &args.scoring.to_config())?;
    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| AppError::new(4, format!("Failed to serialize score: {e}")))?;
            println!("{json}");
        }
        OutputFormat::Text => print!("{}", TemplateExplainer.explain(&report)),
    }
    Ok(())
}

fn handle_score_batch(args: ScoreBatchArgs) -> Result<(), AppError> {
    let outcomes = pipeline::run_score_batch(&args.input, &args.output, &args.scoring.to_config())?;
    println!("{}", crate::report::format_batch_summary(&outcomes, &args.output));
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let n = pipeline::run_sample(&args.output, &args.to_config())?;
    println!("Wrote {n} synthetic rows -> {}", args.output.display());
    Ok(())
}
