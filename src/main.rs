//! Subgen - batch subtitle generation
//!
//! CLI front end for the batch pipeline. Acts as the presentation layer:
//! it enumerates the input, starts the run on a background task, renders
//! the worker's events, maps Ctrl-C to the cancellation token, and prints
//! the final report.

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subgen::batch::{BatchRunner, EventSender, RunEvent};
use subgen::cancel::CancelToken;
use subgen::cli::{Args, Commands};
use subgen::config::{ComputeTarget, Config, ModelTier, RunOptions, SourceMode};
use subgen::engine::EngineFactory;
use subgen::error::SubgenError;
use subgen::media::find_media_files;
use subgen::progress::ProgressUpdate;
use subgen::translate::TranslatorFactory;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("subgen.toml").exists() {
                info!("Found subgen.toml in current directory, loading...");
                Config::from_file("subgen.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Process {
            input,
            output_dir,
            from_lang,
            to_lang,
            tier,
            compute,
        } => {
            info!("Processing media file: {}", input.display());

            let options = RunOptions {
                source: input,
                destination: output_dir,
                mode: SourceMode::SingleFile,
                source_lang: from_lang,
                target_lang: to_lang,
                tier: parse_model_tier(&tier)?,
                compute: parse_compute_target(&compute)?,
            };

            run_batch(config, options).await?;
        }
        Commands::Batch {
            input_dir,
            output_dir,
            from_lang,
            to_lang,
            tier,
            compute,
        } => {
            info!("Processing directory: {}", input_dir.display());

            let options = RunOptions {
                source: input_dir,
                destination: output_dir,
                mode: SourceMode::DirectoryBatch,
                source_lang: from_lang,
                target_lang: to_lang,
                tier: parse_model_tier(&tier)?,
                compute: parse_compute_target(&compute)?,
            };

            run_batch(config, options).await?;
        }
        Commands::Tiers => {
            println!("\nModel precision tiers:");
            println!("{:<10} {:<10} {}", "Tier", "Model", "Description");
            println!("{}", "-".repeat(72));

            for tier in ModelTier::all() {
                println!(
                    "{:<10} {:<10} {}",
                    tier.name(),
                    tier.model_name(),
                    tier.description()
                );
            }
        }
    }

    Ok(())
}

/// Enumerate the input, run the batch on a worker task, and render its
/// events until the run report arrives.
async fn run_batch(config: Config, options: RunOptions) -> Result<()> {
    let files = find_media_files(&options.source, options.mode);
    if files.is_empty() {
        anyhow::bail!("No media files found at {}", options.source.display());
    }
    info!("Found {} media files to process", files.len());

    let engine = EngineFactory::create_default(config.engine.clone());
    let translator = TranslatorFactory::create_translator(config.translate.clone());
    let (events, mut rx) = EventSender::channel();

    let cancel = CancelToken::new();
    let cancel_handle = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancellation requested, stopping at the next checkpoint...");
            cancel_handle.cancel();
        }
    });

    let runner = BatchRunner::new(engine, translator, options, events);
    let worker = tokio::spawn(async move { runner.run(&files, &cancel).await });

    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}").expect("static template is valid"),
    );
    bar.enable_steady_tick(Duration::from_millis(120));

    // The channel closes when the worker drops its sender, ending the loop.
    while let Some(event) = rx.recv().await {
        match event {
            RunEvent::Log(line) => bar.println(format!(">> {}", line)),
            RunEvent::Status(text) => bar.set_message(text),
            RunEvent::Progress(ProgressUpdate::Percent(percent)) => {
                bar.set_message(format!("Working... {}%", percent));
            }
            RunEvent::Progress(ProgressUpdate::Phase(label)) => {
                bar.set_message(format!("Fetching: {}", label));
            }
        }
    }

    let report = worker.await??;
    bar.finish_and_clear();

    println!(
        "\nRun {}: {} succeeded, {} failed",
        report.status.describe(),
        report.succeeded,
        report.failures.len()
    );

    if !report.failures.is_empty() {
        println!("\nFiles with errors:");
        for failure in report.failures.iter().take(5) {
            println!("  {} ({})", failure.file_name, failure.reason);
        }
        if report.failures.len() > 5 {
            println!("  ... and {} more", report.failures.len() - 5);
        }
    }

    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".subgen").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "subgen.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer().with_target(false);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Parse model tier from string
fn parse_model_tier(tier: &str) -> Result<ModelTier> {
    match tier.to_lowercase().as_str() {
        "draft" => Ok(ModelTier::Draft),
        "base" => Ok(ModelTier::Base),
        "balanced" => Ok(ModelTier::Balanced),
        "cinema" => Ok(ModelTier::Cinema),
        "max" => Ok(ModelTier::Max),
        _ => Err(SubgenError::Config(format!(
            "Invalid model tier '{}'. Valid tiers: draft, base, balanced, cinema, max",
            tier
        ))
        .into()),
    }
}

/// Parse compute target from string
fn parse_compute_target(compute: &str) -> Result<ComputeTarget> {
    match compute.to_lowercase().as_str() {
        "gpu" | "cuda" => Ok(ComputeTarget::Gpu),
        "cpu" => Ok(ComputeTarget::Cpu),
        _ => Err(SubgenError::Config(format!(
            "Invalid compute target '{}'. Valid targets: gpu, cpu",
            compute
        ))
        .into()),
    }
}
