//! CLI entrypoint for grounded
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use grounded_application::ProcessQueryUseCase;
use grounded_infrastructure::{ConfigLoader, FileConfig, build_pipeline};
use grounded_presentation::{ChatRepl, Cli, ConsoleFormatter, StageSpinner};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level; the guard flushes the log file on exit
    let _log_guard = init_tracing(cli.verbose, cli.log_file.as_deref())?;

    info!("Starting grounded");

    let config = load_config(&cli)?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        println!();
        println!("Effective configuration:");
        println!("{}", toml::to_string_pretty(&config.redacted())?);
        return Ok(ExitCode::SUCCESS);
    }

    // === Dependency Injection ===
    let pipeline = build_pipeline(&config)
        .await
        .context("could not start the question-answering pipeline")?;

    let shutdown = CancellationToken::new();
    let sweeper = (config.session.sweep_interval_secs > 0).then(|| {
        pipeline.sessions().spawn_sweeper(
            Duration::from_secs(config.session.sweep_interval_secs),
            shutdown.clone(),
        )
    });

    // Chat mode
    let code = if cli.chat {
        let mut repl = ChatRepl::new(pipeline)
            .with_progress(!cli.quiet)
            .with_sources(cli.show_sources)
            .with_session(cli.session.clone());
        repl.run().await?;
        ExitCode::SUCCESS
    } else {
        // Single question mode - question is required
        let Some(question) = cli.question.as_deref() else {
            bail!("Question is required. Use --chat for interactive mode.");
        };
        answer_once(&pipeline, question, &cli).await
    };

    shutdown.cancel();
    if let Some(sweeper) = sweeper {
        let _ = sweeper.await;
    }
    Ok(code)
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let loaded = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
    };
    loaded.map_err(|e| anyhow!("failed to load configuration: {e}"))
}

async fn answer_once(pipeline: &ProcessQueryUseCase, question: &str, cli: &Cli) -> ExitCode {
    let session = cli.session.as_deref();
    let result = if cli.quiet {
        pipeline.process_query(question, session).await
    } else {
        let spinner = StageSpinner::new();
        let result = pipeline
            .process_query_with_progress(question, session, &spinner)
            .await;
        spinner.finish();
        result
    };

    match result {
        Ok(outcome) => {
            print!("{}", ConsoleFormatter::format_answer(&outcome, cli.show_sources));
            if !cli.quiet {
                eprintln!();
                eprintln!("{}", ConsoleFormatter::format_session(Some(&outcome.session_id)));
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            debug!(error = %e, "Query failed");
            eprintln!("{}", ConsoleFormatter::format_failure(&e));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .init();
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .with_context(|| format!("--log-file must name a file: {}", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("could not create log directory {}", dir.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer),
        )
        .init();
    Ok(Some(guard))
}
