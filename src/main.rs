// SPDX-License-Identifier: Apache-2.0 OR MIT
use anyhow::{Context, Result};
use clap::Parser;
use cozmonaut::logging::{Facility, LogFormat, LogPipeline, Severity};
use cozmonaut::service::ServiceContext;
use cozmonaut::services::Operation;
use cozmonaut::{log_info, Config, ProcessContextBuilder, Session};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON5 configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the global log level (fatal, error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<Severity>,

    /// Override the log line format (text, json)
    #[arg(long)]
    format: Option<LogFormat>,

    /// Client operation to run
    #[arg(value_enum, default_value_t = Operation::Interact)]
    operation: Operation,
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("cannot load {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(level) = args.log_level {
        config.log.level = level;
    }
    if let Some(format) = args.format {
        config.log.format = format;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let process = ProcessContextBuilder::from_env().freeze();
    let config = load_config(&args)?;

    let pipeline = LogPipeline::start(&config.log).context("failed to start the log pipeline")?;
    let logger = pipeline.logger();
    log_info!(
        logger,
        Facility::Main,
        "Configuration loaded ({} ring slots, level {})",
        config.log.ring_capacity,
        config.log.level.as_str()
    );

    let ctx = ServiceContext::new(logger.clone(), process, Arc::new(config.services));
    let mut session = Session::new(ctx)?;
    let shutdown = session.shutdown_handle();
    let operation = args.operation;

    let mut run = tokio::task::spawn_blocking(move || session.run(operation));
    let report = tokio::select! {
        joined = &mut run => joined?,
        _ = tokio::signal::ctrl_c() => {
            log_info!(logger, Facility::Main, "Interrupted, shutting down");
            shutdown.set();
            run.await?
        }
    };

    log_info!(
        logger,
        Facility::Main,
        "Session ended after {} frames ({} warnings, {} failures, {} records dropped)",
        report.frames,
        report.warnings,
        report.failures,
        logger.dropped()
    );
    pipeline.shutdown();

    anyhow::ensure!(
        report.failures == 0,
        "{} service operations failed",
        report.failures
    );
    Ok(())
}
