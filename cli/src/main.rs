mod cli;
mod dispatcher;
mod input;

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use common::logger::{TraceId, init_logger, root_span};
use indicator_engine::{IndicatorEngine, IndicatorsRecord};
use tracing::{Instrument, info};

use cli::Cli;
use dispatcher::{IndicatorDispatcher, RecordHandler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger("indicators", cli.json_logs);

    let trace_id = TraceId::new();
    let span = root_span("indicators", &trace_id);
    span.record("stream", cli.stream.as_str());

    run(cli).instrument(span).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.engine_config()?;
    info!(?config, "engine configured");
    let engine = IndicatorEngine::new(config)?;

    let (tx, rx) = tokio::sync::mpsc::channel(cli.channel_capacity.max(1));

    let handler: RecordHandler = Arc::new(|rec: IndicatorsRecord| -> std::io::Result<()> {
        let mut out = std::io::stdout().lock();
        serde_json::to_writer(&mut out, &rec)?;
        writeln!(out)
    });
    let dispatcher = tokio::spawn(IndicatorDispatcher::new(engine, rx, handler).run());

    // the dispatcher drains whatever was queued even when input fails
    let fed = match &cli.input {
        Some(path) => match tokio::fs::File::open(path).await {
            Ok(file) => input::feed(file, tx).await,
            Err(e) => {
                drop(tx);
                Err(e)
            }
        },
        None => input::feed(tokio::io::stdin(), tx).await,
    };

    let processed = dispatcher.await?;
    let sent = fed?;
    info!(sent, processed, "done");
    Ok(())
}
