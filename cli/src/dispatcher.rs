use std::io::{self, ErrorKind};
use std::sync::Arc;
use std::time::Duration;

use common::logger::{child_span, warn_if_slow};
use indicator_engine::{IndicatorEngine, IndicatorsRecord, Snapshot};
use tokio::sync::mpsc::Receiver;
use tracing::{Instrument, info, warn};

/// Budget for a single `process` call before a performance warning.
const PROCESS_BUDGET: Duration = Duration::from_millis(5);

/// A callback receiving every record, in input order. A `BrokenPipe` error
/// stops the dispatcher; any other error drops that record only.
pub type RecordHandler = Arc<dyn Fn(IndicatorsRecord) -> io::Result<()> + Send + Sync>;

/// Owns one engine and feeds it snapshots from a channel.
pub struct IndicatorDispatcher {
    engine: IndicatorEngine,
    rx: Receiver<Snapshot>,
    handler: RecordHandler,
}

impl IndicatorDispatcher {
    pub fn new(engine: IndicatorEngine, rx: Receiver<Snapshot>, handler: RecordHandler) -> Self {
        Self {
            engine,
            rx,
            handler,
        }
    }

    /// Main loop: runs until every sender is dropped or the output closes,
    /// then returns the number of records delivered.
    pub async fn run(self) -> u64 {
        let Self {
            mut engine,
            mut rx,
            handler,
        } = self;

        async move {
            let mut delivered = 0u64;
            while let Some(snapshot) = rx.recv().await {
                let record =
                    warn_if_slow("process", PROCESS_BUDGET, || engine.process(&snapshot));
                let timestamp = record.timestamp;
                match (handler)(record) {
                    Ok(()) => delivered += 1,
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                        info!(delivered, "output closed, dispatcher stopping");
                        return delivered;
                    }
                    Err(e) => warn!(timestamp, error = %e, "failed to write record"),
                }
            }
            info!(
                delivered,
                folded = engine.state().processed(),
                "input closed, dispatcher stopping"
            );
            delivered
        }
        .instrument(child_span("dispatcher"))
        .await
    }
}
