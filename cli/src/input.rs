use indicator_engine::Snapshot;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::Sender;
use tracing::warn;

/// Parse one JSON line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Snapshot>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Read newline-delimited snapshots into the channel and return how many were
/// sent. Lines that are not UTF-8 or not a snapshot are logged and skipped.
pub async fn feed<R>(reader: R, tx: Sender<Snapshot>) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut segments = BufReader::new(reader).split(b'\n');
    let mut line_no = 0u64;
    let mut sent = 0u64;

    while let Some(bytes) = segments.next_segment().await? {
        line_no += 1;
        let line = match String::from_utf8(bytes) {
            Ok(line) => line,
            Err(e) => {
                warn!(line_no, error = %e, "skipping line that is not UTF-8");
                continue;
            }
        };
        match parse_line(&line) {
            Ok(Some(snapshot)) => {
                if tx.send(snapshot).await.is_err() {
                    warn!(line_no, "dispatcher gone, stopping input");
                    break;
                }
                sent += 1;
            }
            Ok(None) => {}
            Err(e) => warn!(line_no, error = %e, "skipping malformed snapshot"),
        }
    }

    Ok(sent)
}
