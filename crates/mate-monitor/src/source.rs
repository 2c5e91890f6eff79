//! Byte sources feeding the decoder.

use mate_metrics::{metric_defs, metrics};
use mate_protocol::{FrameCodec, Mate};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::SourceConfig;
use crate::error::{MonitorError, MonitorResult};

const READ_BUFFER_SIZE: usize = 1024;

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Complete lines handed to the decoder.
    pub chunks: u64,
    /// Lines that produced a stored record.
    pub stored: u64,
    /// Lines dropped by the decoder or the line splitter.
    pub dropped: u64,
}

impl RunSummary {
    fn record(&mut self, mate: &mut Mate, line: &[u8]) {
        self.chunks += 1;
        match mate.process(line) {
            Ok(_) => self.stored += 1,
            Err(_) => self.dropped += 1,
        }
    }
}

/// Resolves once shutdown has been requested. Never resolves if the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Feed `reader` through the line splitter into `mate` until EOF or shutdown.
pub async fn run<R>(
    mut reader: R,
    mate: &mut Mate,
    mut shutdown: watch::Receiver<bool>,
) -> MonitorResult<RunSummary>
where
    R: AsyncRead + Unpin,
{
    let mut codec = FrameCodec::new();
    let mut summary = RunSummary::default();
    let mut read_buf = [0u8; READ_BUFFER_SIZE];

    loop {
        tokio::select! {
            result = reader.read(&mut read_buf) => {
                let n = result?;
                if n == 0 {
                    debug!("end of stream");
                    break;
                }
                codec.push(&read_buf[..n]);
                loop {
                    match codec.decode() {
                        Ok(Some(line)) => summary.record(mate, &line),
                        Ok(None) => break,
                        Err(err) => {
                            warn!(reason = err.reason(), "discarding buffered bytes: {}", err);
                            metrics::counter!(metric_defs::FRAMES_DROPPED.name, "reason" => err.reason())
                                .increment(1);
                            summary.dropped += 1;
                        }
                    }
                }
            }
            _ = shutdown_requested(&mut shutdown) => {
                info!("shutdown requested");
                return Ok(summary);
            }
        }
    }

    // A trailing unterminated line is still offered; framing rejects it.
    if let Some(rest) = codec.flush() {
        summary.record(mate, &rest);
    }
    Ok(summary)
}

/// Open the configured source and run it to completion.
pub async fn run_source(
    source: &SourceConfig,
    mate: &mut Mate,
    shutdown: watch::Receiver<bool>,
) -> MonitorResult<RunSummary> {
    info!(source = %source, "reading");
    match source {
        SourceConfig::Tcp { address } => {
            let stream = TcpStream::connect(address).await?;
            run(stream, mate, shutdown).await
        }
        SourceConfig::File { path } => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|source| MonitorError::Open {
                    path: path.clone(),
                    source,
                })?;
            run(file, mate, shutdown).await
        }
        SourceConfig::Stdin => run(tokio::io::stdin(), mate, shutdown).await,
    }
}
