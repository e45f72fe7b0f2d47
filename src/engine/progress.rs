//! Progress listener for ffmpeg's `-progress` status stream
//!
//! ffmpeg connects to the address returned by [`ProgressListener::begin`] and writes
//! `key=value` lines. Each `progress=` line closes one reporting unit and
//! `progress=end` closes the session.

use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::domain::errors::DomainError;
use crate::domain::model::{ProgressReport, StatusLine};

/// Default time between progress log lines
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Accepts a single status connection and aggregates what it reports
pub struct ProgressListener {
    listener: Option<TcpListener>,
    stop: CancellationToken,
}

impl Default for ProgressListener {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressListener {
    /// Create an unbound listener
    pub fn new() -> Self {
        Self {
            listener: None,
            stop: CancellationToken::new(),
        }
    }

    /// Bind a loopback port and return the address to hand to ffmpeg.
    ///
    /// Calling again on a bound listener returns the same address.
    pub async fn begin(&mut self) -> Result<String, DomainError> {
        if self.listener.is_none() {
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .map_err(|e| DomainError::resource("failed to open progress listener", e))?;
            self.listener = Some(listener);
        }

        let addr = self
            .listener
            .as_ref()
            .map(|l| l.local_addr())
            .transpose()
            .map_err(|e| DomainError::resource("failed to read progress listener address", e))?
            .ok_or_else(|| DomainError::InvalidConfig("progress listener is not bound".to_string()))?;

        Ok(format!("tcp://{}", addr))
    }

    /// Handle that ends the session if no connection has been accepted yet
    pub fn stop_handle(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Wait for the status connection and drain it until the session ends.
    ///
    /// Never fails: a missing connection, EOF, and read errors all end the session with
    /// whatever was reported so far.
    pub async fn run(&mut self, total_frames: u64, report_interval: Duration) -> ProgressReport {
        let Some(listener) = self.listener.as_ref() else {
            error!("progress listener run without begin");
            return ProgressReport::default();
        };

        let stream = tokio::select! {
            biased;
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(%peer, "progress connection accepted");
                    stream
                }
                Err(e) => {
                    error!(err = %e, "error while accepting ffmpeg connection");
                    return ProgressReport::default();
                }
            },
            _ = self.stop.cancelled() => {
                debug!("progress session stopped before ffmpeg connected");
                return ProgressReport::default();
            }
        };

        read_session(stream, total_frames, report_interval).await
    }

    /// Release the listening socket. Safe to call more than once.
    pub fn close(&mut self) {
        if self.listener.take().is_some() {
            debug!("progress listener closed");
        }
    }
}

async fn read_session(stream: TcpStream, total_frames: u64, report_interval: Duration) -> ProgressReport {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    let mut report = ProgressReport::default();
    let mut last_emit: Option<Instant> = None;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                error!(err = %e, "error while reading ffmpeg progress");
                break;
            }
        }

        // Undecodable bytes only spoil the value they appear in
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(&['\r', '\n'][..]);

        match report.apply_line(line) {
            StatusLine::Unit => {
                if emit_due(last_emit.map(|at| at.elapsed()), report_interval) {
                    emit(&report, total_frames);
                    last_emit = Some(Instant::now());
                }
            }
            StatusLine::End => {
                emit(&report, total_frames);
                break;
            }
            StatusLine::Field | StatusLine::Ignored => {}
        }
    }

    report
}

/// Whether a summary should be logged, given the time since the last one
fn emit_due(since_last: Option<Duration>, report_interval: Duration) -> bool {
    since_last.map_or(true, |elapsed| elapsed >= report_interval)
}

fn emit(report: &ProgressReport, total_frames: u64) {
    let summary = report.summary(total_frames);
    info!(
        percent = summary.percent,
        frame = summary.frame,
        fps = summary.fps,
        out_time = %summary.out_time,
        speed = %summary.speed,
        total_size = summary.total_size,
        bitrate = %report.bitrate,
        "ffmpeg progress: {}",
        summary
    );
}
