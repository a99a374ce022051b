//! Asynchronous latency log
//!
//! Producers only push onto an unbounded channel. A dedicated flusher thread
//! wakes on a fixed interval and appends everything queued to the CSV file;
//! `stop()` performs one last drain so nothing buffered is lost at shutdown.
//! Scheduled and final flushes share one lock, so the file never has two
//! writers.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::error::{SimulatorError, SimulatorResult};

pub const CSV_HEADER: &str = "Timestamp,ProcessingLatency(ms),UILatency(ms),TotalLatency(ms)";

/// One row of the latency log
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyRecord {
    pub timestamp: DateTime<Utc>,
    pub processing_ms: f64,
    pub ui_ms: f64,
    pub total_ms: f64,
}

impl LatencyRecord {
    pub fn now(processing_ms: f64, ui_ms: f64, total_ms: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            processing_ms,
            ui_ms,
            total_ms,
        }
    }

    /// `YYYY-MM-DD HH:MM:SS.mmm,p,u,t` with latencies at two decimals
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{:.2},{:.2},{:.2}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.processing_ms,
            self.ui_ms,
            self.total_ms
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetryStats {
    pub rows_written: u64,
    pub dropped_records: u64,
}

struct FlushState {
    path: PathBuf,
    queue: Receiver<LatencyRecord>,
}

struct Shared {
    flush_lock: Mutex<FlushState>,
    rows_written: AtomicU64,
    dropped_records: AtomicU64,
}

impl Shared {
    /// Drain everything currently queued. A failed append drops the batch.
    fn flush(&self) -> SimulatorResult<usize> {
        let state = self.flush_lock.lock();

        let batch: Vec<LatencyRecord> = state.queue.try_iter().collect();
        if batch.is_empty() {
            return Ok(0);
        }

        match append_rows(&state.path, &batch) {
            Ok(()) => {
                self.rows_written.fetch_add(batch.len() as u64, Ordering::Relaxed);
                debug!("Flushed {} latency records", batch.len());
                Ok(batch.len())
            }
            Err(e) => {
                self.dropped_records.fetch_add(batch.len() as u64, Ordering::Relaxed);
                error!(
                    "❌ Dropped {} latency records, append to {} failed: {}",
                    batch.len(),
                    state.path.display(),
                    e
                );
                Err(SimulatorError::TelemetryIo(e.to_string()))
            }
        }
    }
}

fn append_rows(path: &Path, batch: &[LatencyRecord]) -> std::io::Result<()> {
    let file = OpenOptions::new().append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    for record in batch {
        writeln!(writer, "{}", record.to_csv_row())?;
    }
    writer.flush()
}

fn write_header(path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "{}", CSV_HEADER)?;
    file.flush()
}

struct Flusher {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Owned latency telemetry pipeline; share it behind an `Arc`
pub struct LatencyLogger {
    tx: Sender<LatencyRecord>,
    shared: Arc<Shared>,
    flusher: Mutex<Option<Flusher>>,
}

impl LatencyLogger {
    /// Recreate the log with its header and start the periodic flusher.
    ///
    /// Failing to create the file is fatal: no session should run without
    /// somewhere to put its telemetry.
    pub fn start<P: AsRef<Path>>(path: P, flush_interval: Duration) -> SimulatorResult<Self> {
        let path = path.as_ref().to_path_buf();
        write_header(&path).map_err(|e| {
            SimulatorError::TelemetryIo(format!("cannot create {}: {}", path.display(), e))
        })?;

        let (tx, queue) = mpsc::channel();
        let shared = Arc::new(Shared {
            flush_lock: Mutex::new(FlushState { path: path.clone(), queue }),
            rows_written: AtomicU64::new(0),
            dropped_records: AtomicU64::new(0),
        });

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let worker = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("latency-flusher".to_string())
            .spawn(move || flush_loop(worker, stop_rx, flush_interval))?;

        info!("📝 Latency log: {} (flush every {:?})", path.display(), flush_interval);

        Ok(Self {
            tx,
            shared,
            flusher: Mutex::new(Some(Flusher { stop_tx, handle })),
        })
    }

    /// Enqueue a record. Never touches the file.
    pub fn log(&self, record: LatencyRecord) {
        // The receiver lives as long as `self`, so send cannot fail here
        let _ = self.tx.send(record);
    }

    /// Synchronously append everything queued so far
    pub fn flush(&self) -> SimulatorResult<usize> {
        self.shared.flush()
    }

    /// Stop the periodic flusher and drain what is left. Safe to call twice.
    pub fn stop(&self) {
        let flusher = self.flusher.lock().take();
        if let Some(flusher) = flusher {
            let _ = flusher.stop_tx.send(());
            if flusher.handle.join().is_err() {
                error!("Latency flusher thread panicked");
            }
            // Errors are already counted and logged inside flush
            let _ = self.shared.flush();
            info!("🛑 Latency logger stopped ({} rows written)", self.stats().rows_written);
        }
    }

    pub fn is_running(&self) -> bool {
        self.flusher.lock().is_some()
    }

    pub fn path(&self) -> PathBuf {
        self.shared.flush_lock.lock().path.clone()
    }

    pub fn stats(&self) -> TelemetryStats {
        TelemetryStats {
            rows_written: self.shared.rows_written.load(Ordering::Relaxed),
            dropped_records: self.shared.dropped_records.load(Ordering::Relaxed),
        }
    }
}

impl Drop for LatencyLogger {
    fn drop(&mut self) {
        self.stop();
    }
}

fn flush_loop(shared: Arc<Shared>, stop_rx: Receiver<()>, interval: Duration) {
    loop {
        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                let _ = shared.flush();
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
