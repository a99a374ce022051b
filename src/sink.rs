//! Output sink and its single-threaded executor
//!
//! A sink owns a rendering surface that must only be touched from one thread.
//! `SinkExecutor` moves the sink onto a dedicated thread; everything else talks
//! to it through a cloneable `SinkHandle`, whose `submit` schedules a render
//! and returns immediately.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

use crate::core::types::DisplayFields;
use crate::error::SimulatorResult;

/// Passive receiver of finished results
pub trait OutputSink: Send + 'static {
    fn render(&mut self, fields: &DisplayFields);
}

enum SinkCommand {
    Render(DisplayFields),
    Shutdown,
}

/// Cheap, cloneable submission handle
#[derive(Clone)]
pub struct SinkHandle {
    tx: Sender<SinkCommand>,
}

impl SinkHandle {
    /// Schedule a render on the sink's own thread. Returns false once the
    /// executor has shut down.
    pub fn submit(&self, fields: DisplayFields) -> bool {
        self.tx.send(SinkCommand::Render(fields)).is_ok()
    }
}

/// Dedicated thread that exclusively owns an `OutputSink`
pub struct SinkExecutor {
    handle: SinkHandle,
    thread: Option<JoinHandle<()>>,
}

impl SinkExecutor {
    pub fn spawn<S: OutputSink>(sink: S) -> SimulatorResult<Self> {
        let (tx, rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("output-sink".to_string())
            .spawn(move || run_sink(sink, rx))?;

        Ok(Self {
            handle: SinkHandle { tx },
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> SinkHandle {
        self.handle.clone()
    }

    /// Render everything already submitted, then stop the thread
    pub fn shutdown(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.handle.tx.send(SinkCommand::Shutdown);
            if thread.join().is_err() {
                error!("Output sink thread panicked");
            }
        }
    }
}

impl Drop for SinkExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_sink<S: OutputSink>(mut sink: S, rx: Receiver<SinkCommand>) {
    let mut rendered = 0u64;
    while let Ok(command) = rx.recv() {
        match command {
            SinkCommand::Render(fields) => {
                sink.render(&fields);
                rendered += 1;
            }
            SinkCommand::Shutdown => break,
        }
    }
    debug!("Output sink finished after {} renders", rendered);
}

/// Renders each estimate as a single log line
#[derive(Debug, Default)]
pub struct ConsoleSink {
    last: Option<DisplayFields>,
}

impl OutputSink for ConsoleSink {
    fn render(&mut self, fields: &DisplayFields) {
        if self.last.as_ref() == Some(fields) {
            return;
        }

        let line = fields
            .iter()
            .map(|(label, value)| format!("{}: {}", label, value))
            .collect::<Vec<_>>()
            .join(" | ");
        info!("📈 {}", line);
        self.last = Some(fields.clone());
    }
}
