use log::debug;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use super::{OutputSurface, Position};

#[derive(Debug)]
enum OutputCommand {
    Write(String, Option<Position>),
    Clear,
    ClearRegion(usize),
    Close,
}

/// Surface that hands every call to a worker owning the real terminal.
///
/// Callers never block on terminal I/O. `close()` enqueues a sentinel; the
/// worker applies everything queued before it, closes the inner surface and
/// exits.
pub struct QueuedOutput {
    tx: UnboundedSender<OutputCommand>,
}

impl QueuedOutput {
    /// Must be called from within a tokio runtime.
    pub fn spawn(inner: Box<dyn OutputSurface>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::task::spawn_blocking(move || drain(inner, rx));
        (Self { tx }, worker)
    }

    fn send(&self, command: OutputCommand) {
        if self.tx.send(command).is_err() {
            debug!("Output worker already stopped");
        }
    }
}

fn drain(mut inner: Box<dyn OutputSurface>, mut rx: UnboundedReceiver<OutputCommand>) {
    while let Some(command) = rx.blocking_recv() {
        match command {
            OutputCommand::Write(text, position) => inner.write(&text, position),
            OutputCommand::Clear => inner.clear(),
            OutputCommand::ClearRegion(n_lines) => inner.clear_region(n_lines),
            OutputCommand::Close => break,
        }
    }
    inner.close();
    debug!("Output worker stopped");
}

impl OutputSurface for QueuedOutput {
    fn write(&mut self, text: &str, position: Option<Position>) {
        self.send(OutputCommand::Write(text.to_string(), position));
    }

    fn clear(&mut self) {
        self.send(OutputCommand::Clear);
    }

    fn clear_region(&mut self, n_lines: usize) {
        self.send(OutputCommand::ClearRegion(n_lines));
    }

    fn close(&mut self) {
        self.send(OutputCommand::Close);
    }
}
