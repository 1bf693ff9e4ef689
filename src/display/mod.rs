//! Terminal output: the surface abstraction, its console and queued
//! implementations, and the grid compositor that places devices on it.

pub mod compositor;
pub mod console;
pub mod queued;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use compositor::DisplayCompositor;
pub use console::ConsoleOutput;
pub use queued::QueuedOutput;

/// Character cell on the terminal. `row` is 1-based, `col` is 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub col: usize,
    pub row: usize,
}

pub trait OutputSurface: Send {
    /// Print one line, at `position` if given, otherwise after the previous output.
    fn write(&mut self, text: &str, position: Option<Position>);

    fn clear(&mut self);

    /// Blank `n_lines` lines starting at the cursor.
    fn clear_region(&mut self, n_lines: usize);

    fn close(&mut self);
}

/// Output surface shared between the render path and the alert path.
/// Hold the guard for the whole of a multi-line write.
#[derive(Clone)]
pub struct SharedOutput(Arc<Mutex<Box<dyn OutputSurface>>>);

impl SharedOutput {
    pub fn new(surface: Box<dyn OutputSurface>) -> Self {
        Self(Arc::new(Mutex::new(surface)))
    }

    /// A panic while writing leaves nothing inconsistent behind, so a
    /// poisoned lock is still usable.
    pub fn lock(&self) -> MutexGuard<'_, Box<dyn OutputSurface>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Write(String, Option<Position>),
        Clear,
        ClearRegion(usize),
        Close,
    }

    /// Surface that records every call for later inspection.
    #[derive(Clone, Default)]
    pub struct RecordingOutput {
        pub calls: Arc<Mutex<Vec<Call>>>,
    }

    impl RecordingOutput {
        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn written(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    Call::Write(text, _) => Some(text.trim_end().to_string()),
                    _ => None,
                })
                .collect()
        }
    }

    impl OutputSurface for RecordingOutput {
        fn write(&mut self, text: &str, position: Option<Position>) {
            self.calls.lock().unwrap().push(Call::Write(text.to_string(), position));
        }

        fn clear(&mut self) {
            self.calls.lock().unwrap().push(Call::Clear);
        }

        fn clear_region(&mut self, n_lines: usize) {
            self.calls.lock().unwrap().push(Call::ClearRegion(n_lines));
        }

        fn close(&mut self) {
            self.calls.lock().unwrap().push(Call::Close);
        }
    }
}
