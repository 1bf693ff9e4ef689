use log::debug;
use std::io::{self, Stdout, Write};

use super::{OutputSurface, Position};

/// ANSI terminal output.
pub struct ConsoleOutput<W: Write + Send = Stdout> {
    out: W,
}

impl ConsoleOutput<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleOutput<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn emit(&mut self, bytes: &str) {
        if let Err(e) = self.out.write_all(bytes.as_bytes()).and_then(|_| self.out.flush()) {
            debug!("Terminal write failed: {}", e);
        }
    }
}

#[cfg(test)]
impl<W: Write + Send> ConsoleOutput<W> {
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> OutputSurface for ConsoleOutput<W> {
    fn write(&mut self, text: &str, position: Option<Position>) {
        let line = match position {
            Some(pos) => format!("\x1b[{};{}H{}\n", pos.row, pos.col + 1, text),
            None => format!("{}\n", text),
        };
        self.emit(&line);
    }

    fn clear(&mut self) {
        self.emit("\x1bc\x1b[3J");
    }

    fn clear_region(&mut self, n_lines: usize) {
        self.emit(&"\x1b[K\n".repeat(n_lines));
    }

    fn close(&mut self) {
        // Leave the cursor on a fresh line below whatever was drawn
        self.emit("\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(f: impl FnOnce(&mut ConsoleOutput<Vec<u8>>)) -> String {
        let mut console = ConsoleOutput::new(Vec::new());
        f(&mut console);
        String::from_utf8(console.into_inner()).unwrap()
    }

    #[test]
    fn test_positioned_write() {
        let out = rendered(|c| c.write("Temp: 21.50°C", Some(Position { col: 24, row: 3 })));
        assert_eq!(out, "\x1b[3;25HTemp: 21.50°C\n");
    }

    #[test]
    fn test_plain_write_and_clears() {
        let out = rendered(|c| {
            c.write("hello", None);
            c.clear_region(2);
            c.clear();
        });
        assert_eq!(out, "hello\n\x1b[K\n\x1b[K\n\x1bc\x1b[3J");
    }
}
