//! Line and error output sinks.
//!
//! Everything the run loop prints goes through a [`Console`], so tests can
//! swap stdio for in-memory buffers.

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Pair of output sinks shared by the run loop and handlers.
#[derive(Clone)]
pub struct Console {
    out: Sink,
    err: Sink,
}

impl Default for Console {
    fn default() -> Self {
        Self::stdio()
    }
}

impl Console {
    /// Process stdout / stderr.
    pub fn stdio() -> Self {
        Self::from_writers(io::stdout(), io::stderr())
    }

    pub fn from_writers<O, E>(out: O, err: E) -> Self
    where
        O: Write + Send + 'static,
        E: Write + Send + 'static,
    {
        Self {
            out: Arc::new(Mutex::new(Box::new(out))),
            err: Arc::new(Mutex::new(Box::new(err))),
        }
    }

    /// In-memory sinks and a handle for reading what was written.
    pub fn capture() -> (Self, Captured) {
        let captured = Captured::default();
        let console = Self::from_writers(
            SharedBuffer(Arc::clone(&captured.out)),
            SharedBuffer(Arc::clone(&captured.err)),
        );
        (console, captured)
    }

    /// Write `text` and a newline to the line sink.
    pub fn line(&self, text: impl AsRef<str>) {
        write_line(&self.out, text.as_ref());
    }

    /// Write `text` without a newline to the line sink.
    pub fn write(&self, text: impl AsRef<str>) {
        let mut out = self.out.lock();
        let _ = out.write_all(text.as_ref().as_bytes());
        let _ = out.flush();
    }

    /// Write `text` and a newline to the error sink.
    pub fn error(&self, text: impl AsRef<str>) {
        write_line(&self.err, text.as_ref());
    }
}

fn write_line(sink: &Sink, text: &str) {
    let mut sink = sink.lock();
    let _ = sink.write_all(text.as_bytes());
    let _ = sink.write_all(b"\n");
    let _ = sink.flush();
}

/// Readable side of [`Console::capture`].
#[derive(Clone, Default)]
pub struct Captured {
    out: Arc<Mutex<Vec<u8>>>,
    err: Arc<Mutex<Vec<u8>>>,
}

impl Captured {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.out.lock()).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.err.lock()).into_owned()
    }
}

struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
