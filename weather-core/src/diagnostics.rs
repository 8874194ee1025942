//! Destination for the `--debug` payload dumps and `--verbose` summaries.
//!
//! Defaults to stderr. Front ends that take over the terminal hand in a writer
//! that keeps the text off the screen while it is in use.

use std::{
    fmt,
    io::{self, Write},
    sync::{Arc, Mutex, PoisonError},
};

use tracing::warn;

/// Cloneable handle to a shared text sink.
#[derive(Clone)]
pub struct Diagnostics {
    sink: Arc<Mutex<dyn Write + Send>>,
}

impl Diagnostics {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self { sink: Arc::new(Mutex::new(writer)) }
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Writes `text` as is. Failures are logged and otherwise ignored.
    pub fn emit(&self, text: &str) {
        let result = {
            let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
            write_flushed(&mut *sink, text)
        };
        if let Err(e) = result {
            warn!(error = %e, "could not write diagnostics");
        }
    }
}

fn write_flushed(sink: &mut (dyn Write + Send), text: &str) -> io::Result<()> {
    sink.write_all(text.as_bytes())?;
    sink.flush()
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::stderr()
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// In-memory writer whose contents stay readable after it is handed out.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        pub(crate) fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn clones_share_one_sink() {
        let captured = Captured::default();
        let diagnostics = Diagnostics::new(captured.clone());
        diagnostics.emit("one\n");
        diagnostics.clone().emit("two\n");
        assert_eq!(captured.text(), "one\ntwo\n");
    }

    #[test]
    fn write_failure_is_swallowed() {
        Diagnostics::new(Broken).emit("lost\n");
    }
}
