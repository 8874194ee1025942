//! Stderr that can be held back while the terminal display owns the screen.
//!
//! Log lines and `--debug`/`--verbose` output share one [`DeferredStderr`]. While
//! held, writes are buffered and replayed in order on release.

use std::{
    io::{self, Write},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// Most bytes kept while held; older output is dropped first.
const HELD_LIMIT: usize = 1 << 20;

struct State {
    held: bool,
    buffer: Vec<u8>,
    limit: usize,
    dropped: usize,
    target: Box<dyn Write + Send>,
}

#[derive(Clone)]
pub struct DeferredStderr {
    state: Arc<Mutex<State>>,
}

impl DeferredStderr {
    pub fn new() -> Self {
        Self::with_target(io::stderr())
    }

    pub fn with_target<W: Write + Send + 'static>(target: W) -> Self {
        Self::with_limit(target, HELD_LIMIT)
    }

    fn with_limit<W: Write + Send + 'static>(target: W, limit: usize) -> Self {
        let state = State { held: false, buffer: Vec::new(), limit, dropped: 0, target: Box::new(target) };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts buffering every write.
    pub fn hold(&self) {
        self.lock().held = true;
    }

    /// Stops buffering and writes out everything held so far.
    pub fn release(&self) -> io::Result<()> {
        let mut state = self.lock();
        if !state.held {
            return Ok(());
        }
        state.held = false;
        let buffer = std::mem::take(&mut state.buffer);
        let dropped = std::mem::take(&mut state.dropped);
        if dropped > 0 {
            writeln!(state.target, "[{dropped} bytes of earlier output dropped]")?;
        }
        state.target.write_all(&buffer)?;
        state.target.flush()
    }
}

impl Default for DeferredStderr {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for DeferredStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.lock();
        if !state.held {
            return state.target.write(buf);
        }
        state.buffer.extend_from_slice(buf);
        let excess = state.buffer.len().saturating_sub(state.limit);
        if excess > 0 {
            state.buffer.drain(..excess);
            state.dropped += excess;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self.lock();
        if state.held { Ok(()) } else { state.target.flush() }
    }
}
