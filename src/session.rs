// Copyright 2025 Irreducible Inc.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::clock::{self, TimePoint};
use crate::errors::{err_msg, Error};
use crate::kind::SpanKind;
use crate::sync::FrameSync;

/// Bookkeeping for one currently-open span.
pub(crate) struct Frame {
    /// Children already opened under this frame; decides whether the next
    /// child needs a separating comma in the JSON array.
    pub(crate) sibling_count: u16,
    pub(crate) kind: SpanKind,
    pub(crate) sync: Arc<FrameSync>,
}

impl Frame {
    pub(crate) fn new(kind: SpanKind, participants: usize) -> Self {
        Self {
            sibling_count: 0,
            kind,
            sync: Arc::new(FrameSync::new(participants)),
        }
    }
}

/// Live state of an active recording. Dropped exactly once, in
/// [`Session::end`], which closes the trace file.
pub(crate) struct State {
    pub(crate) origin: TimePoint,
    pub(crate) out: BufWriter<File>,
    pub(crate) stack: Vec<Frame>,
}

impl State {
    pub(crate) fn offset_ns(&self, at: TimePoint) -> f64 {
        clock::elapsed_ns(self.origin, at)
    }
}

/// A recording session: owns the trace file and the stack of open spans.
///
/// The profiling macros record into the process-wide [`Session::global`].
/// A fresh instance can be constructed with [`Session::new`] to keep a
/// recording private, which is how the tests in this crate run without
/// forking.
///
/// Everything written between [`start`](Self::start) and
/// [`end`](Self::end) forms a single ordered byte stream. The state lock
/// plus the per-frame guards (see [`FrameSync`]) make concurrent span
/// trackers respect that order; there is no stream-level locking anywhere
/// else.
pub struct Session {
    pub(crate) state: Mutex<Option<State>>,
}

static GLOBAL: Session = Session::new();

impl Session {
    /// Creates an inactive session.
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(None),
        }
    }

    /// The process-wide session used by the profiling macros.
    pub fn global() -> &'static Session {
        &GLOBAL
    }

    /// Opens `path` for writing and starts recording under `session_id`.
    ///
    /// Writes the document preamble and installs the synthetic root frame.
    /// Fails if the file cannot be created or a recording is already
    /// active; in both cases the session stays inactive and nothing is
    /// written.
    ///
    /// The returned guard finalizes the trace when dropped. Keep it alive
    /// for as long as spans are being recorded.
    pub fn start<P: AsRef<Path>>(
        &self,
        path: P,
        session_id: &str,
    ) -> Result<SessionGuard<'_>, Error> {
        let mut state = self.state.lock();
        if state.is_some() {
            return Err(Error::SessionActive);
        }

        let mut out = BufWriter::new(File::create(path)?);
        let _ = write!(out, "{{\"session_id\":\"{session_id}\",\"functions\":[");

        let mut stack = Vec::with_capacity(512);
        stack.push(Frame::new(SpanKind::Session, 1));

        *state = Some(State {
            origin: clock::now(),
            out,
            stack,
        });
        Ok(SessionGuard { session: self })
    }

    /// Appends the document closer, flushes and closes the trace file, and
    /// marks the session inactive. Idempotent.
    pub fn end(&self) {
        let mut state = self.state.lock();
        let Some(mut finished) = state.take() else {
            return;
        };
        if finished.stack.len() > 1 {
            err_msg!(
                "session ended with {} span(s) still open",
                finished.stack.len() - 1
            );
        }
        let _ = write!(finished.out, "]}}");
        let _ = finished.out.flush();
    }

    /// Nanoseconds between the session's time origin and `at`; 0.0 when no
    /// recording is active.
    pub fn elapsed_since_origin(&self, at: Instant) -> f64 {
        self.state
            .lock()
            .as_ref()
            .map_or(0.0, |state| state.offset_ns(at))
    }

    /// Number of currently open frames, including the synthetic root; 0
    /// when no recording is active.
    pub fn depth(&self) -> usize {
        self.state.lock().as_ref().map_or(0, |state| state.stack.len())
    }

    /// Whether a recording is active.
    pub fn is_active(&self) -> bool {
        self.state.lock().is_some()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Finalizes the owning [`Session`] on drop.
///
/// The Rust stand-in for end-of-process finalization: hold it for the whole
/// recording, on every exit path.
#[must_use = "the trace file is finalized when the guard is dropped"]
pub struct SessionGuard<'a> {
    session: &'a Session,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.session.end();
    }
}
