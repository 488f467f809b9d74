// Copyright 2025 Irreducible Inc.

use std::io::Write;
use std::sync::Arc;
use std::thread;

use crate::clock::{self, TimePoint};
use crate::errors::err_msg;
use crate::kind::SpanKind;
use crate::session::{Frame, Session};
use crate::sync::FrameSync;

/// Measures one function or lexical scope.
///
/// Entering pushes a frame onto the session's call stack and writes the
/// opening of this span's JSON node; dropping pops the frame and writes the
/// closing fields. Bind it to a local so it drops on every exit path,
/// early returns and unwinding included.
///
/// Four timestamps are recorded per span: `pb` at entry before any
/// synchronization wait, `b` once the opening node is written, `e` at drop,
/// and `pe` once the parent guard is released. `pb..b` isolates
/// barrier/guard wait from `b..e`, the actual work window, and `e..pe`
/// covers release bookkeeping, so the viewer can tell contention from work.
pub struct SpanTracker<'a> {
    session: &'a Session,
    name: &'static str,
    line: u32,
    kind: SpanKind,
    t_enter: TimePoint,
    t_begin: TimePoint,
    recording: bool,
}

impl<'a> SpanTracker<'a> {
    /// Opens a span under the current top-of-stack frame.
    ///
    /// If that frame is a parallel kind, blocks at its barrier until all
    /// `participants` declared for the frame have arrived, then holds the
    /// frame guard for this span's entire lifetime.
    ///
    /// `participants` sizes the barrier of this span's own frame, i.e. the
    /// number of child spans expected when this span is itself parallel;
    /// pass 1 otherwise.
    ///
    /// Entering with no active session is a contract violation; the
    /// tracker degrades to an inert value that records nothing.
    pub fn enter(
        session: &'a Session,
        name: &'static str,
        line: u32,
        kind: SpanKind,
        participants: usize,
    ) -> Self {
        let t_enter = clock::now();

        let inert = |t_enter| Self {
            session,
            name,
            line,
            kind,
            t_enter,
            t_begin: t_enter,
            recording: false,
        };

        // Peek the parent frame first: the barrier and guard waits below
        // must not happen while holding the state lock.
        let parent_sync: Option<Arc<FrameSync>> = {
            let state = session.state.lock();
            let Some(state) = state.as_ref() else {
                debug_assert!(false, "span '{name}' entered with no active session");
                err_msg!("span '{}' entered with no active session", name);
                return inert(t_enter);
            };
            state
                .stack
                .last()
                .filter(|parent| parent.kind.is_parallel())
                .map(|parent| Arc::clone(&parent.sync))
        };

        if let Some(sync) = &parent_sync {
            sync.rendezvous();
            sync.acquire();
        }

        {
            let mut state = session.state.lock();
            let Some(state) = state.as_mut() else {
                err_msg!("session ended while span '{}' was entering", name);
                if let Some(sync) = &parent_sync {
                    sync.release();
                }
                return inert(t_enter);
            };
            let Some(parent) = state.stack.last_mut() else {
                err_msg!("span '{}' entered on an empty call stack", name);
                return inert(t_enter);
            };

            let needs_comma = parent.sibling_count > 0;
            parent.sibling_count += 1;

            state.stack.push(Frame::new(kind, participants));

            if needs_comma {
                let _ = state.out.write_all(b",");
            }
            let _ = state.out.write_all(b"{\"c\":[");
        }

        let t_begin = clock::now();
        Self {
            session,
            name,
            line,
            kind,
            t_enter,
            t_begin,
            recording: true,
        }
    }
}

impl Drop for SpanTracker<'_> {
    fn drop(&mut self) {
        if !self.recording {
            return;
        }
        let t_end = clock::now();

        let mut state = self.session.state.lock();
        let Some(state) = state.as_mut() else {
            err_msg!("span '{}' closed after its session ended", self.name);
            return;
        };

        state.stack.pop();
        match state.stack.last() {
            Some(parent) if parent.kind.is_parallel() => {
                // A sibling woken by this release still has to take the
                // state lock, so this span's closer reaches the stream
                // before the sibling's opener.
                parent.sync.release();
            }
            Some(_) => {}
            None => err_msg!("span '{}' closed on an empty call stack", self.name),
        }
        let t_post = clock::now();

        let pb = state.offset_ns(self.t_enter);
        let b = state.offset_ns(self.t_begin);
        let e = state.offset_ns(t_end);
        let pe = state.offset_ns(t_post);
        let _ = write!(
            state.out,
            "],\"n\":\"{}\",\"ti\":\"{:?}\",\"t\":\"{}\",\"l\":\"{}\",\"pb\":{pb:.3},\"b\":{b:.3},\"e\":{e:.3},\"pe\":{pe:.3}}}",
            self.name,
            thread::current().id(),
            self.kind.as_str(),
            self.line,
        );
    }
}
