// Copyright 2025 Irreducible Inc.

use std::sync::Barrier;

use parking_lot::lock_api::RawMutex as _;
use parking_lot::RawMutex;

/// Synchronization attached to one call-stack frame: a one-shot rendezvous
/// sized to the frame's declared participant count, and a guard that
/// serializes the frame's children.
///
/// Under a parallel frame, every child span first waits at the barrier until
/// all declared participants have arrived, then holds the guard for its
/// entire duration. Holding the guard across the whole child span (not just
/// the writes) keeps the emitted JSON well-formed without any stream-level
/// locking and aligns sibling start times for comparison in the viewer.
///
/// Lifecycle of a frame: created, (if parallel) awaiting rendezvous,
/// rendezvous complete, guard held, released, popped. A frame is never
/// reused after it is popped.
pub(crate) struct FrameSync {
    barrier: Barrier,
    guard: RawMutex,
}

impl FrameSync {
    pub(crate) fn new(participants: usize) -> Self {
        Self {
            barrier: Barrier::new(participants),
            guard: RawMutex::INIT,
        }
    }

    /// Blocks until all declared participants have arrived.
    ///
    /// There is no timeout: a participant that never shows up blocks the
    /// rest of the cohort indefinitely. The declared count is a caller
    /// contract that must match the number of spans actually opened.
    pub(crate) fn rendezvous(&self) {
        self.barrier.wait();
    }

    /// Blocks until the frame guard is free, then holds it.
    pub(crate) fn acquire(&self) {
        self.guard.lock();
    }

    /// Releases the frame guard.
    pub(crate) fn release(&self) {
        // Safety: paired with a prior `acquire` on the same thread; the span
        // tracker enter/drop protocol guarantees the pairing.
        unsafe { self.guard.unlock() }
    }
}
