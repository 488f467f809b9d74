// Copyright 2025 Irreducible Inc.

use thiserror::Error;

/// Errors reported by [`Session::start`](crate::Session::start).
///
/// Once a recording is active no further errors are surfaced: per-write
/// failures are deliberately unchecked, and a failed write mid-session shows
/// up as a trace file the viewer cannot parse.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open trace file: {0}")]
    Io(#[from] std::io::Error),
    #[error("a recording session is already active")]
    SessionActive,
}

// use this instead of eprintln!
macro_rules! err_msg {
    ($($arg:tt)*) => {{
        eprintln!($($arg)*);
        assert!(cfg!(not(feature = "panic")))
    }};
}

pub(crate) use err_msg;
