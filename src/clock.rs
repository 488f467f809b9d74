// Copyright 2025 Irreducible Inc.

use std::time::Instant;

pub(crate) type TimePoint = Instant;

/// Returns the current time.
pub(crate) fn now() -> TimePoint {
    Instant::now()
}

/// Elapsed time between `begin` and `end` in nanoseconds.
pub(crate) fn elapsed_ns(begin: TimePoint, end: TimePoint) -> f64 {
    end.duration_since(begin).as_secs_f64() * 1e9
}
