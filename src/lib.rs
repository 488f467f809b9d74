//! An in-process call-tree profiler writing flame chart traces.
//!
//! # Overview
//! Application code marks function and scope boundaries with the
//! [`profile_function!`] and [`profile_scope!`] macros. The profiler keeps
//! a process-wide recording session with a live stack of open spans and
//! serializes every span as a node of a nested JSON tree the moment it
//! closes, directly into the trace file. The resulting document is
//! consumable by a flame chart viewer.
//!
//! Regions whose children run on several threads at once are declared with
//! the `parallel` macro variants and a participant count. The
//! participating spans rendezvous at a barrier before any of them starts
//! and then execute one at a time behind the frame's guard, so the trace
//! stays a well-formed tree under genuinely concurrent execution and the
//! aligned start times make the siblings comparable in the viewer.
//!
//! ```
//! use flame_profile::{profile_function, profile_scope, Session};
//!
//! fn entry_point() {
//!     profile_function!();
//!
//!     {
//!         profile_scope!("preparation");
//!         // ... timed work ...
//!     }
//! }
//!
//! let trace = std::env::temp_dir().join("flame_profile_doc.json");
//! // Note that the guard must be kept alive for the duration of the recording.
//! let _guard = Session::global().start(&trace, "docs").unwrap();
//!
//! entry_point();
//! ```
//!
//! Each span records four timestamps (nanosecond offsets from the session
//! origin): `pb` before any synchronization wait, `b` when the span's work
//! begins, `e` when it ends and `pe` after bookkeeping. The gap between
//! `pb` and `b` is time spent waiting at the parent's barrier and guard,
//! which lets the viewer separate contention from work in parallel
//! regions.
//!
//! # Features
//! The `panic` feature will turn eprintln! into panic!, causing the program to halt on errors.

mod clock;
mod errors;
mod kind;
mod macros;
mod session;
mod span;
mod sync;

pub use errors::Error;
pub use kind::SpanKind;
pub use session::{Session, SessionGuard};
pub use span::SpanTracker;

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use rusty_fork::rusty_fork_test;
    use serde_json::Value;

    use crate::{profile_function, profile_parallel_scope, profile_scope};

    use super::*;

    fn compute_step() {
        profile_function!();
        thread::sleep(Duration::from_millis(2));
    }

    fn worker() {
        profile_function!();

        {
            profile_scope!("setup");
            thread::sleep(Duration::from_millis(1));
        }
        compute_step();
        compute_step();
    }

    fn make_spans() {
        profile_scope!("root");

        compute_step();

        {
            profile_parallel_scope!("fan out", 3);
            thread::scope(|s| {
                for _ in 0..3 {
                    s.spawn(worker);
                }
            });
        }
    }

    fn count_nodes(node: &Value) -> usize {
        1 + node["c"]
            .as_array()
            .unwrap()
            .iter()
            .map(count_nodes)
            .sum::<usize>()
    }

    // Since Session::global() is a process-wide singleton, we need to run the tests in separate processes.
    rusty_fork_test! {
        #[test]
        fn global_session_end_to_end() {
            let path = std::env::temp_dir()
                .join(format!("flame_profile_{}_end_to_end.json", std::process::id()));
            let guard = Session::global().start(&path, "end_to_end").unwrap();

            make_spans();

            drop(guard);

            let trace: Value =
                serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
            assert_eq!(trace["session_id"], "end_to_end");

            let functions = trace["functions"].as_array().unwrap();
            assert_eq!(functions.len(), 1);
            let root = &functions[0];
            assert_eq!(root["n"], "root");
            assert_eq!(root["t"], "scope");

            let children = root["c"].as_array().unwrap();
            assert_eq!(children.len(), 2);
            assert!(children[0]["n"].as_str().unwrap().ends_with("compute_step"));
            assert_eq!(children[1]["n"], "fan out");
            assert_eq!(children[1]["t"], "parallel_scope");

            let workers = children[1]["c"].as_array().unwrap();
            assert_eq!(workers.len(), 3);
            for w in workers {
                assert!(w["n"].as_str().unwrap().ends_with("worker"));
                assert_eq!(w["t"], "function");
                // setup scope + two compute steps each
                assert_eq!(w["c"].as_array().unwrap().len(), 3);
            }

            // root + compute_step + fan out + 3 * (worker + 3 children)
            assert_eq!(count_nodes(root), 15);
        }

        #[test]
        fn recording_stops_once_the_guard_is_dropped() {
            let path = std::env::temp_dir()
                .join(format!("flame_profile_{}_stopped.json", std::process::id()));
            let guard = Session::global().start(&path, "stopped").unwrap();
            compute_step();
            drop(guard);
            assert!(!Session::global().is_active());

            let trace: Value =
                serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
            assert_eq!(trace["functions"].as_array().unwrap().len(), 1);
        }
    }
}
