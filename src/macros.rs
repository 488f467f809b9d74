// Copyright 2025 Irreducible Inc.

/// Expands to the path of the enclosing function.
#[doc(hidden)]
#[macro_export]
macro_rules! __function_name {
    () => {{
        fn marker() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(marker);
        // strip the trailing "::marker"
        &name[..name.len() - "::marker".len()]
    }};
}

/// Records the body of the enclosing function as a span on the global
/// session. Place it as the first statement of the function.
#[macro_export]
macro_rules! profile_function {
    () => {
        let _profile_span = $crate::SpanTracker::enter(
            $crate::Session::global(),
            $crate::__function_name!(),
            line!(),
            $crate::SpanKind::Function,
            1,
        );
    };
}

/// Like [`profile_function!`], but declares the function a parallel frame:
/// the `$participants` spans opened directly under it rendezvous before any
/// of them starts, then run one at a time.
#[macro_export]
macro_rules! profile_parallel_function {
    ($participants:expr) => {
        let _profile_span = $crate::SpanTracker::enter(
            $crate::Session::global(),
            $crate::__function_name!(),
            line!(),
            $crate::SpanKind::ParallelFunction,
            $participants,
        );
    };
}

/// Records the rest of the enclosing lexical scope as a span named `$name`
/// on the global session.
#[macro_export]
macro_rules! profile_scope {
    ($name:expr) => {
        let _profile_span = $crate::SpanTracker::enter(
            $crate::Session::global(),
            $name,
            line!(),
            $crate::SpanKind::Scope,
            1,
        );
    };
}

/// Like [`profile_scope!`], but declares the scope a parallel frame with
/// `$participants` expected child spans.
///
/// The count is a contract: fewer spans than declared leaves the cohort
/// blocked at the barrier forever.
#[macro_export]
macro_rules! profile_parallel_scope {
    ($name:expr, $participants:expr) => {
        let _profile_span = $crate::SpanTracker::enter(
            $crate::Session::global(),
            $name,
            line!(),
            $crate::SpanKind::ParallelScope,
            $participants,
        );
    };
}
