// Copyright 2025 Irreducible Inc.

/// The kind of a recorded span.
///
/// `Session` is reserved for the synthetic root frame of the call stack and
/// never appears in trace output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Session,
    Function,
    Scope,
    ParallelFunction,
    ParallelScope,
}

impl SpanKind {
    /// The label written to the `"t"` field of a trace node.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Function => "function",
            Self::Scope => "scope",
            Self::ParallelFunction => "parallel_function",
            Self::ParallelScope => "parallel_scope",
        }
    }

    /// Whether spans opened directly under a frame of this kind must
    /// rendezvous at the frame barrier and serialize behind the frame guard.
    pub fn is_parallel(self) -> bool {
        matches!(self, Self::ParallelFunction | Self::ParallelScope)
    }
}
