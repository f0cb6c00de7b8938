//! Error taxonomy for the mapping kernel.
//!
//! Two families, kept deliberately distinct:
//!
//! - [`ArgumentError`]: construction-time failures such as a malformed canonical
//!   identifier, an unknown class, a structural constraint violated while
//!   building a point, route, or map. These fail fast at the call site and
//!   are never raised mid-pass.
//! - [`OperationError`]: mid-pass failures such as reading a source point,
//!   a checkpoint fault, the recursion guard tripping, or target
//!   finalization going wrong. An `OperationError` inside a path finder
//!   aborts that finder's whole call; inside a checkpoint or `operate()`
//!   it aborts the pass for that pair.
//!
//! A checkpoint's "skip this route" opt-out is **not** an error; it is the
//! [`Checked::Skip`](crate::route::Checked::Skip) outcome, consumed only by
//! the route-execution loop.

use crate::introspect::ClassId;

/// Construction-time failure: malformed identifier or invalid referenced
/// class/member.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    /// The identifier matched none of the point grammars.
    #[error("identifier `{identifier}` does not match the {expected} grammar")]
    Grammar {
        /// The raw identifier as given by the caller.
        identifier: String,
        /// Which grammar (or grammar set) was attempted.
        expected: &'static str,
    },
    /// The referenced class has no registered schema.
    #[error("unknown class `{0}`")]
    UnknownClass(ClassId),
    /// The identifier parsed but a structural constraint failed.
    #[error("`{class}::{member}`: {constraint}")]
    Structure {
        /// Canonicalized class the member was resolved against.
        class: ClassId,
        /// Member (property, method, or parameter) name.
        member: String,
        /// Which constraint was violated.
        constraint: String,
    },
    /// A route builder was finalized without one of its two points.
    #[error("route builder is missing a {0} point")]
    MissingPoint(&'static str),
    /// A map already holds a route with this identity.
    #[error("duplicate route `{0}`")]
    DuplicateRoute(String),
    /// Source and target sequences cannot be positionally aligned.
    #[error("cannot align {sources} source(s) with {targets} target(s)")]
    ShapeMismatch {
        /// Number of sources supplied.
        sources: usize,
        /// Number of targets supplied.
        targets: usize,
    },
}

/// Mid-pass failure while executing a mapping operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    /// Structural fault: the member tables and the live data disagree.
    #[error("introspection failure: {0}")]
    Introspection(String),
    /// A point was applied to a target of a different declaring class.
    #[error("point `{point}` does not belong to target class `{class}`")]
    ForeignPoint {
        /// Canonical identifier of the offending point.
        point: String,
        /// The target's (canonicalized) class.
        class: ClassId,
    },
    /// Reading a source point's value failed.
    #[error("cannot read `{point}`: {reason}")]
    SourceRead {
        /// Canonical identifier of the point.
        point: String,
        /// Why the read failed.
        reason: String,
    },
    /// User-level checkpoint (or filter) fault.
    #[error("checkpoint fault on route `{route}`: {reason}")]
    CheckPoint {
        /// Identity of the route whose pipeline faulted.
        route: String,
        /// Fault description supplied by the checkpoint.
        reason: String,
    },
    /// A recursion checkpoint found a nested value whose runtime class does
    /// not match its declared pairing.
    #[error(
        "nested value `{actual}` does not match declared pairing `{declared}` on route `{route}`"
    )]
    RecursionTypeMismatch {
        /// Identity of the route carrying the recursion checkpoint.
        route: String,
        /// The class the pairing was built for.
        declared: ClassId,
        /// What actually arrived (class id, or a value-kind description).
        actual: String,
    },
    /// Nested mapping re-entered deeper than the recursion bound allows.
    #[error("recursion depth exceeded ({0} levels)")]
    RecursionDepthExceeded(usize),
    /// Target finalization (`operate()`) failed.
    #[error("target finalization failed for `{class}`: {reason}")]
    Finalization {
        /// The target's class.
        class: ClassId,
        /// Why construction or mutation failed.
        reason: String,
    },
    /// A construction-time error surfaced while assembling a pass.
    #[error(transparent)]
    Argument(#[from] ArgumentError),
}

impl OperationError {
    /// Whether this fault is structural (introspection-level) rather than
    /// user-level application logic.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::CheckPoint { .. })
    }
}
