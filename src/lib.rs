//! # remap-kernel
//!
//! Convention-driven object-to-object mapping over explicit class
//! schemas.
//!
//! The kernel answers one question:
//!
//! > Given a source instance and a target class (or instance), which
//! > values **cross over**, through which members, and in what order?
//!
//! ## Core Contract
//!
//! 1. Points name exactly one readable or writable class member, on a
//!    static (declared) or dynamic (runtime) axis
//! 2. Routes pair one source point with one target point and carry an
//!    ordered checkpoint pipeline
//! 3. Path finders discover routes from schema conventions; explicit
//!    routes pre-empt them
//! 4. A pass buffers every routed value, then mutates the target
//!    atomically: it either fully succeeds or leaves the target
//!    untouched
//!
//! ## Architecture
//!
//! ```text
//! Source → PathFinders → Routes → CheckPoints → Target buffers → operate()
//!              ↓
//!       ClassIntrospector (registry of schemas)
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same schemas + same map → identical route collections, in identical
//!   order
//! - Route identity is the concatenation of its point identifiers
//! - Target mutation order is fixed: constructor, methods, properties,
//!   dynamic members

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod canonical;
pub mod error;
pub mod finder;
pub mod introspect;
pub mod map;
pub mod mapper;
pub mod point;
pub mod route;
pub mod source;
pub mod target;
pub mod value;

// Re-exports
pub use canonical::ClassCanonicalizer;
pub use error::{ArgumentError, OperationError};
pub use finder::{
    DynamicSourceToStaticTargetPathFinder, PathFinder, PathFinderCollection, StaticPathFinder,
    StaticSourceToDynamicTargetPathFinder,
};
pub use introspect::{
    ClassId, ClassIntrospector, ClassRegistry, ClassSchema, MethodKind, MethodSchema, ParamSchema,
    PropertySchema, TypeRef, CONSTRUCTOR_NAME,
};
pub use map::{Filter, FilterCollection, Map, MapBuilder, MapId, DEFAULT_PATH_FINDER_PRIORITY};
pub use mapper::{MapTarget, ObjectMapper};
pub use point::{PointFactory, SourcePoint, TargetPoint, DYNAMIC_MARKER, STATIC_MARKER};
pub use route::{
    CheckContext, CheckPoint, CheckPointCollection, Checked, IterableRecursionCheckPoint,
    RecursionCheckPoint, RecursionTrail, Route, RouteBuilder, RouteCollection,
    MAX_RECURSION_DEPTH,
};
pub use source::Source;
pub use target::Target;
pub use value::{Instance, Value};
