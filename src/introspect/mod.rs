//! Static introspection: class member tables and the registry that serves
//! them.

pub mod class;
pub mod registry;

pub use class::{
    ClassId, ClassSchema, MethodKind, MethodSchema, ParamSchema, PropertySchema, TypeRef,
    CONSTRUCTOR_NAME,
};
pub use registry::{ClassIntrospector, ClassRegistry};
