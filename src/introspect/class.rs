//! Class member tables.
//!
//! A [`ClassSchema`] is the static declaration surface of a class: its
//! declared properties and methods, with parameter names, positions, and
//! types. Schemas stand in for runtime reflection; they are the
//! compile-time-style tables the point factory and the path finders
//! introspect.
//!
//! Schemas are plain immutable values assembled with `with_*` builders and
//! shared behind `Arc` once registered.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a class.
///
/// Stores whatever string it was built from; stripping wrapper-proxy
/// prefixes is the caller's job. The point factory and the Source/Target
/// wrappers run every raw id through a
/// [`ClassCanonicalizer`](crate::canonical::ClassCanonicalizer) before
/// schema lookup. Implements `Ord` so schema tables iterate
/// deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassId(String);

impl ClassId {
    /// Create a class id from a raw string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ClassId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ClassId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Declared type of a property or parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRef {
    /// No declared type; anything goes.
    Any,
    /// Boolean.
    Bool,
    /// Integer.
    Int,
    /// Float.
    Float,
    /// String.
    Str,
    /// Homogeneous list of the inner type.
    ListOf(Box<TypeRef>),
    /// Object of the given class.
    Object(ClassId),
}

impl TypeRef {
    /// The class this type names, when it is an object type.
    pub fn object_class(&self) -> Option<&ClassId> {
        match self {
            Self::Object(class) => Some(class),
            _ => None,
        }
    }

    /// The element class, when this is a list of objects.
    pub fn object_element_class(&self) -> Option<&ClassId> {
        match self {
            Self::ListOf(inner) => inner.object_class(),
            _ => None,
        }
    }
}

/// A declared property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySchema {
    /// Property name.
    pub name: String,
    /// Declared type.
    pub type_ref: TypeRef,
    /// Whether the property is part of the public surface.
    ///
    /// Non-public properties are invisible to convention discovery but
    /// still back getters and setters.
    pub public: bool,
}

impl PropertySchema {
    /// Create a public property.
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_ref,
            public: true,
        }
    }

    /// Mark the property as non-public.
    pub fn private(mut self) -> Self {
        self.public = false;
        self
    }
}

/// A declared method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSchema {
    /// Parameter name.
    pub name: String,
    /// Declared type.
    pub type_ref: TypeRef,
    /// Zero-based declared position.
    pub position: usize,
    /// Whether a call must supply this parameter.
    pub required: bool,
}

impl ParamSchema {
    /// Create a required parameter.
    pub fn new(name: impl Into<String>, type_ref: TypeRef, position: usize) -> Self {
        Self {
            name: name.into(),
            type_ref,
            position,
            required: true,
        }
    }

    /// Mark the parameter as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// How a method call mutates or reads an instance.
///
/// Schemas carry accessor semantics explicitly instead of interpreting
/// method bodies: a getter reads its backing member, a setter writes it,
/// a plain method assigns each argument to the same-named member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodKind {
    /// The class constructor; applied only by target instantiation.
    Constructor,
    /// Zero-arg read of the named backing member.
    Getter(String),
    /// Single-arg write of the named backing member.
    Setter(String),
    /// Assigns each argument to the member named after the parameter.
    Plain,
}

/// A declared method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSchema {
    /// Method name.
    pub name: String,
    /// Call semantics.
    pub kind: MethodKind,
    /// Declared parameters, in position order.
    pub params: Vec<ParamSchema>,
}

impl MethodSchema {
    /// Declare the constructor. Its canonical name is
    /// [`CONSTRUCTOR_NAME`].
    pub fn constructor(params: Vec<ParamSchema>) -> Self {
        Self {
            name: CONSTRUCTOR_NAME.to_string(),
            kind: MethodKind::Constructor,
            params: sorted_by_position(params),
        }
    }

    /// Declare a zero-arg getter over a backing member.
    pub fn getter(name: impl Into<String>, backing: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MethodKind::Getter(backing.into()),
            params: Vec::new(),
        }
    }

    /// Declare a single-parameter setter over a backing member. The
    /// parameter is named after the backing member.
    pub fn setter(name: impl Into<String>, backing: impl Into<String>, type_ref: TypeRef) -> Self {
        let backing = backing.into();
        Self {
            name: name.into(),
            kind: MethodKind::Setter(backing.clone()),
            params: vec![ParamSchema::new(backing, type_ref, 0)],
        }
    }

    /// Declare a plain method.
    pub fn plain(name: impl Into<String>, params: Vec<ParamSchema>) -> Self {
        Self {
            name: name.into(),
            kind: MethodKind::Plain,
            params: sorted_by_position(params),
        }
    }

    /// Look up a parameter by name.
    pub fn param(&self, name: &str) -> Option<&ParamSchema> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Whether the method can be called with no arguments.
    pub fn is_zero_arg(&self) -> bool {
        self.params.iter().all(|p| !p.required)
    }

    /// Number of required parameters.
    pub fn required_params(&self) -> usize {
        self.params.iter().filter(|p| p.required).count()
    }
}

/// Canonical name of the constructor method in point identifiers
/// (`Class::new()::$param`).
pub const CONSTRUCTOR_NAME: &str = "new";

fn sorted_by_position(mut params: Vec<ParamSchema>) -> Vec<ParamSchema> {
    params.sort_by_key(|p| p.position);
    params
}

/// The full static declaration surface of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSchema {
    /// Canonical class id.
    pub id: ClassId,
    /// Declared properties, in declaration order.
    pub properties: Vec<PropertySchema>,
    /// Declared methods, in declaration order.
    pub methods: Vec<MethodSchema>,
}

impl ClassSchema {
    /// Create an empty schema for a class.
    pub fn new(id: impl Into<ClassId>) -> Self {
        Self {
            id: id.into(),
            properties: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Add a declared property.
    pub fn with_property(mut self, property: PropertySchema) -> Self {
        self.properties.push(property);
        self
    }

    /// Add a declared method.
    pub fn with_method(mut self, method: MethodSchema) -> Self {
        self.methods.push(method);
        self
    }

    /// Look up a declared property.
    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Look up a declared method.
    pub fn method(&self, name: &str) -> Option<&MethodSchema> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// The constructor, when one is declared.
    pub fn constructor(&self) -> Option<&MethodSchema> {
        self.methods
            .iter()
            .find(|m| matches!(m.kind, MethodKind::Constructor))
    }

    /// Whether the class statically declares `name` as a property or a
    /// method. Dynamic points require this to be false.
    pub fn declares(&self, name: &str) -> bool {
        self.property(name).is_some() || self.method(name).is_some()
    }

    /// Declared public properties, in declaration order.
    pub fn public_properties(&self) -> impl Iterator<Item = &PropertySchema> {
        self.properties.iter().filter(|p| p.public)
    }

    /// Declared zero-arg getters (explicit `Getter` kind only).
    pub fn zero_arg_getters(&self) -> impl Iterator<Item = &MethodSchema> {
        self.methods
            .iter()
            .filter(|m| matches!(m.kind, MethodKind::Getter(_)) && m.is_zero_arg())
    }
}
