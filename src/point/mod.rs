//! Point model: typed handles to named class members.
//!
//! Points come in two axes. **Source vs target** decides read vs write
//! capability, encoded in the [`SourcePoint`] / [`TargetPoint`] split, so
//! a route can only ever pair a readable point with a writable one.
//! **Static vs dynamic** decides whether the member is resolvable from the
//! class declaration alone or only observable on a live instance.
//!
//! Every point renders a canonical identifier (its `fqn`) carrying the
//! role marker: `#` static, `~` dynamic. Route identity is built from
//! these identifiers.

pub mod factory;

pub use factory::PointFactory;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::introspect::ClassId;

/// Role marker for statically declared members.
pub const STATIC_MARKER: char = '#';
/// Role marker for dynamic (instance-only) members.
pub const DYNAMIC_MARKER: char = '~';

/// A readable point on a source class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourcePoint {
    /// Declared property read.
    StaticProperty {
        /// Declaring class.
        class: ClassId,
        /// Property name.
        name: String,
    },
    /// Dynamic (undeclared) property read.
    DynamicProperty {
        /// Declaring class.
        class: ClassId,
        /// Member name.
        name: String,
    },
    /// Declared zero-arg method read.
    StaticMethod {
        /// Declaring class.
        class: ClassId,
        /// Method name.
        name: String,
    },
    /// Dynamic zero-arg method read.
    DynamicMethod {
        /// Declaring class.
        class: ClassId,
        /// Method name.
        name: String,
    },
}

impl SourcePoint {
    /// The point's declaring class.
    pub fn class(&self) -> &ClassId {
        match self {
            Self::StaticProperty { class, .. }
            | Self::DynamicProperty { class, .. }
            | Self::StaticMethod { class, .. }
            | Self::DynamicMethod { class, .. } => class,
        }
    }

    /// The member name the point addresses.
    pub fn member(&self) -> &str {
        match self {
            Self::StaticProperty { name, .. }
            | Self::DynamicProperty { name, .. }
            | Self::StaticMethod { name, .. }
            | Self::DynamicMethod { name, .. } => name,
        }
    }

    /// Whether the point resolves from the class declaration alone.
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            Self::StaticProperty { .. } | Self::StaticMethod { .. }
        )
    }

    /// Canonical identifier, role marker included.
    pub fn fqn(&self) -> String {
        match self {
            Self::StaticProperty { class, name } => format!("{STATIC_MARKER}{class}::${name}"),
            Self::DynamicProperty { class, name } => format!("{DYNAMIC_MARKER}{class}::${name}"),
            Self::StaticMethod { class, name } => format!("{STATIC_MARKER}{class}::{name}()"),
            Self::DynamicMethod { class, name } => format!("{DYNAMIC_MARKER}{class}::{name}()"),
        }
    }
}

impl fmt::Display for SourcePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fqn())
    }
}

/// A writable point on a target class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetPoint {
    /// Declared property write.
    StaticProperty {
        /// Declaring class.
        class: ClassId,
        /// Property name.
        name: String,
    },
    /// Dynamic (undeclared) property write.
    DynamicProperty {
        /// Declaring class.
        class: ClassId,
        /// Member name.
        name: String,
    },
    /// Parameter of a declared method (constructor or setter).
    StaticParameter {
        /// Declaring class.
        class: ClassId,
        /// Method name.
        method: String,
        /// Parameter name.
        name: String,
    },
    /// Parameter of a dynamic (undeclared) method call.
    DynamicParameter {
        /// Declaring class.
        class: ClassId,
        /// Method name.
        method: String,
        /// Parameter name.
        name: String,
    },
}

impl TargetPoint {
    /// The point's declaring class.
    pub fn class(&self) -> &ClassId {
        match self {
            Self::StaticProperty { class, .. }
            | Self::DynamicProperty { class, .. }
            | Self::StaticParameter { class, .. }
            | Self::DynamicParameter { class, .. } => class,
        }
    }

    /// The member name the point addresses (the parameter name for
    /// parameter points).
    pub fn member(&self) -> &str {
        match self {
            Self::StaticProperty { name, .. }
            | Self::DynamicProperty { name, .. }
            | Self::StaticParameter { name, .. }
            | Self::DynamicParameter { name, .. } => name,
        }
    }

    /// Whether the point resolves from the class declaration alone.
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            Self::StaticProperty { .. } | Self::StaticParameter { .. }
        )
    }

    /// Canonical identifier, role marker included.
    pub fn fqn(&self) -> String {
        match self {
            Self::StaticProperty { class, name } => format!("{STATIC_MARKER}{class}::${name}"),
            Self::DynamicProperty { class, name } => format!("{DYNAMIC_MARKER}{class}::${name}"),
            Self::StaticParameter {
                class,
                method,
                name,
            } => format!("{STATIC_MARKER}{class}::{method}()::${name}"),
            Self::DynamicParameter {
                class,
                method,
                name,
            } => format!("{DYNAMIC_MARKER}{class}::{method}()::${name}"),
        }
    }
}

impl fmt::Display for TargetPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fqn())
    }
}
