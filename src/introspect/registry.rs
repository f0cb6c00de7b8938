//! Class schema registry.
//!
//! [`ClassRegistry`] is the default [`ClassIntrospector`]: a read-mostly
//! table of class schemas. Classes are registered once at startup and the
//! registry is then shared read-only (behind `Arc`) across any number of
//! concurrent mapping passes.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::ArgumentError;
use crate::introspect::class::{ClassId, ClassSchema, MethodKind};

/// Static introspection capability.
///
/// The point factory and the path finders never reflect on live values;
/// everything they know about a class comes through this trait. A
/// non-reflective environment can supply a generated table instead of the
/// default registry.
pub trait ClassIntrospector: Send + Sync {
    /// The schema for a (canonicalized) class id, if the class is known.
    fn describe(&self, class: &ClassId) -> Option<Arc<ClassSchema>>;
}

/// In-memory schema table.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    schemas: RwLock<BTreeMap<ClassId, Arc<ClassSchema>>>,
}

impl ClassRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class schema, replacing any previous schema for the
    /// same id.
    ///
    /// Validates that every getter and setter names a backing member the
    /// class actually declares; a dangling accessor is an
    /// [`ArgumentError::Structure`].
    pub fn register(&self, schema: ClassSchema) -> Result<(), ArgumentError> {
        for method in &schema.methods {
            let backing = match &method.kind {
                MethodKind::Getter(backing) | MethodKind::Setter(backing) => backing,
                _ => continue,
            };
            if schema.property(backing).is_none() {
                return Err(ArgumentError::Structure {
                    class: schema.id.clone(),
                    member: method.name.clone(),
                    constraint: format!("accessor backing member `{backing}` is not declared"),
                });
            }
        }
        self.schemas
            .write()
            .insert(schema.id.clone(), Arc::new(schema));
        Ok(())
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }
}

impl ClassIntrospector for ClassRegistry {
    fn describe(&self, class: &ClassId) -> Option<Arc<ClassSchema>> {
        self.schemas.read().get(class).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::class::{MethodSchema, PropertySchema, TypeRef};

    #[test]
    fn test_register_and_describe() {
        let registry = ClassRegistry::new();
        registry
            .register(ClassSchema::new("A").with_property(PropertySchema::new("x", TypeRef::Int)))
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.describe(&ClassId::new("A")).is_some());
        assert!(registry.describe(&ClassId::new("B")).is_none());
    }

    #[test]
    fn test_dangling_accessor_rejected() {
        let registry = ClassRegistry::new();
        let schema = ClassSchema::new("A").with_method(MethodSchema::getter("getX", "x"));

        let err = registry.register(schema).unwrap_err();
        assert!(matches!(err, ArgumentError::Structure { .. }));
    }

    #[test]
    fn test_reregistration_replaces() {
        let registry = ClassRegistry::new();
        registry.register(ClassSchema::new("A")).unwrap();
        registry
            .register(ClassSchema::new("A").with_property(PropertySchema::new("x", TypeRef::Int)))
            .unwrap();

        let schema = registry.describe(&ClassId::new("A")).unwrap();
        assert!(schema.property("x").is_some());
        assert_eq!(registry.len(), 1);
    }
}
