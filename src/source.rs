//! Source wrapper: read-only point lookup over a live instance.

use std::sync::Arc;

use crate::canonical::ClassCanonicalizer;
use crate::error::{ArgumentError, OperationError};
use crate::introspect::{ClassId, ClassIntrospector, ClassSchema, MethodKind};
use crate::point::SourcePoint;
use crate::value::{Instance, Value};

/// Read adapter over a source instance.
///
/// Wraps a borrowed instance with its schema and answers
/// [`point_value`](Source::point_value) lookups for the four source point
/// variants. Holds no mutable state; a fresh wrapper per pass is cheap.
#[derive(Debug)]
pub struct Source<'a> {
    class: ClassId,
    schema: Arc<ClassSchema>,
    canonicalizer: ClassCanonicalizer,
    instance: &'a Instance,
}

impl<'a> Source<'a> {
    /// Wrap an instance, resolving its (canonicalized) class schema.
    pub fn new(
        introspector: &dyn ClassIntrospector,
        canonicalizer: ClassCanonicalizer,
        instance: &'a Instance,
    ) -> Result<Self, OperationError> {
        let class = canonicalizer.canonicalize_id(instance.class());
        let schema = introspector
            .describe(&class)
            .ok_or(ArgumentError::UnknownClass(class.clone()))?;
        Ok(Self {
            class,
            schema,
            canonicalizer,
            instance,
        })
    }

    /// The source's canonicalized class.
    pub fn class(&self) -> &ClassId {
        &self.class
    }

    /// The source class schema.
    pub fn schema(&self) -> &Arc<ClassSchema> {
        &self.schema
    }

    /// The wrapped instance.
    pub fn instance(&self) -> &Instance {
        self.instance
    }

    /// The canonicalizer applied to class comparisons for this pass.
    pub fn canonicalizer(&self) -> &ClassCanonicalizer {
        &self.canonicalizer
    }

    /// Read the value a source point addresses.
    ///
    /// Static properties read declared slots; dynamic properties read the
    /// live dynamic surface; method points read through their accessor
    /// (explicit `Getter` backing member, or the `get`/`is` naming
    /// convention).
    pub fn point_value(&self, point: &SourcePoint) -> Result<Value, OperationError> {
        if !self.canonicalizer.same_class(point.class(), &self.class) {
            return Err(OperationError::SourceRead {
                point: point.fqn(),
                reason: format!("point declared on `{}`, source is `{}`", point.class(), self.class),
            });
        }
        match point {
            SourcePoint::StaticProperty { name, .. } => self
                .instance
                .declared_get(name)
                .cloned()
                .ok_or_else(|| {
                    OperationError::Introspection(format!(
                        "instance of `{}` is missing declared slot `{name}`",
                        self.class
                    ))
                }),
            SourcePoint::DynamicProperty { name, .. } => self
                .instance
                .dynamic_get(name)
                .cloned()
                .ok_or_else(|| OperationError::SourceRead {
                    point: point.fqn(),
                    reason: "dynamic member absent from the live instance".to_string(),
                }),
            SourcePoint::StaticMethod { name, .. } => {
                let method = self.schema.method(name).ok_or_else(|| {
                    OperationError::Introspection(format!(
                        "`{}::{name}()` vanished from the schema",
                        self.class
                    ))
                })?;
                let backing = match &method.kind {
                    MethodKind::Getter(backing) => backing.clone(),
                    _ => crate::finder::accessor_member(name).ok_or_else(|| {
                        OperationError::SourceRead {
                            point: point.fqn(),
                            reason: "method has no readable backing member".to_string(),
                        }
                    })?,
                };
                self.instance.declared_get(&backing).cloned().ok_or_else(|| {
                    OperationError::Introspection(format!(
                        "backing member `{backing}` missing on `{}`",
                        self.class
                    ))
                })
            }
            SourcePoint::DynamicMethod { name, .. } => {
                let member = crate::finder::accessor_member(name)
                    .unwrap_or_else(|| name.clone());
                self.instance
                    .dynamic_get(&member)
                    .cloned()
                    .ok_or_else(|| OperationError::SourceRead {
                        point: point.fqn(),
                        reason: format!("no dynamic member `{member}` behind the method"),
                    })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::{ClassRegistry, ClassSchema, MethodSchema, PropertySchema, TypeRef};

    fn setup() -> (Arc<ClassRegistry>, Instance) {
        let registry = ClassRegistry::new();
        registry
            .register(
                ClassSchema::new("Src")
                    .with_property(PropertySchema::new("a", TypeRef::Int).private())
                    .with_method(MethodSchema::getter("getA", "a")),
            )
            .unwrap();
        let instance = Instance::default_of(
            &registry.describe(&ClassId::new("Src")).unwrap(),
        )
        .with("a", 7i64)
        .with_dynamic("y", 9i64);
        (Arc::new(registry), instance)
    }

    #[test]
    fn test_reads_property_getter_and_dynamic_member() {
        let (registry, instance) = setup();
        let source =
            Source::new(registry.as_ref(), ClassCanonicalizer::new(), &instance).unwrap();

        let prop = SourcePoint::StaticProperty {
            class: ClassId::new("Src"),
            name: "a".to_string(),
        };
        assert_eq!(source.point_value(&prop).unwrap(), Value::Int(7));

        let getter = SourcePoint::StaticMethod {
            class: ClassId::new("Src"),
            name: "getA".to_string(),
        };
        assert_eq!(source.point_value(&getter).unwrap(), Value::Int(7));

        let dynamic = SourcePoint::DynamicProperty {
            class: ClassId::new("Src"),
            name: "y".to_string(),
        };
        assert_eq!(source.point_value(&dynamic).unwrap(), Value::Int(9));
    }

    #[test]
    fn test_foreign_point_rejected() {
        let (registry, instance) = setup();
        let source =
            Source::new(registry.as_ref(), ClassCanonicalizer::new(), &instance).unwrap();
        let foreign = SourcePoint::StaticProperty {
            class: ClassId::new("Other"),
            name: "a".to_string(),
        };
        assert!(matches!(
            source.point_value(&foreign),
            Err(OperationError::SourceRead { .. })
        ));
    }

    #[test]
    fn test_absent_dynamic_member_is_a_read_fault() {
        let (registry, instance) = setup();
        let source =
            Source::new(registry.as_ref(), ClassCanonicalizer::new(), &instance).unwrap();
        let missing = SourcePoint::DynamicProperty {
            class: ClassId::new("Src"),
            name: "z".to_string(),
        };
        assert!(matches!(
            source.point_value(&missing),
            Err(OperationError::SourceRead { .. })
        ));
    }
}
