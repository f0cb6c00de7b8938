//! Static→Dynamic convention discovery.
//!
//! The source side is authoritative: its declared public properties and
//! zero-arg getters define what can supply a value. Each reference point
//! maps onto a dynamic property of the same member name on the target,
//! but only when the target class does not statically declare that name.
//!
//! Target points here are never statically typed, so this finder has no
//! recursive mode.

use std::collections::BTreeMap;

use crate::error::OperationError;
use crate::finder::{accessor_member, PathFinder};
use crate::point::{SourcePoint, TargetPoint};
use crate::route::{CheckPointCollection, Route, RouteCollection};
use crate::source::Source;
use crate::target::Target;

/// Projects a source's declared surface onto dynamic target members.
#[derive(Debug, Clone, Default)]
pub struct StaticSourceToDynamicTargetPathFinder;

impl StaticSourceToDynamicTargetPathFinder {
    /// Create the finder.
    pub fn new() -> Self {
        Self
    }
}

impl PathFinder for StaticSourceToDynamicTargetPathFinder {
    fn routes(
        &self,
        source: &Source<'_>,
        target: &Target,
    ) -> Result<RouteCollection, OperationError> {
        let schema = source.schema();
        let class = source.class();

        // Member → source point; a property claims its member ahead of a
        // getter over the same member.
        let mut reference: BTreeMap<String, SourcePoint> = BTreeMap::new();
        for property in schema.public_properties() {
            reference.insert(
                property.name.clone(),
                SourcePoint::StaticProperty {
                    class: class.clone(),
                    name: property.name.clone(),
                },
            );
        }
        for method in schema.zero_arg_getters() {
            let Some(member) = accessor_member(&method.name) else {
                continue;
            };
            reference.entry(member).or_insert(SourcePoint::StaticMethod {
                class: class.clone(),
                name: method.name.clone(),
            });
        }

        let mut routes = RouteCollection::new();
        for (member, source_point) in reference {
            if target.schema().declares(&member) {
                continue;
            }
            routes.merge(Route::new(
                source_point,
                TargetPoint::DynamicProperty {
                    class: target.class().clone(),
                    name: member,
                },
                CheckPointCollection::new(),
            ));
        }
        tracing::debug!(
            source = %source.class(),
            target = %target.class(),
            routes = routes.len(),
            "static-to-dynamic discovery"
        );
        Ok(routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::ClassCanonicalizer;
    use crate::introspect::{
        ClassId, ClassIntrospector, ClassRegistry, ClassSchema, MethodSchema, PropertySchema,
        TypeRef,
    };
    use crate::value::Instance;
    use std::sync::Arc;

    #[test]
    fn test_declared_target_members_excluded() {
        let registry = ClassRegistry::new();
        registry
            .register(
                ClassSchema::new("Src")
                    .with_property(PropertySchema::new("kept", TypeRef::Int))
                    .with_property(PropertySchema::new("shadowed", TypeRef::Int))
                    .with_property(PropertySchema::new("hidden", TypeRef::Int).private())
                    .with_method(MethodSchema::getter("getHidden", "hidden")),
            )
            .unwrap();
        registry
            .register(
                ClassSchema::new("Bag")
                    .with_property(PropertySchema::new("shadowed", TypeRef::Int)),
            )
            .unwrap();
        let registry = Arc::new(registry);

        let instance = Instance::default_of(&registry.describe(&ClassId::new("Src")).unwrap());
        let source =
            Source::new(registry.as_ref(), ClassCanonicalizer::new(), &instance).unwrap();
        let target = Target::for_class(
            registry.as_ref(),
            ClassCanonicalizer::new(),
            &ClassId::new("Bag"),
        )
        .unwrap();

        let routes = StaticSourceToDynamicTargetPathFinder::new()
            .routes(&source, &target)
            .unwrap();

        // `shadowed` is statically declared on the target; `hidden` rides
        // its getter.
        assert_eq!(
            routes.fqns(),
            vec!["#Src::getHidden()->~Bag::$hidden", "#Src::$kept->~Bag::$kept"]
        );
    }
}
