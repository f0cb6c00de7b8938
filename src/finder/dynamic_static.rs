//! Dynamic→Static convention discovery.
//!
//! Mirrors Static→Static with the reference points read from the source
//! *instance's* live, non-declared surface: every dynamic member is a
//! candidate. The compatible target is resolved with the usual
//! precedence (constructor parameter pre-empts property pre-empts
//! setter); when the target class offers no compatible static point and
//! does not declare the member at all, the route falls back to a dynamic
//! target property, so undeclared data still crosses over.

use crate::canonical::ClassCanonicalizer;
use crate::error::OperationError;
use crate::finder::{compatible_static_target, splice_recursions, PathFinder};
use crate::point::{SourcePoint, TargetPoint};
use crate::route::{CheckPointCollection, Route, RouteCollection};
use crate::source::Source;
use crate::target::Target;

/// Projects a source instance's dynamic surface onto the target's
/// declared (or, failing that, dynamic) members.
#[derive(Debug, Clone)]
pub struct DynamicSourceToStaticTargetPathFinder {
    canonicalizer: ClassCanonicalizer,
    recursive: bool,
}

impl DynamicSourceToStaticTargetPathFinder {
    /// Non-recursive discovery.
    pub fn new(canonicalizer: ClassCanonicalizer) -> Self {
        Self {
            canonicalizer,
            recursive: false,
        }
    }

    /// Recursive discovery over statically typed target points.
    pub fn recursive(canonicalizer: ClassCanonicalizer) -> Self {
        Self {
            canonicalizer,
            recursive: true,
        }
    }
}

impl PathFinder for DynamicSourceToStaticTargetPathFinder {
    fn routes(
        &self,
        source: &Source<'_>,
        target: &Target,
    ) -> Result<RouteCollection, OperationError> {
        let mut routes = RouteCollection::new();
        for (member, _) in source.instance().dynamic_members() {
            let source_point = SourcePoint::DynamicProperty {
                class: source.class().clone(),
                name: member.to_string(),
            };
            let target_point =
                match compatible_static_target(target.schema(), target.class(), member) {
                    Some(point) => point,
                    None if !target.schema().declares(member) => TargetPoint::DynamicProperty {
                        class: target.class().clone(),
                        name: member.to_string(),
                    },
                    // Declared but unreachable (private, no setter):
                    // skip the reference point.
                    None => continue,
                };
            routes.merge(Route::new(
                source_point,
                target_point,
                CheckPointCollection::new(),
            ));
        }
        tracing::debug!(
            source = %source.class(),
            target = %target.class(),
            routes = routes.len(),
            recursive = self.recursive,
            "dynamic-to-static discovery"
        );
        if self.recursive {
            routes = splice_recursions(routes, source, target, &self.canonicalizer)?;
        }
        Ok(routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::{
        ClassId, ClassRegistry, ClassSchema, MethodSchema, PropertySchema, TypeRef,
    };
    use crate::value::Instance;
    use std::sync::Arc;

    fn registry() -> Arc<ClassRegistry> {
        let registry = ClassRegistry::new();
        registry.register(ClassSchema::new("Loose")).unwrap();
        registry
            .register(
                ClassSchema::new("T")
                    .with_property(PropertySchema::new("a", TypeRef::Int))
                    .with_property(PropertySchema::new("b", TypeRef::Str).private())
                    .with_method(MethodSchema::setter("setB", "b", TypeRef::Str)),
            )
            .unwrap();
        Arc::new(registry)
    }

    #[test]
    fn test_dynamic_members_route_to_static_or_dynamic_targets() {
        let registry = registry();
        let instance = Instance::new("Loose")
            .with_dynamic("a", 1i64)
            .with_dynamic("b", "two")
            .with_dynamic("y", 9i64);
        let source =
            Source::new(registry.as_ref(), ClassCanonicalizer::new(), &instance).unwrap();
        let target = Target::for_class(
            registry.as_ref(),
            ClassCanonicalizer::new(),
            &ClassId::new("T"),
        )
        .unwrap();

        let routes = DynamicSourceToStaticTargetPathFinder::new(ClassCanonicalizer::new())
            .routes(&source, &target)
            .unwrap();

        // `a` hits the declared property, `b` its setter, `y` falls back
        // to a dynamic target property.
        assert_eq!(
            routes.fqns(),
            vec![
                "~Loose::$a->#T::$a",
                "~Loose::$b->#T::setB()::$b",
                "~Loose::$y->~T::$y"
            ]
        );
    }

    #[test]
    fn test_declared_but_unreachable_member_skipped() {
        let registry = ClassRegistry::new();
        registry.register(ClassSchema::new("Loose")).unwrap();
        registry
            .register(
                ClassSchema::new("Sealed")
                    .with_property(PropertySchema::new("b", TypeRef::Str).private()),
            )
            .unwrap();
        let registry = Arc::new(registry);

        let instance = Instance::new("Loose").with_dynamic("b", "two");
        let source =
            Source::new(registry.as_ref(), ClassCanonicalizer::new(), &instance).unwrap();
        let target = Target::for_class(
            registry.as_ref(),
            ClassCanonicalizer::new(),
            &ClassId::new("Sealed"),
        )
        .unwrap();

        let routes = DynamicSourceToStaticTargetPathFinder::new(ClassCanonicalizer::new())
            .routes(&source, &target)
            .unwrap();
        assert!(routes.is_empty());
    }
}
