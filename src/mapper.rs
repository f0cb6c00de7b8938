//! The orchestrator: drives Source → CheckPoints → Target for one or
//! many pairs.
//!
//! A pass over one pair is a sequential fold over its routes; later
//! checkpoints may depend on earlier results, and recursion checkpoints
//! re-enter [`map_pair`](ObjectMapper::map_pair) on narrowed pairs. The
//! mapper itself holds no mutable state; the only mutable resource in a
//! pass is the target's private value buffers.

use std::fmt;
use std::sync::Arc;

use crate::canonical::ClassCanonicalizer;
use crate::error::{ArgumentError, OperationError};
use crate::introspect::{ClassId, ClassIntrospector, ClassRegistry};
use crate::map::Map;
use crate::point::PointFactory;
use crate::route::{CheckContext, Checked, RecursionTrail};
use crate::source::Source;
use crate::target::Target;
use crate::value::Instance;

/// What a mapping call writes into: an existing instance, or a class to
/// instantiate.
#[derive(Debug, Clone)]
pub enum MapTarget {
    /// Map onto a pre-existing instance.
    Instance(Instance),
    /// Instantiate the class and map onto the fresh instance.
    Class(ClassId),
}

impl From<Instance> for MapTarget {
    fn from(instance: Instance) -> Self {
        Self::Instance(instance)
    }
}

impl From<ClassId> for MapTarget {
    fn from(class: ClassId) -> Self {
        Self::Class(class)
    }
}

impl From<&str> for MapTarget {
    fn from(class: &str) -> Self {
        Self::Class(ClassId::new(class))
    }
}

/// Convention-driven object-to-object mapper.
#[derive(Clone)]
pub struct ObjectMapper {
    introspector: Arc<dyn ClassIntrospector>,
    canonicalizer: ClassCanonicalizer,
    factory: PointFactory,
}

impl fmt::Debug for ObjectMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectMapper")
            .field("canonicalizer", &self.canonicalizer)
            .finish_non_exhaustive()
    }
}

impl ObjectMapper {
    /// Create a mapper over an introspector and canonicalizer.
    pub fn new(
        introspector: Arc<dyn ClassIntrospector>,
        canonicalizer: ClassCanonicalizer,
    ) -> Self {
        let factory = PointFactory::new(Arc::clone(&introspector), canonicalizer.clone());
        Self {
            introspector,
            canonicalizer,
            factory,
        }
    }

    /// Create a mapper over a class registry with the default
    /// canonicalizer.
    pub fn with_registry(registry: Arc<ClassRegistry>) -> Self {
        Self::new(registry, ClassCanonicalizer::new())
    }

    /// The point factory sharing this mapper's introspector and
    /// canonicalizer.
    pub fn factory(&self) -> &PointFactory {
        &self.factory
    }

    /// The class-identity canonicalizer.
    pub fn canonicalizer(&self) -> &ClassCanonicalizer {
        &self.canonicalizer
    }

    /// Wrap an instance as a mapping source.
    pub fn source_for<'a>(&self, instance: &'a Instance) -> Result<Source<'a>, OperationError> {
        Source::new(
            self.introspector.as_ref(),
            self.canonicalizer.clone(),
            instance,
        )
    }

    /// Empty target for a class.
    pub fn target_for_class(&self, class: &ClassId) -> Result<Target, OperationError> {
        Target::for_class(self.introspector.as_ref(), self.canonicalizer.clone(), class)
    }

    /// Target over a pre-existing instance.
    pub fn target_for_instance(&self, instance: Instance) -> Result<Target, OperationError> {
        Target::for_instance(
            self.introspector.as_ref(),
            self.canonicalizer.clone(),
            instance,
        )
    }

    /// Map one source onto one target, under an optional map (a default
    /// map is built when none is supplied).
    pub fn map_one(
        &self,
        source: &Instance,
        target: impl Into<MapTarget>,
        map: Option<&Map>,
    ) -> Result<Instance, OperationError> {
        let default_map;
        let map = match map {
            Some(map) => map,
            None => {
                default_map = Map::default_for(&self.factory);
                &default_map
            }
        };
        let source = self.source_for(source)?;
        let mut target = match target.into() {
            MapTarget::Instance(instance) => self.target_for_instance(instance)?,
            MapTarget::Class(class) => self.target_for_class(&class)?,
        };
        tracing::debug!(
            map = %map.id(),
            source = %source.class(),
            target = %target.class(),
            "mapping pass"
        );
        let mut trail = RecursionTrail::new();
        self.map_pair(&source, &mut target, map, &mut trail)
    }

    /// Map sources onto targets positionally.
    ///
    /// Equal-length inputs are zipped; a single source broadcasts over
    /// many targets; any other shape is an
    /// [`ArgumentError::ShapeMismatch`]. The result is positionally
    /// aligned with the targets.
    pub fn map_many(
        &self,
        sources: &[Instance],
        targets: Vec<MapTarget>,
        map: Option<&Map>,
    ) -> Result<Vec<Instance>, OperationError> {
        let mut mapped = Vec::with_capacity(targets.len());
        if sources.len() == targets.len() {
            for (source, target) in sources.iter().zip(targets) {
                mapped.push(self.map_one(source, target, map)?);
            }
        } else if sources.len() == 1 {
            for target in targets {
                mapped.push(self.map_one(&sources[0], target, map)?);
            }
        } else {
            return Err(ArgumentError::ShapeMismatch {
                sources: sources.len(),
                targets: targets.len(),
            }
            .into());
        }
        Ok(mapped)
    }

    /// Map a single wrapped pair: the primitive recursion checkpoints
    /// re-enter.
    ///
    /// Resolves the pair's routes under the map; an empty collection
    /// passes the target through unchanged. Otherwise each route, in
    /// deterministic order, reads its source value, runs its checkpoint
    /// pipeline (a skip abandons only that route) and the route's filter
    /// if one is keyed, and buffers the result; `operate()` then applies
    /// the buffers atomically.
    pub fn map_pair(
        &self,
        source: &Source<'_>,
        target: &mut Target,
        map: &Map,
        trail: &mut RecursionTrail,
    ) -> Result<Instance, OperationError> {
        let routes = map.routes_for(source, target)?;
        if routes.is_empty() {
            tracing::warn!(
                source = %source.class(),
                target = %target.class(),
                "no routes for pair; target passes through unchanged"
            );
            return match target.instance() {
                Some(existing) => Ok(existing.clone()),
                None => target.operate(),
            };
        }

        'routes: for route in routes.iter() {
            let mut value = source.point_value(route.source())?;
            {
                let mut ctx = CheckContext {
                    route,
                    map,
                    source,
                    target: &*target,
                    mapper: self,
                    trail: &mut *trail,
                };
                for (_position, checkpoint) in route.checkpoints().iter() {
                    value = match checkpoint.check(value, &mut ctx)? {
                        Checked::Value(next) => next,
                        Checked::Skip => {
                            tracing::trace!(route = route.fqn(), "checkpoint skipped route");
                            continue 'routes;
                        }
                    };
                }
                if let Some(filter) = map.filter_for(route) {
                    value = match filter.filter(value, &mut ctx)? {
                        Checked::Value(next) => next,
                        Checked::Skip => {
                            tracing::trace!(route = route.fqn(), "filter skipped route");
                            continue 'routes;
                        }
                    };
                }
            }
            target.set_point_value(route.target(), value)?;
        }
        target.operate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::{ClassSchema, PropertySchema, TypeRef};
    use crate::value::Value;

    fn registry() -> Arc<ClassRegistry> {
        let registry = ClassRegistry::new();
        registry
            .register(ClassSchema::new("A").with_property(PropertySchema::new("x", TypeRef::Int)))
            .unwrap();
        registry
            .register(ClassSchema::new("B").with_property(PropertySchema::new("x", TypeRef::Int)))
            .unwrap();
        registry
            .register(ClassSchema::new("Blank"))
            .unwrap();
        Arc::new(registry)
    }

    #[test]
    fn test_map_one_with_default_map() {
        let registry = registry();
        let mapper = ObjectMapper::with_registry(Arc::clone(&registry));
        let source = Instance::default_of(&registry.describe(&ClassId::new("A")).unwrap())
            .with("x", 42i64);

        let mapped = mapper.map_one(&source, "B", None).unwrap();
        assert_eq!(mapped.declared_get("x"), Some(&Value::Int(42)));
        assert_eq!(mapped.class().as_str(), "B");
    }

    #[test]
    fn test_empty_route_collection_passes_target_through() {
        let registry = registry();
        let mapper = ObjectMapper::with_registry(Arc::clone(&registry));
        let source = Instance::default_of(&registry.describe(&ClassId::new("A")).unwrap());
        let existing = Instance::new("Blank").with_dynamic("note", "kept");

        let mapped = mapper.map_one(&source, existing.clone(), None).unwrap();
        assert_eq!(mapped, existing);
    }

    #[test]
    fn test_map_many_zips_and_broadcasts() {
        let registry = registry();
        let mapper = ObjectMapper::with_registry(Arc::clone(&registry));
        let schema = registry.describe(&ClassId::new("A")).unwrap();
        let one = Instance::default_of(&schema).with("x", 1i64);
        let two = Instance::default_of(&schema).with("x", 2i64);

        let zipped = mapper
            .map_many(&[one.clone(), two], vec!["B".into(), "B".into()], None)
            .unwrap();
        assert_eq!(zipped[0].declared_get("x"), Some(&Value::Int(1)));
        assert_eq!(zipped[1].declared_get("x"), Some(&Value::Int(2)));

        let broadcast = mapper
            .map_many(&[one], vec!["B".into(), "B".into()], None)
            .unwrap();
        assert_eq!(broadcast.len(), 2);
        assert_eq!(broadcast[0], broadcast[1]);
    }

    #[test]
    fn test_map_many_shape_mismatch() {
        let registry = registry();
        let mapper = ObjectMapper::with_registry(Arc::clone(&registry));
        let schema = registry.describe(&ClassId::new("A")).unwrap();
        let sources = vec![
            Instance::default_of(&schema),
            Instance::default_of(&schema),
        ];

        let err = mapper
            .map_many(&sources, vec!["B".into(), "B".into(), "B".into()], None)
            .unwrap_err();
        assert!(matches!(
            err,
            OperationError::Argument(ArgumentError::ShapeMismatch { .. })
        ));
    }
}
