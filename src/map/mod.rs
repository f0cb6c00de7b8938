//! Maps: named configurations of path finders, explicit routes, and
//! filters.
//!
//! A [`Map`] is built once via [`MapBuilder`] and then queried repeatedly.
//! It is read-only after construction and safe to share across
//! concurrent passes over different source/target pairs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ArgumentError, OperationError};
use crate::finder::{PathFinder, PathFinderCollection, StaticPathFinder};
use crate::point::PointFactory;
use crate::route::{CheckContext, Checked, Route, RouteCollection};
use crate::source::Source;
use crate::target::Target;
use crate::value::Value;
use uuid::Uuid;

/// Priority the default map gives its Static→Static finder.
pub const DEFAULT_PATH_FINDER_PRIORITY: u32 = 10;

/// Unique identifier of a built map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapId(Uuid);

impl MapId {
    /// Generate a fresh map id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named, checkpoint-like hook keyed by route identity.
///
/// Filters see the same (value, context) data as checkpoints and run
/// after the route's own pipeline; they can transform the value, skip the
/// route, or fault the pass.
pub trait Filter: fmt::Debug + Send + Sync {
    /// Process the in-transit value for the route this filter is keyed
    /// to.
    fn filter(&self, value: Value, ctx: &mut CheckContext<'_>) -> Result<Checked, OperationError>;
}

/// Filters keyed by route identity.
#[derive(Debug, Clone, Default)]
pub struct FilterCollection {
    filters: BTreeMap<String, Arc<dyn Filter>>,
}

impl FilterCollection {
    /// Empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Key a filter to a route identity, replacing any previous filter
    /// for that route.
    pub fn insert(&mut self, route_fqn: impl Into<String>, filter: Arc<dyn Filter>) {
        self.filters.insert(route_fqn.into(), filter);
    }

    /// The filter keyed to a route identity, if any.
    pub fn get(&self, route_fqn: &str) -> Option<&Arc<dyn Filter>> {
        self.filters.get(route_fqn)
    }

    /// Number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// Immutable mapping configuration, queried per class pair.
#[derive(Debug, Clone)]
pub struct Map {
    id: MapId,
    finders: PathFinderCollection,
    routes: RouteCollection,
    filters: FilterCollection,
}

impl Map {
    /// The map's id.
    pub fn id(&self) -> MapId {
        self.id
    }

    /// The configured path finders, in priority order.
    pub fn finders(&self) -> &PathFinderCollection {
        &self.finders
    }

    /// The explicitly configured routes.
    pub fn explicit_routes(&self) -> &RouteCollection {
        &self.routes
    }

    /// The filter keyed to a route, if any.
    pub fn filter_for(&self, route: &Route) -> Option<&Arc<dyn Filter>> {
        self.filters.get(route.fqn())
    }

    /// The default map: a recursive Static→Static finder at
    /// [`DEFAULT_PATH_FINDER_PRIORITY`], no explicit routes, no filters.
    pub fn default_for(factory: &PointFactory) -> Self {
        let mut finders = PathFinderCollection::new();
        finders.insert(
            DEFAULT_PATH_FINDER_PRIORITY,
            Arc::new(StaticPathFinder::recursive(factory.canonicalizer().clone())),
        );
        Map {
            id: MapId::generate(),
            finders,
            routes: RouteCollection::new(),
            filters: FilterCollection::new(),
        }
    }

    /// Resolve the route collection for a (source class, target class)
    /// pair: explicit routes first, then each finder's discoveries in
    /// priority order. The first route for an identity wins.
    pub fn routes_for(
        &self,
        source: &Source<'_>,
        target: &Target,
    ) -> Result<RouteCollection, OperationError> {
        let canonicalizer = source.canonicalizer();
        let mut routes = RouteCollection::new();
        for route in self.routes.iter() {
            if canonicalizer.same_class(route.source().class(), source.class())
                && canonicalizer.same_class(route.target().class(), target.class())
            {
                routes.merge(route.clone());
            }
        }
        for (priority, finder) in self.finders.iter() {
            let discovered = finder.routes(source, target)?;
            tracing::trace!(
                map = %self.id,
                priority,
                discovered = discovered.len(),
                "path finder ran"
            );
            for route in discovered {
                routes.merge(route);
            }
        }
        Ok(routes)
    }
}

/// Fluent, copy-on-write assembly of a [`Map`].
#[derive(Debug, Clone, Default)]
pub struct MapBuilder {
    finders: PathFinderCollection,
    routes: Vec<Route>,
    filters: FilterCollection,
}

impl MapBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// A new builder with a path finder at the given priority
    /// (overwriting any previous finder at that priority).
    pub fn path_finder(&self, priority: u32, finder: Arc<dyn PathFinder>) -> Self {
        let mut next = self.clone();
        next.finders.insert(priority, finder);
        next
    }

    /// A new builder with an explicit route added.
    pub fn route_built(&self, route: Route) -> Self {
        let mut next = self.clone();
        next.routes.push(route);
        next
    }

    /// A new builder with an explicit route parsed from two canonical
    /// identifiers.
    pub fn route(
        &self,
        factory: &PointFactory,
        source: &str,
        target: &str,
    ) -> Result<Self, ArgumentError> {
        let route = crate::route::RouteBuilder::new()
            .source(factory, source)?
            .target(factory, target)?
            .build()?;
        Ok(self.route_built(route))
    }

    /// A new builder with a filter keyed to a route identity.
    pub fn filter(&self, route_fqn: impl Into<String>, filter: Arc<dyn Filter>) -> Self {
        let mut next = self.clone();
        next.filters.insert(route_fqn, filter);
        next
    }

    /// Finalize the map, assigning it a fresh id. Duplicate explicit
    /// route identities are rejected.
    pub fn build(&self) -> Result<Map, ArgumentError> {
        let mut routes = RouteCollection::new();
        for route in &self.routes {
            routes.insert(route.clone())?;
        }
        Ok(Map {
            id: MapId::generate(),
            finders: self.finders.clone(),
            routes,
            filters: self.filters.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::ClassCanonicalizer;
    use crate::introspect::{
        ClassId, ClassIntrospector, ClassRegistry, ClassSchema, PropertySchema, TypeRef,
    };
    use crate::point::{SourcePoint, TargetPoint};
    use crate::route::CheckPointCollection;
    use crate::value::Instance;

    fn route(member: &str) -> Route {
        Route::new(
            SourcePoint::StaticProperty {
                class: ClassId::new("A"),
                name: member.to_string(),
            },
            TargetPoint::StaticProperty {
                class: ClassId::new("B"),
                name: member.to_string(),
            },
            CheckPointCollection::new(),
        )
    }

    #[test]
    fn test_duplicate_explicit_routes_rejected() {
        let builder = MapBuilder::new().route_built(route("x")).route_built(route("x"));
        let err = builder.build().unwrap_err();
        assert!(matches!(err, ArgumentError::DuplicateRoute(_)));
    }

    #[test]
    fn test_builder_copy_on_write() {
        let base = MapBuilder::new();
        let with_route = base.route_built(route("x"));
        assert!(base.build().unwrap().explicit_routes().is_empty());
        assert_eq!(with_route.build().unwrap().explicit_routes().len(), 1);
    }

    #[test]
    fn test_each_build_gets_a_fresh_id() {
        let builder = MapBuilder::new();
        assert_ne!(builder.build().unwrap().id(), builder.build().unwrap().id());
    }

    #[test]
    fn test_explicit_route_matches_across_proxy_class_ids() {
        let registry = ClassRegistry::new();
        registry
            .register(ClassSchema::new("A").with_property(PropertySchema::new("x", TypeRef::Int)))
            .unwrap();
        registry
            .register(ClassSchema::new("B").with_property(PropertySchema::new("x", TypeRef::Int)))
            .unwrap();
        let registry = Arc::new(registry);

        // The explicit route was declared against a proxied source class.
        let proxied = Route::new(
            SourcePoint::StaticProperty {
                class: ClassId::new("generated.__proxy__.A"),
                name: "x".to_string(),
            },
            TargetPoint::StaticProperty {
                class: ClassId::new("B"),
                name: "x".to_string(),
            },
            CheckPointCollection::new(),
        );
        let map = MapBuilder::new().route_built(proxied).build().unwrap();

        let instance = Instance::default_of(&registry.describe(&ClassId::new("A")).unwrap());
        let source =
            Source::new(registry.as_ref(), ClassCanonicalizer::new(), &instance).unwrap();
        let target = Target::for_class(
            registry.as_ref(),
            ClassCanonicalizer::new(),
            &ClassId::new("B"),
        )
        .unwrap();

        let routes = map.routes_for(&source, &target).unwrap();
        assert_eq!(routes.len(), 1);
    }
}
