//! Routes: bound (source point, target point, checkpoint pipeline)
//! triples.

pub mod builder;
pub mod checkpoint;
pub mod recursion;

pub use builder::RouteBuilder;
pub use checkpoint::{CheckContext, CheckPoint, CheckPointCollection, Checked};
pub use recursion::{
    IterableRecursionCheckPoint, RecursionCheckPoint, RecursionTrail, MAX_RECURSION_DEPTH,
};

use crate::error::ArgumentError;
use crate::point::{SourcePoint, TargetPoint};
use std::fmt;

/// An immutable (source point, target point, checkpoints) triple.
///
/// Identity is the concatenation of the two point identifiers; a map
/// rejects two routes with the same identity. Read capability on the
/// source side and write capability on the target side hold by
/// construction, since [`SourcePoint`] and [`TargetPoint`] are distinct
/// types.
#[derive(Debug, Clone)]
pub struct Route {
    source: SourcePoint,
    target: TargetPoint,
    checkpoints: CheckPointCollection,
    fqn: String,
}

impl Route {
    /// Bind a source point to a target point with a checkpoint pipeline.
    pub fn new(
        source: SourcePoint,
        target: TargetPoint,
        checkpoints: CheckPointCollection,
    ) -> Self {
        let fqn = format!("{}->{}", source.fqn(), target.fqn());
        Self {
            source,
            target,
            checkpoints,
            fqn,
        }
    }

    /// The readable end.
    pub fn source(&self) -> &SourcePoint {
        &self.source
    }

    /// The writable end.
    pub fn target(&self) -> &TargetPoint {
        &self.target
    }

    /// The route's checkpoint pipeline, in position order.
    pub fn checkpoints(&self) -> &CheckPointCollection {
        &self.checkpoints
    }

    /// Route identity: both point identifiers joined.
    pub fn fqn(&self) -> &str {
        &self.fqn
    }

    /// A copy of this route with an extra checkpoint appended.
    pub fn with_checkpoint(
        &self,
        checkpoint: std::sync::Arc<dyn CheckPoint>,
    ) -> Self {
        Self {
            source: self.source.clone(),
            target: self.target.clone(),
            checkpoints: self.checkpoints.with_appended(checkpoint),
            fqn: self.fqn.clone(),
        }
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.fqn == other.fqn
    }
}

impl Eq for Route {}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fqn)
    }
}

/// Insertion-ordered set of routes with unique identities.
#[derive(Debug, Clone, Default)]
pub struct RouteCollection {
    routes: Vec<Route>,
}

impl RouteCollection {
    /// Empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route; a duplicate identity is an error.
    pub fn insert(&mut self, route: Route) -> Result<(), ArgumentError> {
        if self.contains(route.fqn()) {
            return Err(ArgumentError::DuplicateRoute(route.fqn().to_string()));
        }
        self.routes.push(route);
        Ok(())
    }

    /// Add a route unless the identity is already present; returns whether
    /// the route was added. Used when merging discovery results, where
    /// the first occurrence wins.
    pub fn merge(&mut self, route: Route) -> bool {
        if self.contains(route.fqn()) {
            return false;
        }
        self.routes.push(route);
        true
    }

    /// Whether a route with this identity is present.
    pub fn contains(&self, fqn: &str) -> bool {
        self.routes.iter().any(|r| r.fqn() == fqn)
    }

    /// Routes in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Route> {
        self.routes.iter()
    }

    /// Routes as a slice.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Route identities in insertion order.
    pub fn fqns(&self) -> Vec<&str> {
        self.routes.iter().map(|r| r.fqn()).collect()
    }
}

impl IntoIterator for RouteCollection {
    type Item = Route;
    type IntoIter = std::vec::IntoIter<Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::ClassId;

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
    fn test_route_identity() {
        let r = route("x");
        assert_eq!(r.fqn(), "#A::$x->#B::$x");
        assert_eq!(r, route("x"));
        assert_ne!(r, route("y"));
    }

    #[test]
    fn test_duplicate_identity_rejected() {
        let mut routes = RouteCollection::new();
        routes.insert(route("x")).unwrap();
        let err = routes.insert(route("x")).unwrap_err();
        assert!(matches!(err, ArgumentError::DuplicateRoute(_)));
        assert_eq!(routes.len(), 1);
    }

    #[test]
    fn test_merge_keeps_first() {
        let mut routes = RouteCollection::new();
        assert!(routes.merge(route("x")));
        assert!(!routes.merge(route("x")));
        assert!(routes.merge(route("y")));
        assert_eq!(routes.fqns(), vec!["#A::$x->#B::$x", "#A::$y->#B::$y"]);
    }
}
