//! Copy-on-write route assembly.
//!
//! [`RouteBuilder`] is a plain immutable value: every mutator returns a
//! new builder, so a partially configured builder can be forked and
//! reused. [`build`](RouteBuilder::build) fails when either point was
//! never set.

use std::sync::Arc;

use crate::error::ArgumentError;
use crate::point::{PointFactory, SourcePoint, TargetPoint};
use crate::route::checkpoint::{CheckPoint, CheckPointCollection};
use crate::route::Route;

/// Fluent, copy-on-write assembly of a [`Route`].
#[derive(Debug, Clone, Default)]
pub struct RouteBuilder {
    source: Option<SourcePoint>,
    target: Option<TargetPoint>,
    checkpoints: CheckPointCollection,
}

impl RouteBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// A new builder with the source point set.
    pub fn source_point(&self, point: SourcePoint) -> Self {
        let mut next = self.clone();
        next.source = Some(point);
        next
    }

    /// A new builder with the target point set.
    pub fn target_point(&self, point: TargetPoint) -> Self {
        let mut next = self.clone();
        next.target = Some(point);
        next
    }

    /// A new builder with the source point parsed from a canonical
    /// identifier.
    pub fn source(&self, factory: &PointFactory, identifier: &str) -> Result<Self, ArgumentError> {
        Ok(self.source_point(factory.source_point(identifier)?))
    }

    /// A new builder with the target point parsed from a canonical
    /// identifier.
    pub fn target(&self, factory: &PointFactory, identifier: &str) -> Result<Self, ArgumentError> {
        Ok(self.target_point(factory.target_point(identifier)?))
    }

    /// A new builder with a checkpoint appended after the last position.
    pub fn checkpoint(&self, point: Arc<dyn CheckPoint>) -> Self {
        let mut next = self.clone();
        next.checkpoints = next.checkpoints.with_appended(point);
        next
    }

    /// A new builder with a checkpoint at an explicit position,
    /// overwriting any previous occupant of that position.
    pub fn checkpoint_at(&self, position: u32, point: Arc<dyn CheckPoint>) -> Self {
        let mut next = self.clone();
        next.checkpoints = next.checkpoints.with_inserted(position, point);
        next
    }

    /// Finalize the route. Fails when the source or target point was
    /// never set.
    pub fn build(&self) -> Result<Route, ArgumentError> {
        let source = self
            .source
            .clone()
            .ok_or(ArgumentError::MissingPoint("source"))?;
        let target = self
            .target
            .clone()
            .ok_or(ArgumentError::MissingPoint("target"))?;
        Ok(Route::new(source, target, self.checkpoints.clone()))
    }
}
