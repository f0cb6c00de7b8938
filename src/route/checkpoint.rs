//! Checkpoint pipeline.
//!
//! A [`CheckPoint`] is a pipeline stage on a route: it receives the
//! in-transit value plus the full mapping context and either passes a
//! (possibly transformed) value on, opts its route out of the pass
//! ([`Checked::Skip`], not an error), or escalates to a fatal
//! [`OperationError`] aborting the whole pass.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::OperationError;
use crate::map::Map;
use crate::mapper::ObjectMapper;
use crate::route::recursion::RecursionTrail;
use crate::route::Route;
use crate::source::Source;
use crate::target::Target;
use crate::value::Value;

/// Outcome of a checkpoint (or filter) invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Checked {
    /// Pass this value on down the pipeline.
    Value(Value),
    /// Opt this route out of the pass; sibling routes still execute.
    Skip,
}

/// Everything a checkpoint can see: the route it sits on, the map being
/// executed, both wrappers, the orchestrator (for recursive re-entry),
/// and the recursion trail bounding that re-entry.
pub struct CheckContext<'a> {
    /// The route whose pipeline is executing.
    pub route: &'a Route,
    /// The map the pass runs under.
    pub map: &'a Map,
    /// The pass's source wrapper.
    pub source: &'a Source<'a>,
    /// The pass's target wrapper (read-only; writes go through buffering).
    pub target: &'a Target,
    /// The orchestrator, for nested re-entry.
    pub mapper: &'a ObjectMapper,
    /// Re-entry depth guard, shared down the recursion.
    pub trail: &'a mut RecursionTrail,
}

impl fmt::Debug for CheckContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckContext")
            .field("route", &self.route.fqn())
            .field("depth", &self.trail.depth())
            .finish_non_exhaustive()
    }
}

/// A transformation/validation stage on a route.
pub trait CheckPoint: fmt::Debug + Send + Sync {
    /// Process the in-transit value.
    fn check(&self, value: Value, ctx: &mut CheckContext<'_>) -> Result<Checked, OperationError>;
}

/// Ordered checkpoint pipeline.
///
/// Checkpoints sit at explicit integer positions; inserting at an occupied
/// position overwrites, appending takes the next free position after the
/// current maximum. Iteration is always in position order.
#[derive(Debug, Clone, Default)]
pub struct CheckPointCollection {
    points: BTreeMap<u32, Arc<dyn CheckPoint>>,
}

impl CheckPointCollection {
    /// Empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at an explicit position, overwriting any previous occupant.
    pub fn insert(&mut self, position: u32, point: Arc<dyn CheckPoint>) {
        self.points.insert(position, point);
    }

    /// Append after the current last position.
    pub fn push(&mut self, point: Arc<dyn CheckPoint>) {
        let position = self
            .points
            .keys()
            .next_back()
            .map(|last| last + 1)
            .unwrap_or(0);
        self.points.insert(position, point);
    }

    /// Copy-on-write insert.
    pub fn with_inserted(&self, position: u32, point: Arc<dyn CheckPoint>) -> Self {
        let mut next = self.clone();
        next.insert(position, point);
        next
    }

    /// Copy-on-write append.
    pub fn with_appended(&self, point: Arc<dyn CheckPoint>) -> Self {
        let mut next = self.clone();
        next.push(point);
        next
    }

    /// Checkpoints in position order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Arc<dyn CheckPoint>)> {
        self.points.iter().map(|(pos, cp)| (*pos, cp))
    }

    /// Number of checkpoints.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the pipeline is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
