//! Built-in recursion checkpoints.
//!
//! Convention discovery splices these onto routes whose target point is
//! statically typed with an object (or list-of-object) class different
//! from the source value's runtime class. When the route executes, the
//! checkpoint re-enters the orchestrator on the narrowed nested pair and
//! passes the resulting instance (or aligned collection) on as the
//! in-transit value.
//!
//! Re-entry depth is bounded by [`RecursionTrail`]; exceeding the bound is
//! a fatal [`OperationError::RecursionDepthExceeded`].

use crate::canonical::ClassCanonicalizer;
use crate::error::OperationError;
use crate::introspect::ClassId;
use crate::point::SourcePoint;
use crate::route::checkpoint::{CheckContext, CheckPoint, Checked};
use crate::value::{Instance, Value};

/// Default bound on nested mapping re-entry.
///
/// Owned value trees cannot be cyclic, so this cap only trips on
/// pathologically deep self-similar graphs.
pub const MAX_RECURSION_DEPTH: usize = 64;

/// Stack of (source class, target class) pairs currently being remapped.
#[derive(Debug, Clone)]
pub struct RecursionTrail {
    pairs: Vec<(ClassId, ClassId)>,
    limit: usize,
}

impl RecursionTrail {
    /// Trail with the default depth bound.
    pub fn new() -> Self {
        Self::with_limit(MAX_RECURSION_DEPTH)
    }

    /// Trail with a custom depth bound.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            pairs: Vec::new(),
            limit,
        }
    }

    /// Current re-entry depth.
    pub fn depth(&self) -> usize {
        self.pairs.len()
    }

    /// Record a nested re-entry; fails when the bound is exhausted.
    pub fn enter(&mut self, source: ClassId, target: ClassId) -> Result<(), OperationError> {
        if self.pairs.len() >= self.limit {
            return Err(OperationError::RecursionDepthExceeded(self.limit));
        }
        self.pairs.push((source, target));
        Ok(())
    }

    /// Unwind the most recent re-entry.
    pub fn leave(&mut self) {
        self.pairs.pop();
    }
}

impl Default for RecursionTrail {
    fn default() -> Self {
        Self::new()
    }
}

/// Checkpoint remapping a nested object value.
///
/// Captures the nested pairing and an optional locator point, read
/// against the outer target instance to find a pre-existing nested target
/// value worth updating in place.
#[derive(Debug, Clone)]
pub struct RecursionCheckPoint {
    source_class: ClassId,
    target_class: ClassId,
    locator: Option<SourcePoint>,
}

impl RecursionCheckPoint {
    /// Capture a nested (source class, target class) pairing.
    pub fn new(
        source_class: ClassId,
        target_class: ClassId,
        locator: Option<SourcePoint>,
    ) -> Self {
        Self {
            source_class,
            target_class,
            locator,
        }
    }

    /// The declared nested source class.
    pub fn source_class(&self) -> &ClassId {
        &self.source_class
    }

    /// The declared nested target class.
    pub fn target_class(&self) -> &ClassId {
        &self.target_class
    }

    fn remap_nested(
        &self,
        ctx: &mut CheckContext<'_>,
        nested: &Instance,
        existing: Option<Instance>,
    ) -> Result<Instance, OperationError> {
        ctx.trail
            .enter(self.source_class.clone(), self.target_class.clone())?;
        let result = remap_pair(ctx, nested, &self.target_class, existing);
        ctx.trail.leave();
        result
    }

    fn existing_nested_target(
        &self,
        ctx: &CheckContext<'_>,
    ) -> Result<Option<Instance>, OperationError> {
        let canonicalizer = ctx.mapper.canonicalizer();
        locate_existing(ctx, self.locator.as_ref(), &self.target_class)
            .map(|value| match value {
                // A stale value of another class does not qualify as the
                // nested target; start fresh instead.
                Some(Value::Object(existing))
                    if canonicalizer.same_class(existing.class(), &self.target_class) =>
                {
                    Some(existing)
                }
                _ => None,
            })
    }
}

impl CheckPoint for RecursionCheckPoint {
    fn check(&self, value: Value, ctx: &mut CheckContext<'_>) -> Result<Checked, OperationError> {
        let nested = expect_object(value, ctx, &self.source_class, ctx.mapper.canonicalizer())?;
        tracing::trace!(
            route = ctx.route.fqn(),
            source = %self.source_class,
            target = %self.target_class,
            depth = ctx.trail.depth(),
            "recursing into nested object"
        );
        let existing = self.existing_nested_target(ctx)?;
        let remapped = self.remap_nested(ctx, &nested, existing)?;
        Ok(Checked::Value(Value::Object(remapped)))
    }
}

/// Checkpoint remapping a homogeneous collection of nested objects.
///
/// The result is positionally aligned with any pre-existing target
/// collection; positions beyond the existing collection's length get
/// freshly constructed targets.
#[derive(Debug, Clone)]
pub struct IterableRecursionCheckPoint {
    source_class: ClassId,
    target_class: ClassId,
    locator: Option<SourcePoint>,
}

impl IterableRecursionCheckPoint {
    /// Capture a nested element (source class, target class) pairing.
    pub fn new(
        source_class: ClassId,
        target_class: ClassId,
        locator: Option<SourcePoint>,
    ) -> Self {
        Self {
            source_class,
            target_class,
            locator,
        }
    }

    fn existing_elements(&self, ctx: &CheckContext<'_>) -> Result<Vec<Value>, OperationError> {
        locate_existing(ctx, self.locator.as_ref(), &self.target_class)
            .map(|value| match value {
                Some(Value::List(items)) => items,
                _ => Vec::new(),
            })
    }
}

impl CheckPoint for IterableRecursionCheckPoint {
    fn check(&self, value: Value, ctx: &mut CheckContext<'_>) -> Result<Checked, OperationError> {
        let items = match value {
            Value::List(items) => items,
            other => {
                return Err(OperationError::RecursionTypeMismatch {
                    route: ctx.route.fqn().to_string(),
                    declared: self.source_class.clone(),
                    actual: format!("{} (expected a list)", other.kind()),
                })
            }
        };
        let existing = self.existing_elements(ctx)?;
        let canonicalizer = ctx.mapper.canonicalizer().clone();

        let mut remapped = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let nested = expect_object(item, ctx, &self.source_class, &canonicalizer)?;
            let slot = existing.get(index).and_then(|candidate| {
                candidate.as_object().filter(|instance| {
                    canonicalizer.same_class(instance.class(), &self.target_class)
                })
            });
            ctx.trail
                .enter(self.source_class.clone(), self.target_class.clone())?;
            let result = remap_pair(ctx, &nested, &self.target_class, slot.cloned());
            ctx.trail.leave();
            remapped.push(Value::Object(result?));
        }
        Ok(Checked::Value(Value::List(remapped)))
    }
}

fn expect_object(
    value: Value,
    ctx: &CheckContext<'_>,
    declared: &ClassId,
    canonicalizer: &ClassCanonicalizer,
) -> Result<Instance, OperationError> {
    match value {
        Value::Object(instance) => {
            let runtime = canonicalizer.canonicalize_id(instance.class());
            if &runtime != declared {
                return Err(OperationError::RecursionTypeMismatch {
                    route: ctx.route.fqn().to_string(),
                    declared: declared.clone(),
                    actual: runtime.to_string(),
                });
            }
            Ok(instance)
        }
        other => Err(OperationError::RecursionTypeMismatch {
            route: ctx.route.fqn().to_string(),
            declared: declared.clone(),
            actual: other.kind().to_string(),
        }),
    }
}

fn locate_existing(
    ctx: &CheckContext<'_>,
    locator: Option<&SourcePoint>,
    _target_class: &ClassId,
) -> Result<Option<Value>, OperationError> {
    let (Some(locator), Some(outer)) = (locator, ctx.target.instance()) else {
        return Ok(None);
    };
    let wrapper = ctx.mapper.source_for(outer)?;
    // An unreadable or absent nested value just means a fresh start.
    Ok(wrapper.point_value(locator).ok())
}

fn remap_pair(
    ctx: &mut CheckContext<'_>,
    nested: &Instance,
    target_class: &ClassId,
    existing: Option<Instance>,
) -> Result<Instance, OperationError> {
    let source = ctx.mapper.source_for(nested)?;
    let mut target = match existing {
        Some(instance) => ctx.mapper.target_for_instance(instance)?,
        None => ctx.mapper.target_for_class(target_class)?,
    };
    ctx.mapper.map_pair(&source, &mut target, ctx.map, ctx.trail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trail_bounds_depth() {
        let mut trail = RecursionTrail::with_limit(2);
        trail.enter(ClassId::new("A"), ClassId::new("B")).unwrap();
        trail.enter(ClassId::new("A"), ClassId::new("B")).unwrap();
        let err = trail
            .enter(ClassId::new("A"), ClassId::new("B"))
            .unwrap_err();
        assert!(matches!(err, OperationError::RecursionDepthExceeded(2)));

        trail.leave();
        assert_eq!(trail.depth(), 1);
        assert!(trail.enter(ClassId::new("A"), ClassId::new("B")).is_ok());
    }
}
