//! Path finders: convention engines proposing routes for a class pair.
//!
//! Every finder follows the same shape: enumerate *reference points* on
//! one authoritative side, resolve a compatible point on the other side
//! by naming convention, and bind the two into a route. A reference point
//! with no compatible counterpart is simply skipped; discovery is
//! best-effort and may yield an empty collection. Any structural failure
//! aborts the whole call with no partial result.
//!
//! In recursive mode a finder post-processes its routes: when a route's
//! statically typed object (or list-of-object) target disagrees with the
//! current source value's runtime class, a recursion checkpoint is
//! spliced in to remap the nested pair at execution time.

pub mod dynamic_static;
pub mod static_dynamic;
pub mod static_static;

pub use dynamic_static::DynamicSourceToStaticTargetPathFinder;
pub use static_dynamic::StaticSourceToDynamicTargetPathFinder;
pub use static_static::StaticPathFinder;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::canonical::ClassCanonicalizer;
use crate::error::OperationError;
use crate::introspect::{ClassId, ClassSchema};
use crate::point::{SourcePoint, TargetPoint};
use crate::route::{IterableRecursionCheckPoint, RecursionCheckPoint, RouteCollection};
use crate::source::Source;
use crate::target::Target;
use crate::value::Value;

/// A convention engine enumerating candidate routes for a (source class,
/// target class) pair.
pub trait PathFinder: fmt::Debug + Send + Sync {
    /// Discover routes for the pair the two wrappers represent.
    fn routes(
        &self,
        source: &Source<'_>,
        target: &Target,
    ) -> Result<RouteCollection, OperationError>;
}

/// Priority-ordered set of path finders.
///
/// Lower priority runs first; inserting at an occupied priority
/// overwrites.
#[derive(Debug, Clone, Default)]
pub struct PathFinderCollection {
    finders: BTreeMap<u32, Arc<dyn PathFinder>>,
}

impl PathFinderCollection {
    /// Empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a finder at a priority, overwriting any previous occupant.
    pub fn insert(&mut self, priority: u32, finder: Arc<dyn PathFinder>) {
        self.finders.insert(priority, finder);
    }

    /// Finders in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Arc<dyn PathFinder>)> {
        self.finders.iter().map(|(priority, finder)| (*priority, finder))
    }

    /// Number of finders.
    pub fn len(&self) -> usize {
        self.finders.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.finders.is_empty()
    }
}

// ─── Naming conventions ─────────────────────────────────────────────────

fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn lcfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Member behind an accessor method name: `getX`/`isX` → `x`.
pub(crate) fn accessor_member(method: &str) -> Option<String> {
    for prefix in ["get", "is"] {
        if let Some(rest) = method.strip_prefix(prefix) {
            if !rest.is_empty() {
                return Some(lcfirst(rest));
            }
        }
    }
    None
}

/// Member behind a setter method name: `setX` → `x`.
pub(crate) fn setter_member(method: &str) -> Option<String> {
    method
        .strip_prefix("set")
        .filter(|rest| !rest.is_empty())
        .map(lcfirst)
}

/// Accessor candidates for a member: `get<M>`, then `is<M>`.
pub(crate) fn getter_names(member: &str) -> [String; 2] {
    let suffix = ucfirst(member);
    [format!("get{suffix}"), format!("is{suffix}")]
}

/// Compatible static source point for a member: same-named public
/// property, else `get<M>`/`is<M>` zero-arg method.
pub(crate) fn compatible_source(
    schema: &ClassSchema,
    class: &ClassId,
    member: &str,
) -> Option<SourcePoint> {
    if schema.property(member).map(|p| p.public).unwrap_or(false) {
        return Some(SourcePoint::StaticProperty {
            class: class.clone(),
            name: member.to_string(),
        });
    }
    for candidate in getter_names(member) {
        if let Some(method) = schema.method(&candidate) {
            if method.required_params() == 0 {
                return Some(SourcePoint::StaticMethod {
                    class: class.clone(),
                    name: candidate,
                });
            }
        }
    }
    None
}

/// Compatible static target point for a member. Precedence: constructor
/// parameter pre-empts property pre-empts setter.
pub(crate) fn compatible_static_target(
    schema: &ClassSchema,
    class: &ClassId,
    member: &str,
) -> Option<TargetPoint> {
    if let Some(ctor) = schema.constructor() {
        if ctor.param(member).is_some() {
            return Some(TargetPoint::StaticParameter {
                class: class.clone(),
                method: ctor.name.clone(),
                name: member.to_string(),
            });
        }
    }
    if schema.property(member).map(|p| p.public).unwrap_or(false) {
        return Some(TargetPoint::StaticProperty {
            class: class.clone(),
            name: member.to_string(),
        });
    }
    let setter = format!("set{}", ucfirst(member));
    if let Some(method) = schema.method(&setter) {
        if method.params.len() == 1 {
            return Some(TargetPoint::StaticParameter {
                class: class.clone(),
                method: setter,
                name: method.params[0].name.clone(),
            });
        }
    }
    None
}

/// Point on the target class used to locate a pre-existing nested value:
/// same-named property, else a zero-arg getter.
pub(crate) fn locator_point(
    schema: &ClassSchema,
    class: &ClassId,
    member: &str,
) -> Option<SourcePoint> {
    if schema.property(member).is_some() {
        return Some(SourcePoint::StaticProperty {
            class: class.clone(),
            name: member.to_string(),
        });
    }
    for candidate in getter_names(member) {
        if schema
            .method(&candidate)
            .map(|m| m.required_params() == 0)
            .unwrap_or(false)
        {
            return Some(SourcePoint::StaticMethod {
                class: class.clone(),
                name: candidate,
            });
        }
    }
    None
}

/// The conceptual member a target point writes: the property name, or the
/// member behind a setter/constructor parameter.
fn target_member(point: &TargetPoint) -> String {
    match point {
        TargetPoint::StaticProperty { name, .. } | TargetPoint::DynamicProperty { name, .. } => {
            name.clone()
        }
        TargetPoint::StaticParameter { method, name, .. }
        | TargetPoint::DynamicParameter { method, name, .. } => {
            setter_member(method).unwrap_or_else(|| name.clone())
        }
    }
}

/// Recursive-mode post-processing shared by the static-target finders.
///
/// For each route with a statically typed object (or list-of-object)
/// target point whose declared class differs from the current source
/// value's runtime class, splice in the matching recursion checkpoint.
pub(crate) fn splice_recursions(
    routes: RouteCollection,
    source: &Source<'_>,
    target: &Target,
    canonicalizer: &ClassCanonicalizer,
) -> Result<RouteCollection, OperationError> {
    let mut spliced = RouteCollection::new();
    for route in routes {
        let declared_type = match route.target() {
            TargetPoint::StaticProperty { name, .. } => {
                target.schema().property(name).map(|p| p.type_ref.clone())
            }
            TargetPoint::StaticParameter { method, name, .. } => target
                .schema()
                .method(method)
                .and_then(|m| m.param(name))
                .map(|p| p.type_ref.clone()),
            _ => None,
        };
        let Some(declared_type) = declared_type else {
            spliced.merge(route);
            continue;
        };

        let value = source.point_value(route.source())?;
        let member = target_member(route.target());
        let locator = locator_point(target.schema(), target.class(), &member);

        let next = if let Some(declared_class) = declared_type.object_class() {
            match &value {
                Value::Object(nested) => {
                    let runtime = canonicalizer.canonicalize_id(nested.class());
                    if &runtime != declared_class {
                        route.with_checkpoint(Arc::new(RecursionCheckPoint::new(
                            runtime,
                            declared_class.clone(),
                            locator,
                        )))
                    } else {
                        route
                    }
                }
                _ => route,
            }
        } else if let Some(element_class) = declared_type.object_element_class() {
            match uniform_element_class(&value, canonicalizer) {
                Some(runtime) if &runtime != element_class => {
                    route.with_checkpoint(Arc::new(IterableRecursionCheckPoint::new(
                        runtime,
                        element_class.clone(),
                        locator,
                    )))
                }
                _ => route,
            }
        } else {
            route
        };
        spliced.merge(next);
    }
    Ok(spliced)
}

/// The single runtime class of a homogeneous object list, if any.
fn uniform_element_class(value: &Value, canonicalizer: &ClassCanonicalizer) -> Option<ClassId> {
    let Value::List(items) = value else {
        return None;
    };
    let mut uniform: Option<ClassId> = None;
    for item in items {
        let class = canonicalizer.canonicalize_id(item.as_object()?.class());
        match &uniform {
            None => uniform = Some(class),
            Some(existing) if existing == &class => {}
            Some(_) => return None,
        }
    }
    uniform
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessor_member() {
        assert_eq!(accessor_member("getName"), Some("name".to_string()));
        assert_eq!(accessor_member("isActive"), Some("active".to_string()));
        assert_eq!(accessor_member("get"), None);
        assert_eq!(accessor_member("fetch"), None);
    }

    #[test]
    fn test_setter_member() {
        assert_eq!(setter_member("setName"), Some("name".to_string()));
        assert_eq!(setter_member("set"), None);
        assert_eq!(setter_member("reset"), None);
    }

    #[test]
    fn test_getter_names() {
        assert_eq!(getter_names("name"), ["getName".to_string(), "isName".to_string()]);
    }
}
