//! Static→Static convention discovery.
//!
//! The target side is authoritative: its constructor parameters, declared
//! public properties, and setters define what wants a value. For each
//! such reference point the source class is searched for a same-named
//! public property, else a `get<Member>`/`is<Member>` zero-arg method.
//!
//! A constructor parameter claims its member: a same-named property or
//! setter yields to it. A property claims its member ahead of a setter.

use std::collections::BTreeSet;

use crate::canonical::ClassCanonicalizer;
use crate::error::OperationError;
use crate::finder::{compatible_source, setter_member, splice_recursions, PathFinder};
use crate::point::TargetPoint;
use crate::route::{CheckPointCollection, Route, RouteCollection};
use crate::source::Source;
use crate::target::Target;

/// The default convention engine: statically declared source members to
/// statically declared target members.
#[derive(Debug, Clone)]
pub struct StaticPathFinder {
    canonicalizer: ClassCanonicalizer,
    recursive: bool,
}

impl StaticPathFinder {
    /// Non-recursive discovery.
    pub fn new(canonicalizer: ClassCanonicalizer) -> Self {
        Self {
            canonicalizer,
            recursive: false,
        }
    }

    /// Recursive discovery: nested object pairings get recursion
    /// checkpoints spliced onto their routes.
    pub fn recursive(canonicalizer: ClassCanonicalizer) -> Self {
        Self {
            canonicalizer,
            recursive: true,
        }
    }

    /// Reference points on the target class, constructor parameters
    /// first, each tagged with the member it serves.
    fn reference_points(&self, target: &Target) -> Vec<(String, TargetPoint)> {
        let schema = target.schema();
        let class = target.class();
        let mut claimed: BTreeSet<String> = BTreeSet::new();
        let mut refs: Vec<(String, TargetPoint)> = Vec::new();

        if let Some(ctor) = schema.constructor() {
            for param in &ctor.params {
                claimed.insert(param.name.clone());
                refs.push((
                    param.name.clone(),
                    TargetPoint::StaticParameter {
                        class: class.clone(),
                        method: ctor.name.clone(),
                        name: param.name.clone(),
                    },
                ));
            }
        }
        for property in schema.public_properties() {
            if claimed.insert(property.name.clone()) {
                refs.push((
                    property.name.clone(),
                    TargetPoint::StaticProperty {
                        class: class.clone(),
                        name: property.name.clone(),
                    },
                ));
            }
        }
        for method in &schema.methods {
            let Some(member) = setter_member(&method.name) else {
                continue;
            };
            if method.params.len() == 1 && claimed.insert(member.clone()) {
                refs.push((
                    member,
                    TargetPoint::StaticParameter {
                        class: class.clone(),
                        method: method.name.clone(),
                        name: method.params[0].name.clone(),
                    },
                ));
            }
        }
        refs
    }
}

impl PathFinder for StaticPathFinder {
    fn routes(
        &self,
        source: &Source<'_>,
        target: &Target,
    ) -> Result<RouteCollection, OperationError> {
        let mut routes = RouteCollection::new();
        for (member, target_point) in self.reference_points(target) {
            let Some(source_point) = compatible_source(source.schema(), source.class(), &member)
            else {
                continue;
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
            "static-to-static discovery"
        );
        if self.recursive {
            routes = splice_recursions(routes, source, target, &self.canonicalizer)?;
        }
        Ok(routes)
    }
}
