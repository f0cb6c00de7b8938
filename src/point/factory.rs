//! Point factory: canonical identifier parsing and resolution.
//!
//! The factory turns an identifier string into exactly one point variant
//! or fails with an [`ArgumentError`] telling the caller whether the
//! *grammar* did not match or a *structural* constraint was violated.
//!
//! Grammar (role marker `#` static / `~` dynamic, absent = infer):
//!
//! ```text
//! property:   [#|~]ClassId::$member
//! method:     [#|~]ClassId::member()        (source only, zero-arg)
//! parameter:  [#|~]ClassId::method()::$parameter   (target only)
//! ```
//!
//! Static forms require the member to resolve via static introspection of
//! the named class; dynamic forms require it to NOT so resolve. With no
//! marker, static resolution is attempted first, then dynamic; when both
//! fail the static failure is reported.

use regex_lite::Regex;
use std::sync::{Arc, OnceLock};

use crate::canonical::ClassCanonicalizer;
use crate::error::ArgumentError;
use crate::introspect::{ClassId, ClassIntrospector, ClassSchema};
use crate::point::{SourcePoint, TargetPoint, DYNAMIC_MARKER, STATIC_MARKER};

const CLASS: &str = r"[A-Za-z_][A-Za-z0-9_.]*";
const MEMBER: &str = r"[A-Za-z_][A-Za-z0-9_]*";

fn property_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"^([#~])?({CLASS})::\$({MEMBER})$")).unwrap())
}

fn method_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"^([#~])?({CLASS})::({MEMBER})\(\)$")).unwrap())
}

fn parameter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"^([#~])?({CLASS})::({MEMBER})\(\)::\$({MEMBER})$")).unwrap()
    })
}

/// Requested resolution role, parsed from the optional marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Static,
    Dynamic,
    Infer,
}

impl Role {
    fn parse(marker: Option<&str>) -> Self {
        match marker.and_then(|m| m.chars().next()) {
            Some(STATIC_MARKER) => Self::Static,
            Some(DYNAMIC_MARKER) => Self::Dynamic,
            _ => Self::Infer,
        }
    }
}

/// Parses canonical identifiers into point variants.
///
/// Holds the introspector the static/dynamic constraints are checked
/// against and the canonicalizer applied to every class id before lookup.
#[derive(Clone)]
pub struct PointFactory {
    introspector: Arc<dyn ClassIntrospector>,
    canonicalizer: ClassCanonicalizer,
}

impl std::fmt::Debug for PointFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointFactory").finish_non_exhaustive()
    }
}

impl PointFactory {
    /// Create a factory over an introspector and canonicalizer.
    pub fn new(
        introspector: Arc<dyn ClassIntrospector>,
        canonicalizer: ClassCanonicalizer,
    ) -> Self {
        Self {
            introspector,
            canonicalizer,
        }
    }

    /// The canonicalizer the factory applies to class ids.
    pub fn canonicalizer(&self) -> &ClassCanonicalizer {
        &self.canonicalizer
    }

    /// The introspector the factory resolves members against.
    pub fn introspector(&self) -> &Arc<dyn ClassIntrospector> {
        &self.introspector
    }

    fn schema(&self, raw_class: &str) -> Result<(ClassId, Arc<ClassSchema>), ArgumentError> {
        let class = self.canonicalizer.canonicalize(raw_class);
        let schema = self
            .introspector
            .describe(&class)
            .ok_or_else(|| ArgumentError::UnknownClass(class.clone()))?;
        Ok((class, schema))
    }

    /// Parse a source point identifier (property or zero-arg method form).
    pub fn source_point(&self, identifier: &str) -> Result<SourcePoint, ArgumentError> {
        if let Some(caps) = property_re().captures(identifier) {
            let role = Role::parse(caps.get(1).map(|m| m.as_str()));
            let (class, schema) = self.schema(&caps[2])?;
            let name = caps[3].to_string();
            return resolve_property(role, &schema, &class, name, |class, name, is_static| {
                if is_static {
                    SourcePoint::StaticProperty { class, name }
                } else {
                    SourcePoint::DynamicProperty { class, name }
                }
            });
        }
        if let Some(caps) = method_re().captures(identifier) {
            let role = Role::parse(caps.get(1).map(|m| m.as_str()));
            let (class, schema) = self.schema(&caps[2])?;
            let name = caps[3].to_string();
            return self.resolve_source_method(role, &schema, class, name);
        }
        if parameter_re().captures(identifier).is_some() {
            return Err(ArgumentError::Grammar {
                identifier: identifier.to_string(),
                expected: "source (parameter points are target-only)",
            });
        }
        Err(ArgumentError::Grammar {
            identifier: identifier.to_string(),
            expected: "source property or zero-arg method",
        })
    }

    /// Parse a target point identifier (property or method-parameter
    /// form).
    pub fn target_point(&self, identifier: &str) -> Result<TargetPoint, ArgumentError> {
        if let Some(caps) = property_re().captures(identifier) {
            let role = Role::parse(caps.get(1).map(|m| m.as_str()));
            let (class, schema) = self.schema(&caps[2])?;
            let name = caps[3].to_string();
            return resolve_property(role, &schema, &class, name, |class, name, is_static| {
                if is_static {
                    TargetPoint::StaticProperty { class, name }
                } else {
                    TargetPoint::DynamicProperty { class, name }
                }
            });
        }
        if let Some(caps) = parameter_re().captures(identifier) {
            let role = Role::parse(caps.get(1).map(|m| m.as_str()));
            let (class, schema) = self.schema(&caps[2])?;
            let method = caps[3].to_string();
            let name = caps[4].to_string();
            return resolve_parameter(role, &schema, class, method, name);
        }
        if method_re().captures(identifier).is_some() {
            return Err(ArgumentError::Grammar {
                identifier: identifier.to_string(),
                expected: "target (method points are source-only)",
            });
        }
        Err(ArgumentError::Grammar {
            identifier: identifier.to_string(),
            expected: "target property or method parameter",
        })
    }

    fn resolve_source_method(
        &self,
        role: Role,
        schema: &ClassSchema,
        class: ClassId,
        name: String,
    ) -> Result<SourcePoint, ArgumentError> {
        let declared = schema.method(&name);
        let static_point = || -> Result<SourcePoint, ArgumentError> {
            let method = declared.ok_or_else(|| ArgumentError::Structure {
                class: class.clone(),
                member: name.clone(),
                constraint: "method is not statically declared".to_string(),
            })?;
            if method.required_params() > 0 {
                return Err(ArgumentError::Structure {
                    class: class.clone(),
                    member: name.clone(),
                    constraint: format!(
                        "source method has {} required parameter(s)",
                        method.required_params()
                    ),
                });
            }
            Ok(SourcePoint::StaticMethod {
                class: class.clone(),
                name: name.clone(),
            })
        };
        let dynamic_point = || -> Result<SourcePoint, ArgumentError> {
            if declared.is_some() {
                return Err(ArgumentError::Structure {
                    class: class.clone(),
                    member: name.clone(),
                    constraint: "method is statically declared; dynamic point not allowed"
                        .to_string(),
                });
            }
            Ok(SourcePoint::DynamicMethod {
                class: class.clone(),
                name: name.clone(),
            })
        };
        match role {
            Role::Static => static_point(),
            Role::Dynamic => dynamic_point(),
            Role::Infer => static_point().or_else(|static_err| {
                dynamic_point().map_err(|_| static_err)
            }),
        }
    }
}

fn resolve_property<P>(
    role: Role,
    schema: &ClassSchema,
    class: &ClassId,
    name: String,
    build: impl Fn(ClassId, String, bool) -> P,
) -> Result<P, ArgumentError> {
    let declared = schema.property(&name).is_some();
    let static_point = || -> Result<P, ArgumentError> {
        if !declared {
            return Err(ArgumentError::Structure {
                class: class.clone(),
                member: name.clone(),
                constraint: "property is not statically declared".to_string(),
            });
        }
        Ok(build(class.clone(), name.clone(), true))
    };
    let dynamic_point = || -> Result<P, ArgumentError> {
        if declared {
            return Err(ArgumentError::Structure {
                class: class.clone(),
                member: name.clone(),
                constraint: "property is statically declared; dynamic point not allowed"
                    .to_string(),
            });
        }
        Ok(build(class.clone(), name.clone(), false))
    };
    match role {
        Role::Static => static_point(),
        Role::Dynamic => dynamic_point(),
        Role::Infer => static_point().or_else(|static_err| dynamic_point().map_err(|_| static_err)),
    }
}

fn resolve_parameter(
    role: Role,
    schema: &ClassSchema,
    class: ClassId,
    method: String,
    name: String,
) -> Result<TargetPoint, ArgumentError> {
    let declared = schema.method(&method);
    let static_point = || -> Result<TargetPoint, ArgumentError> {
        let m = declared.ok_or_else(|| ArgumentError::Structure {
            class: class.clone(),
            member: method.clone(),
            constraint: "method is not statically declared".to_string(),
        })?;
        if m.param(&name).is_none() {
            return Err(ArgumentError::Structure {
                class: class.clone(),
                member: format!("{method}()::{name}"),
                constraint: "method declares no such parameter".to_string(),
            });
        }
        Ok(TargetPoint::StaticParameter {
            class: class.clone(),
            method: method.clone(),
            name: name.clone(),
        })
    };
    let dynamic_point = || -> Result<TargetPoint, ArgumentError> {
        if declared.is_some() {
            return Err(ArgumentError::Structure {
                class: class.clone(),
                member: method.clone(),
                constraint: "method is statically declared; dynamic point not allowed".to_string(),
            });
        }
        Ok(TargetPoint::DynamicParameter {
            class: class.clone(),
            method: method.clone(),
            name: name.clone(),
        })
    };
    match role {
        Role::Static => static_point(),
        Role::Dynamic => dynamic_point(),
        Role::Infer => static_point().or_else(|static_err| dynamic_point().map_err(|_| static_err)),
    }
}
