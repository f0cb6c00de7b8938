//! Dynamic value model.
//!
//! Mapped objects are represented as [`Instance`] values: a class id plus
//! two member surfaces: the **declared** slots the class schema names,
//! and the **dynamic** members that only exist on the live instance. Both
//! are `BTreeMap`s so member iteration is deterministic.
//!
//! `Instance` is also where the dynamic-member-access capability lives:
//! `get`/`set` over either surface, and `apply_method`/`apply_dynamic_method`
//! for invocation, driven by the accessor semantics a
//! [`MethodSchema`](crate::introspect::MethodSchema) declares.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::OperationError;
use crate::introspect::{ClassId, ClassSchema, MethodKind, MethodSchema};

/// Reserved key carrying an object's class id in JSON form.
pub const JSON_CLASS_KEY: &str = "@class";

/// A value in transit between a source point and a target point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Absent / unset.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// String.
    Str(String),
    /// Ordered list.
    List(Vec<Value>),
    /// Object with class identity.
    Object(Instance),
}

impl Value {
    /// Short description of the value's kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Object(_) => "object",
        }
    }

    /// The instance, when this value is an object.
    pub fn as_object(&self) -> Option<&Instance> {
        match self {
            Self::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// Convert to a plain JSON value. Objects become JSON objects with
    /// their class id under [`JSON_CLASS_KEY`].
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Value::from(*f),
            Self::Str(s) => serde_json::Value::from(s.clone()),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Self::Object(instance) => instance.to_json(),
        }
    }

    /// Convert a plain (class-less) JSON scalar or array into a value.
    ///
    /// JSON objects are not accepted here because they carry no class
    /// identity; use [`Instance::from_json`] with a schema instead.
    pub fn from_json_scalar(json: &serde_json::Value) -> Option<Value> {
        match json {
            serde_json::Value::Null => Some(Value::Null),
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Value::Int(i))
                } else {
                    n.as_f64().map(Value::Float)
                }
            }
            serde_json::Value::String(s) => Some(Value::Str(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Value::from_json_scalar)
                .collect::<Option<Vec<_>>>()
                .map(Value::List),
            serde_json::Value::Object(_) => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Instance> for Value {
    fn from(v: Instance) -> Self {
        Self::Object(v)
    }
}

/// A live object: class identity plus declared and dynamic member
/// surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    class: ClassId,
    declared: BTreeMap<String, Value>,
    dynamic: BTreeMap<String, Value>,
}

impl Instance {
    /// Create an instance with no member slots. Prefer
    /// [`Instance::default_of`] when a schema is at hand.
    pub fn new(class: impl Into<ClassId>) -> Self {
        Self {
            class: class.into(),
            declared: BTreeMap::new(),
            dynamic: BTreeMap::new(),
        }
    }

    /// Create an instance with every declared property slot present and
    /// `Null`.
    pub fn default_of(schema: &ClassSchema) -> Self {
        let declared = schema
            .properties
            .iter()
            .map(|p| (p.name.clone(), Value::Null))
            .collect();
        Self {
            class: schema.id.clone(),
            declared,
            dynamic: BTreeMap::new(),
        }
    }

    /// The instance's (raw) class id.
    pub fn class(&self) -> &ClassId {
        &self.class
    }

    /// Fluent declared-member assignment, for construction sites.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.declared.insert(name.into(), value.into());
        self
    }

    /// Fluent dynamic-member assignment, for construction sites.
    pub fn with_dynamic(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.dynamic.insert(name.into(), value.into());
        self
    }

    /// Read a declared member slot.
    pub fn declared_get(&self, name: &str) -> Option<&Value> {
        self.declared.get(name)
    }

    /// Write a declared member slot. The slot must already exist.
    pub fn declared_set(&mut self, name: &str, value: Value) -> Result<(), OperationError> {
        match self.declared.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(OperationError::Introspection(format!(
                "instance of `{}` has no declared member `{name}`",
                self.class
            ))),
        }
    }

    /// Read a dynamic member.
    pub fn dynamic_get(&self, name: &str) -> Option<&Value> {
        self.dynamic.get(name)
    }

    /// Write (or create) a dynamic member.
    pub fn dynamic_set(&mut self, name: impl Into<String>, value: Value) {
        self.dynamic.insert(name.into(), value);
    }

    /// The live dynamic surface, in deterministic (sorted) order.
    pub fn dynamic_members(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.dynamic.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Invoke a declared method with named arguments.
    ///
    /// Accessor semantics come from the schema's [`MethodKind`]: a setter
    /// writes its backing member; a plain method assigns each argument to
    /// the member named after the parameter (declared slot when present,
    /// dynamic member otherwise). Getters and constructors are not
    /// invocable here.
    pub fn apply_method(
        &mut self,
        method: &MethodSchema,
        args: &[(String, Value)],
    ) -> Result<(), OperationError> {
        match &method.kind {
            MethodKind::Setter(backing) => {
                let (_, value) = args.first().ok_or_else(|| {
                    OperationError::Introspection(format!(
                        "setter `{}::{}` called with no argument",
                        self.class, method.name
                    ))
                })?;
                self.declared_set(backing, value.clone())
            }
            MethodKind::Plain => {
                for (param, value) in args {
                    if self.declared.contains_key(param) {
                        self.declared_set(param, value.clone())?;
                    } else {
                        self.dynamic_set(param.clone(), value.clone());
                    }
                }
                Ok(())
            }
            MethodKind::Getter(_) => Err(OperationError::Introspection(format!(
                "getter `{}::{}` is not invocable for mutation",
                self.class, method.name
            ))),
            MethodKind::Constructor => Err(OperationError::Introspection(format!(
                "constructor `{}::{}` can only run during instantiation",
                self.class, method.name
            ))),
        }
    }

    /// Invoke an undeclared method: each argument lands on the dynamic
    /// member named after its parameter.
    pub fn apply_dynamic_method(&mut self, _method: &str, args: &[(String, Value)]) {
        for (param, value) in args {
            self.dynamic_set(param.clone(), value.clone());
        }
    }

    /// Convert to a JSON object carrying the class id under
    /// [`JSON_CLASS_KEY`]. Dynamic members are merged into the same
    /// object.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert(
            JSON_CLASS_KEY.to_string(),
            serde_json::Value::from(self.class.as_str()),
        );
        for (name, value) in self.declared.iter().chain(self.dynamic.iter()) {
            map.insert(name.clone(), value.to_json());
        }
        serde_json::Value::Object(map)
    }

    /// Build an instance from a flat JSON object, splitting members into
    /// declared and dynamic surfaces per the schema. Nested JSON objects
    /// are not resolvable without their own schemas and are rejected.
    pub fn from_json(
        schema: &ClassSchema,
        json: &serde_json::Value,
    ) -> Result<Instance, OperationError> {
        let map = json.as_object().ok_or_else(|| {
            OperationError::Introspection(format!(
                "expected a JSON object for class `{}`",
                schema.id
            ))
        })?;
        let mut instance = Instance::default_of(schema);
        for (name, raw) in map {
            if name == JSON_CLASS_KEY {
                continue;
            }
            let value = Value::from_json_scalar(raw).ok_or_else(|| {
                OperationError::Introspection(format!(
                    "member `{name}` of `{}` is a nested JSON object without a schema",
                    schema.id
                ))
            })?;
            if schema.property(name).is_some() {
                instance.declared_set(name, value)?;
            } else {
                instance.dynamic_set(name.clone(), value);
            }
        }
        Ok(instance)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({} declared, {} dynamic)",
            self.class,
            self.declared.len(),
            self.dynamic.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::{PropertySchema, TypeRef};

    fn schema() -> ClassSchema {
        ClassSchema::new("Point2")
            .with_property(PropertySchema::new("x", TypeRef::Int))
            .with_property(PropertySchema::new("y", TypeRef::Int))
            .with_method(MethodSchema::setter("setX", "x", TypeRef::Int))
    }

    #[test]
    fn test_default_of_fills_declared_slots() {
        let instance = Instance::default_of(&schema());
        assert_eq!(instance.declared_get("x"), Some(&Value::Null));
        assert_eq!(instance.declared_get("y"), Some(&Value::Null));
        assert_eq!(instance.declared_get("z"), None);
    }

    #[test]
    fn test_declared_set_requires_slot() {
        let mut instance = Instance::default_of(&schema());
        instance.declared_set("x", Value::Int(3)).unwrap();
        assert_eq!(instance.declared_get("x"), Some(&Value::Int(3)));

        let err = instance.declared_set("z", Value::Int(1)).unwrap_err();
        assert!(matches!(err, OperationError::Introspection(_)));
    }

    #[test]
    fn test_setter_writes_backing_member() {
        let s = schema();
        let mut instance = Instance::default_of(&s);
        let setter = s.method("setX").unwrap();
        instance
            .apply_method(setter, &[("x".to_string(), Value::Int(9))])
            .unwrap();
        assert_eq!(instance.declared_get("x"), Some(&Value::Int(9)));
    }

    #[test]
    fn test_dynamic_method_lands_on_dynamic_surface() {
        let mut instance = Instance::default_of(&schema());
        instance.apply_dynamic_method("setColor", &[("color".to_string(), Value::from("red"))]);
        assert_eq!(instance.dynamic_get("color"), Some(&Value::from("red")));
        assert_eq!(instance.declared_get("color"), None);
    }

    #[test]
    fn test_dynamic_members_sorted() {
        let mut instance = Instance::new("Bag");
        instance.dynamic_set("b", Value::Int(2));
        instance.dynamic_set("a", Value::Int(1));
        let names: Vec<&str> = instance.dynamic_members().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_json_round_trip() {
        let s = schema();
        let instance = Instance::default_of(&s)
            .with("x", 1i64)
            .with("y", 2i64)
            .with_dynamic("tag", "v");

        let json = instance.to_json();
        assert_eq!(json[JSON_CLASS_KEY], "Point2");

        let back = Instance::from_json(&s, &json).unwrap();
        assert_eq!(back, instance);
    }

    #[test]
    fn test_from_json_rejects_nested_objects() {
        let s = schema();
        let json = serde_json::json!({ "x": { "nested": 1 } });
        assert!(Instance::from_json(&s, &json).is_err());
    }
}
