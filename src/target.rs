//! Target wrapper: value buffering and atomic instantiation/mutation.
//!
//! A [`Target`] moves through three states: *Empty* (class id only),
//! *Buffering* (values accumulated via [`set_point_value`]), *Operated*
//! (instance finalized by [`operate`]), and back to Buffering for the
//! next pass.
//!
//! [`operate`] applies the buffered values in a fixed order: construct if
//! absent (buffered constructor values, else no-argument construction),
//! then static method calls (constructor excluded), dynamic method calls,
//! static property assignments, dynamic property assignments. The whole
//! sequence is first dry-run against a private clone; only when the dry
//! run succeeds is it repeated against the real instance, so a
//! pre-existing instance is never observed partially mutated. Buffers are
//! drained unconditionally, success or fault.
//!
//! [`set_point_value`]: Target::set_point_value
//! [`operate`]: Target::operate

use std::collections::BTreeMap;
use std::mem;
use std::sync::Arc;

use crate::canonical::ClassCanonicalizer;
use crate::error::{ArgumentError, OperationError};
use crate::introspect::{ClassId, ClassIntrospector, ClassSchema, MethodSchema};
use crate::point::TargetPoint;
use crate::value::{Instance, Value};

/// A buffered method-parameter value.
#[derive(Debug, Clone)]
struct BufferedParam {
    position: usize,
    name: String,
    value: Value,
}

#[derive(Debug, Default)]
struct Buffers {
    /// Declared property assignments, in buffering order.
    static_properties: Vec<(String, Value)>,
    /// Declared method calls: method name → parameters sorted by declared
    /// position.
    static_parameters: BTreeMap<String, Vec<BufferedParam>>,
    /// Dynamic property assignments, in buffering order.
    dynamic_properties: Vec<(String, Value)>,
    /// Dynamic method calls, call order preserved.
    dynamic_calls: Vec<(String, String, Value)>,
}

impl Buffers {
    fn is_empty(&self) -> bool {
        self.static_properties.is_empty()
            && self.static_parameters.is_empty()
            && self.dynamic_properties.is_empty()
            && self.dynamic_calls.is_empty()
    }
}

/// Write adapter over an existing instance or a class to instantiate.
#[derive(Debug)]
pub struct Target {
    class: ClassId,
    schema: Arc<ClassSchema>,
    canonicalizer: ClassCanonicalizer,
    instance: Option<Instance>,
    buffers: Buffers,
}

impl Target {
    /// Empty target: class id only, instance constructed on `operate()`.
    pub fn for_class(
        introspector: &dyn ClassIntrospector,
        canonicalizer: ClassCanonicalizer,
        class: &ClassId,
    ) -> Result<Self, OperationError> {
        let class = canonicalizer.canonicalize_id(class);
        let schema = introspector
            .describe(&class)
            .ok_or(ArgumentError::UnknownClass(class.clone()))?;
        Ok(Self {
            class,
            schema,
            canonicalizer,
            instance: None,
            buffers: Buffers::default(),
        })
    }

    /// Target over a pre-existing instance.
    pub fn for_instance(
        introspector: &dyn ClassIntrospector,
        canonicalizer: ClassCanonicalizer,
        instance: Instance,
    ) -> Result<Self, OperationError> {
        let class = canonicalizer.canonicalize_id(instance.class());
        let schema = introspector
            .describe(&class)
            .ok_or(ArgumentError::UnknownClass(class.clone()))?;
        Ok(Self {
            class,
            schema,
            canonicalizer,
            instance: Some(instance),
            buffers: Buffers::default(),
        })
    }

    /// The target's canonicalized class.
    pub fn class(&self) -> &ClassId {
        &self.class
    }

    /// The target class schema.
    pub fn schema(&self) -> &Arc<ClassSchema> {
        &self.schema
    }

    /// The current instance, if one exists (pre-existing or operated).
    pub fn instance(&self) -> Option<&Instance> {
        self.instance.as_ref()
    }

    /// Whether any values are buffered for the next `operate()`.
    pub fn has_buffered_values(&self) -> bool {
        !self.buffers.is_empty()
    }

    /// Buffer a value for a target point.
    ///
    /// Validates the point's declaring class against the target's
    /// (canonicalized on both sides) and appends into the buffer matching
    /// the point kind. Nothing touches the instance until `operate()`.
    pub fn set_point_value(
        &mut self,
        point: &TargetPoint,
        value: Value,
    ) -> Result<(), OperationError> {
        if !self.canonicalizer.same_class(point.class(), &self.class) {
            return Err(OperationError::ForeignPoint {
                point: point.fqn(),
                class: self.class.clone(),
            });
        }
        match point {
            TargetPoint::StaticProperty { name, .. } => {
                self.buffers.static_properties.push((name.clone(), value));
            }
            TargetPoint::StaticParameter { method, name, .. } => {
                let position = self
                    .schema
                    .method(method)
                    .and_then(|m| m.param(name))
                    .map(|p| p.position)
                    .ok_or_else(|| {
                        OperationError::Introspection(format!(
                            "`{}::{method}()::{name}` vanished from the schema",
                            self.class
                        ))
                    })?;
                let params = self.buffers.static_parameters.entry(method.clone()).or_default();
                params.push(BufferedParam {
                    position,
                    name: name.clone(),
                    value,
                });
                params.sort_by_key(|p| p.position);
            }
            TargetPoint::DynamicProperty { name, .. } => {
                self.buffers.dynamic_properties.push((name.clone(), value));
            }
            TargetPoint::DynamicParameter { method, name, .. } => {
                self.buffers
                    .dynamic_calls
                    .push((method.clone(), name.clone(), value));
            }
        }
        Ok(())
    }

    /// Apply all buffered values and yield the resulting instance.
    ///
    /// With empty buffers this is a no-op for a pre-existing instance
    /// (idempotent) and a plain no-argument construction for an empty
    /// target. Buffers are drained whether the application succeeds or
    /// faults.
    pub fn operate(&mut self) -> Result<Instance, OperationError> {
        let mut buffers = mem::take(&mut self.buffers);

        let ctor_name = self.schema.constructor().map(|c| c.name.clone());
        let ctor_values = ctor_name
            .as_deref()
            .and_then(|name| buffers.static_parameters.remove(name));

        let base = match self.instance.clone() {
            Some(existing) => existing,
            None => self.construct(ctor_values)?,
        };

        // Dry run against a private clone; a fault here leaves any
        // pre-existing instance untouched.
        let mut probe = base.clone();
        if let Err(err) = self.apply(&buffers, &mut probe) {
            tracing::error!(class = %self.class, error = %err, "target finalization dry run failed");
            return Err(err);
        }

        let mut real = base;
        self.apply(&buffers, &mut real)?;
        self.instance = Some(real.clone());
        Ok(real)
    }

    fn construct(
        &self,
        ctor_values: Option<Vec<BufferedParam>>,
    ) -> Result<Instance, OperationError> {
        match (self.schema.constructor(), ctor_values) {
            (Some(ctor), Some(params)) => {
                for required in ctor.params.iter().filter(|p| p.required) {
                    if !params.iter().any(|b| b.name == required.name) {
                        return Err(OperationError::Finalization {
                            class: self.class.clone(),
                            reason: format!(
                                "no value buffered for required constructor parameter `{}`",
                                required.name
                            ),
                        });
                    }
                }
                let mut instance = Instance::default_of(&self.schema);
                for param in &params {
                    if instance.declared_get(&param.name).is_some() {
                        instance.declared_set(&param.name, param.value.clone())?;
                    } else {
                        instance.dynamic_set(param.name.clone(), param.value.clone());
                    }
                }
                Ok(instance)
            }
            (Some(ctor), None) if ctor.required_params() > 0 => {
                Err(OperationError::Finalization {
                    class: self.class.clone(),
                    reason: format!(
                        "constructor requires {} parameter(s) and none were buffered",
                        ctor.required_params()
                    ),
                })
            }
            _ => Ok(Instance::default_of(&self.schema)),
        }
    }

    fn apply(&self, buffers: &Buffers, instance: &mut Instance) -> Result<(), OperationError> {
        // Declared method calls (constructor already consumed).
        for (method, params) in &buffers.static_parameters {
            let schema: &MethodSchema = self.schema.method(method).ok_or_else(|| {
                OperationError::Introspection(format!(
                    "`{}::{method}()` vanished from the schema",
                    self.class
                ))
            })?;
            let args: Vec<(String, Value)> = params
                .iter()
                .map(|p| (p.name.clone(), p.value.clone()))
                .collect();
            instance.apply_method(schema, &args)?;
        }
        // Dynamic method calls, in call order.
        for (method, param, value) in &buffers.dynamic_calls {
            instance.apply_dynamic_method(method, &[(param.clone(), value.clone())]);
        }
        // Declared property assignments.
        for (name, value) in &buffers.static_properties {
            instance.declared_set(name, value.clone())?;
        }
        // Dynamic property assignments.
        for (name, value) in &buffers.dynamic_properties {
            instance.dynamic_set(name.clone(), value.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::{
        ClassRegistry, MethodSchema, ParamSchema, PropertySchema, TypeRef,
    };

    fn registry() -> Arc<ClassRegistry> {
        let registry = ClassRegistry::new();
        registry
            .register(
                ClassSchema::new("Tgt")
                    .with_property(PropertySchema::new("a", TypeRef::Int))
                    .with_property(PropertySchema::new("b", TypeRef::Str))
                    .with_method(MethodSchema::constructor(vec![ParamSchema::new(
                        "a",
                        TypeRef::Int,
                        0,
                    )]))
                    .with_method(MethodSchema::setter("setB", "b", TypeRef::Str)),
            )
            .unwrap();
        Arc::new(registry)
    }

    fn target_for_class(registry: &ClassRegistry) -> Target {
        Target::for_class(registry, ClassCanonicalizer::new(), &ClassId::new("Tgt")).unwrap()
    }

    fn prop(name: &str) -> TargetPoint {
        TargetPoint::StaticProperty {
            class: ClassId::new("Tgt"),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_construct_from_buffered_ctor_values() {
        let registry = registry();
        let mut target = target_for_class(&registry);
        target
            .set_point_value(
                &TargetPoint::StaticParameter {
                    class: ClassId::new("Tgt"),
                    method: "new".to_string(),
                    name: "a".to_string(),
                },
                Value::Int(5),
            )
            .unwrap();

        let instance = target.operate().unwrap();
        assert_eq!(instance.declared_get("a"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_missing_required_ctor_value_is_finalization_fault() {
        let registry = registry();
        let mut target = target_for_class(&registry);
        target.set_point_value(&prop("b"), Value::from("x")).unwrap();

        let err = target.operate().unwrap_err();
        assert!(matches!(err, OperationError::Finalization { .. }));
        // Buffers are drained even on fault.
        assert!(!target.has_buffered_values());
    }

    #[test]
    fn test_setter_then_property_order() {
        let registry = registry();
        let base = Instance::default_of(&registry.describe(&ClassId::new("Tgt")).unwrap());
        let mut target =
            Target::for_instance(registry.as_ref(), ClassCanonicalizer::new(), base).unwrap();

        // Property assignments run after method calls, so the property
        // value wins for the same member.
        target
            .set_point_value(
                &TargetPoint::StaticParameter {
                    class: ClassId::new("Tgt"),
                    method: "setB".to_string(),
                    name: "b".to_string(),
                },
                Value::from("via-setter"),
            )
            .unwrap();
        target
            .set_point_value(&prop("b"), Value::from("via-property"))
            .unwrap();

        let instance = target.operate().unwrap();
        assert_eq!(instance.declared_get("b"), Some(&Value::from("via-property")));
    }

    #[test]
    fn test_operate_idempotent_without_new_values() {
        let registry = registry();
        let base = Instance::default_of(&registry.describe(&ClassId::new("Tgt")).unwrap())
            .with("a", 1i64);
        let mut target =
            Target::for_instance(registry.as_ref(), ClassCanonicalizer::new(), base).unwrap();

        target.set_point_value(&prop("a"), Value::Int(2)).unwrap();
        let first = target.operate().unwrap();
        let second = target.operate().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_failed_operate_leaves_existing_instance_unchanged() {
        let registry = registry();
        let base = Instance::default_of(&registry.describe(&ClassId::new("Tgt")).unwrap())
            .with("a", 1i64);
        let snapshot = base.clone();
        let mut target =
            Target::for_instance(registry.as_ref(), ClassCanonicalizer::new(), base).unwrap();

        // A parameter point whose method no longer resolves triggers a
        // structural fault mid-sequence; the earlier property assignment
        // must not leak into the real instance.
        target.set_point_value(&prop("a"), Value::Int(99)).unwrap();
        target.buffers.static_parameters.insert(
            "ghost".to_string(),
            vec![BufferedParam {
                position: 0,
                name: "g".to_string(),
                value: Value::Int(1),
            }],
        );

        assert!(target.operate().is_err());
        assert_eq!(target.instance(), Some(&snapshot));
    }

    #[test]
    fn test_dynamic_buffers_apply_in_order() {
        let registry = registry();
        let mut target = target_for_class(&registry);
        target
            .set_point_value(
                &TargetPoint::StaticParameter {
                    class: ClassId::new("Tgt"),
                    method: "new".to_string(),
                    name: "a".to_string(),
                },
                Value::Int(1),
            )
            .unwrap();
        target
            .set_point_value(
                &TargetPoint::DynamicParameter {
                    class: ClassId::new("Tgt"),
                    method: "setColor".to_string(),
                    name: "color".to_string(),
                },
                Value::from("red"),
            )
            .unwrap();
        target
            .set_point_value(
                &TargetPoint::DynamicProperty {
                    class: ClassId::new("Tgt"),
                    name: "color".to_string(),
                },
                Value::from("blue"),
            )
            .unwrap();

        // Dynamic property assignments run after dynamic calls.
        let instance = target.operate().unwrap();
        assert_eq!(instance.dynamic_get("color"), Some(&Value::from("blue")));
    }

    #[test]
    fn test_foreign_point_rejected() {
        let registry = registry();
        let mut target = target_for_class(&registry);
        let foreign = TargetPoint::StaticProperty {
            class: ClassId::new("Other"),
            name: "a".to_string(),
        };
        assert!(matches!(
            target.set_point_value(&foreign, Value::Null),
            Err(OperationError::ForeignPoint { .. })
        ));
    }

    #[test]
    fn test_proxy_declared_point_accepted() {
        let registry = registry();
        let mut target = target_for_class(&registry);
        let proxied = TargetPoint::StaticProperty {
            class: ClassId::new("generated.__proxy__.Tgt"),
            name: "a".to_string(),
        };
        assert!(target.set_point_value(&proxied, Value::Int(1)).is_ok());
    }
}
