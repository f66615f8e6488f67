//! Schema compilation into mapping trees
//!
//! Every schema member becomes a helper call on `serde_json::Value`
//! targets, so compiled schemas go through the same validation as
//! hand-written mappings.

use kvs_core::helpers::HelperOptions;
use kvs_core::{
    ClassMapping, ClassMappingHelper, CollectionKeyType, CompositeValues, MapMembers, MappingError,
};
use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::schema::{MemberKind, MemberSchema, Schema};
use crate::value::{scalar_to_string, ValueType};

impl Schema {
    /// Compile into a mapping over JSON objects
    ///
    /// # Errors
    /// Returns [`SchemaError::Mapping`] when the resulting mapping fails
    /// validation (duplicate keys, composites without components, ...).
    pub fn compile(&self) -> Result<ClassMapping<Value>, SchemaError> {
        let mut problems = Vec::new();
        check_joins(&self.members, "", &mut problems);
        if !problems.is_empty() {
            return Err(SchemaError::Mapping {
                schema: self.name.clone(),
                source: MappingError::Configuration(problems.join("; ")),
            });
        }

        let helper = add_members(ClassMappingHelper::new(empty_object), &self.members);
        let mapping = helper.build().map_err(|source| SchemaError::Mapping {
            schema: self.name.clone(),
            source,
        })?;
        tracing::debug!(schema = %self.name, members = self.members.len(), "schema compiled");
        Ok(mapping)
    }
}

/// Composite `join` separators must be non-empty
fn check_joins(members: &[MemberSchema], parent: &str, problems: &mut Vec<String>) {
    for member in members {
        let path = if parent.is_empty() {
            member.name.clone()
        } else {
            format!("{parent}.{}", member.name)
        };
        match &member.kind {
            MemberKind::Composite {
                join: Some(join), ..
            } if join.is_empty() => {
                problems.push(format!("{path}: composite join must not be empty"));
            }
            MemberKind::Class { members } | MemberKind::ClassCollection { members } => {
                check_joins(members, &path, problems);
            }
            _ => {}
        }
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn field<'a>(target: &'a Value, name: &str) -> Option<&'a Value> {
    target.get(name).filter(|value| !value.is_null())
}

fn store(target: &mut Value, name: &str, value: Value) {
    if let Some(object) = target.as_object_mut() {
        object.insert(name.to_string(), value);
    }
}

fn add_members<H: MapMembers<Value>>(helper: H, members: &[MemberSchema]) -> H {
    members.iter().fold(helper, add_member)
}

fn apply<H: HelperOptions>(mut helper: H, member: &MemberSchema) -> H {
    if let Some(key) = &member.key {
        helper = helper.key(key.as_str());
    }
    if member.mandatory {
        helper = helper.mandatory();
    }
    if let Some(flag) = &member.flag {
        helper = match &flag.value {
            Some(value) => helper.flag_value(flag.key.as_str(), value.as_str()),
            None => helper.flag(flag.key.as_str()),
        };
    }
    helper
}

fn add_member<H: MapMembers<Value>>(helper: H, member: &MemberSchema) -> H {
    let name = member.name.clone();
    let get_name = name.clone();
    let set_name = name.clone();

    match &member.kind {
        MemberKind::Simple { value_type } => {
            let value_type = *value_type;
            helper.simple_with(
                name,
                move |target: &Value| field(target, &get_name),
                move |target: &mut Value, value: Value| store(target, &set_name, value),
                |m| {
                    apply(
                        m.parse_with(move |raw| value_type.parse(raw))
                            .format_with(move |value| value_type.format(value)),
                        member,
                    )
                },
            )
        }

        MemberKind::Class { members } => helper.class_with(
            name,
            empty_object,
            move |target: &Value| field(target, &get_name).filter(|v| v.is_object()),
            move |target: &mut Value, value: Value| store(target, &set_name, value),
            |m| apply(add_members(m, members), member),
        ),

        MemberKind::Composite { components, join } => {
            let ids = components.clone();
            let join = join.clone();
            helper.composite(
                name,
                move |target: &Value| field(target, &get_name),
                move |target: &mut Value, value: Value| store(target, &set_name, value),
                |m| apply(composite_components(m, ids, join), member),
            )
        }

        MemberKind::ValueCollection {
            value_type,
            keys,
            separator,
        } => {
            let value_type = *value_type;
            helper.value_collection_with(
                name,
                move |target: &Value| field(target, &get_name).and_then(Value::as_array),
                move |target: &mut Value, items: Vec<Value>| {
                    store(target, &set_name, Value::Array(items));
                },
                |m| {
                    let m = m
                        .parse_with(move |raw| value_type.parse(raw))
                        .format_with(move |value| value_type.format(value));
                    let m = match (keys, separator) {
                        (CollectionKeyType::Separate, _) => m.separate(),
                        (CollectionKeyType::Aggregate, Some(separator)) => {
                            m.aggregate_with(separator.as_str())
                        }
                        (CollectionKeyType::Aggregate, None) => m.aggregate(),
                    };
                    apply(m, member)
                },
            )
        }

        MemberKind::ClassCollection { members } => helper.class_collection(
            name,
            move |target: &Value| field(target, &get_name).and_then(Value::as_array),
            move |target: &mut Value, items: Vec<Value>| {
                store(target, &set_name, Value::Array(items));
            },
            |m| apply(add_members(m.factory(empty_object), members), member),
        ),
    }
}

fn composite_components(
    helper: kvs_core::CompositeMappingHelper<Value, Value>,
    ids: Vec<String>,
    join: Option<String>,
) -> kvs_core::CompositeMappingHelper<Value, Value> {
    match join {
        None => {
            let helper = ids.iter().fold(helper, |helper, id| {
                let key = id.clone();
                helper.component(id.as_str(), move |value: &Value| {
                    value.get(&key).and_then(scalar_to_string)
                })
            });
            helper.deserialize_with(|values: &CompositeValues| {
                Ok(Value::Object(
                    values
                        .iter()
                        .map(|(id, raw)| (id.to_string(), Value::String(raw.to_string())))
                        .collect(),
                ))
            })
        }
        Some(join) => {
            let count = ids.len();
            let helper = ids.iter().enumerate().fold(helper, |helper, (position, id)| {
                let separator = join.clone();
                helper.component(id.as_str(), move |value: &Value| {
                    value
                        .as_str()
                        .and_then(|s| s.splitn(count, separator.as_str()).nth(position))
                        .filter(|part| !part.is_empty())
                        .map(str::to_string)
                })
            });
            let separator = join.clone();
            let helper = helper.check_with(move |value: &Value| {
                let text = value.as_str().ok_or("expected a string")?;
                let parts: Vec<&str> = text.splitn(count, separator.as_str()).collect();
                if parts.len() == count && parts.iter().all(|part| !part.is_empty()) {
                    Ok(())
                } else {
                    Err(format!(
                        "expected {count} non-empty parts joined by '{separator}'"
                    ))
                }
            });
            helper.deserialize_with(move |values: &CompositeValues| {
                let parts = ids
                    .iter()
                    .map(|id| values.require(id))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::String(parts.join(join.as_str())))
            })
        }
    }
}
