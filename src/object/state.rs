// This file is part of the terraform-provider-fortimanager project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::borrow::{Borrow, Cow};
use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tf_provider::value::{Value, ValueMap};

use crate::codec::{StateBlock, StateValue};
use crate::schema::{Field, FieldKind, Mode};

/// Terraform value whose type is only known through the resource schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dynamic {
    Bool(bool),
    Number(i64),
    String(String),
    List(Vec<ValueDynamic>),
    Object(BTreeMap<String, ValueDynamic>),
}

pub type ValueDynamic = Value<Dynamic>;

/// Attributes of a resource, keyed by attribute name.
pub type StateObject<'a> = BTreeMap<Cow<'a, str>, ValueDynamic>;

pub type ResourceState<'a> = ValueMap<'a, ValueDynamic>;

impl Serialize for Dynamic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Dynamic::Bool(b) => serializer.serialize_bool(*b),
            Dynamic::Number(n) => serializer.serialize_i64(*n),
            Dynamic::String(s) => serializer.serialize_str(s),
            Dynamic::List(list) => serializer.collect_seq(list),
            Dynamic::Object(object) => serializer.collect_map(object),
        }
    }
}

struct DynamicVisitor;

impl<'de> Visitor<'de> for DynamicVisitor {
    type Value = Dynamic;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a terraform value")
    }

    fn visit_bool<E: serde::de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Dynamic::Bool(v))
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Dynamic::Number(v))
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v)
            .map(Dynamic::Number)
            .map_err(|_| E::custom(format!("number {v} is out of range")))
    }

    fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Self::Value, E> {
        if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
            Ok(Dynamic::Number(v as i64))
        } else {
            Err(E::custom(format!("number {v} is not an integer")))
        }
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Dynamic::String(v.to_owned()))
    }

    fn visit_string<E: serde::de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(Dynamic::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut list = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(elt) = seq.next_element()? {
            list.push(elt);
        }
        Ok(Dynamic::List(list))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut object = BTreeMap::new();
        while let Some((key, value)) = map.next_entry()? {
            object.insert(key, value);
        }
        Ok(Dynamic::Object(object))
    }
}

impl<'de> Deserialize<'de> for Dynamic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DynamicVisitor)
    }
}

impl From<&str> for Dynamic {
    fn from(value: &str) -> Self {
        Dynamic::String(value.to_owned())
    }
}

impl From<i64> for Dynamic {
    fn from(value: i64) -> Self {
        Dynamic::Number(value)
    }
}

impl From<bool> for Dynamic {
    fn from(value: bool) -> Self {
        Dynamic::Bool(value)
    }
}

/// Text of a string or number attribute.
pub fn string_of<K: Borrow<str> + Ord>(object: &BTreeMap<K, ValueDynamic>, name: &str) -> Option<String> {
    match object.get(name)? {
        Value::Value(Dynamic::String(s)) if !s.is_empty() => Some(s.clone()),
        Value::Value(Dynamic::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Collect the known values of `object` into a state tree. Null and unknown values are absent.
pub fn to_block<K: Borrow<str> + Ord>(fields: &[Field], object: &BTreeMap<K, ValueDynamic>) -> StateBlock {
    fields
        .iter()
        .filter_map(|field| {
            let Value::Value(value) = object.get(field.name)? else {
                return None;
            };
            Some((field.name.to_owned(), to_state_value(field, value)?))
        })
        .collect()
}

fn strings(list: &[ValueDynamic]) -> impl Iterator<Item = String> + '_ {
    list.iter().filter_map(|item| match item {
        Value::Value(Dynamic::String(s)) => Some(s.clone()),
        Value::Value(Dynamic::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn to_state_value(field: &Field, value: &Dynamic) -> Option<StateValue> {
    match (&field.kind, value) {
        (FieldKind::String, Dynamic::String(s)) => Some(StateValue::Str(s.clone())),
        (FieldKind::Int, Dynamic::Number(n)) => Some(StateValue::Int(*n)),
        (FieldKind::Bool, Dynamic::Bool(b)) => Some(StateValue::Bool(*b)),
        (FieldKind::StringList, Dynamic::List(list)) => {
            Some(StateValue::List(strings(list).collect()))
        }
        (FieldKind::StringSet, Dynamic::List(list)) => {
            Some(StateValue::Set(strings(list).collect()))
        }
        (FieldKind::Block(children) | FieldKind::Blocks(children), Dynamic::List(list)) => {
            Some(StateValue::Blocks(
                list.iter()
                    .filter_map(|item| match item {
                        Value::Value(Dynamic::Object(object)) => Some(to_block(children, object)),
                        _ => None,
                    })
                    .collect(),
            ))
        }
        (kind, value) => {
            tracing::warn!(field = field.name, ?kind, ?value, "ignoring value of unexpected type");
            None
        }
    }
}

/// Terraform object holding every field of `fields`, null where the state tree has no value.
///
/// Block fields are never null, an absent block is an empty list.
pub fn from_block<K: Ord + From<&'static str>>(fields: &[Field], block: &StateBlock) -> BTreeMap<K, ValueDynamic> {
    fields
        .iter()
        .map(|field| {
            let value = match block.get(field.name) {
                Some(value) => Value::Value(from_state_value(field, value)),
                None if field.children().is_some() => Value::Value(Dynamic::List(Vec::new())),
                None => Value::Null,
            };
            (K::from(field.name), value)
        })
        .collect()
}

fn from_state_value(field: &Field, value: &StateValue) -> Dynamic {
    match value {
        StateValue::Str(s) => Dynamic::String(s.clone()),
        StateValue::Int(n) => Dynamic::Number(*n),
        StateValue::Bool(b) => Dynamic::Bool(*b),
        StateValue::List(items) => string_list(items),
        StateValue::Set(items) => string_list(items),
        StateValue::Blocks(blocks) => {
            let children = field.children().unwrap_or_default();
            Dynamic::List(
                blocks
                    .iter()
                    .map(|block| Value::Value(Dynamic::Object(from_block(children, block))))
                    .collect(),
            )
        }
    }
}

fn string_list<'s>(items: impl IntoIterator<Item = &'s String>) -> Dynamic {
    Dynamic::List(
        items
            .into_iter()
            .map(|s| Value::Value(Dynamic::String(s.clone())))
            .collect(),
    )
}

/// Mark attributes the remote will fill in as unknown.
///
/// Computed-only attributes always become unknown. Optional computed attributes only
/// when `optional` is set and the configuration leaves them null.
pub fn unknown_computed<K: Borrow<str> + Ord>(
    fields: &[Field],
    object: &mut BTreeMap<K, ValueDynamic>,
    optional: bool,
) {
    for field in fields {
        let Some(value) = object.get_mut(field.name) else {
            continue;
        };
        if let Some(children) = field.children() {
            if let Value::Value(Dynamic::List(items)) = value {
                for item in items.iter_mut() {
                    if let Value::Value(Dynamic::Object(inner)) = item {
                        unknown_computed(children, inner, optional);
                    }
                }
            }
            continue;
        }
        match field.mode {
            Mode::Computed => *value = Value::Unknown,
            Mode::OptionalComputed if optional && value.is_null() => *value = Value::Unknown,
            _ => (),
        }
    }
}

/// Fill the unknown values of a planned object from what the remote reports.
///
/// Known planned values are kept as they are, Terraform requires them to match.
pub fn reconcile<K: Borrow<str> + Ord>(
    fields: &[Field],
    planned: &mut BTreeMap<K, ValueDynamic>,
    remote: &BTreeMap<K, ValueDynamic>,
) {
    for field in fields {
        let Some(value) = planned.get_mut(field.name) else {
            continue;
        };
        let remote = remote.get(field.name);
        if value.is_unknown() {
            *value = remote.cloned().unwrap_or(Value::Null);
            continue;
        }
        let (Value::Value(Dynamic::List(items)), Some(children)) = (value, field.children()) else {
            continue;
        };
        let remote_items = match remote {
            Some(Value::Value(Dynamic::List(remote_items))) => remote_items.as_slice(),
            _ => &[],
        };
        for (i, item) in items.iter_mut().enumerate() {
            let Value::Value(Dynamic::Object(inner)) = item else {
                continue;
            };
            match remote_items.get(i) {
                Some(Value::Value(Dynamic::Object(remote_inner))) => {
                    reconcile(children, inner, remote_inner)
                }
                _ => reconcile(children, inner, &BTreeMap::new()),
            }
        }
    }
}
