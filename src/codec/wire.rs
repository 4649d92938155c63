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

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type WireMap = BTreeMap<String, WireValue>;

/// Node of the configuration tree exchanged with the remote API.
///
/// A null member of an object is dropped while decoding, which is how the API
/// reports absent attributes. A null array element is kept as `Null` so the
/// array keeps its length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    Str(String),
    Int(i64),
    Bool(bool),
    List(Vec<WireValue>),
    Map(WireMap),
    Null,
}

impl WireValue {
    pub fn kind(&self) -> &'static str {
        match self {
            WireValue::Str(_) => "string",
            WireValue::Int(_) => "integer",
            WireValue::Bool(_) => "bool",
            WireValue::List(_) => "list",
            WireValue::Map(_) => "map",
            WireValue::Null => "null",
        }
    }

    /// Render a scalar usable as an object key in a URL.
    pub fn as_key(&self) -> Option<String> {
        match self {
            WireValue::Str(s) => Some(s.clone()),
            WireValue::Int(i) => Some(i.to_string()),
            WireValue::Bool(_) | WireValue::List(_) | WireValue::Map(_) | WireValue::Null => None,
        }
    }

    pub fn as_map(&self) -> Option<&WireMap> {
        match self {
            WireValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self {
        WireValue::Str(value.to_owned())
    }
}

impl From<String> for WireValue {
    fn from(value: String) -> Self {
        WireValue::Str(value)
    }
}

impl From<i64> for WireValue {
    fn from(value: i64) -> Self {
        WireValue::Int(value)
    }
}

impl From<bool> for WireValue {
    fn from(value: bool) -> Self {
        WireValue::Bool(value)
    }
}

impl From<Vec<WireValue>> for WireValue {
    fn from(value: Vec<WireValue>) -> Self {
        WireValue::List(value)
    }
}

impl From<WireMap> for WireValue {
    fn from(value: WireMap) -> Self {
        WireValue::Map(value)
    }
}

impl FromIterator<WireValue> for WireValue {
    fn from_iter<T: IntoIterator<Item = WireValue>>(iter: T) -> Self {
        WireValue::List(iter.into_iter().collect())
    }
}

impl Serialize for WireValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WireValue::Str(s) => serializer.serialize_str(s),
            WireValue::Int(i) => serializer.serialize_i64(*i),
            WireValue::Bool(b) => serializer.serialize_bool(*b),
            WireValue::List(list) => serializer.collect_seq(list),
            WireValue::Map(map) => serializer.collect_map(map),
            WireValue::Null => serializer.serialize_unit(),
        }
    }
}

struct WireVisitor;

impl<'de> Visitor<'de> for WireVisitor {
    type Value = WireValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string, a number, a boolean, null, an array or an object")
    }

    fn visit_bool<E: serde::de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(WireValue::Bool(v))
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(WireValue::Int(v))
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(match i64::try_from(v) {
            Ok(i) => WireValue::Int(i),
            Err(_) => WireValue::Str(v.to_string()),
        })
    }

    fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Self::Value, E> {
        if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
            Ok(WireValue::Int(v as i64))
        } else {
            Ok(WireValue::Str(v.to_string()))
        }
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(WireValue::Str(v.to_owned()))
    }

    fn visit_string<E: serde::de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(WireValue::Str(v))
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(WireValue::Null)
    }

    fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(WireValue::Null)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut list = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(elt) = seq.next_element::<WireValue>()? {
            list.push(elt);
        }
        Ok(WireValue::List(list))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut out = WireMap::new();
        while let Some((key, value)) = map.next_entry::<String, Option<WireValue>>()? {
            if let Some(value) = value {
                out.insert(key, value);
            }
        }
        Ok(WireValue::Map(out))
    }
}

impl<'de> Deserialize<'de> for WireValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(WireVisitor)
    }
}
