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

use thiserror::Error;

use crate::schema::{Field, FieldKind};

use super::path::StatePath;
use super::state::{StateBlock, StateValue};
use super::wire::{WireMap, WireValue};

/// A response attribute whose value does not fit the declared field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("attribute `{path}` expected {expected}, got {found}")]
pub struct FieldError {
    pub path: StatePath,
    pub expected: &'static str,
    pub found: &'static str,
}

/// Decode a response object into a state block.
///
/// Keys the schema does not know are ignored. A field that fails to decode is
/// left absent and reported, the other fields are decoded anyway.
pub fn flatten(fields: &[Field], wire: &WireMap, prefix: &StatePath) -> (StateBlock, Vec<FieldError>) {
    let mut errors = Vec::new();
    let block = flatten_block(fields, wire, prefix, &mut errors);
    (block, errors)
}

fn flatten_block(
    fields: &[Field],
    wire: &WireMap,
    prefix: &StatePath,
    errors: &mut Vec<FieldError>,
) -> StateBlock {
    fields
        .iter()
        .filter_map(|field| {
            let value = wire.get(field.wire_key().as_ref())?;
            let path = prefix.clone().field(field.name);
            let value = flatten_field(field, value, &path, errors)?;
            Some((field.name.to_owned(), value))
        })
        .collect()
}

fn flatten_field(
    field: &Field,
    value: &WireValue,
    path: &StatePath,
    errors: &mut Vec<FieldError>,
) -> Option<StateValue> {
    match (&field.kind, value) {
        (FieldKind::String, WireValue::Str(s)) => Some(StateValue::Str(s.clone())),
        (FieldKind::String, _) => mismatch(errors, path, value, "string"),
        (FieldKind::Int, WireValue::Int(i)) => Some(StateValue::Int(*i)),
        (FieldKind::Int, _) => mismatch(errors, path, value, "integer"),
        (FieldKind::Bool, WireValue::Bool(b)) => Some(StateValue::Bool(*b)),
        (FieldKind::Bool, _) => mismatch(errors, path, value, "bool"),
        (FieldKind::StringList, WireValue::List(items)) => match strings(items) {
            Some(items) => Some(StateValue::List(items.collect())),
            None => mismatch(errors, path, value, "list of strings"),
        },
        (FieldKind::StringSet, WireValue::List(items)) => match strings(items) {
            Some(items) => Some(StateValue::Set(items.collect())),
            None => mismatch(errors, path, value, "list of strings"),
        },
        (FieldKind::StringList | FieldKind::StringSet, _) => {
            mismatch(errors, path, value, "list of strings")
        }
        (FieldKind::Block(children), WireValue::Map(map)) => Some(StateValue::Blocks(vec![
            flatten_block(children, map, &path.clone().index(0), errors),
        ])),
        (FieldKind::Block(_), _) => mismatch(errors, path, value, "map"),
        (FieldKind::Blocks(children), WireValue::List(items)) => {
            let blocks = items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let path = path.clone().index(i);
                    match item.as_map() {
                        Some(map) => flatten_block(children, map, &path, errors),
                        None => {
                            mismatch(errors, &path, item, "map");
                            StateBlock::new()
                        }
                    }
                })
                .collect();
            Some(StateValue::Blocks(blocks))
        }
        (FieldKind::Blocks(_), _) => mismatch(errors, path, value, "list of maps"),
    }
}

fn mismatch(
    errors: &mut Vec<FieldError>,
    path: &StatePath,
    value: &WireValue,
    expected: &'static str,
) -> Option<StateValue> {
    errors.push(FieldError {
        path: path.clone(),
        expected,
        found: value.kind(),
    });
    None
}

fn strings(items: &[WireValue]) -> Option<impl Iterator<Item = String> + '_> {
    if items.iter().all(|item| matches!(item, WireValue::Str(_))) {
        Some(items.iter().filter_map(|item| match item {
            WireValue::Str(s) => Some(s.clone()),
            _ => None,
        }))
    } else {
        None
    }
}
