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

use crate::schema::{Field, FieldKind};

use super::path::StatePath;
use super::state::{StateReader, StateValue};
use super::wire::{WireMap, WireValue};

/// Build the request body for the fields under `prefix`.
///
/// Only attributes the reader reports as set or changed are emitted. Computed-only
/// fields are never sent.
pub fn expand<R: StateReader + ?Sized>(fields: &[Field], reader: &R, prefix: &StatePath) -> WireMap {
    fields
        .iter()
        .filter(|field| field.mode.settable())
        .filter_map(|field| {
            let path = prefix.clone().field(field.name);
            let value = expand_field(field, reader, &path)?;
            Some((field.wire_key().into_owned(), value))
        })
        .collect()
}

fn expand_field<R: StateReader + ?Sized>(
    field: &Field,
    reader: &R,
    path: &StatePath,
) -> Option<WireValue> {
    if !reader.is_set_or_changed(path) {
        return None;
    }
    let value = reader.get(path);

    match &field.kind {
        FieldKind::String | FieldKind::Int | FieldKind::Bool => {
            Some(value.map_or_else(|| zero(&field.kind), expand_scalar))
        }
        FieldKind::StringList | FieldKind::StringSet => Some(match value {
            Some(value) => expand_scalar(value),
            None => WireValue::List(Vec::new()),
        }),
        FieldKind::Block(children) => {
            if reader.len(path) == 0 {
                return None;
            }
            let inner = expand(children, reader, &path.clone().index(0));
            if inner.is_empty() {
                None
            } else {
                Some(WireValue::Map(inner))
            }
        }
        FieldKind::Blocks(children) => {
            let elements = (0..reader.len(path))
                .map(|i| WireValue::Map(expand(children, reader, &path.clone().index(i))))
                .collect();
            Some(WireValue::List(elements))
        }
    }
}

/// Value sent to reset an attribute that was removed from the configuration.
fn zero(kind: &FieldKind) -> WireValue {
    match kind {
        FieldKind::String => WireValue::Str(String::new()),
        FieldKind::Int => WireValue::Int(0),
        FieldKind::Bool => WireValue::Bool(false),
        FieldKind::StringList
        | FieldKind::StringSet
        | FieldKind::Block(_)
        | FieldKind::Blocks(_) => WireValue::List(Vec::new()),
    }
}

fn expand_scalar(value: &StateValue) -> WireValue {
    match value {
        StateValue::Str(s) => WireValue::Str(s.clone()),
        StateValue::Int(i) => WireValue::Int(*i),
        StateValue::Bool(b) => WireValue::Bool(*b),
        StateValue::List(items) => items.iter().map(|s| WireValue::from(s.as_str())).collect(),
        // BTreeSet iteration gives a stable order
        StateValue::Set(items) => items.iter().map(|s| WireValue::from(s.as_str())).collect(),
        StateValue::Blocks(_) => WireValue::List(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashSet};

    use serde_json::json;

    use super::*;
    use crate::codec::state::{lookup, Planned, StateBlock};
    use crate::schema::registry;

    fn port_fields() -> Vec<Field> {
        vec![
            Field::string("switch_id").required(),
            Field::string("description"),
            Field::int("max_poe_budget"),
            Field::string("serial").computed(),
            Field::block(
                "snmp",
                vec![Field::string("community"), Field::bool("trap")],
            ),
            Field::blocks(
                "ports",
                vec![
                    Field::string("port_name"),
                    Field::string("poe_status"),
                    Field::string_set("allowed_vlans"),
                ],
            ),
        ]
    }

    fn to_json(map: WireMap) -> serde_json::Value {
        serde_json::to_value(WireValue::Map(map)).unwrap()
    }

    fn block(entries: Vec<(&str, StateValue)>) -> StateBlock {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect()
    }

    /// Reader reporting only an explicit list of paths as changed.
    struct Marked<'a> {
        state: &'a StateBlock,
        changed: HashSet<String>,
    }

    impl StateReader for Marked<'_> {
        fn get(&self, path: &StatePath) -> Option<&StateValue> {
            lookup(self.state, path)
        }

        fn is_set_or_changed(&self, path: &StatePath) -> bool {
            let path = path.to_string();
            self.changed
                .iter()
                .any(|changed| *changed == path || changed.starts_with(&format!("{path}.")))
        }
    }

    #[test]
    fn repeated_block_keeps_length_and_order() {
        let state = block(vec![
            ("switch_id", "SW1".into()),
            (
                "ports",
                StateValue::Blocks(vec![
                    block(vec![
                        ("port_name", "port1".into()),
                        ("poe_status", "enable".into()),
                    ]),
                    block(vec![("port_name", "port2".into())]),
                    block(vec![]),
                ]),
            ),
        ]);

        let body = expand(&port_fields(), &Planned::create(&state), &StatePath::root());
        assert_eq!(
            to_json(body),
            json!({
                "switch-id": "SW1",
                "ports": [
                    {"port-name": "port1", "poe-status": "enable"},
                    {"port-name": "port2"},
                    {},
                ],
            })
        );
    }

    #[test]
    fn absent_singleton_is_omitted() {
        let state = block(vec![
            ("switch_id", "SW1".into()),
            ("snmp", StateValue::Blocks(vec![])),
        ]);
        let body = expand(&port_fields(), &Planned::create(&state), &StatePath::root());
        assert!(!body.contains_key("snmp"));

        // present but without any value
        let state = block(vec![("snmp", StateValue::Blocks(vec![block(vec![])]))]);
        let body = expand(&port_fields(), &Planned::create(&state), &StatePath::root());
        assert!(!body.contains_key("snmp"));

        let state = block(vec![(
            "snmp",
            StateValue::Blocks(vec![block(vec![("trap", true.into())])]),
        )]);
        let body = expand(&port_fields(), &Planned::create(&state), &StatePath::root());
        assert_eq!(to_json(body), json!({"snmp": {"trap": true}}));
    }

    #[test]
    fn sets_are_sent_sorted() {
        let vlans: BTreeSet<String> = ["vlan30", "vlan10", "vlan20"]
            .into_iter()
            .map(String::from)
            .collect();
        let state = block(vec![(
            "ports",
            StateValue::Blocks(vec![block(vec![("allowed_vlans", StateValue::Set(vlans))])]),
        )]);

        let body = expand(&port_fields(), &Planned::create(&state), &StatePath::root());
        assert_eq!(
            to_json(body),
            json!({"ports": [{"allowed-vlans": ["vlan10", "vlan20", "vlan30"]}]})
        );
    }

    #[test]
    fn computed_fields_are_not_sent() {
        let state = block(vec![("serial", "S248EP000000".into())]);
        let body = expand(&port_fields(), &Planned::create(&state), &StatePath::root());
        assert!(body.is_empty());
    }

    #[test]
    fn partial_update_only_sends_changed() {
        let state = block(vec![
            ("switch_id", "SW1".into()),
            ("description", "core".into()),
            ("max_poe_budget", 120.into()),
        ]);
        let reader = Marked {
            state: &state,
            changed: HashSet::from(["description".to_owned()]),
        };

        let body = expand(&port_fields(), &reader, &StatePath::root());
        assert_eq!(to_json(body), json!({"description": "core"}));
    }

    #[test]
    fn partial_update_keeps_ancestor_block() {
        let state = block(vec![
            ("switch_id", "SW1".into()),
            (
                "snmp",
                StateValue::Blocks(vec![block(vec![
                    ("community", "public".into()),
                    ("trap", true.into()),
                ])]),
            ),
        ]);
        let reader = Marked {
            state: &state,
            changed: HashSet::from(["snmp.0.trap".to_owned()]),
        };

        let body = expand(&port_fields(), &reader, &StatePath::root());
        assert_eq!(to_json(body), json!({"snmp": {"trap": true}}));
    }

    #[test]
    fn cleared_values_are_reset() {
        let prior = block(vec![
            ("description", "core".into()),
            ("max_poe_budget", 120.into()),
            (
                "ports",
                StateValue::Blocks(vec![block(vec![("port_name", "port1".into())])]),
            ),
            (
                "snmp",
                StateValue::Blocks(vec![block(vec![("trap", true.into())])]),
            ),
        ]);
        let planned = block(vec![("description", "core".into())]);

        let body = expand(
            &port_fields(),
            &Planned::update(&prior, &planned),
            &StatePath::root(),
        );
        assert_eq!(
            to_json(body),
            json!({"description": "core", "max-poe-budget": 0, "ports": []})
        );
    }

    #[test]
    fn unconfigured_blocks_are_not_sent() {
        let state = block(vec![
            ("switch_id", "SW1".into()),
            ("ports", StateValue::Blocks(vec![])),
            ("mirror", StateValue::Blocks(vec![])),
            ("static_mac", StateValue::Blocks(vec![])),
            ("snmp_sysinfo", StateValue::Blocks(vec![])),
        ]);
        let fields = registry::managed_switch().fields;

        let body = expand(&fields, &Planned::create(&state), &StatePath::root());
        assert_eq!(to_json(body), json!({"switch-id": "SW1"}));

        // still empty on update
        let body = expand(&fields, &Planned::update(&state, &state), &StatePath::root());
        assert!(!body.contains_key("ports"));
        assert!(!body.contains_key("static-mac"));
    }

    #[test]
    fn emptied_blocks_are_cleared() {
        let prior = block(vec![(
            "ports",
            StateValue::Blocks(vec![block(vec![("port_name", "port1".into())])]),
        )]);
        let planned = block(vec![("ports", StateValue::Blocks(vec![]))]);

        let body = expand(
            &port_fields(),
            &Planned::update(&prior, &planned),
            &StatePath::root(),
        );
        assert_eq!(to_json(body), json!({"ports": []}));
    }
}
