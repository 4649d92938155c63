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

use std::collections::{BTreeMap, BTreeSet};

use super::path::{Segment, StatePath};

pub type StateBlock = BTreeMap<String, StateValue>;

/// Value of a state attribute. A missing key in a [`StateBlock`] is a null attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValue {
    Str(String),
    Int(i64),
    Bool(bool),
    List(Vec<String>),
    Set(BTreeSet<String>),
    /// Elements of a nested block, singleton blocks hold at most one
    Blocks(Vec<StateBlock>),
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        StateValue::Str(value.to_owned())
    }
}

impl From<i64> for StateValue {
    fn from(value: i64) -> Self {
        StateValue::Int(value)
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        StateValue::Bool(value)
    }
}

/// Read access to the configuration state, addressed by path.
pub trait StateReader {
    fn get(&self, path: &StatePath) -> Option<&StateValue>;

    /// Whether the attribute at `path` has a value, or differs from what it was.
    fn is_set_or_changed(&self, path: &StatePath) -> bool;

    fn len(&self, path: &StatePath) -> usize {
        match self.get(path) {
            Some(StateValue::Blocks(blocks)) => blocks.len(),
            _ => 0,
        }
    }
}

/// Look up a path inside a block tree.
pub fn lookup<'a>(root: &'a StateBlock, path: &StatePath) -> Option<&'a StateValue> {
    let mut segments = path.segments().iter();
    let Some(Segment::Field(name)) = segments.next() else {
        return None;
    };
    let mut current = root.get(name)?;

    while let Some(segment) = segments.next() {
        let Segment::Index(i) = segment else {
            return None;
        };
        let StateValue::Blocks(blocks) = current else {
            return None;
        };
        let block = blocks.get(*i)?;
        let Some(Segment::Field(name)) = segments.next() else {
            return None;
        };
        current = block.get(name)?;
    }

    Some(current)
}

/// State about to be applied, compared against the state it replaces.
///
/// Without a prior state (creation), only the presence of a value counts.
#[derive(Debug, Clone, Copy)]
pub struct Planned<'a> {
    planned: &'a StateBlock,
    prior: Option<&'a StateBlock>,
}

impl<'a> Planned<'a> {
    pub fn create(planned: &'a StateBlock) -> Self {
        Self {
            planned,
            prior: None,
        }
    }

    pub fn update(prior: &'a StateBlock, planned: &'a StateBlock) -> Self {
        Self {
            planned,
            prior: Some(prior),
        }
    }
}

impl StateReader for Planned<'_> {
    fn get(&self, path: &StatePath) -> Option<&StateValue> {
        lookup(self.planned, path)
    }

    fn is_set_or_changed(&self, path: &StatePath) -> bool {
        let planned = configured(lookup(self.planned, path));
        planned.is_some()
            || self
                .prior
                .is_some_and(|prior| configured(lookup(prior, path)) != planned)
    }
}

/// An empty block list is what Terraform holds for blocks the configuration never wrote.
fn configured(value: Option<&StateValue>) -> Option<&StateValue> {
    match value {
        Some(StateValue::Blocks(blocks)) if blocks.is_empty() => None,
        value => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ports() -> StateBlock {
        let port1 = StateBlock::from([
            ("port_name".to_owned(), StateValue::from("port1")),
            ("poe_status".to_owned(), StateValue::from("enable")),
        ]);
        let port2 = StateBlock::from([("port_name".to_owned(), StateValue::from("port2"))]);
        StateBlock::from([
            ("switch_id".to_owned(), StateValue::from("SW1")),
            ("ports".to_owned(), StateValue::Blocks(vec![port1, port2])),
        ])
    }

    #[test]
    fn lookup_nested() {
        let state = ports();
        assert_eq!(
            lookup(&state, &StatePath::parse("ports.0.poe_status")),
            Some(&StateValue::from("enable"))
        );
        assert_eq!(lookup(&state, &StatePath::parse("ports.1.poe_status")), None);
        assert_eq!(lookup(&state, &StatePath::parse("ports.2.port_name")), None);
        assert_eq!(lookup(&state, &StatePath::parse("switch_id.0.x")), None);
        assert_eq!(
            lookup(&state, &StatePath::parse("switch_id")),
            Some(&StateValue::from("SW1"))
        );
    }

    #[test]
    fn creation_only_sees_values() {
        let state = ports();
        let reader = Planned::create(&state);
        assert!(reader.is_set_or_changed(&StatePath::parse("ports.0.poe_status")));
        assert!(!reader.is_set_or_changed(&StatePath::parse("ports.1.poe_status")));
        assert_eq!(reader.len(&StatePath::parse("ports")), 2);
    }

    #[test]
    fn update_sees_cleared_values() {
        let prior = ports();
        let mut planned = ports();
        planned.remove("switch_id");

        let reader = Planned::update(&prior, &planned);
        assert!(reader.is_set_or_changed(&StatePath::parse("switch_id")));
        assert!(reader.get(&StatePath::parse("switch_id")).is_none());
        assert!(!reader.is_set_or_changed(&StatePath::parse("ports.1.poe_status")));
    }
}
