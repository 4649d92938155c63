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

use std::fmt;

use tf_provider::AttributePath;

use crate::utils::DisplayJoinable;

/// One step of a state path: a named attribute or a position inside a block list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Field(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => f.write_str(name),
            Segment::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Dotted address of an attribute inside the resource state, eg: `ports.3.poe_status`.
///
/// Singleton blocks are addressed through index `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StatePath {
    segments: Vec<Segment>,
}

impl StatePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.segments.push(Segment::Field(name.into()));
        self
    }

    pub fn index(mut self, i: usize) -> Self {
        self.segments.push(Segment::Index(i));
        self
    }

    /// Parse the dotted form. Purely numeric segments are list indices.
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|s| match s.parse::<usize>() {
                Ok(i) => Segment::Index(i),
                Err(_) => Segment::Field(s.to_owned()),
            })
            .collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Terraform attribute path pointing at the same attribute, for diagnostics.
    pub fn to_attribute_path(&self) -> AttributePath {
        let mut segments = self.segments.iter();
        let mut attr_path = match segments.next() {
            Some(Segment::Field(name)) => AttributePath::new(name.clone()),
            Some(Segment::Index(i)) => AttributePath::default().index(*i as i64),
            None => return AttributePath::default(),
        };
        for segment in segments {
            attr_path = match segment {
                Segment::Field(name) => attr_path.attribute(name.clone()),
                Segment::Index(i) => attr_path.index(*i as i64),
            };
        }
        attr_path
    }
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.iter().join_with("."))
    }
}

/// Remote API name of a state attribute.
pub fn wire_key(name: &str) -> String {
    name.replace('_', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_display() {
        let path = StatePath::root().field("ports").index(3).field("poe_status");
        assert_eq!(path.to_string(), "ports.3.poe_status");
        assert_eq!(StatePath::root().to_string(), "");
    }

    #[test]
    fn parse_indices() {
        let path = StatePath::parse("ports.3.poe_status");
        assert_eq!(
            path.segments(),
            &[
                Segment::Field("ports".into()),
                Segment::Index(3),
                Segment::Field("poe_status".into()),
            ]
        );
        assert_eq!(path, StatePath::root().field("ports").index(3).field("poe_status"));
        assert!(StatePath::parse("").segments().is_empty());
    }

    #[test]
    fn wire_names_use_hyphens() {
        assert_eq!(wire_key("poe_status"), "poe-status");
        assert_eq!(wire_key("switch_id"), "switch-id");
        assert_eq!(wire_key("name"), "name");
    }
}
