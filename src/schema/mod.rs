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

use std::borrow::Cow;
use std::collections::HashMap;

use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, NestedBlock, Schema,
};

use crate::codec::wire_key;
use crate::utils::WithSchema;

pub mod registry;

pub const ID: &str = "id";
pub const DEVICE_NAME: &str = "device_name";
pub const DEVICE_VDOM: &str = "device_vdom";

/// Shape of the value held by a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Int,
    Bool,
    /// Ordered list of strings
    StringList,
    /// Unordered set of strings
    StringSet,
    /// Nested block with at most one element, addressed as `<name>.0.`
    Block(Vec<Field>),
    /// Repeated nested block, addressed as `<name>.<index>.`
    Blocks(Vec<Field>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Required,
    Optional,
    Computed,
    OptionalComputed,
}

impl Mode {
    /// Whether the user may give this field a value.
    pub fn settable(self) -> bool {
        !matches!(self, Mode::Computed)
    }
}

impl From<Mode> for AttributeConstraint {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Required => AttributeConstraint::Required,
            Mode::Optional => AttributeConstraint::Optional,
            Mode::Computed => AttributeConstraint::Computed,
            Mode::OptionalComputed => AttributeConstraint::OptionalComputed,
        }
    }
}

/// Declaration of one attribute of a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub wire_name: Option<&'static str>,
    pub kind: FieldKind,
    pub mode: Mode,
    pub sensitive: bool,
    pub description: &'static str,
}

impl Field {
    fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            wire_name: None,
            kind,
            mode: Mode::OptionalComputed,
            sensitive: false,
            description: "",
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn int(name: &'static str) -> Self {
        Self::new(name, FieldKind::Int)
    }

    pub fn bool(name: &'static str) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    pub fn string_list(name: &'static str) -> Self {
        Self::new(name, FieldKind::StringList)
    }

    pub fn string_set(name: &'static str) -> Self {
        Self::new(name, FieldKind::StringSet)
    }

    pub fn block(name: &'static str, fields: Vec<Field>) -> Self {
        Self::new(name, FieldKind::Block(fields)).optional()
    }

    pub fn blocks(name: &'static str, fields: Vec<Field>) -> Self {
        Self::new(name, FieldKind::Blocks(fields)).optional()
    }

    pub fn required(mut self) -> Self {
        self.mode = Mode::Required;
        self
    }

    pub fn optional(mut self) -> Self {
        self.mode = Mode::Optional;
        self
    }

    pub fn computed(mut self) -> Self {
        self.mode = Mode::Computed;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn wire(mut self, wire_name: &'static str) -> Self {
        self.wire_name = Some(wire_name);
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn wire_key(&self) -> Cow<'static, str> {
        match self.wire_name {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(wire_key(self.name)),
        }
    }

    /// Sub-fields of a nested block, if any.
    pub fn children(&self) -> Option<&[Field]> {
        match &self.kind {
            FieldKind::Block(fields) | FieldKind::Blocks(fields) => Some(fields),
            _ => None,
        }
    }

    fn make_computed(&mut self) {
        self.mode = Mode::Computed;
        if let FieldKind::Block(children) | FieldKind::Blocks(children) = &mut self.kind {
            children.iter_mut().for_each(Field::make_computed);
        }
    }

    fn attribute_type(&self) -> Option<AttributeType> {
        match self.kind {
            FieldKind::String => Some(AttributeType::String),
            FieldKind::Int => Some(AttributeType::Number),
            FieldKind::Bool => Some(AttributeType::Bool),
            FieldKind::StringList => Some(AttributeType::List(AttributeType::String.into())),
            FieldKind::StringSet => Some(AttributeType::Set(AttributeType::String.into())),
            FieldKind::Block(_) | FieldKind::Blocks(_) => None,
        }
    }
}

/// Object routing scope on the managed device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// `{device}` and `{vdom}`
    Vdom,
    /// `{device}` only
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Objects of this type are keyed by the value of this field
    Field(&'static str),
    /// Exactly one object per parent scope, tracked with this literal id
    Singleton(&'static str),
}

/// Declaration of a resource type: its location on the remote API and its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSchema {
    pub type_name: &'static str,
    pub description: &'static str,
    /// URL template of the object table, eg: `/pm/config/device/{device}/vdom/{vdom}/firewall/address`
    pub url: &'static str,
    pub scope: Scope,
    pub parents: &'static [&'static str],
    pub key: Key,
    pub fields: Vec<Field>,
}

impl ResourceSchema {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn key_field(&self) -> Option<&Field> {
        match self.key {
            Key::Field(name) => self.field(name),
            Key::Singleton(_) => None,
        }
    }

    /// Same type read-only: every field but the key is filled in by the remote.
    pub fn data_source(&self) -> ResourceSchema {
        let mut schema = self.clone();
        let key = self.key_field().map(|field| field.name);
        for field in &mut schema.fields {
            if Some(field.name) != key {
                field.make_computed();
            }
        }
        schema
    }

    pub fn is_singleton(&self) -> bool {
        matches!(self.key, Key::Singleton(_))
    }

    /// Attributes that locate the object on the remote side.
    ///
    /// Changing any of them means talking about another object.
    pub fn identity_attributes(&self) -> Vec<&'static str> {
        let mut attrs = vec![DEVICE_NAME];
        if self.scope == Scope::Vdom {
            attrs.push(DEVICE_VDOM);
        }
        attrs.extend(self.parents.iter().copied());
        if let Key::Field(name) = self.key {
            attrs.push(name);
        }
        attrs
    }

    fn routing_attributes(&self) -> HashMap<String, Attribute> {
        let mut attributes = HashMap::new();
        attributes.insert(
            ID.to_owned(),
            Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Identifier of the object"),
                constraint: AttributeConstraint::Computed,
                ..Default::default()
            },
        );
        attributes.insert(
            DEVICE_NAME.to_owned(),
            Attribute {
                attr_type: AttributeType::String,
                description: Description::plain(
                    "Managed device holding the object, defaults to the provider `device_name`",
                ),
                constraint: AttributeConstraint::Optional,
                ..Default::default()
            },
        );
        if self.scope == Scope::Vdom {
            attributes.insert(
                DEVICE_VDOM.to_owned(),
                Attribute {
                    attr_type: AttributeType::String,
                    description: Description::plain("Virtual domain holding the object"),
                    constraint: AttributeConstraint::Required,
                    ..Default::default()
                },
            );
        }
        for parent in self.parents {
            attributes.insert(
                parent.to_string(),
                Attribute {
                    attr_type: AttributeType::String,
                    description: Description::plain(&format!("Key of the parent `{parent}`")),
                    constraint: AttributeConstraint::Required,
                    ..Default::default()
                },
            );
        }
        attributes
    }
}

fn block_of(description: &str, fields: &[Field]) -> Block {
    let attributes = fields
        .iter()
        .filter_map(|field| {
            Some((
                field.name.to_owned(),
                Attribute {
                    attr_type: field.attribute_type()?,
                    description: Description::plain(field.description),
                    constraint: field.mode.into(),
                    sensitive: field.sensitive,
                    ..Default::default()
                },
            ))
        })
        .collect();
    let blocks = fields
        .iter()
        .filter_map(|field| {
            Some((
                field.name.to_owned(),
                NestedBlock::List(block_of(field.description, field.children()?)),
            ))
        })
        .collect();

    Block {
        version: 1,
        description: Description::plain(description),
        attributes,
        blocks,
        ..Default::default()
    }
}

impl WithSchema for ResourceSchema {
    fn schema(&self) -> Schema {
        let mut block = block_of(self.description, &self.fields);
        for (name, attribute) in self.routing_attributes() {
            block.attributes.entry(name).or_insert(attribute);
        }
        Schema { version: 1, block }
    }
}
