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

use std::borrow::Borrow;
use std::collections::BTreeMap;

use tf_provider::{value::Value, Diagnostics};

use crate::codec::StatePath;
use crate::schema::{Field, FieldKind};
use crate::utils::WithValidate;

use super::state::{Dynamic, StateObject, ValueDynamic};

impl<'a> WithValidate<[Field]> for StateObject<'a> {
    fn validate(&self, diags: &mut Diagnostics, path: &StatePath, fields: &[Field]) {
        validate_object(diags, path, fields, self);
    }
}

fn validate_object<K: Borrow<str> + Ord>(
    diags: &mut Diagnostics,
    path: &StatePath,
    fields: &[Field],
    object: &BTreeMap<K, ValueDynamic>,
) {
    for field in fields {
        let Some(children) = field.children() else {
            continue;
        };
        let Some(Value::Value(Dynamic::List(items))) = object.get(field.name) else {
            continue;
        };
        let field_path = path.clone().field(field.name);

        if matches!(field.kind, FieldKind::Block(_)) && items.len() > 1 {
            diags.error(
                format!("Too many `{}` blocks", field.name),
                format!(
                    "At most one `{}` block is allowed, {} were given.",
                    field.name,
                    items.len()
                ),
                field_path.to_attribute_path(),
            );
        }

        for (i, item) in items.iter().enumerate() {
            if let Value::Value(Dynamic::Object(inner)) = item {
                validate_object(diags, &field_path.clone().index(i), children, inner);
            }
        }
    }
}
