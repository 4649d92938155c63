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

use tf_provider::{value::Value, Diagnostics};

use crate::utils::WithNormalize;

use super::state::{Dynamic, StateObject, ValueDynamic};

impl WithNormalize for ValueDynamic {
    fn normalize(&mut self, diags: &mut Diagnostics) {
        match self {
            Value::Unknown => *self = Value::Null,
            Value::Value(Dynamic::List(items)) => {
                for item in items {
                    item.normalize(diags);
                }
            }
            Value::Value(Dynamic::Object(object)) => {
                for value in object.values_mut() {
                    value.normalize(diags);
                }
            }
            _ => (),
        }
    }
}

impl<'a> WithNormalize for StateObject<'a> {
    fn normalize(&mut self, diags: &mut Diagnostics) {
        for value in self.values_mut() {
            value.normalize(diags);
        }
    }
}
