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

use anyhow::Result;
use tf_provider::{value::Value, Diagnostics};

use crate::client::CallContext;
use crate::codec::{flatten, StateBlock, StatePath};
use crate::provider::{Session, SharedSession};
use crate::schema::{ResourceSchema, ID};

use super::identity::{object_id, routing_params};
use super::state::{from_block, Dynamic, StateObject};

pub(super) fn type_name(schema: &ResourceSchema) -> String {
    format!("fortimanager_{}", schema.type_name)
}

pub(super) async fn current_session(shared: &SharedSession, diags: &mut Diagnostics) -> Option<Session> {
    let session = shared.read().await.clone();
    if session.is_none() {
        diags.root_error(
            "Provider is not configured",
            "The FortiManager provider must be configured before its resources can be used.",
        );
    }
    session
}

pub(super) fn context(
    schema: &ResourceSchema,
    session: &Session,
    object: &StateObject<'_>,
) -> Result<CallContext> {
    Ok(CallContext {
        params: routing_params(schema, object, session.device_name.as_deref())?,
        retries: session.retries,
    })
}

/// Fetch the object and decode it. Fields that fail to decode are reported and left out.
pub(super) async fn read_remote(
    diags: &mut Diagnostics,
    schema: &ResourceSchema,
    session: &Session,
    ctx: &CallContext,
    key: Option<&str>,
) -> Result<Option<StateBlock>> {
    let Some(wire) = session.client.read(ctx, schema.url, key).await? else {
        return Ok(None);
    };

    let (block, errors) = flatten(&schema.fields, &wire, &StatePath::root());
    for err in errors {
        diags.error(
            format!("Failed to decode {}", type_name(schema)),
            err.to_string(),
            err.path.to_attribute_path(),
        );
    }
    Ok(Some(block))
}

/// Terraform object for a decoded remote object.
///
/// Routing attributes are not part of the remote object and come from `prior`, as do
/// sensitive fields which the remote only returns masked.
pub(super) fn remote_object<'a>(
    schema: &ResourceSchema,
    block: &StateBlock,
    prior: &StateObject<'a>,
    key: Option<&str>,
) -> StateObject<'a> {
    let mut object: StateObject<'a> = from_block(&schema.fields, block);

    for name in schema.identity_attributes() {
        if schema.field(name).is_none() {
            object.insert(
                Cow::Borrowed(name),
                prior.get(name).cloned().unwrap_or(Value::Null),
            );
        }
    }
    if let (Some(field), Some(key)) = (schema.key_field(), key) {
        let value = object.entry(Cow::Borrowed(field.name)).or_insert(Value::Null);
        if value.is_null() {
            *value = Value::Value(Dynamic::from(key));
        }
    }
    for field in schema.fields.iter().filter(|field| field.sensitive) {
        match prior.get(field.name) {
            Some(value) if !value.is_unknown() => {
                object.insert(Cow::Borrowed(field.name), value.clone());
            }
            _ => (),
        }
    }
    object.insert(
        Cow::Borrowed(ID),
        Value::Value(Dynamic::String(object_id(schema, key))),
    );

    object
}
