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

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use tf_provider::value::{Value, ValueEmpty};
use tf_provider::{schema::Schema, AttributePath, Diagnostics, Resource};

use crate::client::CallContext;
use crate::codec::{expand, Planned, StateBlock, StatePath};
use crate::provider::{Session, SharedSession};
use crate::schema::{Key, ResourceSchema, ID};
use crate::utils::{DisplayJoinable, WithNormalize, WithSchema, WithValidate};

use super::identity::{object_id, object_key};
use super::read::{context, current_session, read_remote, remote_object, type_name};
use super::state::{
    from_block, reconcile, string_of, to_block, unknown_computed, Dynamic, ResourceState,
    StateObject,
};

/// Terraform resource managing objects of one FortiManager object type.
#[derive(Debug)]
pub struct FortiResource {
    pub(super) schema: ResourceSchema,
    pub(super) session: SharedSession,
}

impl FortiResource {
    pub fn new(schema: ResourceSchema, session: SharedSession) -> Self {
        Self { schema, session }
    }

    fn type_name(&self) -> String {
        type_name(&self.schema)
    }

    pub(crate) async fn create_object<'a>(
        &self,
        diags: &mut Diagnostics,
        session: &Session,
        planned: &StateObject<'a>,
    ) -> Result<StateObject<'a>> {
        let ctx = context(&self.schema, session, planned)?;
        let fields = &self.schema.fields;

        let block = to_block(fields, planned);
        let body = expand(fields, &Planned::create(&block), &StatePath::root());

        let key = match self.schema.key {
            // There is always exactly one such object, creating it means configuring it
            Key::Singleton(_) => {
                session
                    .client
                    .update(&ctx, self.schema.url, None, body)
                    .await?;
                None
            }
            Key::Field(name) => {
                let response = session.client.create(&ctx, self.schema.url, body).await?;
                let key = string_of(planned, name)
                    .or_else(|| {
                        let field = self.schema.key_field()?;
                        response.get(field.wire_key().as_ref())?.as_key()
                    })
                    .ok_or_else(|| anyhow!("the new object has no `{name}`"))?;
                Some(key)
            }
        };
        tracing::info!(resource = %self.type_name(), key = ?key, "object created");

        self.refresh(diags, session, &ctx, planned, key).await
    }

    pub(crate) async fn update_object<'a>(
        &self,
        diags: &mut Diagnostics,
        session: &Session,
        prior: &StateObject<'a>,
        planned: &StateObject<'a>,
    ) -> Result<StateObject<'a>> {
        let ctx = context(&self.schema, session, planned)?;
        let fields = &self.schema.fields;

        let key = object_key(&self.schema, planned);
        if key.is_none() && !self.schema.is_singleton() {
            bail!("the object to update has no key");
        }

        let prior_block = to_block(fields, prior);
        let planned_block = to_block(fields, planned);
        let body = expand(
            fields,
            &Planned::update(&prior_block, &planned_block),
            &StatePath::root(),
        );
        session
            .client
            .update(&ctx, self.schema.url, key.as_deref(), body)
            .await?;
        tracing::info!(resource = %self.type_name(), key = ?key, "object updated");

        self.refresh(diags, session, &ctx, planned, key).await
    }

    /// Current state of the object, `None` if it does not exist anymore.
    pub(crate) async fn read_object<'a>(
        &self,
        diags: &mut Diagnostics,
        session: &Session,
        state: &StateObject<'a>,
    ) -> Result<Option<StateObject<'a>>> {
        let ctx = context(&self.schema, session, state)?;
        let key = object_key(&self.schema, state);
        if key.is_none() && !self.schema.is_singleton() {
            bail!("the object to read has no key");
        }

        let Some(block) = read_remote(diags, &self.schema, session, &ctx, key.as_deref()).await?
        else {
            return Ok(None);
        };
        Ok(Some(remote_object(&self.schema, &block, state, key.as_deref())))
    }

    pub(crate) async fn delete_object(
        &self,
        session: &Session,
        state: &StateObject<'_>,
    ) -> Result<()> {
        let ctx = context(&self.schema, session, state)?;
        let key = object_key(&self.schema, state);
        if key.is_none() && !self.schema.is_singleton() {
            bail!("the object to delete has no key");
        }

        session
            .client
            .delete(&ctx, self.schema.url, key.as_deref())
            .await?;
        tracing::info!(resource = %self.type_name(), key = ?key, "object deleted");
        Ok(())
    }

    /// Read back a written object and fill in what the plan left unknown.
    async fn refresh<'a>(
        &self,
        diags: &mut Diagnostics,
        session: &Session,
        ctx: &CallContext,
        planned: &StateObject<'a>,
        key: Option<String>,
    ) -> Result<StateObject<'a>> {
        let block = read_remote(diags, &self.schema, session, ctx, key.as_deref())
            .await?
            .ok_or_else(|| anyhow!("the object could not be read back after being written"))?;
        let remote = remote_object(&self.schema, &block, planned, key.as_deref());

        let mut state = planned.clone();
        reconcile(&self.schema.fields, &mut state, &remote);
        state.insert(
            Cow::Borrowed(ID),
            Value::Value(Dynamic::String(object_id(&self.schema, key.as_deref()))),
        );
        state.normalize(diags);

        Ok(state)
    }
}

#[async_trait]
impl Resource for FortiResource {
    type State<'a> = ResourceState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(self.schema.schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        if let Value::Value(config) = &config {
            config.validate(diags, &StatePath::root(), self.schema.fields.as_slice());
        }

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Value::Value(object) = &state else {
            return Some((state, private_state));
        };
        let session = current_session(&self.session, diags).await?;

        match self.read_object(diags, &session, object).await {
            Ok(Some(object)) => Some((Value::Value(object), private_state)),
            Ok(None) => {
                tracing::info!(
                    resource = %self.type_name(),
                    "object does not exist anymore, removing it from the state"
                );
                Some((Value::Null, private_state))
            }
            Err(err) => {
                diags.root_error(
                    format!("Failed to read {}", self.type_name()),
                    format!("{err:#}"),
                );
                None
            }
        }
    }

    async fn plan_create<'a>(
        &self,
        _diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state;
        if let Value::Value(object) = &mut state {
            let id = match self.schema.key {
                Key::Singleton(id) => Value::Value(Dynamic::from(id)),
                Key::Field(_) => Value::Unknown,
            };
            object.insert(Cow::Borrowed(ID), id);
            unknown_computed(&self.schema.fields, object, true);
        }

        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(
        Self::State<'a>,
        Self::PrivateState<'a>,
        Vec<AttributePath>,
    )> {
        let mut trigger_replace = Vec::new();
        let mut state = proposed_state;

        if let (Value::Value(prior), Value::Value(proposed)) = (&prior_state, &mut state) {
            for name in self.schema.identity_attributes() {
                if prior.get(name) != proposed.get(name) {
                    trigger_replace.push(AttributePath::new(name));
                }
            }
            if prior != proposed {
                unknown_computed(&self.schema.fields, proposed, false);
            }
        }

        Some((state, prior_private_state, trigger_replace))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        _prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        Some(())
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Value::Value(planned) = &planned_state else {
            diags.root_error("Failed to create resource", "The planned state is null");
            return None;
        };
        let session = current_session(&self.session, diags).await?;

        match self.create_object(diags, &session, planned).await {
            Ok(state) => Some((Value::Value(state), private_state)),
            Err(err) => {
                diags.root_error(
                    format!("Failed to create {}", self.type_name()),
                    format!("{err:#}"),
                );
                None
            }
        }
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let (Value::Value(prior), Value::Value(planned)) = (&prior_state, &planned_state) else {
            diags.root_error("Failed to update resource", "The prior or planned state is null");
            return None;
        };
        let session = current_session(&self.session, diags).await?;

        match self.update_object(diags, &session, prior, planned).await {
            Ok(state) => Some((Value::Value(state), private_state)),
            Err(err) => {
                diags.root_error(
                    format!("Failed to update {}", self.type_name()),
                    format!("{err:#}"),
                );
                None
            }
        }
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let Value::Value(object) = &state else {
            return Some(());
        };
        let session = current_session(&self.session, diags).await?;

        // A missing object is reported like any other failure
        if let Err(err) = self.delete_object(&session, object).await {
            diags.root_error(
                format!("Failed to delete {}", self.type_name()),
                format!("{err:#}"),
            );
            return None;
        }
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let identity = self.schema.identity_attributes();
        let mut state: StateObject<'a> = from_block(&self.schema.fields, &StateBlock::new());
        for name in identity.iter().copied().chain([ID]) {
            state.entry(Cow::Borrowed(name)).or_insert(Value::Null);
        }

        let mut key = None;
        for part in id.split(',') {
            if part.is_empty() {
                continue;
            }
            let Some((name, value)) = part.split_once('=') else {
                key = Some(part.to_owned());
                continue;
            };
            match identity.iter().find(|attr| **attr == name) {
                Some(attr) => {
                    state.insert(Cow::Borrowed(*attr), Value::Value(Dynamic::from(value)));
                }
                None => diags.root_error(
                    format!("Unknown import attribute `{name}`"),
                    format!(
                        "Only {} can be given when importing {}",
                        identity.iter().join_with(", "),
                        self.type_name()
                    ),
                ),
            }
        }

        let key = match self.schema.key {
            Key::Singleton(_) => None,
            Key::Field(name) => {
                let key = key.or_else(|| string_of(&state, name));
                let Some(key) = key else {
                    diags.root_error(
                        format!("Failed to import {}", self.type_name()),
                        format!("The import id must contain the `{name}` of the object"),
                    );
                    return None;
                };
                state.insert(Cow::Borrowed(name), Value::Value(Dynamic::from(key.as_str())));
                Some(key)
            }
        };
        state.insert(
            Cow::Borrowed(ID),
            Value::Value(Dynamic::String(object_id(&self.schema, key.as_deref()))),
        );

        if !diags.errors.is_empty() {
            return None;
        }
        Some((Value::Value(state), Default::default()))
    }
}
