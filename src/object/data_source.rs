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

use async_trait::async_trait;

use tf_provider::{value::Value, DataSource, Diagnostics, Schema, ValueEmpty};

use crate::codec::StatePath;
use crate::provider::SharedSession;
use crate::schema::ResourceSchema;
use crate::utils::{WithNormalize, WithSchema, WithValidate};

use super::identity::object_key;
use super::read::{context, current_session, read_remote, remote_object, type_name};
use super::state::ResourceState;

/// Read-only view of an existing object, looked up by its key.
#[derive(Debug)]
pub struct FortiDataSource {
    pub(super) schema: ResourceSchema,
    pub(super) session: SharedSession,
}

impl FortiDataSource {
    pub fn new(schema: &ResourceSchema, session: SharedSession) -> Self {
        Self {
            schema: schema.data_source(),
            session,
        }
    }
}

#[async_trait]
impl DataSource for FortiDataSource {
    type State<'a> = ResourceState<'a>;
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
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let Value::Value(config) = &config else {
            diags.root_error("Failed to read data source", "The configuration is null");
            return None;
        };
        let session = current_session(&self.session, diags).await?;
        let type_name = type_name(&self.schema);

        let key = object_key(&self.schema, config);
        let found = match context(&self.schema, &session, config) {
            Ok(ctx) => read_remote(diags, &self.schema, &session, &ctx, key.as_deref()).await,
            Err(err) => Err(err),
        };

        match found {
            Ok(Some(block)) => {
                let mut state = remote_object(&self.schema, &block, config, key.as_deref());
                state.normalize(diags);
                Some(Value::Value(state))
            }
            Ok(None) => {
                diags.root_error(
                    format!("Failed to read {type_name}"),
                    format!(
                        "The object `{}` does not exist",
                        key.as_deref().unwrap_or(self.schema.type_name)
                    ),
                );
                None
            }
            Err(err) => {
                diags.root_error(format!("Failed to read {type_name}"), format!("{err:#}"));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::sync::Arc;

    use tf_provider::value::Value;

    use super::*;
    use crate::codec::{StateBlock, WireMap, WireValue};
    use crate::object::resource::tests::{session, MockClient};
    use crate::object::state::{from_block, Dynamic, StateObject};
    use crate::schema::registry;

    fn config(name: &str) -> StateObject<'static> {
        let schema = registry::firewall_address().data_source();
        let mut object: StateObject = from_block(&schema.fields, &StateBlock::new());
        object.insert(Cow::Borrowed("name"), Value::Value(Dynamic::from(name)));
        object.insert(Cow::Borrowed("device_name"), Value::Null);
        object.insert(Cow::Borrowed("device_vdom"), Value::Value(Dynamic::from("root")));
        object.insert(Cow::Borrowed("id"), Value::Unknown);
        object
    }

    #[tokio::test]
    async fn read_existing() {
        let client = Arc::new(MockClient::default());
        client.objects.lock().unwrap().insert(
            "lan".to_owned(),
            WireMap::from([
                ("name".to_owned(), WireValue::from("lan")),
                ("comment".to_owned(), WireValue::from("office")),
                ("color".to_owned(), WireValue::from(5)),
            ]),
        );
        let data_source = FortiDataSource::new(&registry::firewall_address(), session(client));
        let mut diags = Diagnostics::default();

        let state = data_source
            .read(&mut diags, Value::Value(config("lan")), Default::default())
            .await
            .unwrap();
        let Value::Value(state) = state else { panic!("null state") };
        assert_eq!(state["comment"], Value::Value(Dynamic::from("office")));
        assert_eq!(state["color"], Value::Value(Dynamic::Number(5)));
        assert_eq!(state["uuid"], Value::Null);
        assert_eq!(state["id"], Value::Value(Dynamic::from("lan")));
    }

    #[tokio::test]
    async fn read_missing_is_an_error() {
        let data_source = FortiDataSource::new(
            &registry::firewall_address(),
            session(Arc::new(MockClient::default())),
        );
        let mut diags = Diagnostics::default();

        let state = data_source
            .read(&mut diags, Value::Value(config("gone")), Default::default())
            .await;
        assert!(state.is_none());
        assert_eq!(diags.errors.len(), 1);
    }
}
