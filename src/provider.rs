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

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType};
use tf_provider::value::{Value, ValueBool, ValueNumber, ValueString};
use tf_provider::{AttributePath, Block, Description, Diagnostics, Provider, Schema, ValueEmpty};

use crate::client::jsonrpc::{Credentials, JsonRpcClient};
use crate::client::FortiClient;
use crate::object::{FortiDataSource, FortiResource};
use crate::schema::registry;

const ENV_HOSTNAME: &str = "FORTIMANAGER_ACCESS_HOSTNAME";
const ENV_USERNAME: &str = "FORTIMANAGER_ACCESS_USERNAME";
const ENV_PASSWORD: &str = "FORTIMANAGER_ACCESS_PASSWORD";
const ENV_TOKEN: &str = "FORTIMANAGER_ACCESS_TOKEN";
const ENV_INSECURE: &str = "FORTIMANAGER_INSECURE";
const ENV_RETRIES: &str = "FORTIMANAGER_RETRIES";
const ENV_DEVICE_NAME: &str = "FORTIMANAGER_DEVICE_NAME";

const DEFAULT_RETRIES: u32 = 1;

/// Connection to the FortiManager shared by every resource of the provider.
#[derive(Debug, Clone)]
pub struct Session {
    pub client: Arc<dyn FortiClient>,
    pub retries: u32,
    /// Device used by objects that do not name one
    pub device_name: Option<String>,
}

/// Filled in by `configure`, resources are created before the provider is configured.
pub type SharedSession = Arc<RwLock<Option<Session>>>;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig<'a> {
    #[serde(borrow = "'a")]
    pub hostname: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub username: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub password: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub token: ValueString<'a>,
    pub insecure: ValueBool,
    pub retries: ValueNumber,
    #[serde(borrow = "'a")]
    pub device_name: ValueString<'a>,
}

/// Settings of the provider once the environment has been taken into account.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    hostname: String,
    credentials: Credentials,
    insecure: bool,
    retries: u32,
    device_name: Option<String>,
}

fn string_or_env(value: &ValueString<'_>, env: &str) -> Option<String> {
    match value {
        Value::Value(value) if !value.is_empty() => Some(value.to_string()),
        _ => std::env::var(env).ok().filter(|value| !value.is_empty()),
    }
}

impl ProviderConfig<'_> {
    fn settings(&self, diags: &mut Diagnostics) -> Option<Settings> {
        let hostname = string_or_env(&self.hostname, ENV_HOSTNAME);
        let username = string_or_env(&self.username, ENV_USERNAME);
        let password = string_or_env(&self.password, ENV_PASSWORD);
        let token = string_or_env(&self.token, ENV_TOKEN);

        let insecure = match self.insecure {
            Value::Value(insecure) => insecure,
            _ => std::env::var(ENV_INSECURE)
                .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "True"))
                .unwrap_or(false),
        };

        let retries = match self.retries {
            Value::Value(retries) => u32::try_from(retries).ok(),
            _ => match std::env::var(ENV_RETRIES) {
                Ok(value) => value.parse().ok(),
                Err(_) => Some(DEFAULT_RETRIES),
            },
        };
        let Some(retries) = retries else {
            diags.error(
                "Invalid retries",
                "`retries` must be a non negative integer",
                AttributePath::new("retries"),
            );
            return None;
        };

        let Some(hostname) = hostname else {
            diags.root_error(
                "Missing FortiManager hostname",
                format!("Set the `hostname` attribute or the {ENV_HOSTNAME} environment variable."),
            );
            return None;
        };

        let credentials = match (token, username, password) {
            (Some(token), _, _) => Credentials::Token(token),
            (None, Some(username), Some(password)) => Credentials::Login { username, password },
            _ => {
                diags.root_error(
                    "Missing FortiManager credentials",
                    format!(
                        "Either `token` ({ENV_TOKEN}) or both `username` ({ENV_USERNAME}) and `password` ({ENV_PASSWORD}) must be set."
                    ),
                );
                return None;
            }
        };

        Some(Settings {
            hostname,
            credentials,
            insecure,
            retries,
            device_name: string_or_env(&self.device_name, ENV_DEVICE_NAME),
        })
    }
}

fn attribute(attr_type: AttributeType, description: &str, sensitive: bool) -> Attribute {
    Attribute {
        attr_type,
        description: Description::plain(description),
        constraint: AttributeConstraint::Optional,
        sensitive,
        ..Default::default()
    }
}

#[derive(Debug, Default, Clone)]
pub struct FortiProvider {
    session: SharedSession,
}

#[async_trait]
impl Provider for FortiProvider {
    type Config<'a> = ProviderConfig<'a>;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(Schema {
            version: 1,
            block: Block {
                description: Description::plain("Manage FortiGate configuration through FortiManager"),
                attributes: HashMap::from([
                    (
                        "hostname".to_owned(),
                        attribute(
                            AttributeType::String,
                            &format!("FortiManager address, defaults to {ENV_HOSTNAME}"),
                            false,
                        ),
                    ),
                    (
                        "username".to_owned(),
                        attribute(
                            AttributeType::String,
                            &format!("Login user, defaults to {ENV_USERNAME}"),
                            false,
                        ),
                    ),
                    (
                        "password".to_owned(),
                        attribute(
                            AttributeType::String,
                            &format!("Login password, defaults to {ENV_PASSWORD}"),
                            true,
                        ),
                    ),
                    (
                        "token".to_owned(),
                        attribute(
                            AttributeType::String,
                            &format!("API token used instead of a login, defaults to {ENV_TOKEN}"),
                            true,
                        ),
                    ),
                    (
                        "insecure".to_owned(),
                        attribute(
                            AttributeType::Bool,
                            &format!("Skip TLS certificate verification, defaults to {ENV_INSECURE}"),
                            false,
                        ),
                    ),
                    (
                        "retries".to_owned(),
                        attribute(
                            AttributeType::Number,
                            &format!(
                                "Number of times a request failing at the transport level is sent again, defaults to {ENV_RETRIES} or {DEFAULT_RETRIES}"
                            ),
                            false,
                        ),
                    ),
                    (
                        "device_name".to_owned(),
                        attribute(
                            AttributeType::String,
                            &format!(
                                "Device used by objects without `device_name`, defaults to {ENV_DEVICE_NAME}"
                            ),
                            false,
                        ),
                    ),
                ]),
                ..Default::default()
            },
        })
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::Config<'a>) -> Option<()> {
        if let Value::Value(retries) = config.retries {
            if retries < 0 {
                diags.error(
                    "Invalid retries",
                    "`retries` must be a non negative integer",
                    AttributePath::new("retries"),
                );
                return None;
            }
        }
        Some(())
    }

    async fn configure<'a>(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        let settings = config.settings(diags)?;

        let client = match JsonRpcClient::new(
            &settings.hostname,
            settings.credentials,
            settings.insecure,
        ) {
            Ok(client) => client,
            Err(err) => {
                diags.root_error("Failed to create the FortiManager client", err.to_string());
                return None;
            }
        };
        tracing::info!(
            hostname = %settings.hostname,
            terraform_version = %terraform_version,
            retries = settings.retries,
            "provider configured"
        );

        *self.session.write().await = Some(Session {
            client: Arc::new(client),
            retries: settings.retries,
            device_name: settings.device_name,
        });
        Some(())
    }

    fn get_resources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn tf_provider::resource::DynamicResource>>> {
        Some(
            registry::all()
                .into_iter()
                .map(|schema| {
                    let resource: Box<dyn tf_provider::resource::DynamicResource> =
                        Box::new(FortiResource::new(schema.clone(), self.session.clone()));
                    (format!("fortimanager_{}", schema.type_name), resource)
                })
                .collect(),
        )
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn tf_provider::data_source::DynamicDataSource>>> {
        Some(
            registry::all()
                .into_iter()
                .map(|schema| {
                    let data_source: Box<dyn tf_provider::data_source::DynamicDataSource> =
                        Box::new(FortiDataSource::new(&schema, self.session.clone()));
                    (format!("fortimanager_{}", schema.type_name), data_source)
                })
                .collect(),
        )
    }
}
