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

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::codec::WireMap;

pub mod jsonrpc;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("missing routing parameter `{0}`")]
    MissingParameter(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error on {url}: {code} - {message}")]
    Api {
        url: String,
        code: i64,
        message: String,
    },
    #[error("Authentication failed: {0}")]
    AuthFailed(String),
    #[error("Malformed response: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Values substituted into the `{name}` placeholders of an object URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingParams(BTreeMap<String, String>);

impl RoutingParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Replace every `{name}` placeholder of `template`.
    pub fn render(&self, template: &str) -> Result<String, ClientError> {
        let mut url = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            let name = &rest[start + 1..start + len];
            let value = self
                .get(name)
                .ok_or_else(|| ClientError::MissingParameter(name.to_owned()))?;
            url.push_str(&rest[..start]);
            url.push_str(&escape_key(value));
            rest = &rest[start + len + 1..];
        }
        url.push_str(rest);
        Ok(url)
    }

    /// URL of one object of the table at `template`, or the table itself for singletons.
    pub fn object_url(&self, template: &str, key: Option<&str>) -> Result<String, ClientError> {
        let mut url = self.render(template)?;
        if let Some(key) = key {
            url.push('/');
            url.push_str(&escape_key(key));
        }
        Ok(url)
    }
}

/// The API separates URL segments with `/`, so it must be escaped inside keys.
pub fn escape_key(key: &str) -> String {
    key.replace('/', "\\/")
}

/// Per call settings handed to the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    pub params: RoutingParams,
    /// Number of times a request failing at the transport level is sent again
    pub retries: u32,
}

#[async_trait]
pub trait FortiClient: Send + Sync + std::fmt::Debug + 'static {
    /// Add an object to the table at `url`, returns the response data
    async fn create(&self, ctx: &CallContext, url: &str, body: WireMap) -> Result<WireMap>;

    /// Fetch an object, `None` if it does not exist
    async fn read(&self, ctx: &CallContext, url: &str, key: Option<&str>)
        -> Result<Option<WireMap>>;

    /// Update the given attributes of an object, leaving the others untouched
    async fn update(
        &self,
        ctx: &CallContext,
        url: &str,
        key: Option<&str>,
        body: WireMap,
    ) -> Result<WireMap>;

    /// Delete an object
    async fn delete(&self, ctx: &CallContext, url: &str, key: Option<&str>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_placeholders() {
        let params = RoutingParams::new()
            .with("device", "FGT-01")
            .with("vdom", "root");
        assert_eq!(
            params
                .render("/pm/config/device/{device}/vdom/{vdom}/firewall/address")
                .unwrap(),
            "/pm/config/device/FGT-01/vdom/root/firewall/address"
        );
    }

    #[test]
    fn render_missing() {
        let params = RoutingParams::new().with("device", "FGT-01");
        let err = params
            .render("/pm/config/device/{device}/vdom/{vdom}/firewall/address")
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingParameter(name) if name == "vdom"));
    }

    #[test]
    fn object_url_escapes_key() {
        let params = RoutingParams::new().with("device", "FGT-01").with("vdom", "root");
        assert_eq!(
            params
                .object_url(
                    "/pm/config/device/{device}/vdom/{vdom}/firewall/address",
                    Some("net/24")
                )
                .unwrap(),
            "/pm/config/device/FGT-01/vdom/root/firewall/address/net\\/24"
        );
        assert_eq!(
            params
                .object_url("/pm/config/device/{device}/global/system/ha", None)
                .unwrap(),
            "/pm/config/device/FGT-01/global/system/ha"
        );
    }
}
