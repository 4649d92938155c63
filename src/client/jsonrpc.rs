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

//! FortiManager JSON-RPC API client.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::codec::{WireMap, WireValue};

use super::{CallContext, ClientError, FortiClient};

const LOGIN_URL: &str = "/sys/login/user";
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Status code returned when the requested object does not exist
const OBJECT_NOT_FOUND: i64 = -3;
/// Status code returned for a session the FortiManager no longer knows
const INVALID_SESSION: i64 = -11;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Login { username: String, password: String },
    Token(String),
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    id: u64,
    method: &'a str,
    params: [RpcParams<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct RpcParams<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a WireMap>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Vec<RpcResult>,
    #[serde(default)]
    session: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RpcResult {
    status: RpcStatus,
    #[serde(default)]
    data: Option<WireValue>,
}

#[derive(Debug, Deserialize)]
struct RpcStatus {
    code: i64,
    #[serde(default)]
    message: String,
}

impl RpcResult {
    fn check(self, url: &str) -> Result<Self, ClientError> {
        if self.status.code == 0 {
            Ok(self)
        } else {
            Err(ClientError::Api {
                url: url.to_owned(),
                code: self.status.code,
                message: self.status.message,
            })
        }
    }

    /// Object carried by the response. Table reads may wrap it in a one element list.
    fn into_object(self) -> WireMap {
        match self.data {
            Some(WireValue::Map(map)) => map,
            Some(WireValue::List(list)) => list
                .into_iter()
                .find_map(|item| match item {
                    WireValue::Map(map) => Some(map),
                    _ => None,
                })
                .unwrap_or_default(),
            _ => WireMap::new(),
        }
    }
}

#[derive(Debug)]
pub struct JsonRpcClient {
    http: reqwest::Client,
    endpoint: String,
    credentials: Credentials,
    session: Mutex<Option<String>>,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(hostname: &str, credentials: Credentials, insecure: bool) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(insecure)
            .timeout(Duration::from_secs(250))
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint(hostname),
            credentials,
            session: Mutex::new(None),
            next_id: AtomicU64::new(1),
        })
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Credentials::Token(token) = &self.credentials {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
                headers.insert(AUTHORIZATION, value);
            }
        }

        headers
    }

    async fn post(&self, request: &RpcRequest<'_>) -> Result<RpcResponse, ClientError> {
        let response = self
            .http
            .post(&self.endpoint)
            .headers(self.headers())
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Session id to attach to requests, logging in on first use.
    async fn session(&self) -> Result<Option<String>, ClientError> {
        let Credentials::Login { username, password } = &self.credentials else {
            return Ok(None);
        };

        let mut session = self.session.lock().await;
        if let Some(session) = session.as_ref() {
            return Ok(Some(session.clone()));
        }

        let data: WireMap = [
            ("user".to_owned(), WireValue::from(username.as_str())),
            ("passwd".to_owned(), WireValue::from(password.as_str())),
        ]
        .into_iter()
        .collect();
        let request = RpcRequest {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method: "exec",
            params: [RpcParams {
                url: LOGIN_URL,
                data: Some(&data),
            }],
            session: None,
        };

        tracing::debug!(user = %username, "logging into FortiManager");
        let response = self.post(&request).await?;
        for result in response.result {
            if let Err(err) = result.check(LOGIN_URL) {
                return Err(ClientError::AuthFailed(err.to_string()));
            }
        }
        let id = response
            .session
            .ok_or_else(|| ClientError::AuthFailed("no session returned".to_owned()))?;

        *session = Some(id.clone());
        Ok(Some(id))
    }

    async fn call(
        &self,
        ctx: &CallContext,
        method: &str,
        url: &str,
        data: Option<&WireMap>,
    ) -> Result<RpcResult, ClientError> {
        let mut attempt = 0;
        let mut relogged = false;
        loop {
            match self.call_once(method, url, data).await {
                Err(ClientError::Http(err)) if attempt < ctx.retries => {
                    attempt += 1;
                    tracing::warn!(method, url, attempt, error = %err, "request failed, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Ok(result) if result.status.code == INVALID_SESSION && !relogged => {
                    let Credentials::Login { .. } = &self.credentials else {
                        return Ok(result);
                    };
                    relogged = true;
                    tracing::info!(method, url, "session rejected, logging in again");
                    *self.session.lock().await = None;
                }
                result => return result,
            }
        }
    }

    async fn call_once(
        &self,
        method: &str,
        url: &str,
        data: Option<&WireMap>,
    ) -> Result<RpcResult, ClientError> {
        let session = self.session().await?;
        let request = RpcRequest {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params: [RpcParams { url, data }],
            session: session.as_deref(),
        };

        tracing::debug!(method, url, "FortiManager request");
        let response = self.post(&request).await?;
        response
            .result
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::Api {
                url: url.to_owned(),
                code: -1,
                message: "empty result".to_owned(),
            })
    }
}

fn endpoint(hostname: &str) -> String {
    let hostname = hostname.trim_end_matches('/');
    if hostname.starts_with("http://") || hostname.starts_with("https://") {
        format!("{hostname}/jsonrpc")
    } else {
        format!("https://{hostname}/jsonrpc")
    }
}

#[async_trait]
impl FortiClient for JsonRpcClient {
    async fn create(&self, ctx: &CallContext, url: &str, body: WireMap) -> Result<WireMap> {
        let url = ctx.params.object_url(url, None)?;
        let result = self
            .call(ctx, "add", &url, Some(&body))
            .await
            .and_then(|result| result.check(&url))
            .with_context(|| format!("add {url}"))?;
        Ok(result.into_object())
    }

    async fn read(
        &self,
        ctx: &CallContext,
        url: &str,
        key: Option<&str>,
    ) -> Result<Option<WireMap>> {
        let url = ctx.params.object_url(url, key)?;
        let result = self
            .call(ctx, "get", &url, None)
            .await
            .with_context(|| format!("get {url}"))?;
        if result.status.code == OBJECT_NOT_FOUND {
            return Ok(None);
        }
        let result = result.check(&url).with_context(|| format!("get {url}"))?;
        Ok(Some(result.into_object()))
    }

    async fn update(
        &self,
        ctx: &CallContext,
        url: &str,
        key: Option<&str>,
        body: WireMap,
    ) -> Result<WireMap> {
        let url = ctx.params.object_url(url, key)?;
        let result = self
            .call(ctx, "update", &url, Some(&body))
            .await
            .and_then(|result| result.check(&url))
            .with_context(|| format!("update {url}"))?;
        Ok(result.into_object())
    }

    async fn delete(&self, ctx: &CallContext, url: &str, key: Option<&str>) -> Result<()> {
        let url = ctx.params.object_url(url, key)?;
        self.call(ctx, "delete", &url, None)
            .await
            .and_then(|result| result.check(&url))
            .with_context(|| format!("delete {url}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;
    use crate::client::RoutingParams;

    const ADDRESS_URL: &str = "/pm/config/device/{device}/vdom/{vdom}/firewall/address";

    /// Local HTTP server answering the n-th request with the n-th reply.
    /// Requests without a reply get their connection closed unanswered.
    struct Server {
        endpoint: String,
        requests: Arc<std::sync::Mutex<Vec<serde_json::Value>>>,
        connections: Arc<AtomicUsize>,
    }

    impl Server {
        async fn start(replies: Vec<serde_json::Value>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let endpoint = format!("http://{}", listener.local_addr().unwrap());
            let requests = Arc::new(std::sync::Mutex::new(Vec::new()));
            let connections = Arc::new(AtomicUsize::new(0));

            let seen = requests.clone();
            let count = connections.clone();
            tokio::spawn(async move {
                let mut replies = replies.into_iter();
                while let Ok((mut socket, _)) = listener.accept().await {
                    count.fetch_add(1, Ordering::SeqCst);
                    let Some(body) = read_request(&mut socket).await else {
                        continue;
                    };
                    if let Ok(request) = serde_json::from_slice(&body) {
                        seen.lock().unwrap().push(request);
                    }
                    let Some(reply) = replies.next() else {
                        continue;
                    };
                    let reply = reply.to_string();
                    let response = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{reply}",
                        reply.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
            });

            Self {
                endpoint,
                requests,
                connections,
            }
        }

        fn connections(&self) -> usize {
            self.connections.load(Ordering::SeqCst)
        }
    }

    async fn read_request(socket: &mut TcpStream) -> Option<Vec<u8>> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let len = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|len| len.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                let start = end + 4;
                while buf.len() < start + len {
                    let n = socket.read(&mut chunk).await.ok()?;
                    if n == 0 {
                        return None;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }
                return Some(buf[start..start + len].to_vec());
            }
            let n = socket.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    }

    fn context(retries: u32) -> CallContext {
        CallContext {
            params: RoutingParams::new().with("device", "FGT").with("vdom", "root"),
            retries,
        }
    }

    fn status(code: i64, message: &str) -> serde_json::Value {
        json!({"result": [{"status": {"code": code, "message": message}}]})
    }

    fn token(server: &Server) -> JsonRpcClient {
        JsonRpcClient::new(&server.endpoint, Credentials::Token("t0k3n".to_owned()), false).unwrap()
    }

    #[tokio::test]
    async fn transport_failures_are_retried() {
        let server = Server::start(vec![]).await;
        let client = token(&server);

        let err = client
            .read(&context(2), ADDRESS_URL, Some("lan"))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").starts_with("get /pm/config/device/FGT/vdom/root/firewall/address/lan"));
        assert_eq!(server.connections(), 3);
    }

    #[tokio::test]
    async fn api_errors_are_not_retried() {
        let server = Server::start(vec![status(-10, "The data is invalid")]).await;
        let client = token(&server);

        let err = client
            .update(&context(2), ADDRESS_URL, Some("lan"), WireMap::new())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("-10 - The data is invalid"));
        assert_eq!(server.connections(), 1);
    }

    #[tokio::test]
    async fn missing_object_reads_none() {
        let server = Server::start(vec![status(-3, "Object does not exist")]).await;
        let client = token(&server);

        let object = client
            .read(&context(0), ADDRESS_URL, Some("net/24"))
            .await
            .unwrap();
        assert_eq!(object, None);

        let requests = server.requests.lock().unwrap();
        assert_eq!(requests[0]["method"], "get");
        assert_eq!(
            requests[0]["params"][0]["url"],
            "/pm/config/device/FGT/vdom/root/firewall/address/net\\/24"
        );
    }

    #[tokio::test]
    async fn malformed_response() {
        let server = Server::start(vec![json!("maintenance")]).await;
        let client = token(&server);

        let err = client
            .delete(&context(2), ADDRESS_URL, Some("lan"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ClientError>(),
            Some(ClientError::Serialization(_))
        ));
        assert_eq!(server.connections(), 1);
    }

    #[tokio::test]
    async fn expired_session_logs_in_again() {
        let logged_in = |session: &str| {
            json!({"result": [{"status": {"code": 0, "message": "OK"}}], "session": session})
        };
        let server = Server::start(vec![
            logged_in("s1"),
            status(INVALID_SESSION, "No permission for the resource"),
            logged_in("s2"),
            json!({"result": [{"status": {"code": 0, "message": "OK"}, "data": {"name": "lan"}}]}),
        ])
        .await;
        let client = JsonRpcClient::new(
            &server.endpoint,
            Credentials::Login {
                username: "admin".to_owned(),
                password: "secret".to_owned(),
            },
            false,
        )
        .unwrap();

        let object = client
            .read(&context(0), ADDRESS_URL, Some("lan"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(object["name"], WireValue::from("lan"));

        let requests = server.requests.lock().unwrap();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[1]["session"], "s1");
        assert_eq!(requests[2]["params"][0]["url"], LOGIN_URL);
        assert_eq!(requests[3]["session"], "s2");
    }

    #[test]
    fn endpoints() {
        assert_eq!(endpoint("fmg.example.com"), "https://fmg.example.com/jsonrpc");
        assert_eq!(endpoint("http://10.0.0.1:8080/"), "http://10.0.0.1:8080/jsonrpc");
    }

    #[test]
    fn request_body() {
        let data: WireMap = [("name".to_owned(), WireValue::from("lan"))]
            .into_iter()
            .collect();
        let request = RpcRequest {
            id: 7,
            method: "add",
            params: [RpcParams {
                url: "/pm/config/device/FGT/vdom/root/firewall/address",
                data: Some(&data),
            }],
            session: Some("abc"),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "id": 7,
                "method": "add",
                "params": [{
                    "url": "/pm/config/device/FGT/vdom/root/firewall/address",
                    "data": {"name": "lan"},
                }],
                "session": "abc",
            })
        );
    }

    #[test]
    fn response_status() {
        let response: RpcResponse = serde_json::from_value(json!({
            "id": 1,
            "result": [{
                "status": {"code": -3, "message": "Object does not exist"},
                "url": "/pm/config/device/FGT/vdom/root/firewall/address/lan",
            }],
        }))
        .unwrap();
        let result = response.result.into_iter().next().unwrap();
        assert_eq!(result.status.code, OBJECT_NOT_FOUND);
        let err = result.check("/x").unwrap_err();
        assert_eq!(err.to_string(), "API error on /x: -3 - Object does not exist");
    }

    #[test]
    fn response_object() {
        let response: RpcResponse = serde_json::from_value(json!({
            "result": [{
                "status": {"code": 0, "message": "OK"},
                "data": [{"name": "lan", "comment": null}],
            }],
        }))
        .unwrap();
        let object = response
            .result
            .into_iter()
            .next()
            .unwrap()
            .check("/x")
            .unwrap()
            .into_object();
        assert_eq!(object.len(), 1);
        assert_eq!(object["name"], WireValue::from("lan"));
    }
}
