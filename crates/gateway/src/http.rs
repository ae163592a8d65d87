//! reqwest-backed REST gateway.

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;

use crate::envelope::{decode_detail, decode_list};
use crate::error::{GatewayError, GatewayResult};
use crate::resource::{ListQuery, Page, Record, Resource, ResourceGateway};
use crate::session::SessionContext;

/// Shared HTTP plumbing: base URL, route prefix, session-driven auth.
///
/// Cheap to clone; all gateways built from one transport share the connection
/// pool and the session.
#[derive(Debug, Clone)]
pub struct RestTransport {
    client: Client,
    base_url: String,
    prefix: String,
    session: SessionContext,
}

impl RestTransport {
    pub fn new(
        base_url: &str,
        prefix: &str,
        timeout: Duration,
        session: SessionContext,
    ) -> GatewayResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            prefix: prefix.trim_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        if self.prefix.is_empty() {
            format!("{}/{}", self.base_url, path)
        } else {
            format!("{}/{}/{}", self.base_url, self.prefix, path)
        }
    }

    async fn send(&self, method: &'static str, url: String, req: RequestBuilder) -> GatewayResult<Value> {
        let req = match self.session.bearer() {
            Some(token) => req.bearer_auth(token),
            None => req,
        };

        tracing::debug!(method, %url, "gateway request");
        let resp = req.send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(method, %url, status = status.as_u16(), "gateway request failed");
            return Err(match status {
                StatusCode::UNAUTHORIZED => GatewayError::Unauthorized,
                StatusCode::NOT_FOUND => GatewayError::NotFound(url),
                _ => GatewayError::Api {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let bytes = resp.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| GatewayError::invalid(format!("{method} {url}: {e}")))
    }
}

/// REST gateway for one resource type.
#[derive(Debug)]
pub struct RestGateway<R> {
    transport: RestTransport,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for RestGateway<R> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> RestGateway<R> {
    pub fn new(transport: RestTransport) -> Self {
        Self {
            transport,
            _resource: PhantomData,
        }
    }

    fn collection_url(&self) -> String {
        self.transport.url(R::PATH)
    }

    fn member_url(&self, id: u64) -> String {
        self.transport.url(&format!("{}/{}", R::PATH, id))
    }
}

#[async_trait]
impl<R: Resource> ResourceGateway<R> for RestGateway<R> {
    async fn list(&self, query: &ListQuery) -> GatewayResult<Page<R::Attributes>> {
        let url = self.collection_url();
        let req = self.transport.client.get(&url).query(query.params());
        let body = self.transport.send("GET", url, req).await?;
        decode_list(body)
    }

    async fn get_with(&self, id: u64, query: &ListQuery) -> GatewayResult<Record<R::Attributes>> {
        let url = self.member_url(id);
        let req = self.transport.client.get(&url).query(query.params());
        let body = self.transport.send("GET", url, req).await?;
        decode_detail(body)
    }

    async fn create(&self, payload: &R::Create) -> GatewayResult<Record<R::Attributes>> {
        let url = self.collection_url();
        let body = serde_json::to_value(payload)?;
        let req = self.transport.client.post(&url).json(&body);
        let body = self.transport.send("POST", url, req).await?;
        decode_detail(body)
    }

    async fn update(&self, id: u64, payload: &R::Update) -> GatewayResult<Record<R::Attributes>> {
        let url = self.member_url(id);
        let body = serde_json::to_value(payload)?;
        let req = self.transport.client.put(&url).json(&body);
        let body = self.transport.send("PUT", url, req).await?;
        decode_detail(body)
    }

    async fn action(&self, id: u64, name: &str) -> GatewayResult<()> {
        let url = self
            .transport
            .url(&format!("{}/{}/actions/{}", R::PATH, id, name));
        let req = self.transport.client.post(&url);
        self.transport.send("POST", url, req).await?;
        Ok(())
    }
}
