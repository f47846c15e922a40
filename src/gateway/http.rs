//! reqwest-backed gateway client.

use super::{ByteStream, GatewayError, GatewayReply, ServiceGateway, ToggleAction};
use crate::config::{GatewayConfig, GatewayEndpoint, AUTH_HEADER};
use crate::services::ServiceId;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{header, Client, Method, RequestBuilder};
use serde_json::json;
use std::time::Duration;

/// Gateway client over HTTP.
///
/// The shared client carries only a connect timeout, because relay streams
/// run until either side closes. Control calls set their own timeout per
/// request.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    endpoint: GatewayEndpoint,
    request_timeout: Duration,
    stats_timeout: Duration,
}

impl HttpGateway {
    /// Build a client for the endpoint selected by the deployment mode.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        Self::with_endpoint(config.endpoint(), config)
    }

    /// Build a client for an explicit endpoint (timeouts still from `config`).
    pub fn with_endpoint(
        endpoint: GatewayEndpoint,
        config: &GatewayConfig,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| GatewayError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            request_timeout: config.request_timeout(),
            stats_timeout: config.stats_timeout(),
        })
    }

    pub fn endpoint(&self) -> &GatewayEndpoint {
        &self.endpoint
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.client.request(method, self.endpoint.url(path));
        match &self.endpoint.auth_key {
            Some(key) => req.header(AUTH_HEADER, key),
            None => req,
        }
    }

    async fn open_stream(&self, path: &str) -> Result<ByteStream, GatewayError> {
        let response = self
            .request(Method::GET, path)
            .header(header::ACCEPT, "text/event-stream")
            .header(header::CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(GatewayError::from_request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status.as_u16()));
        }
        if response.content_length() == Some(0) {
            return Err(GatewayError::NoBody);
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| GatewayError::Read(e.to_string())))
            .boxed())
    }

    async fn call_json(
        &self,
        req: RequestBuilder,
        timeout: Duration,
    ) -> Result<GatewayReply, GatewayError> {
        let response = req
            .timeout(timeout)
            .send()
            .await
            .map_err(GatewayError::from_request)?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Read(e.to_string()))?;
        let body = match serde_json::from_slice(&bytes) {
            Ok(body) => body,
            // Keep the upstream failure status even when its body is an HTML error page.
            Err(_) if !status.is_success() => json!({
                "error": format!("gateway answered {} without a JSON body", status.as_u16())
            }),
            Err(e) => return Err(GatewayError::InvalidResponse(e.to_string())),
        };

        Ok(GatewayReply {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ServiceGateway for HttpGateway {
    async fn open_log_stream(&self, service: &ServiceId) -> Result<ByteStream, GatewayError> {
        self.open_stream(&format!("/maintenance/logs/{}", service))
            .await
    }

    async fn open_restart_stream(
        &self,
        service: &ServiceId,
    ) -> Result<ByteStream, GatewayError> {
        self.open_stream(&format!("/maintenance/restart/{}", service))
            .await
    }

    async fn toggle_public(&self, action: ToggleAction) -> Result<GatewayReply, GatewayError> {
        let req = self
            .request(Method::POST, "/toggle-public")
            .json(&json!({ "action": action }));
        self.call_json(req, self.request_timeout).await
    }

    async fn public_status(&self) -> Result<GatewayReply, GatewayError> {
        let req = self.request(Method::GET, "/toggle-public");
        self.call_json(req, self.request_timeout).await
    }

    async fn live_stats(&self) -> Result<serde_json::Value, GatewayError> {
        let reply = self
            .call_json(self.request(Method::GET, "/stats"), self.stats_timeout)
            .await?;
        if !(200..300).contains(&reply.status) {
            return Err(GatewayError::Status(reply.status));
        }
        Ok(reply.body)
    }
}
