use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Json,
    body::{Body, to_bytes},
    extract::Request,
    http::{HeaderMap, HeaderName, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    error::ApiError,
    middleware::{USER_EMAIL_HEADER, USER_ID_HEADER, USER_ROLE_HEADER},
};

/// Largest request body the forwarder buffers before giving up.
pub const MAX_FORWARD_BODY: usize = 10 * 1024 * 1024;

/// UpstreamService
///
/// Destination for every request the gate lets through that no local route
/// handles: in practice the web application serving the pages and business APIs.
#[async_trait]
pub trait UpstreamService: Send + Sync {
    async fn forward(&self, request: Request) -> Result<Response, ApiError>;
}

pub type UpstreamState = Arc<dyn UpstreamService>;

/// HttpUpstream
///
/// Forwards over HTTP with reqwest. Redirects issued by the application are
/// relayed to the client untouched rather than followed here.
#[derive(Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUpstream {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in [
        header::CONNECTION,
        header::TRANSFER_ENCODING,
        header::UPGRADE,
        header::TE,
        header::TRAILER,
        header::PROXY_AUTHENTICATE,
        header::PROXY_AUTHORIZATION,
        HeaderName::from_static("keep-alive"),
    ] {
        headers.remove(name);
    }
    // Recomputed from the buffered body on both legs.
    headers.remove(header::CONTENT_LENGTH);
}

#[async_trait]
impl UpstreamService for HttpUpstream {
    async fn forward(&self, request: Request) -> Result<Response, ApiError> {
        let (parts, body) = request.into_parts();
        let body = to_bytes(body, MAX_FORWARD_BODY)
            .await
            .map_err(|_| ApiError::PayloadTooLarge)?;

        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = format!("{}{}", self.base_url, path_and_query);

        let mut headers = parts.headers;
        headers.remove(header::HOST);
        strip_hop_by_hop(&mut headers);

        let upstream_response = self
            .client
            .request(parts.method, &url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, url = %url, "upstream request failed");
                ApiError::BadGateway
            })?;

        let status = upstream_response.status();
        let mut headers = upstream_response.headers().clone();
        strip_hop_by_hop(&mut headers);

        let bytes = upstream_response.bytes().await.map_err(|e| {
            tracing::error!(error = %e, url = %url, "upstream body read failed");
            ApiError::BadGateway
        })?;

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

/// EchoUpstream
///
/// Stand-in application for local runs without `UPSTREAM_URL` and for tests.
/// Answers every request with the method, path and the identity headers it
/// received, which makes the gate's propagation directly observable.
#[derive(Clone, Default)]
pub struct EchoUpstream;

impl EchoUpstream {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UpstreamService for EchoUpstream {
    async fn forward(&self, request: Request) -> Result<Response, ApiError> {
        let headers = request.headers();
        let read = |name: &HeaderName| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        let identity = match (
            read(&USER_ID_HEADER),
            read(&USER_EMAIL_HEADER),
            read(&USER_ROLE_HEADER),
        ) {
            (Some(id), Some(email), Some(role)) => json!({ "id": id, "email": email, "role": role }),
            _ => serde_json::Value::Null,
        };

        Ok(Json(json!({
            "method": request.method().as_str(),
            "path": request.uri().path(),
            "identity": identity,
        }))
        .into_response())
    }
}
