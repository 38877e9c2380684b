use reqwest::Client;
use tracing::warn;
use warp::Reply;
use warp::http::{HeaderMap, Method, Response};
use warp::hyper::Body;
use warp::hyper::body::Bytes;

use crate::error::ApiError;
use crate::identity::IDENTITY_HEADER;

const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Headers that never cross the proxy. Incoming identity headers are
/// dropped so only the gateway can set one.
fn is_forwardable(name: &str) -> bool {
    !HOP_BY_HOP_HEADERS.contains(&name)
        && name != "host"
        && name != "content-length"
        && name != IDENTITY_HEADER
}

pub struct ProxyRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug, thiserror::Error)]
enum ProxyError {
    #[error("unsupported method {0}")]
    Method(String),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Response(#[from] warp::http::Error),
}

/// Forwards page requests to the front service.
pub struct FrontProxy {
    client: Client,
    base_url: String,
}

impl FrontProxy {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn forward(
        &self,
        request: ProxyRequest,
        identity_token: Option<&str>,
    ) -> Response<Body> {
        let path = request.path.clone();
        match self.try_forward(request, identity_token).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Proxying {} to front failed: {}", path, e);
                ApiError::Upstream {
                    status: 502,
                    message: "Front service unavailable".to_string(),
                }
                .into_response()
            }
        }
    }

    async fn try_forward(
        &self,
        request: ProxyRequest,
        identity_token: Option<&str>,
    ) -> Result<Response<Body>, ProxyError> {
        // warp and reqwest sit on different `http` majors, so convert by value
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|_| ProxyError::Method(request.method.to_string()))?;

        let mut url = format!("{}{}", self.base_url, request.path);
        if let Some(query) = &request.query {
            url.push('?');
            url.push_str(query);
        }

        let mut builder = self.client.request(method, &url);
        for (name, value) in request.headers.iter() {
            if is_forwardable(name.as_str()) {
                builder = builder.header(name.as_str(), value.as_bytes());
            }
        }
        if let Some(token) = identity_token {
            builder = builder.header(IDENTITY_HEADER, token);
        }

        let upstream = builder.body(request.body.to_vec()).send().await?;

        let mut response = Response::builder().status(upstream.status().as_u16());
        for (name, value) in upstream.headers() {
            if is_forwardable(name.as_str()) {
                response = response.header(name.as_str(), value.as_bytes());
            }
        }

        let body = upstream.bytes().await?;
        Ok(response.body(Body::from(body.to_vec()))?)
    }
}
