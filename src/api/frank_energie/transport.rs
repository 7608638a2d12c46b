use std::time::Duration;

use serde_json::Value;
use ureq::Agent;
use url::Url;

use crate::{api::frank_energie::error::ApiError, prelude::*};

const TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("frank-slim/", env!("CARGO_PKG_VERSION"));

/// Status and body of a completed HTTP exchange.
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub const fn is_success(&self) -> bool {
        200 <= self.status && self.status < 300
    }
}

/// Blocking JSON-over-POST.
pub trait Transport: Send + Sync {
    fn post_json(&self, body: &Value, bearer_token: Option<&str>)
    -> Result<HttpResponse, ApiError>;
}

pub struct UreqTransport {
    agent: Agent,
    url: Url,
}

impl UreqTransport {
    pub fn new(url: Url) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(TIMEOUT))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent, url }
    }
}

impl Transport for UreqTransport {
    #[instrument(skip_all, level = Level::DEBUG, fields(url = %self.url))]
    fn post_json(
        &self,
        body: &Value,
        bearer_token: Option<&str>,
    ) -> Result<HttpResponse, ApiError> {
        let mut request = self.agent.post(self.url.as_str()).header("User-Agent", USER_AGENT);
        if let Some(token) = bearer_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        let mut response = request.send_json(body)?;
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string()?;
        debug!(status, "received");
        Ok(HttpResponse { status, body })
    }
}
