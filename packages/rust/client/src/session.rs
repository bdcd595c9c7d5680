//! Authenticated transport against the academic-records endpoints.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderMap};
use reqwest::{Client, StatusCode};
use tracing::debug;

use regfetch_shared::{RegfetchError, Result, SessionCredential};

use crate::form::FormBody;

/// User-Agent string for every request.
const USER_AGENT: &str = concat!("regfetch/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A raw response: status, headers and body, whatever the status.
#[derive(Debug, Clone)]
pub struct RemoteResponse {
    pub url: String,
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl RemoteResponse {
    /// The body if the status is exactly 200, otherwise a protocol error.
    pub fn into_ok_body(self) -> Result<String> {
        if self.status != StatusCode::OK.as_u16() {
            return Err(RegfetchError::Protocol {
                url: self.url,
                status: self.status,
            });
        }
        Ok(self.body)
    }
}

/// Thin wrapper over a `reqwest::Client` that forwards the session cookie.
#[derive(Debug, Clone)]
pub struct SessionClient {
    client: Client,
}

impl SessionClient {
    /// A zero `timeout` leaves requests without a deadline.
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS));
        if !timeout.is_zero() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| RegfetchError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// POST a form body, forwarding `credential` as the `Cookie` header.
    pub async fn post_form(
        &self,
        url: &str,
        credential: Option<&SessionCredential>,
        body: &FormBody,
    ) -> Result<RemoteResponse> {
        debug!(url, fields = body.len(), "POST");

        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body.to_string());
        if let Some(credential) = credential {
            request = request.header(COOKIE, credential.expose());
        }

        let response = request
            .send()
            .await
            .map_err(|e| RegfetchError::Transport(format!("{url}: {e}")))?;
        read_response(url, response).await
    }

    /// GET a page without credentials.
    pub async fn get(&self, url: &str) -> Result<RemoteResponse> {
        debug!(url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RegfetchError::Transport(format!("{url}: {e}")))?;
        read_response(url, response).await
    }
}

async fn read_response(url: &str, response: reqwest::Response) -> Result<RemoteResponse> {
    let status = response.status().as_u16();
    let headers = response.headers().clone();
    let body = response
        .text()
        .await
        .map_err(|e| RegfetchError::Transport(format!("{url}: body read failed: {e}")))?;

    debug!(url, status, bytes = body.len(), "response");

    Ok(RemoteResponse {
        url: url.to_string(),
        status,
        headers,
        body,
    })
}
