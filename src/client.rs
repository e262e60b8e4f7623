//! Thin gateway over the Sentry REST API.
//!
//! Single blocking client per invocation, bearer-token auth, fixed 30 second
//! per-request timeout. Failed calls are reported immediately; there is no
//! retry layer.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::config::EffectiveConfig;
use crate::error::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ApiClient {
    http: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(config: &EffectiveConfig) -> Result<Self> {
        Self::from_parts(&config.url, &config.auth_token)
    }

    /// Build a client for an arbitrary url/token pair; `config validate` uses
    /// this to probe each configured profile in turn.
    pub fn from_parts(base_url: &str, token: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(Error::Network)?;
        Ok(ApiClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// `GET {base_url}/api/0{endpoint}`, parsed as JSON.
    pub fn get(&self, endpoint: &str) -> Result<Value> {
        let url = format!("{}/api/0{}", self.base_url, endpoint);
        debug!(%url, "GET");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .map_err(Error::Network)?;

        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => Err(Error::NotFound(format!("resource not found: {endpoint}"))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(Error::Authentication { status })
            }
            s if !s.is_success() => Err(Error::Api { status }),
            _ => response.json().map_err(Error::Network),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped_from_base_url() {
        let client = ApiClient::from_parts("https://sentry.example.com/", "tok").unwrap();
        assert_eq!(client.base_url, "https://sentry.example.com");
    }
}
