//! Vendor Connect API client for authenticated requests
//!
//! Wraps a reqwest client with the browser-mimic headers the vendor's web
//! endpoints expect, and classifies HTTP status codes into the error
//! taxonomy the fetch orchestrator consumes.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::session::SessionToken;
use crate::config::Settings;
use crate::error::{HunoError, Result};

/// User agent for Connect API requests. The vendor's WAF serves empty bodies
/// to clients that do not look like a browser.
const API_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36";

/// Explicit configuration for the vendor client.
///
/// Proxy and debug behavior are passed in here rather than toggled through
/// process-wide globals; construction is the single init point.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub proxy_url: Option<String>,
    pub timeout_secs: u64,
}

impl ClientConfig {
    /// Config for the given vendor domain (e.g. "garmin.com")
    pub fn for_domain(domain: &str, settings: &Settings) -> Self {
        Self {
            base_url: format!("https://connect.{}", domain),
            proxy_url: settings.proxy_url.clone(),
            timeout_secs: 30,
        }
    }

    /// Config with a custom base URL (for testing)
    pub fn for_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            proxy_url: None,
            timeout_secs: 30,
        }
    }
}

/// A raw upstream response: status plus body text, prior to shape checks
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawResponse {
    /// Body size in bytes
    pub fn size(&self) -> usize {
        self.body.len()
    }
}

/// Vendor Connect API client
pub struct VendorClient {
    client: Client,
    base_url: String,
}

impl VendorClient {
    /// Create a new API client from explicit configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .default_headers(Self::default_headers(&config.base_url));

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| HunoError::config(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            client: builder.build().map_err(HunoError::Http)?,
            base_url: config.base_url.clone(),
        })
    }

    fn default_headers(base_url: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(API_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        // The NK header is required by newer vendor endpoint revisions
        headers.insert("NK", HeaderValue::from_static("NT"));
        if let Ok(origin) = HeaderValue::from_str(base_url) {
            headers.insert("Origin", origin);
        }
        if let Ok(referer) = HeaderValue::from_str(&format!("{}/modern/", base_url)) {
            headers.insert("Referer", referer);
        }
        headers
    }

    /// The configured base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the full URL for a given path
    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchange credentials for a session token.
    ///
    /// The vendor auth protocol is opaque to this crate: one POST in, one
    /// bearer token out. Invalid credentials surface as an authentication
    /// error so the UI can prompt instead of retrying.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionToken> {
        let url = self.build_url("/auth/login");
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "username": email, "password": password }))
            .send()
            .await
            .map_err(HunoError::Http)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(HunoError::auth("Invalid email or password"));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HunoError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let payload: Value = response.json().await.map_err(|e| {
            HunoError::invalid_response(format!("Failed to parse login response: {}", e))
        })?;

        let access_token = payload
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| HunoError::invalid_response("Login response missing access_token"))?
            .to_string();
        let token_type = payload
            .get("token_type")
            .and_then(|v| v.as_str())
            .unwrap_or("Bearer")
            .to_string();
        let expires_in = payload
            .get("expires_in")
            .and_then(|v| v.as_i64())
            .unwrap_or(3600);
        let display_name = payload
            .get("displayName")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        Ok(SessionToken {
            token_type,
            access_token,
            expires_at: chrono::Utc::now().timestamp() + expires_in,
            display_name,
        })
    }

    /// Make an authenticated GET request and return the raw response.
    ///
    /// Status classification: 401 aborts with `AuthExpired` (the session is
    /// dead, no point trying other endpoints with it); 429/403/5xx map to
    /// `UpstreamTransient` for the orchestrator's backoff; anything else
    /// non-2xx is a plain API error.
    pub async fn get_raw(
        &self,
        token: &SessionToken,
        path: &str,
        query: &[(String, String)],
    ) -> Result<RawResponse> {
        let url = self.build_url(path);

        let mut request = self
            .client
            .get(&url)
            .header("Authorization", token.authorization_header());
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.map_err(HunoError::Http)?;
        self.classify_response(response).await
    }

    async fn classify_response(&self, response: Response) -> Result<RawResponse> {
        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        match status {
            s if s.is_success() => {
                let body = response.text().await.map_err(HunoError::Http)?;
                Ok(RawResponse {
                    status: status.as_u16(),
                    content_type,
                    body,
                })
            }
            StatusCode::UNAUTHORIZED => Err(HunoError::AuthExpired),
            StatusCode::TOO_MANY_REQUESTS | StatusCode::FORBIDDEN => {
                Err(HunoError::UpstreamTransient {
                    status: status.as_u16(),
                })
            }
            s if s.is_server_error() => Err(HunoError::UpstreamTransient {
                status: status.as_u16(),
            }),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(HunoError::Api {
                    status: status.as_u16(),
                    message: body,
                })
            }
        }
    }

    /// Make an authenticated GET request and deserialize the JSON response
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        token: &SessionToken,
        path: &str,
    ) -> Result<T> {
        let raw = self.get_raw(token, path, &[]).await?;
        serde_json::from_str(&raw.body).map_err(|e| {
            HunoError::invalid_response(format!("Failed to parse JSON response: {}", e))
        })
    }

    /// Fetch the user's social profile (display name, full name, location)
    pub async fn get_profile(&self, token: &SessionToken) -> Result<Value> {
        self.get_json(token, "/userprofile-service/socialProfile")
            .await
    }

    /// Fetch user settings (height, weight, birth date, unit preferences)
    pub async fn get_settings(&self, token: &SessionToken) -> Result<Value> {
        self.get_json(token, "/userprofile-service/userprofile/user-settings")
            .await
    }

    /// Fetch recent activities
    pub async fn get_activities(&self, token: &SessionToken, limit: u32) -> Result<Value> {
        let path = format!(
            "/activitylist-service/activities/search/activities?start=0&limit={}",
            limit
        );
        self.get_json(token, &path).await
    }
}
