use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::cookie::Jar;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::types::ServerConfig;

use super::error::{ApiError, extract_message};

/// Name of the servlet session cookie the tracker issues on login.
pub const SESSION_COOKIE: &str = "JSESSIONID";

/// A REST client for the tracker server.
///
/// Holds the session cookie jar, so every request made through one client
/// shares the same login. Active reference listings go through a moka cache
/// keyed by request path.
pub struct TrackerClient {
    http: reqwest::Client,
    jar: Arc<Jar>,
    base_url: Url,
    cache: Cache<String, String>,
}

impl TrackerClient {
    /// Build a client for `server`, caching reference responses for
    /// `cache_ttl_minutes`.
    pub fn new(server: &ServerConfig, cache_ttl_minutes: u32) -> Result<Self, ApiError> {
        let base_url = parse_base_url(&server.base_url)?;
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            // Login answers with a redirect to the web UI; the status is all we need.
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(server.timeout_secs.max(1)))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("bugdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ApiError::Transport {
                url: base_url.to_string(),
                source,
            })?;
        let cache = Cache::builder()
            .max_capacity(64)
            .time_to_live(Duration::from_secs(u64::from(cache_ttl_minutes) * 60))
            .build();

        Ok(Self {
            http,
            jar,
            base_url,
            cache,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Adopt an existing server session instead of logging in.
    pub fn set_session_cookie(&self, value: &str) {
        let cookie = format!("{SESSION_COOKIE}={value}; Path=/");
        self.jar.add_cookie_str(&cookie, &self.base_url);
    }

    pub(crate) fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl {
                path: path.to_owned(),
                message: e.to_string(),
            })
    }

    // -----------------------------------------------------------------------
    // Request helpers
    // -----------------------------------------------------------------------

    /// `GET path` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path)?;
        let body = self.execute(self.http.get(url.clone()), &url, false).await?;
        decode(&url, &body)
    }

    /// `GET path`, returning `None` when the server answers 204 No Content.
    pub async fn get_optional_json<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, ApiError> {
        let url = self.url(path)?;
        let body = self.execute(self.http.get(url.clone()), &url, false).await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        decode(&url, &body).map(Some)
    }

    /// `GET path` through the response cache. `force` bypasses and refreshes
    /// the cached entry.
    pub async fn get_json_cached<T: DeserializeOwned>(
        &self,
        path: &str,
        force: bool,
    ) -> Result<T, ApiError> {
        let url = self.url(path)?;
        let key = url.to_string();

        if !force
            && let Some(cached) = self.cache.get(&key).await
            && let Ok(value) = serde_json::from_str::<T>(&cached)
        {
            tracing::debug!("cache hit for {key}");
            return Ok(value);
        }

        let body = self.execute(self.http.get(url.clone()), &url, false).await?;
        let value = decode(&url, &body)?;
        self.cache.insert(key, body).await;
        Ok(value)
    }

    /// Send `body` as JSON with `method` and decode the JSON response.
    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        let request = self.http.request(method, url.clone()).json(body);
        let text = self.execute(request, &url, false).await?;
        decode(&url, &text)
    }

    /// Send `body` as JSON and ignore whatever the server answers with.
    pub async fn post_json_discard<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let url = self.url(path)?;
        self.execute(self.http.post(url.clone()).json(body), &url, true)
            .await
            .map(|_| ())
    }

    /// `PUT path` with a `text/plain` body, ignoring the response.
    pub async fn put_text(&self, path: &str, body: &str) -> Result<(), ApiError> {
        let url = self.url(path)?;
        let request = self
            .http
            .put(url.clone())
            .header(CONTENT_TYPE, "text/plain")
            .body(body.to_owned());
        self.execute(request, &url, false).await.map(|_| ())
    }

    /// `POST path` without a body.
    pub async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path)?;
        self.execute(self.http.post(url.clone()), &url, true)
            .await
            .map(|_| ())
    }

    /// Send the request and return the body text of a successful response.
    ///
    /// With `redirect_ok`, a 3xx answer counts as success: the server
    /// redirects after login and logout rather than returning a body.
    /// Anywhere else a redirect means the session was not accepted.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        url: &Url,
        redirect_ok: bool,
    ) -> Result<String, ApiError> {
        let transport = |source| ApiError::Transport {
            url: url.to_string(),
            source,
        };
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        tracing::debug!("api: {url} -> {}", status.as_u16());

        if status == StatusCode::NO_CONTENT || (redirect_ok && status.is_redirection()) {
            return Ok(String::new());
        }
        let body = response.text().await.map_err(transport)?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(ApiError::Status {
                status,
                message: extract_message(&body),
            })
        }
    }
}

fn decode<T: DeserializeOwned>(url: &Url, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source,
    })
}

/// Parse the configured base URL, making sure it ends in `/` so relative
/// API paths join under it rather than replacing its last segment.
fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let mut normalized = raw.trim().to_owned();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).map_err(|e| ApiError::InvalidUrl {
        path: raw.to_owned(),
        message: e.to_string(),
    })
}
