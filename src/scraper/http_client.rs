use crate::config::PortalConfig;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderMap;
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::error::PortalError;

/// Cookie-carrying HTTP session against one portal origin.
///
/// Each search opens its own session, so cookies never leak between runs.
/// Cloning shares the same jar.
#[derive(Clone)]
pub struct SessionContext {
    inner: reqwest::Client,
    jar: Arc<Jar>,
    base: Url,
}

impl SessionContext {
    pub fn open(config: &PortalConfig) -> Result<Self, PortalError> {
        let mut base = Url::parse(&config.base_url)
            .map_err(|e| PortalError::network(format!("invalid base URL {}: {}", config.base_url, e)))?;
        // A trailing slash makes `join` keep a path prefix such as `/app`.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let jar = Arc::new(Jar::default());
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .cookie_provider(Arc::clone(&jar))
            .build()?;

        Ok(Self { inner, jar, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve a path or absolute URL against the portal base. Paths are
    /// appended to the base path, leading slash or not.
    pub fn resolve(&self, path: &str) -> Result<Url, PortalError> {
        if let Ok(absolute) = Url::parse(path) {
            return Ok(absolute);
        }
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| PortalError::network(format!("invalid URL {}: {}", path, e)))
    }

    /// Send one request and return the body. Non-2xx is an error; no retries.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
        headers: Option<HeaderMap>,
    ) -> Result<String, PortalError> {
        let url = self.resolve(path)?;
        debug!("{} {}", method, url);

        let mut req = self.inner.request(method.clone(), url.clone());
        if let Some(headers) = headers {
            req = req.headers(headers);
        }
        if let Some(body) = body {
            req = req.body(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        debug!("{} {} -> {}", method, url, status);

        if !status.is_success() {
            return Err(PortalError::Network {
                status: Some(status.as_u16()),
                message: format!("{} {}", method, url),
            });
        }

        Ok(resp.text().await?)
    }

    pub async fn get_text(&self, path: &str) -> Result<String, PortalError> {
        self.request(Method::GET, path, None, None).await
    }

    /// `Cookie` header value the session would send to the portal origin.
    pub fn cookies(&self) -> Option<String> {
        self.jar
            .cookies(&self.base)
            .and_then(|v| v.to_str().ok().map(|s| s.to_string()))
    }
}
