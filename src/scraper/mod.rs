pub mod cleaner;
pub mod document;
pub mod error;
pub mod http_client;
pub mod parsers;

use crate::config::PortalConfig;
use crate::models::{Category, DetailRecord, SearchQuery};
use crate::utils::preview;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use tracing::{debug, info};

use self::error::{PortalError, ScrapeError};
use self::http_client::SessionContext;
use self::parsers::{collect_links, extract_token, parse_detail};

// ── Source trait ──────────────────────────────────────────────────────────────

/// Anything that can answer a person search. The routing layer depends on this.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<DetailRecord>, ScrapeError>;
}

// ── Search form ───────────────────────────────────────────────────────────────

/// `application/x-www-form-urlencoded` body for the search form.
pub fn build_search_form(token: &str, keyword: &str, category: Category) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("_token", token)
        .append_pair("pencarian", keyword)
        .append_pair("pilihan_search", &category.code().to_string())
        .finish()
}

// ── Portal scraper ────────────────────────────────────────────────────────────

/// The individual page steps of a portal search. Every step runs inside a
/// caller-owned [`SessionContext`].
pub struct PortalScraper {
    config: PortalConfig,
}

impl PortalScraper {
    pub fn new(config: &PortalConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn open_session(&self) -> Result<SessionContext, PortalError> {
        SessionContext::open(&self.config)
    }

    /// GET the root page and pull the anti-forgery token out of it.
    pub async fn warm_up(&self, session: &SessionContext) -> Result<String, PortalError> {
        info!("Warm-up: GET {}", session.base());
        let html = session.get_text("/").await?;
        debug!("Session cookie received: {}", session.cookies().is_some());

        let token = extract_token(&html, &self.config.token_field)?;
        debug!("Token found: {}...", preview(&token, 10));
        Ok(token)
    }

    /// POST the search form; returns the detail links of the listing page.
    pub async fn submit_search(
        &self,
        session: &SessionContext,
        token: &str,
        query: &SearchQuery,
    ) -> Result<Vec<String>, PortalError> {
        let body = build_search_form(token, &query.keyword, query.category);
        debug!(
            "Payload: pencarian={:?} pilihan_search={}",
            query.keyword,
            query.category.code()
        );

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );

        info!("Submit: POST {}", self.config.search_path);
        let html = session
            .request(Method::POST, &self.config.search_path, Some(body), Some(headers))
            .await?;

        let links = collect_links(&html, &self.config.results_selector)?;
        info!("Found {} links", links.len());
        debug!("Links: {:?}", links);
        Ok(links)
    }

    pub async fn fetch_detail(
        &self,
        session: &SessionContext,
        link: &str,
    ) -> Result<DetailRecord, PortalError> {
        let html = session.get_text(link).await?;
        parse_detail(&html, &self.config.detail_row_selector)
    }
}
