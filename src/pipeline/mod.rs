//! Search orchestrator: ties session → token → listing → detail pages together.
//!
//! ## Steps
//!
//! 1. Open a fresh [`SessionContext`] (own cookie jar, nothing shared across searches)
//! 2. GET `/` and read the anti-forgery token. No token ends the run.
//! 3. POST the search form and collect the detail links from the listing
//! 4. Fetch + parse every detail page, in link order
//!
//! Any failure ends the whole run: the caller gets one [`ScrapeError`] and none
//! of the records gathered so far.
//!
//! Detail pages are fetched one at a time by default. With
//! `pipeline.detail_concurrency > 1` they are fanned out over the same session
//! (the jar is internally locked); results keep link order and the first
//! failing link cancels the rest.

use crate::config::AppConfig;
use crate::models::{DetailRecord, SearchQuery};
use crate::scraper::error::{PortalError, ScrapeError};
use crate::scraper::http_client::SessionContext;
use crate::scraper::{DirectorySource, PortalScraper};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

pub struct Pipeline {
    config: AppConfig,
    scraper: Arc<PortalScraper>,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        let scraper = Arc::new(PortalScraper::new(&config.portal));
        Self { config, scraper }
    }

    pub async fn run(&self, query: &SearchQuery) -> Result<Vec<DetailRecord>, PortalError> {
        let session = self.scraper.open_session()?;

        // ── 1. Token ──────────────────────────────────────────────────────────
        let token = self.scraper.warm_up(&session).await?;

        // ── 2. Listing ────────────────────────────────────────────────────────
        let links = self.scraper.submit_search(&session, &token, query).await?;
        if links.is_empty() {
            return Ok(vec![]);
        }

        // ── 3. Details ────────────────────────────────────────────────────────
        let concurrency = self.config.pipeline.detail_concurrency;
        if concurrency <= 1 {
            self.fetch_sequential(&session, &links).await
        } else {
            self.fetch_concurrent(&session, links, concurrency).await
        }
    }

    async fn fetch_sequential(
        &self,
        session: &SessionContext,
        links: &[String],
    ) -> Result<Vec<DetailRecord>, PortalError> {
        let mut results = Vec::with_capacity(links.len());

        for (i, link) in links.iter().enumerate() {
            info!("Detail {}/{}: {}", i + 1, links.len(), link);
            let record = self.scraper.fetch_detail(session, link).await?;
            debug!("Detail {}: {} fields", i + 1, record.len());
            results.push(record);
        }

        Ok(results)
    }

    async fn fetch_concurrent(
        &self,
        session: &SessionContext,
        links: Vec<String>,
        concurrency: usize,
    ) -> Result<Vec<DetailRecord>, PortalError> {
        let total = links.len();
        let sem = Arc::new(Semaphore::new(concurrency));
        let mut handles = Vec::with_capacity(total);

        for (i, link) in links.into_iter().enumerate() {
            let scraper = Arc::clone(&self.scraper);
            let session = session.clone();
            let sem = Arc::clone(&sem);

            let handle = tokio::spawn(async move {
                let _permit = sem
                    .acquire()
                    .await
                    .map_err(|e| PortalError::network(format!("detail fetch cancelled: {}", e)))?;

                info!("Detail {}/{}: {}", i + 1, total, link);
                scraper.fetch_detail(&session, &link).await
            });

            handles.push(handle);
        }

        let mut results = Vec::with_capacity(total);
        let mut handles = handles.into_iter();

        while let Some(handle) = handles.next() {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(PortalError::network(format!("detail task failed: {}", e))),
            };

            match outcome {
                Ok(record) => results.push(record),
                Err(e) => {
                    for pending in handles.by_ref() {
                        pending.abort();
                    }
                    return Err(e);
                }
            }
        }

        Ok(results)
    }
}

#[async_trait]
impl DirectorySource for Pipeline {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<DetailRecord>, ScrapeError> {
        info!(
            "Starting search for \"{}\" ({} / {})",
            query.keyword,
            query.category.code(),
            query.category
        );

        match self.run(query).await {
            Ok(records) => {
                info!("Search completed: {} results", records.len());
                Ok(records)
            }
            Err(e) => {
                error!("Search failed: {}", e);
                Err(ScrapeError::from(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WARMUP_PAGE: &str = r#"
        <html><body>
          <form method="POST" action="/prosesCari">
            <input type="hidden" name="_token" value="tok123">
            <input type="text" name="pencarian">
            <select name="pilihan_search"><option value="1">Mahasiswa</option></select>
          </form>
        </body></html>"#;

    fn listing(hrefs: &[&str]) -> String {
        let rows: String = hrefs
            .iter()
            .map(|h| format!(r#"<tr><td><a href="{}">detail</a></td></tr>"#, h))
            .collect();
        format!(
            r#"<html><body><a href="/beranda">Beranda</a><table id="datatable">{}</table></body></html>"#,
            rows
        )
    }

    fn detail(name: &str) -> String {
        format!(
            r#"<html><body><table>
                 <tr><td>Nama</td><td>:</td><td>{}</td></tr>
                 <tr><td>Program Studi</td><td>:</td><td>Teknik Informatika</td></tr>
                 <tr><td colspan="3">Biodata</td></tr>
               </table></body></html>"#,
            name
        )
    }

    fn pipeline_for(server: &MockServer, concurrency: usize) -> Pipeline {
        let mut config = AppConfig::default();
        config.portal.base_url = server.uri();
        config.portal.timeout_secs = 5;
        config.pipeline.detail_concurrency = concurrency;
        Pipeline::new(config)
    }

    async fn mount_warmup(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "portal_session=s3ss10n; Path=/; HttpOnly")
                    .set_body_string(WARMUP_PAGE),
            )
            .mount(server)
            .await;
    }

    async fn mount_detail(server: &MockServer, at: &str, name: &str) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(200).set_body_string(detail(name)))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_missing_token_fails_without_posting() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>maintenance</body></html>"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result = pipeline_for(&server, 1)
            .search(&SearchQuery::new("budi", Category::Student))
            .await;

        assert_eq!(
            result,
            Err(ScrapeError { message: "token not found".to_string() })
        );
    }

    #[tokio::test]
    async fn test_search_returns_records_in_link_order() {
        let server = MockServer::start().await;
        mount_warmup(&server).await;

        let absolute = format!("{}/dosen/1", server.uri());
        Mock::given(method("POST"))
            .and(path("/prosesCari"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string("_token=tok123&pencarian=budi&pilihan_search=2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(listing(&["/dosen/2", &absolute, "dosen/3"])),
            )
            .expect(1)
            .mount(&server)
            .await;

        mount_detail(&server, "/dosen/1", "Budi Santoso").await;
        mount_detail(&server, "/dosen/2", "Budi Hartono").await;
        mount_detail(&server, "/dosen/3", "Budiman").await;

        let records = pipeline_for(&server, 1)
            .search(&SearchQuery::new("budi", Category::Faculty))
            .await;
        tokio_test::assert_ok!(&records);
        let records = records.unwrap();

        let names: Vec<&str> = records.iter().filter_map(|r| r.get("Nama")).collect();
        assert_eq!(names, vec!["Budi Hartono", "Budi Santoso", "Budiman"]);
        assert_eq!(records[0].len(), 2);
        assert_eq!(records[0].get("Program Studi"), Some("Teknik Informatika"));
    }

    #[tokio::test]
    async fn test_warmup_cookie_is_sent_with_search() {
        let server = MockServer::start().await;
        mount_warmup(&server).await;

        Mock::given(method("POST"))
            .and(path("/prosesCari"))
            .and(header("cookie", "portal_session=s3ss10n"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[])))
            .expect(1)
            .mount(&server)
            .await;

        let records = pipeline_for(&server, 1)
            .search(&SearchQuery::new("budi", Category::Student))
            .await;

        assert_eq!(records, Ok(vec![]));
    }

    #[tokio::test]
    async fn test_no_links_is_empty_success() {
        let server = MockServer::start().await;
        mount_warmup(&server).await;
        Mock::given(method("POST"))
            .and(path("/prosesCari"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<p>Data tidak ditemukan</p>"),
            )
            .mount(&server)
            .await;

        let records = pipeline_for(&server, 1)
            .search(&SearchQuery::new("zzz", Category::Alumni))
            .await;

        assert_eq!(records, Ok(vec![]));
    }

    #[tokio::test]
    async fn test_search_post_failure_is_terminal() {
        let server = MockServer::start().await;
        mount_warmup(&server).await;
        Mock::given(method("POST"))
            .and(path("/prosesCari"))
            .respond_with(ResponseTemplate::new(419))
            .mount(&server)
            .await;

        let err = pipeline_for(&server, 1)
            .search(&SearchQuery::new("budi", Category::Student))
            .await
            .unwrap_err();

        assert!(err.message.starts_with("HTTP 419"), "{}", err.message);
    }

    async fn mount_listing_with_failing_second(server: &MockServer) {
        mount_warmup(server).await;
        Mock::given(method("POST"))
            .and(path("/prosesCari"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(listing(&["/mhs/1", "/mhs/2", "/mhs/3"])),
            )
            .mount(server)
            .await;
        mount_detail(server, "/mhs/1", "Budi Santoso").await;
        Mock::given(method("GET"))
            .and(path("/mhs/2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_detail_failure_discards_partial_results() {
        let server = MockServer::start().await;
        mount_listing_with_failing_second(&server).await;
        Mock::given(method("GET"))
            .and(path("/mhs/3"))
            .respond_with(ResponseTemplate::new(200).set_body_string(detail("Budiman")))
            .expect(0)
            .mount(&server)
            .await;

        let err = pipeline_for(&server, 1)
            .search(&SearchQuery::new("budi", Category::Student))
            .await
            .unwrap_err();

        assert!(err.message.contains("HTTP 500"), "{}", err.message);
        assert!(err.message.contains("/mhs/2"), "{}", err.message);
    }

    #[tokio::test]
    async fn test_concurrent_detail_failure_is_single_error() {
        let server = MockServer::start().await;
        mount_listing_with_failing_second(&server).await;
        mount_detail(&server, "/mhs/3", "Budiman").await;

        let err = pipeline_for(&server, 3)
            .search(&SearchQuery::new("budi", Category::Student))
            .await
            .unwrap_err();

        assert!(err.message.contains("/mhs/2"), "{}", err.message);
    }

    #[tokio::test]
    async fn test_concurrent_fetch_keeps_link_order() {
        let server = MockServer::start().await;
        mount_warmup(&server).await;
        Mock::given(method("POST"))
            .and(path("/prosesCari"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(listing(&["/alumni/9", "/alumni/4", "/alumni/7"])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/alumni/9"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(detail("Pertama"))
                    .set_delay(std::time::Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
        mount_detail(&server, "/alumni/4", "Kedua").await;
        mount_detail(&server, "/alumni/7", "Ketiga").await;

        let records = pipeline_for(&server, 3)
            .search(&SearchQuery::new("budi", Category::Alumni))
            .await
            .unwrap();

        let names: Vec<&str> = records.iter().filter_map(|r| r.get("Nama")).collect();
        assert_eq!(names, vec!["Pertama", "Kedua", "Ketiga"]);
    }
}
