use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Portal endpoint, transport and page-structure settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortalConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Name of the hidden input carrying the CSRF token.
    #[serde(default = "default_token_field")]
    pub token_field: String,

    #[serde(default = "default_search_path")]
    pub search_path: String,

    /// Anchors pointing at detail pages on the listing page.
    #[serde(default = "default_results_selector")]
    pub results_selector: String,

    #[serde(default = "default_detail_row_selector")]
    pub detail_row_selector: String,
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// 1 = strictly sequential detail fetches.
    #[serde(default = "default_detail_concurrency")]
    pub detail_concurrency: usize,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "https://portal.dinus.ac.id".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    "portal-search/0.1 (directory lookup client)".to_string()
}
fn default_token_field() -> String {
    "_token".to_string()
}
fn default_search_path() -> String {
    "/prosesCari".to_string()
}
fn default_results_selector() -> String {
    "#datatable a".to_string()
}
fn default_detail_row_selector() -> String {
    "table tr".to_string()
}
fn default_detail_concurrency() -> usize {
    1
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            token_field: default_token_field(),
            search_path: default_search_path(),
            results_selector: default_results_selector(),
            detail_row_selector: default_detail_row_selector(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detail_concurrency: default_detail_concurrency(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("PORTAL").separator("__"))
            .build()?;

        let app_cfg: AppConfig = cfg.try_deserialize()?;
        Ok(app_cfg)
    }
}
