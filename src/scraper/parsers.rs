use crate::models::DetailRecord;
use tracing::{debug, warn};

use super::document::{attr, table_rows, Document};
use super::error::PortalError;

// ── Warm-up page ──────────────────────────────────────────────────────────────

/// Value of the `<input name="{field}">` anti-forgery field.
pub fn extract_token(html: &str, field: &str) -> Result<String, PortalError> {
    let doc = Document::parse(html);
    let selector = format!(r#"input[name="{}"]"#, field);

    let token = doc
        .find(&selector)?
        .into_iter()
        .next()
        .and_then(|input| attr(input, "value"))
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string());

    token.ok_or_else(|| PortalError::Authentication("token not found".to_string()))
}

// ── Listing page ──────────────────────────────────────────────────────────────

/// Non-empty `href`s of the result anchors, in document order. Duplicates and
/// relative URLs are kept as-is.
pub fn collect_links(html: &str, anchor_selector: &str) -> Result<Vec<String>, PortalError> {
    let doc = Document::parse(html);

    let links: Vec<String> = doc
        .find(anchor_selector)?
        .into_iter()
        .filter_map(|a| attr(a, "href"))
        .filter(|href| !href.is_empty())
        .map(|href| href.to_string())
        .collect();

    Ok(links)
}

// ── Detail page ───────────────────────────────────────────────────────────────

/// Rows shaped `label | separator | value` become record entries; shorter rows
/// are skipped and later labels overwrite earlier ones.
pub fn parse_detail(html: &str, row_selector: &str) -> Result<DetailRecord, PortalError> {
    let doc = Document::parse(html);
    let mut record = DetailRecord::new();

    for cells in table_rows(&doc, row_selector)? {
        if cells.len() < 3 {
            continue;
        }
        let mut cells = cells.into_iter();
        let label = cells.next().unwrap_or_default();
        let value = cells.nth(1).unwrap_or_default();
        record.insert(label, value);
    }

    if record.is_empty() {
        warn!("detail page has no label/value rows");
    } else {
        debug!("detail page: {} fields", record.len());
    }
    Ok(record)
}
