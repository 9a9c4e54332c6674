//! Narrow HTML capability used by the parsers: select elements, read their
//! text and attributes. Everything else about the DOM stays inside `scraper`.

use scraper::{ElementRef, Html, Selector};

use super::error::PortalError;

pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// All elements matching `selector`, in document order.
    pub fn find(&self, selector: &str) -> Result<Vec<ElementRef<'_>>, PortalError> {
        let sel = selector_for(selector)?;
        Ok(self.html.select(&sel).collect())
    }
}

pub fn selector_for(selector: &str) -> Result<Selector, PortalError> {
    Selector::parse(selector)
        .map_err(|e| PortalError::Parse(format!("selector '{}': {:?}", selector, e)))
}

/// Concatenated, trimmed text content of an element.
pub fn text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

pub fn attr<'a>(el: ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name)
}

/// Rows matched by `row_selector`, each as the trimmed text of its `td` cells.
pub fn table_rows(doc: &Document, row_selector: &str) -> Result<Vec<Vec<String>>, PortalError> {
    let td_sel = selector_for("td")?;

    Ok(doc
        .find(row_selector)?
        .into_iter()
        .map(|tr| tr.select(&td_sel).map(text).collect())
        .collect())
}
