use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ── Category ──────────────────────────────────────────────────────────────────

/// Search scope selector, sent to the portal as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Category {
    Student,
    Faculty,
    Alumni,
}

impl Category {
    pub fn code(self) -> u8 {
        match self {
            Category::Student => 1,
            Category::Faculty => 2,
            Category::Alumni => 3,
        }
    }

    /// The portal's own name for the category.
    pub fn description(self) -> &'static str {
        match self {
            Category::Student => "mahasiswa",
            Category::Faculty => "dosen",
            Category::Alumni => "alumni",
        }
    }
}

impl TryFrom<u8> for Category {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Category::Student),
            2 => Ok(Category::Faculty),
            3 => Ok(Category::Alumni),
            other => Err(format!(
                "invalid category {}: must be 1 (mahasiswa), 2 (dosen), or 3 (alumni)",
                other
            )),
        }
    }
}

impl From<Category> for u8 {
    fn from(c: Category) -> u8 {
        c.code()
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "student" | "mahasiswa" => Ok(Category::Student),
            "2" | "faculty" | "dosen" => Ok(Category::Faculty),
            "3" | "alumni" => Ok(Category::Alumni),
            other => Err(format!(
                "invalid category '{}': must be 1 (mahasiswa), 2 (dosen), or 3 (alumni)",
                other
            )),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

// ── Query ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub keyword: String,
    pub category: Category,
}

impl SearchQuery {
    pub fn new(keyword: impl Into<String>, category: Category) -> Self {
        Self {
            keyword: keyword.into(),
            category,
        }
    }
}

// ── Detail record ─────────────────────────────────────────────────────────────

/// Label → value fields scraped from one detail page.
///
/// Labels keep the position of their first appearance; inserting an existing
/// label replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailRecord {
    fields: Vec<(String, String)>,
}

impl DetailRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let label = label.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(l, _)| *l == label) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((label, value)),
        }
    }

    #[cfg(test)]
    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(l, v)| (l.as_str(), v.as_str()))
    }
}

impl Serialize for DetailRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (label, value) in &self.fields {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

// ── Search report ─────────────────────────────────────────────────────────────

/// Success envelope printed by the CLI for one search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub keyword: String,
    pub category: Category,
    pub category_description: &'static str,
    pub results: Vec<DetailRecord>,
    pub count: usize,
    pub searched_at: DateTime<Utc>,
}

impl SearchReport {
    pub fn new(query: &SearchQuery, results: Vec<DetailRecord>) -> Self {
        Self {
            keyword: query.keyword.clone(),
            category: query.category,
            category_description: query.category.description(),
            count: results.len(),
            results,
            searched_at: Utc::now(),
        }
    }
}

// ── Contacts ──────────────────────────────────────────────────────────────────

/// Contact export row: columns B, C, D of the student sheet.
#[derive(Debug, Clone, Default)]
pub struct RawContactRow {
    pub nim: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanContact {
    pub nim: String,
    pub email: String,
    pub nama: String,
    pub clean_phone: String,
}
