//! Contact export loader/writer: CSV or spreadsheet in, cleaned CSV out.

use crate::models::{CleanContact, RawContactRow};
use crate::scraper::cleaner::clean_contact_rows;
use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Reader};
use std::path::Path;
use tracing::{debug, info, warn};

const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

/// Read a headered export and keep columns B, C, D: NIM, name, phone.
/// Spreadsheets are read from their first sheet; anything else is CSV.
pub fn load_contacts(path: &Path) -> Result<Vec<CleanContact>> {
    debug!("Loading contacts from {:?}", path);

    let rows = if is_workbook(path) {
        read_workbook_rows(path)?
    } else {
        read_csv_rows(path)?
    };

    let contacts = clean_contact_rows(rows);
    info!("{:?}: {} contacts loaded", path, contacts.len());
    Ok(contacts)
}

fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| WORKBOOK_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Columns B, C, D of one data row.
fn contact_row(cells: &[String]) -> RawContactRow {
    RawContactRow {
        nim: cells.get(1).cloned(),
        name: cells.get(2).cloned(),
        phone: cells.get(3).cloned(),
    }
}

fn read_csv_rows(path: &Path) -> Result<Vec<RawContactRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {:?}", path))?;

    let mut rows = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Row {} in {:?}: {}", i + 1, path, e);
                continue;
            }
        };

        let cells: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        rows.push(contact_row(&cells));
    }

    Ok(rows)
}

fn read_workbook_rows(path: &Path) -> Result<Vec<RawContactRow>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook {:?}", path))?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .with_context(|| format!("No sheets in {:?}", path))?;
    debug!("Reading sheet {:?}", sheet);

    let range = workbook
        .worksheet_range(&sheet)
        .with_context(|| format!("Failed to read sheet {:?} in {:?}", sheet, path))?;

    // first row is the header
    let rows = range
        .rows()
        .skip(1)
        .map(|row| {
            let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            contact_row(&cells)
        })
        .collect();

    Ok(rows)
}

pub fn write_contacts(path: &Path, contacts: &[CleanContact]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Could not create dir {:?}", parent))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {:?}", path))?;
    for contact in contacts {
        writer.serialize(contact)?;
    }
    writer.flush()?;

    info!("{} contacts written to {:?}", contacts.len(), path);
    Ok(())
}
