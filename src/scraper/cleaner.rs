use crate::models::{CleanContact, RawContactRow};

const STUDENT_MAIL_DOMAIN: &str = "mhs.dinus.ac.id";

// ── Field cleaners ────────────────────────────────────────────────────────────

/// Normalise a phone number to the `62…` international form.
/// "'0812-3456 789" → "628123456789" | "+62 812" → "62812" | "" → ""
pub fn clean_phone(raw: &str) -> String {
    let s = raw.trim();
    let s = s.strip_prefix('\'').unwrap_or(s).trim();

    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return String::new();
    }

    if digits.starts_with("62") {
        digits
    } else if let Some(rest) = digits.strip_prefix('0') {
        format!("62{}", rest)
    } else {
        format!("62{}", digits)
    }
}

/// Student mailbox derived from a NIM.
/// "A11.2020.12345" → "111202012345@mhs.dinus.ac.id"
pub fn nim_to_email(nim: &str) -> String {
    let s = nim.trim();
    let s = match s.strip_prefix("A11") {
        Some(rest) => format!("111{}", rest),
        None => s.to_string(),
    };

    let clean = s.replace('.', "");
    if clean.is_empty() {
        String::new()
    } else {
        format!("{}@{}", clean, STUDENT_MAIL_DOMAIN)
    }
}

// ── Row → CleanContact ────────────────────────────────────────────────────────

/// Cell values are copied as-is; a row is dropped only when all three cells
/// are empty (whitespace counts as content).
pub fn contact_row_to_contact(row: &RawContactRow) -> Option<CleanContact> {
    let nim = row.nim.as_deref().unwrap_or_default();
    let name = row.name.as_deref().unwrap_or_default();
    let phone = row.phone.as_deref().unwrap_or_default();

    if nim.is_empty() && name.is_empty() && phone.is_empty() {
        return None;
    }

    Some(CleanContact {
        nim: nim.to_string(),
        email: nim_to_email(nim),
        nama: name.to_string(),
        clean_phone: clean_phone(phone),
    })
}

pub fn clean_contact_rows(rows: Vec<RawContactRow>) -> Vec<CleanContact> {
    rows.iter().filter_map(contact_row_to_contact).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
