use crate::error::CliError;
use crate::model::{CorkItem, Db};
use chrono::{DateTime, Utc};

pub fn next_cork_id(db: &mut Db) -> String {
    let n = db.meta.next_cork_number;
    let id = format!("k{:04}", n);
    db.meta.next_cork_number = n + 1;
    id
}

/// Comma-separated tag list, trimmed, empties dropped.
pub fn parse_tags(raw: Option<&str>) -> Vec<String> {
    match raw {
        None => Vec::new(),
        Some(s) => s
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
    }
}

pub fn make_cork_item(
    id: String,
    image_url: &str,
    uploaded_by: &str,
    book_title: Option<&str>,
    description: Option<&str>,
    tags: Option<&str>,
    now: DateTime<Utc>,
) -> Result<CorkItem, CliError> {
    let image_url = image_url.trim();
    if image_url.is_empty() {
        return Err(CliError::usage("Image URL is required"));
    }

    Ok(CorkItem {
        id,
        image_url: image_url.to_string(),
        uploaded_by: uploaded_by.to_string(),
        book_title: book_title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
        description: description.map(|d| d.to_string()),
        tags: parse_tags(tags),
        uploaded_at: now,
    })
}
