use crate::error::CliError;
use crate::model::{Book, BookStatus, Db, Profile};
use chrono::NaiveDate;

pub fn next_book_id(db: &mut Db) -> String {
    let n = db.meta.next_book_number;
    let id = format!("b{:04}", n);
    db.meta.next_book_number = n + 1;
    id
}

pub fn stable_book_sort(a: &Book, b: &Book) -> std::cmp::Ordering {
    let at = a.title.to_lowercase();
    let bt = b.title.to_lowercase();
    match at.cmp(&bt) {
        std::cmp::Ordering::Equal => a.id.cmp(&b.id),
        o => o,
    }
}

pub fn list_books(profile: &Profile, status: Option<BookStatus>) -> Vec<Book> {
    let mut out: Vec<Book> = profile
        .books
        .iter()
        .filter(|b| status.map_or(true, |s| b.status == s))
        .cloned()
        .collect();
    out.sort_by(stable_book_sort);
    out
}

/// Resolves a book selector: exact id (b0001) or unique title prefix
/// (case-insensitive). Ambiguity is an error listing the candidates.
pub fn select_book_index(profile: &Profile, selector: &str) -> Result<usize, CliError> {
    let s = selector.trim();
    if s.is_empty() {
        return Err(CliError::usage("Book selector is required"));
    }

    if s.len() == 5 && s.starts_with('b') && s[1..].chars().all(|c| c.is_ascii_digit()) {
        return profile
            .books
            .iter()
            .position(|b| b.id == s)
            .ok_or_else(|| CliError::not_found(format!("Book not found: {}", selector)));
    }

    let prefix = s.to_lowercase();
    let mut matches: Vec<(usize, Book)> = profile
        .books
        .iter()
        .enumerate()
        .filter(|(_, b)| b.title.to_lowercase().starts_with(&prefix))
        .map(|(i, b)| (i, b.clone()))
        .collect();

    matches.sort_by(|a, b| stable_book_sort(&a.1, &b.1));

    if matches.is_empty() {
        return Err(CliError::not_found(format!(
            "Book not found: {}",
            selector
        )));
    }

    if matches.len() > 1 {
        let candidates = matches
            .iter()
            .map(|(_, b)| format!("{} {}", b.id, b.title))
            .collect::<Vec<String>>()
            .join(", ");
        return Err(CliError::ambiguous(format!(
            "Ambiguous selector '{}'. Candidates: {}",
            selector, candidates
        )));
    }

    Ok(matches[0].0)
}

pub fn make_book(
    id: String,
    title: &str,
    author: &str,
    total_pages: u32,
    genre: Option<&str>,
    today: NaiveDate,
) -> Result<Book, CliError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CliError::usage("Book title is required"));
    }
    if total_pages < 1 {
        return Err(CliError::usage("Invalid page count"));
    }

    Ok(Book {
        id,
        title: title.to_string(),
        author: author.trim().to_string(),
        total_pages,
        current_page: 0,
        status: BookStatus::ToRead,
        genre: genre.map(|g| g.trim().to_string()).filter(|g| !g.is_empty()),
        rating: None,
        review: None,
        added_date: today,
        started_at: None,
        finished_at: None,
    })
}
