use crate::achievements;
use crate::challenge;
use crate::clock::date_of;
use crate::error::CliError;
use crate::level::level_of;
use crate::model::{BookStatus, ChallengeUnit, CorkItem, Profile};
use crate::progress::apply_progress;
use crate::streak::apply_streak;
use chrono::{DateTime, Utc};

/// XP awarded for publishing a review.
const REVIEW_XP: u64 = 100;
/// XP awarded for uploading a cork illustration.
const CORK_UPLOAD_XP: u64 = 20;
/// An existing review longer than this blocks a second one.
const SUBSTANTIVE_REVIEW_LEN: usize = 5;

/// One reading event. Every mutation of a profile goes through exactly one
/// of these, applied atomically by `apply_event`.
#[derive(Debug, Clone)]
pub enum Event {
    PageUpdate {
        book_id: String,
        page: i64,
        status: BookStatus,
    },
    ReviewPublished {
        book_id: String,
        rating: u8,
        text: String,
    },
    CorkUploaded {
        item: CorkItem,
    },
    CorkFavoriteToggled {
        item_id: String,
    },
}

/// Externally observable outcome of an event, for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    LevelUp { new_level: u32 },
    AchievementUnlocked { id: String },
}

/// Applies one event to a profile snapshot and returns the replacement
/// profile plus the effects to render. The input is never mutated; on error
/// the caller's copy is untouched, so an event is all-or-nothing.
pub fn apply_event(
    profile: &Profile,
    event: Event,
    now: DateTime<Utc>,
) -> Result<(Profile, Vec<Effect>), CliError> {
    let mut p = profile.clone();
    let mut effects = Vec::new();

    match event {
        Event::PageUpdate {
            book_id,
            page,
            status,
        } => {
            let idx = find_book(&p, &book_id)?;
            let before = p.books[idx].clone();
            let (updated, xp_gained) = apply_progress(&before, page, status, now);
            let pages_read = updated.current_page.saturating_sub(before.current_page);

            tracing::debug!(
                book = %book_id,
                pages_read,
                xp_gained,
                status = updated.status.as_str(),
                "page update"
            );

            add_xp(&mut p, xp_gained, &mut effects);

            if pages_read > 0 {
                challenge::accumulate(&mut p.active_challenge, ChallengeUnit::Pages, pages_read);
            }

            let today = date_of(now);
            let (new_streak, new_last) = apply_streak(p.last_read_date, today, p.current_streak);
            p.current_streak = new_streak;
            p.longest_streak = p.longest_streak.max(new_streak);
            p.last_read_date = Some(new_last);

            p.books[idx] = updated;
        }

        Event::ReviewPublished {
            book_id,
            rating,
            text,
        } => {
            let idx = find_book(&p, &book_id)?;
            let book = &mut p.books[idx];

            let already_reviewed = book
                .review
                .as_deref()
                .is_some_and(|r| r.trim().len() > SUBSTANTIVE_REVIEW_LEN);
            if already_reviewed {
                return Err(CliError::conflict(format!(
                    "Duplicate review: {} already has one",
                    book.title
                )));
            }

            book.rating = Some(rating);
            book.review = Some(text);
            // Publishing a review finishes the book.
            book.status = BookStatus::Finished;
            book.current_page = book.total_pages;
            if book.finished_at.is_none() {
                book.finished_at = Some(now);
            }

            tracing::debug!(book = %book_id, rating, "review published");
            add_xp(&mut p, REVIEW_XP, &mut effects);
        }

        Event::CorkUploaded { item } => {
            tracing::debug!(item = %item.id, "cork upload");
            p.cork_items.push(item);
            add_xp(&mut p, CORK_UPLOAD_XP, &mut effects);
        }

        Event::CorkFavoriteToggled { item_id } => {
            match p.cork_favorites.iter().position(|id| *id == item_id) {
                Some(i) => {
                    p.cork_favorites.remove(i);
                }
                None => p.cork_favorites.push(item_id),
            }
        }
    }

    for def in achievements::evaluate(&mut p, now) {
        effects.push(Effect::AchievementUnlocked {
            id: def.id.to_string(),
        });
    }

    Ok((p, effects))
}

fn find_book(profile: &Profile, book_id: &str) -> Result<usize, CliError> {
    profile
        .books
        .iter()
        .position(|b| b.id == book_id)
        .ok_or_else(|| CliError::not_found(format!("Book not found: {}", book_id)))
}

fn add_xp(profile: &mut Profile, amount: u64, effects: &mut Vec<Effect>) {
    if amount == 0 {
        return;
    }
    profile.xp += amount;
    let new_level = level_of(profile.xp);
    if new_level > profile.level {
        profile.level = new_level;
        effects.push(Effect::LevelUp { new_level });
    }
}
