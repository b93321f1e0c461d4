use crate::model::{Book, BookStatus};
use chrono::{DateTime, Utc};

/// XP awarded once when a book crosses into Finished.
const FINISH_BONUS_XP: u64 = 100;

/// The book reading state machine. Applies one requested page/status
/// change and returns the updated book plus the XP earned by the
/// transition.
///
/// Out-of-range pages are silently clamped to [0, total_pages]; that is
/// deliberate policy, not an error. Abandoned is accepted as an explicit
/// requested status but never produced by the machine itself.
pub fn apply_progress(
    book: &Book,
    requested_page: i64,
    requested_status: BookStatus,
    now: DateTime<Utc>,
) -> (Book, u64) {
    let total = book.total_pages;
    let mut page = requested_page.clamp(0, total as i64) as u32;
    let mut status = requested_status;
    let mut started = book.started_at;
    let mut finished = book.finished_at;

    // A book cannot stay "to read" once a page has been turned.
    if page > 0 && book.current_page == 0 && started.is_none() {
        started = Some(now);
        status = BookStatus::Reading;
    }

    // Reaching the last page finishes the book no matter what was asked.
    if page == total && status != BookStatus::Finished {
        status = BookStatus::Finished;
    }

    if requested_status == BookStatus::Reading && started.is_none() {
        started = Some(now);
    }

    // Finishing means reading to the end: the page snaps to total_pages
    // so `Finished => current_page == total_pages` holds on every path,
    // including an explicit Finished request at a partial page.
    if status == BookStatus::Finished {
        page = total;
        if finished.is_none() {
            finished = Some(now);
        }
    }

    let pages_read = page.saturating_sub(book.current_page) as u64;
    let finish_bonus = if status == BookStatus::Finished && book.status != BookStatus::Finished {
        FINISH_BONUS_XP
    } else {
        0
    };

    let updated = Book {
        current_page: page,
        status,
        started_at: started,
        finished_at: finished,
        ..book.clone()
    };

    (updated, pages_read + finish_bonus)
}
