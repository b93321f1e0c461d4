use chrono::NaiveDate;

/// Daily reading streak rule, applied once per progress-applying event.
///
/// Same day: already counted, nothing changes. Previous day: the streak
/// extends. Anything else (a gap of two or more days, or a first-ever
/// read) restarts the streak at 1.
pub fn apply_streak(
    last_read_date: Option<NaiveDate>,
    today: NaiveDate,
    current_streak: u32,
) -> (u32, NaiveDate) {
    match last_read_date {
        Some(last) if last == today => (current_streak, last),
        Some(last) if last.succ_opt() == Some(today) => (current_streak + 1, today),
        _ => (1, today),
    }
}
