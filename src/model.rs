use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Db {
    pub version: u32,
    pub meta: Meta,
    pub profile: Profile,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Meta {
    pub next_book_number: u32,
    pub next_cork_number: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    ToRead,
    Reading,
    Finished,
    Abandoned,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::ToRead => "to_read",
            BookStatus::Reading => "reading",
            BookStatus::Finished => "finished",
            BookStatus::Abandoned => "abandoned",
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    /// Immutable once set; always >= 1.
    pub total_pages: u32,
    /// Invariant: 0 <= current_page <= total_pages.
    pub current_page: u32,
    pub status: BookStatus,
    pub genre: Option<String>,
    /// 1-5, set only when a review is published.
    pub rating: Option<u8>,
    pub review: Option<String>,
    pub added_date: NaiveDate,
    /// Set once, never cleared.
    pub started_at: Option<DateTime<Utc>>,
    /// Set once, never cleared.
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Profile {
    pub username: String,
    /// Monotonically non-decreasing.
    pub xp: u64,
    /// Stored, not recomputed on read; never decreases.
    pub level: u32,
    pub current_streak: u32,
    /// Invariant: longest_streak >= current_streak.
    pub longest_streak: u32,
    /// None = never read.
    pub last_read_date: Option<NaiveDate>,
    /// Books to finish per calendar month; >= 1.
    pub monthly_goal: u32,
    pub books: Vec<Book>,
    /// One entry per catalog definition, seeded at profile creation.
    /// The list never gains or loses entries afterwards.
    pub achievements: Vec<AchievementState>,
    pub active_challenge: WeeklyChallenge,
    pub cork_items: Vec<CorkItem>,
    pub cork_favorites: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AchievementState {
    pub id: String,
    /// One-way: false -> true only.
    pub unlocked: bool,
    /// Set exactly once, on the unlock transition.
    pub unlocked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeUnit {
    Pages,
    Books,
    Reviews,
    Days,
}

impl ChallengeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeUnit::Pages => "pages",
            ChallengeUnit::Books => "books",
            ChallengeUnit::Reviews => "reviews",
            ChallengeUnit::Days => "days",
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct WeeklyChallenge {
    pub id: String,
    pub title: String,
    pub description: String,
    pub target: u32,
    /// Accumulates only for the matching unit; never clamped to target,
    /// so >100% progress stays visible.
    pub current: u32,
    pub unit: ChallengeUnit,
    pub expires_at: DateTime<Utc>,
    pub reward_xp: u32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CorkItem {
    pub id: String,
    pub image_url: String,
    /// Username of the uploader; the upload achievement counts items
    /// whose uploader matches the profile's own username.
    pub uploaded_by: String,
    pub book_title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub uploaded_at: DateTime<Utc>,
}

pub fn default_db(now: DateTime<Utc>) -> Db {
    Db {
        version: 1,
        meta: Meta {
            next_book_number: 1,
            next_cork_number: 1,
        },
        profile: crate::profile::new_profile("reader", now),
    }
}
