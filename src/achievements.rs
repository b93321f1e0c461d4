use crate::model::{AchievementState, BookStatus, Profile};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Reading,
    Streak,
    Diversity,
    Social,
    Collection,
}

/// Threshold rule for one badge. The variant picks the counter, the
/// payload is the target count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    FinishedBooks(u32),
    StreakDays(u32),
    DistinctGenres(u32),
    Reviews(u32),
    CorkUploads(u32),
    CorkFavorites(u32),
}

impl Rule {
    pub fn target_count(&self) -> u32 {
        match *self {
            Rule::FinishedBooks(n)
            | Rule::StreakDays(n)
            | Rule::DistinctGenres(n)
            | Rule::Reviews(n)
            | Rule::CorkUploads(n)
            | Rule::CorkFavorites(n) => n,
        }
    }
}

pub struct AchievementDef {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: Category,
    pub rule: Rule,
}

/// The static badge catalog. Declaration order is evaluation order and the
/// order profiles are seeded in; ids are stable keys into profile state.
pub const CATALOG: &[AchievementDef] = &[
    AchievementDef {
        id: "read_1",
        title: "First Book",
        description: "Finish your first read.",
        icon: "\u{1F331}",
        category: Category::Reading,
        rule: Rule::FinishedBooks(1),
    },
    AchievementDef {
        id: "read_5",
        title: "Steady Reader",
        description: "Finish 5 books.",
        icon: "\u{1F4DA}",
        category: Category::Reading,
        rule: Rule::FinishedBooks(5),
    },
    AchievementDef {
        id: "read_10",
        title: "Bibliophile",
        description: "Finish 10 books.",
        icon: "\u{1F913}",
        category: Category::Reading,
        rule: Rule::FinishedBooks(10),
    },
    AchievementDef {
        id: "read_25",
        title: "Book Devourer",
        description: "Finish 25 books.",
        icon: "\u{1F988}",
        category: Category::Reading,
        rule: Rule::FinishedBooks(25),
    },
    AchievementDef {
        id: "read_50",
        title: "Living Library",
        description: "Finish 50 books.",
        icon: "\u{1F3DB}",
        category: Category::Reading,
        rule: Rule::FinishedBooks(50),
    },
    AchievementDef {
        id: "streak_7",
        title: "On Fire",
        description: "Read 7 days in a row.",
        icon: "\u{1F525}",
        category: Category::Streak,
        rule: Rule::StreakDays(7),
    },
    AchievementDef {
        id: "div_genre_3",
        title: "Explorer",
        description: "Finish books in 3 distinct genres.",
        icon: "\u{1F9ED}",
        category: Category::Diversity,
        rule: Rule::DistinctGenres(3),
    },
    AchievementDef {
        id: "div_genre_5",
        title: "Literary Traveler",
        description: "Finish books in 5 distinct genres.",
        icon: "\u{1F30D}",
        category: Category::Diversity,
        rule: Rule::DistinctGenres(5),
    },
    AchievementDef {
        id: "social_review_1",
        title: "First Review",
        description: "Publish your first review.",
        icon: "\u{270D}",
        category: Category::Social,
        rule: Rule::Reviews(1),
    },
    AchievementDef {
        id: "social_review_10",
        title: "Literary Critic",
        description: "Publish 10 reviews.",
        icon: "\u{1F396}",
        category: Category::Social,
        rule: Rule::Reviews(10),
    },
    AchievementDef {
        id: "cork_upload_1",
        title: "Cork Artist",
        description: "Upload your first illustration.",
        icon: "\u{1F3A8}",
        category: Category::Social,
        rule: Rule::CorkUploads(1),
    },
    AchievementDef {
        id: "cork_fav_5",
        title: "Collector",
        description: "Save 5 favorite illustrations.",
        icon: "\u{1F4CC}",
        category: Category::Collection,
        rule: Rule::CorkFavorites(5),
    },
];

pub fn find_def(id: &str) -> Option<&'static AchievementDef> {
    CATALOG.iter().find(|d| d.id == id)
}

/// Fresh locked state for a new profile, one entry per catalog definition.
pub fn seed_states() -> Vec<AchievementState> {
    CATALOG
        .iter()
        .map(|d| AchievementState {
            id: d.id.to_string(),
            unlocked: false,
            unlocked_at: None,
        })
        .collect()
}

/// Aggregate counters the rules are evaluated against.
struct Counters {
    finished_books: u32,
    streak_days: u32,
    distinct_genres: u32,
    reviews: u32,
    cork_uploads: u32,
    cork_favorites: u32,
}

impl Counters {
    fn of(profile: &Profile) -> Self {
        let finished: Vec<_> = profile
            .books
            .iter()
            .filter(|b| b.status == BookStatus::Finished)
            .collect();

        let genres: BTreeSet<&str> = finished
            .iter()
            .map(|b| b.genre.as_deref().unwrap_or("General"))
            .collect();

        let reviews = finished
            .iter()
            .filter(|b| b.review.as_deref().is_some_and(|r| !r.trim().is_empty()))
            .count() as u32;

        let cork_uploads = profile
            .cork_items
            .iter()
            .filter(|c| c.uploaded_by == profile.username)
            .count() as u32;

        Counters {
            finished_books: finished.len() as u32,
            streak_days: profile.current_streak,
            distinct_genres: genres.len() as u32,
            reviews,
            cork_uploads,
            cork_favorites: profile.cork_favorites.len() as u32,
        }
    }

    fn meets(&self, rule: Rule) -> bool {
        match rule {
            Rule::FinishedBooks(n) => self.finished_books >= n,
            Rule::StreakDays(n) => self.streak_days >= n,
            Rule::DistinctGenres(n) => self.distinct_genres >= n,
            Rule::Reviews(n) => self.reviews >= n,
            Rule::CorkUploads(n) => self.cork_uploads >= n,
            Rule::CorkFavorites(n) => self.cork_favorites >= n,
        }
    }
}

/// Walks the catalog in declaration order and unlocks every still-locked
/// badge whose threshold the profile now meets. Returns the definitions
/// unlocked by this call, in catalog order. Idempotent: a second pass over
/// an unchanged profile unlocks nothing.
pub fn evaluate(profile: &mut Profile, now: DateTime<Utc>) -> Vec<&'static AchievementDef> {
    let counters = Counters::of(profile);
    let mut unlocked = Vec::new();

    for def in CATALOG {
        let state = match profile.achievements.iter_mut().find(|s| s.id == def.id) {
            Some(s) => s,
            None => continue,
        };
        if state.unlocked || !counters.meets(def.rule) {
            continue;
        }
        state.unlocked = true;
        state.unlocked_at = Some(now);
        unlocked.push(def);
    }

    unlocked
}
