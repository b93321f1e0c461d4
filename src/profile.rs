use crate::achievements;
use crate::challenge;
use crate::level::{level_floor, level_of};
use crate::model::{BookStatus, Profile};
use chrono::{DateTime, Datelike, NaiveDate, Utc};

pub fn new_profile(username: &str, now: DateTime<Utc>) -> Profile {
    Profile {
        username: username.to_string(),
        xp: 0,
        level: 1,
        current_streak: 0,
        longest_streak: 0,
        last_read_date: None,
        monthly_goal: 3,
        books: Vec::new(),
        achievements: achievements::seed_states(),
        active_challenge: challenge::default_challenge(now),
        cork_items: Vec::new(),
        cork_favorites: Vec::new(),
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Summary {
    pub username: String,
    pub xp: u64,
    pub level: u32,
    pub level_progress: LevelProgress,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_read_date: Option<NaiveDate>,
    pub monthly_goal: GoalSection,
    pub challenge: ChallengeSection,
    pub achievements: AchievementsSection,
    pub library: LibrarySection,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct LevelProgress {
    /// XP earned since the current level began.
    pub into_level: u64,
    /// XP span of the current level.
    pub span: u64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct GoalSection {
    pub target: u32,
    pub finished_this_month: u32,
    pub percent: u32,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ChallengeSection {
    pub id: String,
    pub title: String,
    pub current: u32,
    pub target: u32,
    pub unit: &'static str,
    pub percent: u32,
    pub complete: bool,
    pub expired: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AchievementsSection {
    pub unlocked: u32,
    pub total: u32,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct LibrarySection {
    pub total: u32,
    pub reading: u32,
    pub finished: u32,
}

/// Builds the `shelf profile` report. "This month" is the calendar month
/// of the event date in UTC, same boundary the streak uses.
pub fn build_summary(profile: &Profile, now: DateTime<Utc>) -> Summary {
    let today = now.date_naive();

    let finished_this_month = profile
        .books
        .iter()
        .filter(|b| {
            b.finished_at.map_or(false, |f| {
                let fd = f.date_naive();
                fd.year() == today.year() && fd.month() == today.month()
            })
        })
        .count() as u32;

    let goal_percent = if profile.monthly_goal == 0 {
        100
    } else {
        ((finished_this_month as f64 / profile.monthly_goal as f64) * 100.0).round() as u32
    };

    let floor = level_floor(profile.level);
    let next = level_floor(profile.level + 1);
    let ch = &profile.active_challenge;

    Summary {
        username: profile.username.clone(),
        xp: profile.xp,
        level: profile.level,
        level_progress: LevelProgress {
            into_level: profile.xp.saturating_sub(floor),
            span: next - floor,
        },
        current_streak: profile.current_streak,
        longest_streak: profile.longest_streak,
        last_read_date: profile.last_read_date,
        monthly_goal: GoalSection {
            target: profile.monthly_goal,
            finished_this_month,
            percent: goal_percent,
        },
        challenge: ChallengeSection {
            id: ch.id.clone(),
            title: ch.title.clone(),
            current: ch.current,
            target: ch.target,
            unit: ch.unit.as_str(),
            percent: challenge::percent(ch),
            complete: challenge::is_complete(ch),
            expired: challenge::is_expired(ch, now),
        },
        achievements: AchievementsSection {
            unlocked: profile.achievements.iter().filter(|a| a.unlocked).count() as u32,
            total: profile.achievements.len() as u32,
        },
        library: LibrarySection {
            total: profile.books.len() as u32,
            reading: profile
                .books
                .iter()
                .filter(|b| b.status == BookStatus::Reading)
                .count() as u32,
            finished: profile
                .books
                .iter()
                .filter(|b| b.status == BookStatus::Finished)
                .count() as u32,
        },
    }
}
