use crate::model::{ChallengeUnit, WeeklyChallenge};
use chrono::{DateTime, Duration, Utc};

/// Seeded for every new profile: a week of pages.
pub fn default_challenge(now: DateTime<Utc>) -> WeeklyChallenge {
    WeeklyChallenge {
        id: "weekly_pages_150".to_string(),
        title: "Page Marathon".to_string(),
        description: "Read 150 pages this week.".to_string(),
        target: 150,
        current: 0,
        unit: ChallengeUnit::Pages,
        expires_at: now + Duration::days(7),
        reward_xp: 300,
    }
}

/// Adds `delta` to the challenge counter, but only when the event's unit
/// matches the challenge's. No clamping: progress past the target stays
/// visible as >100%. Expiry is not enforced here.
pub fn accumulate(challenge: &mut WeeklyChallenge, unit: ChallengeUnit, delta: u32) {
    if challenge.unit == unit {
        challenge.current = challenge.current.saturating_add(delta);
    }
}

pub fn is_complete(challenge: &WeeklyChallenge) -> bool {
    challenge.current >= challenge.target
}

pub fn is_expired(challenge: &WeeklyChallenge, now: DateTime<Utc>) -> bool {
    now > challenge.expires_at
}

/// Whole-number percentage, uncapped.
pub fn percent(challenge: &WeeklyChallenge) -> u32 {
    if challenge.target == 0 {
        return 100;
    }
    ((challenge.current as f64 / challenge.target as f64) * 100.0).round() as u32
}
