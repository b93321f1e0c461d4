use crate::error::CliError;
use chrono::{DateTime, NaiveDate, Utc};

/// Parses an RFC3339 timestamp (offset required) into UTC.
pub fn parse_ts(ts: &str, label: &str) -> Result<DateTime<Utc>, CliError> {
    let t = ts.trim();
    if t.is_empty() {
        return Err(CliError::usage(format!("Invalid {}: (empty)", label)));
    }
    DateTime::parse_from_rfc3339(t)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| CliError::usage(format!("Invalid {}: {}", label, ts)))
}

/// Resolves the event timestamp: `--ts` flag, then SHELF_NOW, then the
/// system clock. Streak days are derived from this, so tests pin it.
pub fn resolve_now(cli_ts: Option<&str>) -> Result<DateTime<Utc>, CliError> {
    if let Some(t) = cli_ts {
        return parse_ts(t, "ts");
    }

    if let Ok(t) = std::env::var("SHELF_NOW") {
        let tt = t.trim();
        if !tt.is_empty() {
            return parse_ts(tt, "ts");
        }
    }

    Ok(Utc::now())
}

/// The calendar date an event lands on. Day boundary is UTC; a caller that
/// wants local-midnight semantics passes a local-offset `--ts`.
pub fn date_of(now: DateTime<Utc>) -> NaiveDate {
    now.date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ts_requires_offset() {
        assert!(parse_ts("2024-01-02T10:00:00Z", "ts").is_ok());
        assert!(parse_ts("2024-01-02T10:00:00+05:30", "ts").is_ok());
        assert!(parse_ts("2024-01-02T10:00:00", "ts").is_err());
        assert!(parse_ts("2024-01-02", "ts").is_err());
        assert!(parse_ts("", "ts").is_err());
    }

    #[test]
    fn date_of_normalizes_offsets_to_utc() {
        // 01:30+05:30 is still the previous UTC day
        let now = parse_ts("2024-03-10T01:30:00+05:30", "ts").unwrap();
        assert_eq!(date_of(now), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());

        let now = parse_ts("2024-03-10T23:30:00-02:00", "ts").unwrap();
        assert_eq!(date_of(now), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
    }
}
