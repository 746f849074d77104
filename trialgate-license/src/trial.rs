//! Trial clock.

use crate::error::{LicenseError, LicenseResult};
use chrono::{DateTime, NaiveDate, Utc};

/// Length of the trial window in days.
pub const DEFAULT_TRIAL_DAYS: i64 = 3;

const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// Parses a first-launch date in `YYYY-MM-DD` form.
///
/// # Errors
///
/// Returns [`LicenseError::DateParse`] for anything else.
pub fn parse_first_launch(date: &str) -> LicenseResult<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| LicenseError::DateParse(date.to_string()))
}

/// Days left in the trial at `now`.
///
/// The trial starts at midnight UTC of `first_launch`. Whole days passed
/// are floored, so a positive result means the trial is still running and
/// anything else means it is over.
#[must_use]
pub fn days_left(first_launch: NaiveDate, trial_days: i64, now: DateTime<Utc>) -> i64 {
    let start = first_launch.and_time(chrono::NaiveTime::MIN).and_utc();
    let days_passed = (now - start).num_seconds().div_euclid(SECS_PER_DAY);
    trial_days.saturating_sub(days_passed)
}
