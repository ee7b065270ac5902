//! User identity and challenge position.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::onboarding::OnboardingState;

pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// One user of the engine.
///
/// `current_day` is 0 before onboarding finishes, then 1..=challenge length.
/// It is mutated only by onboarding completion (set to 1) and by the
/// lifecycle scheduler (advance/reset) -- never by task logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// External chat identity (transport-specific id or handle).
    pub handle: String,
    pub current_day: u32,
    pub start_date: Option<NaiveDate>,
    /// IANA zone name, e.g. "America/Chicago".
    pub timezone: String,
    pub onboarding_complete: bool,
    pub onboarding_state: Option<OnboardingState>,
    /// Which run at the challenge this is; bumped on every reset so day
    /// numbers are never reused across attempts.
    pub attempt: u32,
    /// Local date of the last rollover transition. Guards the scheduler
    /// against firing twice in the same boundary hour.
    pub last_rollover_date: Option<NaiveDate>,
    /// Set once when the final day is judged complete. Finished users are
    /// excluded from scheduler scans.
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Resolve the user's zone, falling back to UTC on a corrupt zone name
    /// so one bad record cannot knock the user out of scheduling.
    pub fn zone(&self) -> Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            tracing::warn!(user = self.id, zone = %self.timezone, "unparseable timezone, using UTC");
            Tz::UTC
        })
    }

    /// The given instant expressed in the user's local timezone.
    pub fn local_time(&self, now: DateTime<Utc>) -> DateTime<Tz> {
        self.zone().from_utc_datetime(&now.naive_utc())
    }

    /// The user's local calendar date at the given instant.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        self.local_time(now).date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_in(zone: &str) -> User {
        User {
            id: 1,
            handle: "tester".to_string(),
            current_day: 1,
            start_date: None,
            timezone: zone.to_string(),
            onboarding_complete: true,
            onboarding_state: None,
            attempt: 1,
            last_rollover_date: None,
            finished_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn local_time_respects_zone() {
        let user = user_in("America/Chicago");
        // 2026-01-15 11:00 UTC is 05:00 in Chicago (CST, UTC-6).
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 11, 0, 0).unwrap();
        assert_eq!(user.local_time(now).format("%H:%M").to_string(), "05:00");
    }

    #[test]
    fn bad_zone_falls_back_to_utc() {
        let user = user_in("Mars/Olympus_Mons");
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 11, 0, 0).unwrap();
        assert_eq!(user.local_time(now).format("%H:%M").to_string(), "11:00");
    }

    #[test]
    fn local_date_can_differ_from_utc_date() {
        let user = user_in("Pacific/Auckland");
        // 13:00 UTC Jan 15 is already Jan 16 in Auckland (UTC+13 in January).
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 13, 0, 0).unwrap();
        assert_eq!(
            user.local_date(now),
            chrono::NaiveDate::from_ymd_opt(2026, 1, 16).unwrap()
        );
    }
}
