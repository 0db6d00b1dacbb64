//! Local-time helpers
//!
//! The committee operates in Israel; "today" and "overdue" are evaluated in
//! Asia/Jerusalem regardless of the server's timezone.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Asia::Jerusalem;

/// Today's calendar date in Israel.
pub fn israel_today() -> NaiveDate {
    israel_date(Utc::now())
}

/// Calendar date of an instant in Israel.
pub fn israel_date(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&Jerusalem).date_naive()
}

/// Wall-clock time in Israel as an instant. Ambiguous times (clocks going
/// back) take the earlier instant; times skipped by DST give `None`.
pub fn israel_to_utc(local: NaiveDateTime) -> Option<DateTime<Utc>> {
    Jerusalem
        .from_local_datetime(&local)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn late_utc_evening_is_next_day_in_israel() {
        // 22:30 UTC is past midnight in Jerusalem (UTC+2/+3)
        let at = Utc.with_ymd_and_hms(2024, 1, 10, 22, 30, 0).unwrap();
        assert_eq!(israel_date(at), NaiveDate::from_ymd_opt(2024, 1, 11).unwrap());
    }

    #[test]
    fn midday_is_same_day() {
        let at = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();
        assert_eq!(israel_date(at), NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
    }

    #[test]
    fn summer_evening_is_utc_plus_three() {
        let local = NaiveDate::from_ymd_opt(2026, 6, 20)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        assert_eq!(
            israel_to_utc(local),
            Some(Utc.with_ymd_and_hms(2026, 6, 20, 15, 0, 0).unwrap())
        );
    }

    #[test]
    fn winter_evening_is_utc_plus_two() {
        let local = NaiveDate::from_ymd_opt(2026, 1, 15)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        assert_eq!(
            israel_to_utc(local),
            Some(Utc.with_ymd_and_hms(2026, 1, 15, 16, 0, 0).unwrap())
        );
    }
}
