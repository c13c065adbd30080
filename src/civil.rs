//! Wall clock dates for the page footer and the compile stamp.
//!
//! This file is also compiled into `build.rs` to produce the compile date,
//! so it must only depend on `core` and `chrono`.

use chrono::{Datelike, FixedOffset, Month, NaiveDateTime, Timelike};
use core::fmt;

/// Eastern Standard Time, west of UTC. Daylight saving is not applied.
pub const EST_OFFSET_SECS: i32 = 5 * 3600;

/// A calendar date and time of day, already shifted to its timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime(NaiveDateTime);

impl DateTime {
    /// Converts seconds since the Unix epoch into a UTC date.
    /// Returns `None` when the timestamp is out of chrono's range.
    pub fn from_unix(secs: i64) -> Option<DateTime> {
        chrono::DateTime::from_timestamp(secs, 0).map(|dt| DateTime(dt.naive_utc()))
    }

    /// Converts seconds since the Unix epoch into the local time of `offset`.
    pub fn from_unix_at(secs: i64, offset: FixedOffset) -> Option<DateTime> {
        chrono::DateTime::from_timestamp(secs, 0)
            .map(|dt| DateTime(dt.with_timezone(&offset).naive_local()))
    }

    /// Converts seconds since the Unix epoch into EST.
    pub fn from_unix_est(secs: i64) -> Option<DateTime> {
        DateTime::from_unix_at(secs, FixedOffset::west_opt(EST_OFFSET_SECS)?)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    pub fn second(&self) -> u32 {
        self.0.second()
    }

    /// Three letter English month name.
    pub fn month_abbrev(&self) -> &'static str {
        Month::try_from(self.0.month() as u8)
            .map(|month| &month.name()[..3])
            .unwrap_or("???")
    }
}

/// Formats as `Mmm dd yyyy hh:mm:ss`, the day padded with a space.
impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:>2} {} {:02}:{:02}:{:02}",
            self.month_abbrev(),
            self.day(),
            self.year(),
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(dt: &DateTime) -> (i32, u32, u32) {
        (dt.year(), dt.month(), dt.day())
    }

    fn hms(dt: &DateTime) -> (u32, u32, u32) {
        (dt.hour(), dt.minute(), dt.second())
    }

    #[test]
    fn epoch_is_first_of_january_1970() {
        let dt = DateTime::from_unix(0).unwrap();
        assert_eq!(ymd(&dt), (1970, 1, 1));
        assert_eq!(hms(&dt), (0, 0, 0));
    }

    #[test]
    fn leap_day_is_handled() {
        // 2024-02-29T12:34:56Z
        let dt = DateTime::from_unix(1_709_210_096).unwrap();
        assert_eq!(ymd(&dt), (2024, 2, 29));
        assert_eq!(hms(&dt), (12, 34, 56));
    }

    #[test]
    fn century_non_leap_year() {
        // 2100-03-01T00:00:00Z, 2100 is not a leap year
        let dt = DateTime::from_unix(4_107_542_400).unwrap();
        assert_eq!(ymd(&dt), (2100, 3, 1));
    }

    #[test]
    fn negative_timestamps_go_before_the_epoch() {
        let dt = DateTime::from_unix(-1).unwrap();
        assert_eq!(ymd(&dt), (1969, 12, 31));
        assert_eq!(hms(&dt), (23, 59, 59));
    }

    #[test]
    fn out_of_range_timestamp_is_none() {
        assert!(DateTime::from_unix(i64::MAX).is_none());
    }

    #[test]
    fn est_offset_crosses_midnight() {
        // 2026-01-01T03:00:00Z is still New Year's Eve in EST
        let dt = DateTime::from_unix_est(1_767_236_400).unwrap();
        assert_eq!(ymd(&dt), (2025, 12, 31));
        assert_eq!(dt.hour(), 22);
    }

    #[test]
    fn display_pads_day_with_a_space() {
        // 2026-10-06T07:08:09Z
        let dt = DateTime::from_unix(1_791_270_489).unwrap();
        assert_eq!(dt.to_string(), "Oct  6 2026 07:08:09");
    }

    #[test]
    fn every_month_has_an_abbreviation() {
        // 15th of each month of 2025, at noon UTC
        let names: Vec<&str> = [
            1_736_942_400i64, 1_739_620_800, 1_742_040_000, 1_744_718_400,
            1_747_310_400, 1_749_988_800, 1_752_580_800, 1_755_259_200,
            1_757_937_600, 1_760_529_600, 1_763_208_000, 1_765_800_000,
        ]
        .iter()
        .map(|&secs| DateTime::from_unix(secs).unwrap().month_abbrev())
        .collect();
        assert_eq!(
            names,
            ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"]
        );
    }
}
