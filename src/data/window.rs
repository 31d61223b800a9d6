use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::error::{AvailabilityError, Result};

pub const WINDOW_MINUTES: i64 = 40;

/// Half-open wall-clock range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// `None` when the end falls outside the representable date range.
    pub fn starting_at(start: NaiveDateTime) -> Option<Self> {
        let end = start.checked_add_signed(Duration::minutes(WINDOW_MINUTES))?;
        Some(TimeWindow { start, end })
    }

    /// The window of equal width that ends where this one starts.
    pub fn preceding(&self) -> Option<Self> {
        let start = self.start.checked_sub_signed(self.duration())?;
        Some(TimeWindow {
            start,
            end: self.start,
        })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        start < self.end && end > self.start
    }

    pub fn is_covered_by(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        start <= self.start && end >= self.end
    }
}

/// `(main, before)` for a requested start.
pub fn booking_windows(start: NaiveDateTime) -> Result<(TimeWindow, TimeWindow)> {
    let out_of_range =
        || AvailabilityError::Validation(format!("start {} is outside the supported range", start));

    let main = TimeWindow::starting_at(start).ok_or_else(out_of_range)?;
    let before = main.preceding().ok_or_else(out_of_range)?;
    Ok((main, before))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::date::parse_date_time;
    use chrono::NaiveDate;

    #[test]
    fn before_window_ends_at_main_start() {
        for time in ["00:00", "06:15", "10:00", "12:39", "23:59"] {
            let start = parse_date_time("2026-02-03", time).unwrap();
            let (main, before) = booking_windows(start).unwrap();
            assert_eq!(before.end, main.start);
            assert_eq!(main.duration(), Duration::minutes(40));
            assert_eq!(before.duration(), Duration::minutes(40));
        }
    }

    #[test]
    fn before_window_crosses_midnight() {
        let start = parse_date_time("2026-02-03", "00:20").unwrap();
        let (main, before) = booking_windows(start).unwrap();
        assert_eq!(before.start, parse_date_time("2026-02-02", "23:40").unwrap());
        assert_eq!(main.end, parse_date_time("2026-02-03", "01:00").unwrap());
    }

    #[test]
    fn windows_past_the_calendar_range_are_rejected() {
        let last = NaiveDate::MAX.and_hms_opt(23, 30, 0).unwrap();
        assert!(booking_windows(last).unwrap_err().is_validation());

        let first = NaiveDate::MIN.and_hms_opt(0, 10, 0).unwrap();
        assert!(booking_windows(first).unwrap_err().is_validation());
    }

    #[test]
    fn overlap_excludes_touching_edges() {
        let at = |t: &str| parse_date_time("2026-02-03", t).unwrap();
        let window = TimeWindow::starting_at(at("10:00")).unwrap();
        assert!(!window.overlaps(at("09:20"), at("10:00")));
        assert!(!window.overlaps(at("10:40"), at("11:20")));
        assert!(window.overlaps(at("10:20"), at("11:00")));
    }

    #[test]
    fn cover_accepts_equal_and_containing_slots() {
        let at = |t: &str| parse_date_time("2026-02-03", t).unwrap();
        let window = TimeWindow::starting_at(at("10:00")).unwrap();
        assert!(window.is_covered_by(at("10:00"), at("10:40")));
        assert!(window.is_covered_by(at("09:40"), at("11:00")));
        assert!(!window.is_covered_by(at("10:20"), at("11:00")));
    }
}
