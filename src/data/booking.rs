use std::collections::BTreeMap;

use log::{error, info};
use serde::Serialize;

use crate::error::{AvailabilityError, Result};
use crate::settings::Settings;
use crate::utils::date::{format_booking_timestamp, parse_date_time};

use super::availability::{
    filter_target_slots, window_availability, CourtAvailability, WindowAvailability,
};
use super::rpde::{fetch_all_slots, HttpPageSource, PageSource};
use super::window::{booking_windows, TimeWindow};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSlots {
    pub main: TimeWindow,
    pub before: TimeWindow,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityReport {
    pub success: bool,
    pub message: String,
    pub main_slot_available: usize,
    pub before_slot_available: usize,
    pub booking_url: String,
    pub main_court_info: Option<BTreeMap<String, CourtAvailability>>,
    pub before_court_info: Option<BTreeMap<String, CourtAvailability>>,
    pub time_slots: TimeSlots,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AvailabilityReport {
    /// Courts the feed lists as free in both windows.
    pub fn courts_free_for_both(&self) -> Vec<&str> {
        match (&self.main_court_info, &self.before_court_info) {
            (Some(main), Some(before)) => main
                .iter()
                .filter(|(name, court)| {
                    court.available && before.get(*name).map(|c| c.available).unwrap_or(false)
                })
                .map(|(name, _)| name.as_str())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Outcome and message for the number of free slots before the booking.
pub fn availability_message(before_available: usize) -> (bool, String) {
    match before_available {
        0 => (false, "There is no slots free before your booking".to_string()),
        1 => (true, "There is one slot free before your booking".to_string()),
        n => (true, format!("There are {} slots free before your booking", n)),
    }
}

pub fn booking_url(settings: &Settings, main: &TimeWindow, before: &TimeWindow) -> String {
    format!(
        "{}?activityDate={}&previousActivityDate={}",
        settings.calendar_url(),
        format_booking_timestamp(&main.start),
        format_booking_timestamp(&before.start)
    )
}

pub struct SquashChecker<S = HttpPageSource> {
    settings: Settings,
    source: S,
}

impl SquashChecker<HttpPageSource> {
    pub fn new(settings: Settings) -> Result<Self> {
        let source = HttpPageSource::new(&settings)?;
        Ok(SquashChecker { settings, source })
    }
}

impl<S: PageSource> SquashChecker<S> {
    pub fn with_source(settings: Settings, source: S) -> Self {
        SquashChecker { settings, source }
    }

    /// Checks the 40 minutes from `start_time` on `date` and the 40 minutes
    /// before. Bad input fails before anything is fetched; feed failures are
    /// returned as errors.
    pub async fn check(&self, date: &str, start_time: &str) -> Result<AvailabilityReport> {
        let start = parse_date_time(date, start_time)?;
        let (main, before) = booking_windows(start)?;

        let walk =
            fetch_all_slots(&self.source, &self.settings.feed_url, self.settings.max_pages).await?;
        let targets = filter_target_slots(&walk.slots, &self.settings);
        info!(
            "{} of {} slots belong to facility {}",
            targets.len(),
            walk.slots.len(),
            self.settings.facility_id
        );

        let main_result = window_availability(&targets, main, self.settings.match_mode);
        let before_result = window_availability(&targets, before, self.settings.match_mode);

        let mut warnings = Vec::new();
        if walk.truncated {
            warnings.push(format!(
                "Feed was cut off after {} pages; availability may be incomplete",
                walk.pages
            ));
        }
        for (label, result) in [("main", &main_result), ("before", &before_result)] {
            if result.is_partial() {
                warnings.push(self.partial_data_note(label, result));
            }
        }

        let (success, message) = availability_message(before_result.available_slots);

        Ok(AvailabilityReport {
            success,
            message,
            main_slot_available: main_result.available_slots,
            before_slot_available: before_result.available_slots,
            booking_url: booking_url(&self.settings, &main, &before),
            main_court_info: main_result.courts,
            before_court_info: before_result.courts,
            time_slots: TimeSlots { main, before },
            warnings,
            error: None,
        })
    }

    /// Like [`check`](Self::check), but a failed fetch comes back as an
    /// unsuccessful report instead of an error. Bad input still fails fast.
    pub async fn check_or_report(
        &self,
        date: &str,
        start_time: &str,
    ) -> Result<AvailabilityReport> {
        let (main, before) = booking_windows(parse_date_time(date, start_time)?)?;

        match self.check(date, start_time).await {
            Ok(report) => Ok(report),
            Err(e) => Ok(failure_report(&self.settings, main, before, &e)),
        }
    }

    fn partial_data_note(&self, label: &str, result: &WindowAvailability) -> String {
        format!(
            "Specific court availability for the {} slot ({} - {}) is not in the feed data; see {}",
            label,
            result.window.start.format("%H:%M"),
            result.window.end.format("%H:%M"),
            self.settings.calendar_url()
        )
    }
}

fn failure_report(
    settings: &Settings,
    main: TimeWindow,
    before: TimeWindow,
    err: &AvailabilityError,
) -> AvailabilityReport {
    error!("availability check failed: {}", err);
    AvailabilityReport {
        success: false,
        message: format!("Error checking availability: {}", err),
        main_slot_available: 0,
        before_slot_available: 0,
        booking_url: settings.calendar_url(),
        main_court_info: None,
        before_court_info: None,
        time_slots: TimeSlots { main, before },
        warnings: Vec::new(),
        error: Some(err.to_string()),
    }
}

/// Checks availability against the live feed with default settings.
pub async fn check_availability(date: &str, start_time: &str) -> Result<AvailabilityReport> {
    check_availability_with(Settings::default(), date, start_time).await
}

pub async fn check_availability_with(
    settings: Settings,
    date: &str,
    start_time: &str,
) -> Result<AvailabilityReport> {
    let (main, before) = booking_windows(parse_date_time(date, start_time)?)?;

    match SquashChecker::new(settings.clone()) {
        Ok(checker) => checker.check_or_report(date, start_time).await,
        Err(e) => Ok(failure_report(&settings, main, before, &e)),
    }
}
