use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::data::availability::CourtAvailability;
use crate::data::booking::AvailabilityReport;
use crate::data::window::TimeWindow;

/// The object printed by the CLI in its default mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub success: bool,
    pub message: String,
    pub main_slot_available: usize,
    pub before_slot_available: usize,
    pub booking_url: String,
}

impl From<&AvailabilityReport> for Summary {
    fn from(report: &AvailabilityReport) -> Self {
        Summary {
            success: report.success,
            message: report.message.clone(),
            main_slot_available: report.main_slot_available,
            before_slot_available: report.before_slot_available,
            booking_url: report.booking_url.clone(),
        }
    }
}

/// Human-readable report, one section per window.
pub struct TextReport<'a>(pub &'a AvailabilityReport);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let rule = "=".repeat(60);

        writeln!(f, "{}", rule)?;
        writeln!(f, "SQUASH COURT AVAILABILITY REPORT")?;
        writeln!(f, "{}", rule)?;

        write_window(
            f,
            "Main Slot",
            &report.time_slots.main,
            report.main_slot_available,
            report.main_court_info.as_ref(),
        )?;
        write_window(
            f,
            "Before Slot",
            &report.time_slots.before,
            report.before_slot_available,
            report.before_court_info.as_ref(),
        )?;

        writeln!(f, "\nSQUASH COURTS AVAILABLE FOR BOTH SLOTS:")?;
        writeln!(f, "{}", "-".repeat(40))?;
        let both = report.courts_free_for_both();
        if both.is_empty() {
            writeln!(f, "  No squash courts available for both time slots.")?;
        } else {
            for court in both {
                writeln!(f, "  {}", court)?;
            }
        }

        if !report.warnings.is_empty() {
            writeln!(f, "\nNOTES:")?;
            for warning in &report.warnings {
                writeln!(f, "  {}", warning)?;
            }
        }

        writeln!(f, "\n{}", report.message)?;
        writeln!(f, "Book: {}", report.booking_url)?;
        writeln!(f, "{}", rule)
    }
}

pub fn render_text(report: &AvailabilityReport) -> String {
    TextReport(report).to_string()
}

fn write_window(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    window: &TimeWindow,
    available_slots: usize,
    courts: Option<&BTreeMap<String, CourtAvailability>>,
) -> fmt::Result {
    writeln!(
        f,
        "\n{} ({}-{}):",
        title,
        window.start.format("%H:%M"),
        window.end.format("%H:%M")
    )?;
    writeln!(f, "{}", "-".repeat(40))?;

    let Some(courts) = courts else {
        writeln!(f, "  {} slot(s) with remaining uses", available_slots)?;
        return writeln!(f, "  Specific court availability not available in feed data");
    };

    let (free, booked): (Vec<_>, Vec<_>) =
        courts.iter().partition(|(_, court)| court.available);

    if !free.is_empty() {
        writeln!(f, "AVAILABLE SQUASH COURTS ({}):", free.len())?;
        for (name, court) in &free {
            writeln!(f, "  • {} - {} slots available", name, court.remaining_uses)?;
        }
    }
    if !booked.is_empty() {
        writeln!(f, "UNAVAILABLE SQUASH COURTS ({}):", booked.len())?;
        for (name, _) in &booked {
            writeln!(f, "  • {} - Fully booked", name)?;
        }
    }
    if courts.is_empty() {
        writeln!(f, "  No squash slots published for this time")?;
    }

    Ok(())
}
