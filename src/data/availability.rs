use std::collections::BTreeMap;

use log::warn;
use serde::Serialize;

use crate::settings::{MatchMode, Settings};

use super::shared_slot::Slot;
use super::window::TimeWindow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotSummary {
    pub start: String,
    pub end: String,
    pub remaining: u32,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourtAvailability {
    pub id: String,
    pub available: bool,
    pub remaining_uses: u32,
    pub slots: Vec<SlotSummary>,
}

/// What the feed says about one checked window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowAvailability {
    pub window: TimeWindow,
    /// Matching slot records with remaining uses.
    pub available_slots: usize,
    /// Per-court breakdown. `None` when at least one matching record covers
    /// several courts at once, so the courts it stands for cannot be told apart.
    pub courts: Option<BTreeMap<String, CourtAvailability>>,
}

impl WindowAvailability {
    pub fn is_partial(&self) -> bool {
        self.courts.is_none()
    }

    pub fn available_court_names(&self) -> Vec<&str> {
        self.courts
            .iter()
            .flat_map(|courts| courts.iter())
            .filter(|(_, court)| court.available)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Keeps slots of the configured facility and court type.
pub fn filter_target_slots<'a>(slots: &'a [Slot], settings: &Settings) -> Vec<&'a Slot> {
    let court_type = settings.court_type.to_lowercase();

    slots
        .iter()
        .filter(|slot| slot.facility_id == settings.facility_id)
        .filter(|slot| {
            slot.locations.is_empty()
                || slot.locations.iter().any(|location| {
                    location
                        .name
                        .as_deref()
                        .map(|name| name.to_lowercase().contains(&court_type))
                        .unwrap_or(false)
                })
        })
        .collect()
}

pub fn slot_matches(slot: &Slot, window: &TimeWindow, mode: MatchMode) -> bool {
    let (start, end) = (slot.local_start(), slot.local_end());
    match mode {
        MatchMode::Cover => window.is_covered_by(start, end),
        MatchMode::Overlap => window.overlaps(start, end),
    }
}

pub fn window_availability(
    slots: &[&Slot],
    window: TimeWindow,
    mode: MatchMode,
) -> WindowAvailability {
    let mut matching: Vec<&Slot> = slots
        .iter()
        .copied()
        .filter(|slot| slot_matches(slot, &window, mode))
        .collect();
    matching.sort();

    let available_slots = matching.iter().filter(|slot| slot.is_available()).count();

    let courts = court_breakdown(&matching);
    if courts.is_none() {
        warn!(
            "feed does not say which court is free for {} - {}, reporting counts only",
            window.start, window.end
        );
    }

    WindowAvailability {
        window,
        available_slots,
        courts,
    }
}

fn court_breakdown(slots: &[&Slot]) -> Option<BTreeMap<String, CourtAvailability>> {
    let mut courts: BTreeMap<String, CourtAvailability> = BTreeMap::new();

    for slot in slots {
        let (name, id) = match slot.locations.as_slice() {
            [] => (
                format!("Squash Court ({})", slot.identifier),
                slot.identifier.clone(),
            ),
            [location] => (
                location.display_name(),
                location
                    .identifier
                    .clone()
                    .unwrap_or_else(|| slot.identifier.clone()),
            ),
            _ => return None,
        };

        let court = courts.entry(name).or_insert_with(|| CourtAvailability {
            id,
            available: false,
            remaining_uses: 0,
            slots: Vec::new(),
        });

        court.remaining_uses = court.remaining_uses.max(slot.remaining_uses);
        court.available |= slot.is_available();
        court.slots.push(SlotSummary {
            start: slot.start.to_rfc3339(),
            end: slot.end.to_rfc3339(),
            remaining: slot.remaining_uses,
            price: slot.price(),
        });
    }

    Some(courts)
}
