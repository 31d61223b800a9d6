use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct CourtLocation {
    pub name: Option<String>,
    pub identifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotOffer {
    pub price: Option<f64>,
}

/// One bookable interval as published by the feed. Only the fields the
/// checker reads are kept; everything else in the record is ignored.
#[derive(Debug, Clone)]
pub struct Slot {
    pub identifier: String,
    /// Last path segment of `facilityUse`
    pub facility_id: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub remaining_uses: u32,
    pub locations: Vec<CourtLocation>,
    pub offers: Vec<SlotOffer>,
}

impl Slot {
    /// Reads a slot out of an item's `data` object. `None` when a field the
    /// checker depends on is missing or unparseable.
    pub fn from_feed_data(data: &Value) -> Option<Slot> {
        let facility_use = data.get("facilityUse").and_then(Value::as_str)?;
        let facility_id = facility_use
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())?
            .to_string();

        let start = data
            .get("startDate")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())?;
        let end = data
            .get("endDate")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())?;

        let remaining_uses = data
            .get("remainingUses")
            .and_then(Value::as_u64)
            .map(|n| n.min(u32::MAX as u64) as u32)
            .unwrap_or(0);

        let locations = data
            .get("beta:sportsActivityLocation")
            .and_then(Value::as_array)
            .map(|list| list.iter().map(CourtLocation::from_feed_value).collect())
            .unwrap_or_default();

        let offers = data
            .get("offers")
            .and_then(Value::as_array)
            .map(|list| list.iter().map(SlotOffer::from_feed_value).collect())
            .unwrap_or_default();

        Some(Slot {
            identifier: data
                .get("identifier")
                .and_then(scalar_to_string)
                .unwrap_or_else(|| "Unknown".to_string()),
            facility_id,
            start,
            end,
            remaining_uses,
            locations,
            offers,
        })
    }

    pub fn is_available(&self) -> bool {
        self.remaining_uses > 0
    }

    pub fn price(&self) -> Option<f64> {
        self.offers.first().and_then(|offer| offer.price)
    }

    /// Wall-clock start in the slot's own offset.
    pub fn local_start(&self) -> NaiveDateTime {
        self.start.naive_local()
    }

    pub fn local_end(&self) -> NaiveDateTime {
        self.end.naive_local()
    }
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.identifier == other.identifier
    }
}

impl Eq for Slot {}

impl PartialOrd for Slot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Slot {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.identifier.cmp(&other.identifier))
    }
}

impl CourtLocation {
    fn from_feed_value(value: &Value) -> Self {
        CourtLocation {
            name: value
                .get("name")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            identifier: value
                .get("identifier")
                .and_then(scalar_to_string)
                .filter(|id| !id.is_empty()),
        }
    }

    pub fn display_name(&self) -> String {
        match (&self.name, &self.identifier) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => format!("Squash Court ({})", id),
            (None, None) => "Squash Court (Unknown)".to_string(),
        }
    }
}

impl SlotOffer {
    fn from_feed_value(value: &Value) -> Self {
        SlotOffer {
            price: value.get("price").and_then(Value::as_f64),
        }
    }
}

/// Feed identifiers show up both as strings and as bare numbers.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn squash_data() -> Value {
        json!({
            "@type": "Slot",
            "identifier": 123456,
            "facilityUse": "https://feed.test/api/facility-uses/041A000005",
            "startDate": "2026-02-03T10:00:00Z",
            "endDate": "2026-02-03T10:40:00Z",
            "remainingUses": 1,
            "maximumUses": 1,
            "offers": [{ "@type": "Offer", "price": 10.25, "priceCurrency": "GBP" }],
            "beta:sportsActivityLocation": [
                { "@type": "Place", "name": "Squash Court 1", "identifier": "041ZSQU001" }
            ],
            "someFutureField": { "nested": true }
        })
    }

    #[test]
    fn reads_known_fields_and_ignores_the_rest() {
        let slot = Slot::from_feed_data(&squash_data()).unwrap();
        assert_eq!(slot.identifier, "123456");
        assert_eq!(slot.facility_id, "041A000005");
        assert_eq!(slot.remaining_uses, 1);
        assert_eq!(slot.price(), Some(10.25));
        assert_eq!(slot.locations[0].display_name(), "Squash Court 1");
        assert_eq!(slot.local_start().to_string(), "2026-02-03 10:00:00");
    }

    #[test]
    fn missing_dates_make_the_record_unusable() {
        let mut data = squash_data();
        data.as_object_mut().unwrap().remove("endDate");
        assert!(Slot::from_feed_data(&data).is_none());

        let mut data = squash_data();
        data["startDate"] = json!("tomorrow");
        assert!(Slot::from_feed_data(&data).is_none());
    }

    #[test]
    fn missing_remaining_uses_counts_as_zero() {
        let mut data = squash_data();
        data.as_object_mut().unwrap().remove("remainingUses");
        let slot = Slot::from_feed_data(&data).unwrap();
        assert!(!slot.is_available());
    }

    #[test]
    fn local_time_keeps_the_feed_offset() {
        let mut data = squash_data();
        data["startDate"] = json!("2026-06-03T10:00:00+01:00");
        data["endDate"] = json!("2026-06-03T10:40:00+01:00");
        let slot = Slot::from_feed_data(&data).unwrap();
        assert_eq!(slot.local_start().to_string(), "2026-06-03 10:00:00");
    }

    #[test]
    fn unnamed_location_falls_back_to_identifier() {
        let location =
            CourtLocation::from_feed_value(&json!({ "name": "", "identifier": "041ZSQU002" }));
        assert_eq!(location.display_name(), "Squash Court (041ZSQU002)");
    }
}
