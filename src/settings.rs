use serde::Deserialize;
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use dotenv::dotenv;

use crate::error::{AvailabilityError, Result};

pub const DEFAULT_FEED_URL: &str =
    "https://opendata.leisurecloud.live/api/feeds/PlacesLeisure-live-slots";
pub const DEFAULT_BOOKING_URL_BASE: &str = "https://placesleisure.gladstonego.cloud/book/calendar";
/// Alfreton Leisure Centre squash
pub const DEFAULT_FACILITY_ID: &str = "041A000005";

/// How a slot's interval is compared against a checked window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Slot equals or fully contains the window.
    #[default]
    Cover,
    /// Slot intersects the window at all.
    Overlap,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Settings {
    pub feed_url: String,
    /// Facility-use identifier, the last path segment of a slot's `facilityUse`
    pub facility_id: String,
    /// Matched case-insensitively against the slot's location names
    pub court_type: String,
    pub booking_url_base: String,
    /// Hard ceiling on followed feed pages
    pub max_pages: usize,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub match_mode: MatchMode,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            feed_url: DEFAULT_FEED_URL.to_string(),
            facility_id: DEFAULT_FACILITY_ID.to_string(),
            court_type: "Squash".to_string(),
            booking_url_base: DEFAULT_BOOKING_URL_BASE.to_string(),
            max_pages: 1000,
            request_timeout_secs: 30,
            user_agent: "SquashCourtChecker/1.0".to_string(),
            match_mode: MatchMode::Cover,
        }
    }
}

impl Settings {
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        dotenv().ok();

        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| {
            AvailabilityError::Config(format!("cannot open '{}': {}", path.display(), e))
        })?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(|e| {
            AvailabilityError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;

        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let mut settings: Settings = serde_yaml::from_str(contents)
            .map_err(|e| AvailabilityError::Config(format!("invalid settings: {}", e)))?;

        settings.feed_url = parse_env_var(&settings.feed_url)?;
        settings.facility_id = parse_env_var(&settings.facility_id)?;
        settings.court_type = parse_env_var(&settings.court_type)?;
        settings.booking_url_base = parse_env_var(&settings.booking_url_base)?;
        settings.user_agent = parse_env_var(&settings.user_agent)?;

        if settings.max_pages == 0 {
            return Err(AvailabilityError::Config("max_pages must be at least 1".into()));
        }

        Ok(settings)
    }

    /// Calendar page for the facility without any date parameters.
    pub fn calendar_url(&self) -> String {
        format!(
            "{}/{}",
            self.booking_url_base.trim_end_matches('/'),
            urlencoding::encode(&self.facility_id)
        )
    }
}

fn parse_env_var(value: &str) -> Result<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let env_name = &value[2..value.len() - 1];
        match env::var(env_name) {
            Ok(val) => Ok(val),
            Err(_) => Err(AvailabilityError::Config(format!(
                "Environment variable '{}' not found",
                env_name
            ))),
        }
    } else {
        Ok(value.to_string())
    }
}
