pub mod data;
pub mod error;
pub mod report;
pub mod settings;
pub mod utils;

pub use data::booking::{
    check_availability, check_availability_with, AvailabilityReport, SquashChecker,
};
pub use error::AvailabilityError;
pub use settings::Settings;
