use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

use squash_availability::report::{render_text, Summary};
use squash_availability::{AvailabilityError, Settings, SquashChecker};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Parser)]
#[command(name = "check-squash-availability")]
#[command(about = "Check squash court availability for a 40-minute slot and the slot before it")]
#[command(version)]
struct Cli {
    /// Target date (YYYY-MM-DD). Defaults to today
    #[arg(long)]
    date: Option<String>,

    /// Start time (HH:MM) of the slot to check
    #[arg(long)]
    start_time: String,

    /// Optional YAML settings file
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Include per-court breakdowns and window boundaries in JSON output
    #[arg(long)]
    detailed: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let result = run(cli).await;
    if let Err(e) = &result {
        eprintln!("ERROR: {}", e);
    }
    ExitCode::from(exit_status(&result))
}

/// 0 for any answer from the feed, 2 for bad input, 1 for everything else.
fn exit_status(result: &Result<(), AvailabilityError>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) if e.is_validation() => 2,
        Err(_) => 1,
    }
}

async fn run(cli: Cli) -> Result<(), AvailabilityError> {
    let settings = match &cli.config {
        Some(path) => Settings::from_yaml(path)?,
        None => Settings::default(),
    };

    let date = cli
        .date
        .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());

    let checker = SquashChecker::new(settings)?;
    let report = checker.check(&date, &cli.start_time).await?;

    let output = match (cli.format, cli.detailed) {
        (OutputFormat::Text, _) => render_text(&report),
        (OutputFormat::Json, true) => to_json(&report)?,
        (OutputFormat::Json, false) => to_json(&Summary::from(&report))?,
    };
    println!("{}", output.trim_end());

    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, AvailabilityError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use squash_availability::data::booking::{AvailabilityReport, TimeSlots};
    use squash_availability::data::window::booking_windows;
    use squash_availability::utils::date::parse_date_time;

    #[test]
    fn exit_status_separates_bad_input_from_failures() {
        assert_eq!(exit_status(&Ok(())), 0);
        assert_eq!(
            exit_status(&Err(AvailabilityError::Validation("bad date".into()))),
            2
        );
        assert_eq!(
            exit_status(&Err(AvailabilityError::Config("missing file".into()))),
            1
        );
    }

    #[test]
    fn start_time_is_required_and_json_is_the_default() {
        let cli =
            Cli::try_parse_from(["check-squash-availability", "--start-time", "10:00"]).unwrap();
        assert_eq!(cli.start_time, "10:00");
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.date.is_none());
        assert!(!cli.detailed);

        let err = Cli::try_parse_from(["check-squash-availability", "--date", "2026-02-03"])
            .err()
            .unwrap();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn default_output_has_exactly_five_fields() {
        let start = parse_date_time("2026-02-03", "10:00").unwrap();
        let (main, before) = booking_windows(start).unwrap();
        let report = AvailabilityReport {
            success: false,
            message: "There is no slots free before your booking".into(),
            main_slot_available: 1,
            before_slot_available: 0,
            booking_url: "https://example.test/book".into(),
            main_court_info: None,
            before_court_info: None,
            time_slots: TimeSlots { main, before },
            warnings: vec!["partial".into()],
            error: None,
        };

        let output: serde_json::Value =
            serde_json::from_str(&to_json(&Summary::from(&report)).unwrap()).unwrap();
        let object = output.as_object().unwrap();

        assert_eq!(object.len(), 5);
        for key in [
            "success",
            "message",
            "main_slot_available",
            "before_slot_available",
            "booking_url",
        ] {
            assert!(object.contains_key(key), "missing {}", key);
        }
        assert_eq!(object["success"], false);
    }
}
