//! `calbridge range`.

use calbridge_core::{DateRange, DisplayZone, OutputFormat, RangePreset, parse_date};
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Resolves `args` (a preset name, or two `YYYY-MM-DD` dates) at `now`.
pub fn resolve(zone: &DisplayZone, args: &[String], now: DateTime<Utc>) -> ClientResult<DateRange> {
    match args {
        [] => Ok(zone.resolve(RangePreset::ThisWeek, now)),
        [preset] => Ok(zone.resolve(preset.parse()?, now)),
        [from, to] => Ok(zone.whole_days(parse_date(from)?, parse_date(to)?)?),
        _ => Err(ClientError::Config(
            "expected a preset or <from> <to>".to_string(),
        )),
    }
}

/// Prints the range and the query bounds it produces.
pub fn range(config: &ClientConfig, args: &[String], format: OutputFormat) -> ClientResult<()> {
    let zone = config.display_zone()?;
    let range = resolve(&zone, args, Utc::now())?;

    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "label": range.label(),
                "from": range.from().to_rfc3339(),
                "to": range.to().to_rfc3339(),
                "timeMin": range.time_min(),
                "timeMax": range.time_max(),
                "timezone": zone.to_string(),
            })
        ),
        OutputFormat::Tty => {
            println!("{}", range);
            println!("timeMin: {}", range.time_min());
            println!("timeMax: {}", range.time_max());
        }
    }

    Ok(())
}
