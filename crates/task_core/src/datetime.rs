use crate::error::AppError;
use time::format_description::FormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

const DEADLINE_FORMAT: &[FormatItem<'static>] = format_description!("[day]-[month]-[year]");
const DEADLINE_INPUT_FORMAT: &[FormatItem<'static>] =
    format_description!("[day padding:none]-[month padding:none]-[year]");
const STAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]");
const ISO_LOCAL_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
);
const MINUTE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");
const SECOND_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Current local wall-clock time as `YYYY-MM-DDTHH:MM:SS.ffffff`, the
/// layout every writer of the data file uses. Falls back to UTC when the
/// local offset cannot be determined.
pub fn now_timestamp() -> Result<String, AppError> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(STAMP_FORMAT)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

/// Validates a `D-M-YYYY` deadline and returns it zero-padded.
pub fn parse_deadline(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("deadline is required"));
    }

    let date = Date::parse(trimmed, DEADLINE_INPUT_FORMAT)
        .map_err(|_| AppError::invalid_input("deadline must be DD-MM-YYYY"))?;
    date.format(DEADLINE_FORMAT)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn display_minutes(timestamp: &str) -> String {
    display_with(timestamp, MINUTE_FORMAT)
}

pub fn display_seconds(timestamp: &str) -> String {
    display_with(timestamp, SECOND_FORMAT)
}

// Files written by other front-ends carry offset-less local timestamps;
// anything unrecognised is shown as stored.
fn display_with(timestamp: &str, format: &[FormatItem<'_>]) -> String {
    let local_offset = local_offset();
    let parsed = OffsetDateTime::parse(timestamp, &Rfc3339)
        .map(|value| value.to_offset(local_offset))
        .or_else(|_| {
            PrimitiveDateTime::parse(timestamp, ISO_LOCAL_FORMAT)
                .map(|value| value.assume_offset(local_offset))
        });

    match parsed {
        Ok(value) => value
            .format(format)
            .unwrap_or_else(|_| timestamp.to_string()),
        Err(_) => timestamp.to_string(),
    }
}

fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}
