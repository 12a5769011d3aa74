use crate::error::AppError;
use time::format_description::FormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

const DATETIME_SECONDS: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const DATETIME_MINUTES: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");
const DATE_ONLY: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

pub fn format_rfc3339(value: OffsetDateTime) -> Result<String, AppError> {
    value
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

/// Parses a due date given as RFC 3339, `YYYY-MM-DD HH:MM[:SS]` or
/// `YYYY-MM-DD` (midnight). Forms without an offset use `offset`.
pub fn parse_due_date_with_offset(raw: &str, offset: UtcOffset) -> Result<OffsetDateTime, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("dueDate is required"));
    }

    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(parsed);
    }

    for format in [DATETIME_SECONDS, DATETIME_MINUTES] {
        if let Ok(parsed) = PrimitiveDateTime::parse(trimmed, format) {
            return Ok(parsed.assume_offset(offset));
        }
    }

    if let Ok(date) = Date::parse(trimmed, DATE_ONLY) {
        return Ok(PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_offset(offset));
    }

    Err(AppError::validation(
        "dueDate must be RFC3339, YYYY-MM-DD HH:MM[:SS] or YYYY-MM-DD",
    ))
}

pub fn parse_due_date(raw: &str) -> Result<OffsetDateTime, AppError> {
    parse_due_date_with_offset(raw, local_offset())
}
