//! Timestamp parsing and the two fixed renderings used in published output:
//! the article date (`July 26, 2024`) and the error-log stamp.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};

use crate::error::TimestampParseError;

/// Article date layout, e.g. `July 26, 2024`.
pub const DISPLAY_FORMAT: &str = "%B %-d, %Y";
const DISPLAY_PARSE_FORMAT: &str = "%B %d, %Y";

/// Error-log stamp layout, e.g. `Fri Jul 26 09:41:2024`.
pub const LOG_STAMP_FORMAT: &str = "%a %b %-d %H:%M:%Y";

pub const DEFAULT_OFFSET_HOURS: i32 = 8;

type Grammar = fn(&str) -> Option<DateTime<FixedOffset>>;

// Tried in order, first match wins.
const GRAMMARS: [Grammar; 3] = [rfc3339, rfc1123_numeric_zone, rfc1123];

pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, TimestampParseError> {
    GRAMMARS
        .iter()
        .find_map(|grammar| grammar(raw))
        .ok_or_else(|| TimestampParseError(raw.to_string()))
}

/// `2006-01-02T15:04:05Z07:00`, with or without fractional seconds.
fn rfc3339(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).ok()
}

/// `Mon, 02 Jan 2006 15:04:05 -0700`, plus the RFC 2822 named zones (GMT, EST, ...).
fn rfc1123_numeric_zone(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(raw).ok()
}

/// `Mon, 02 Jan 2006 15:04:05 CEST`. Zone abbreviations are not resolved and read as UTC.
fn rfc1123(raw: &str) -> Option<DateTime<FixedOffset>> {
    let (stamp, zone) = raw.rsplit_once(' ')?;
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let naive = NaiveDateTime::parse_from_str(stamp, "%a, %d %b %Y %H:%M:%S").ok()?;
    Some(Utc.fix().from_utc_datetime(&naive))
}

/// Timestamp hook for the feed parser.
///
/// The parser only hands back `DateTime<Utc>`, so the feed's own wall-clock
/// time is carried as if it were UTC. That keeps the rendered calendar date
/// the one the feed author declared.
pub fn wall_clock_utc(raw: &str) -> Option<DateTime<Utc>> {
    parse_timestamp(raw.trim())
        .ok()
        .map(|at| Utc.from_utc_datetime(&at.naive_local()))
}

pub fn format_display<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(DISPLAY_FORMAT).to_string()
}

/// Inverse of [`format_display`], at day precision.
pub fn parse_display(display: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(display, DISPLAY_PARSE_FORMAT).ok()
}

pub fn log_stamp(at: &DateTime<FixedOffset>) -> String {
    at.format(LOG_STAMP_FORMAT).to_string()
}

/// Current time at a fixed UTC offset, whatever the host timezone is.
pub fn now_local(offset_hours: i32) -> DateTime<FixedOffset> {
    Clock::local(offset_hours).now()
}

/// Source of "now". Frozen clocks keep tests deterministic.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    offset: FixedOffset,
    frozen: Option<DateTime<Utc>>,
}

impl Clock {
    pub fn local(offset_hours: i32) -> Self {
        Self {
            offset: fixed_offset(offset_hours),
            frozen: None,
        }
    }

    pub fn frozen(at: DateTime<Utc>, offset_hours: i32) -> Self {
        Self {
            offset: fixed_offset(offset_hours),
            frozen: Some(at),
        }
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.frozen
            .unwrap_or_else(Utc::now)
            .with_timezone(&self.offset)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::local(DEFAULT_OFFSET_HOURS)
    }
}

fn fixed_offset(hours: i32) -> FixedOffset {
    FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| Utc.fix())
}
