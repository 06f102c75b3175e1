//! Pace encodings and zero-safe pace/speed conversion
//!
//! Sources encode pace two ways: a "minutes:seconds" string (spreadsheet
//! exports) and a decimal where the fractional part is seconds over 100,
//! so 7.30 means 7 minutes 30 seconds, not 7.3 minutes. Everything in this
//! crate works in true decimal minutes per kilometer; this module owns the
//! conversions in and out of that form.
//!
//! Undefined pace (a row with zero recorded speed) is `None`, never a NaN
//! or an infinity. Converters in both directions refuse to divide by zero.

use crate::error::FeedError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Parse a "minutes:seconds" pace token into decimal minutes per kilometer.
///
/// `"7:30"` parses to `7.5`. Seconds must be below 60; anything else is a
/// malformed value the loader should drop.
pub fn from_min_sec(raw: &str) -> Result<Decimal, FeedError> {
    let invalid = || FeedError::InvalidPace {
        value: raw.to_string(),
    };

    let (min_part, sec_part) = raw.trim().split_once(':').ok_or_else(invalid)?;
    let minutes: u32 = min_part.trim().parse().map_err(|_| invalid())?;
    let seconds: u32 = sec_part.trim().parse().map_err(|_| invalid())?;
    if seconds >= 60 {
        return Err(invalid());
    }

    Ok(Decimal::from(minutes) + Decimal::from(seconds) / dec!(60))
}

/// Decode a centi-minute pace value into decimal minutes per kilometer.
///
/// The fractional part carries seconds over 100: `7.30` decodes to `7.5`.
pub fn from_centi_minutes(encoded: Decimal) -> Decimal {
    let minutes = encoded.trunc();
    let seconds = (encoded - minutes) * dec!(100);
    minutes + seconds / dec!(60)
}

/// Derive pace (min/km) from speed (m/s). Zero or negative speed has no
/// finite pace and yields `None`.
pub fn from_speed(speed_m_per_s: Decimal) -> Option<Decimal> {
    if speed_m_per_s <= Decimal::ZERO {
        return None;
    }
    Some(dec!(1000) / (speed_m_per_s * dec!(60)))
}

/// Derive speed (m/s) from pace (min/km). Zero or negative pace yields
/// `None` rather than an infinite speed.
pub fn to_speed(pace_min_per_km: Decimal) -> Option<Decimal> {
    if pace_min_per_km <= Decimal::ZERO {
        return None;
    }
    Some(dec!(1000) / (pace_min_per_km * dec!(60)))
}

/// Render decimal minutes as a "minutes:seconds" token, rounding to the
/// nearest whole second. `7.5` renders as `"7:30"`.
pub fn format_min_sec(pace: Decimal) -> String {
    let total_seconds = (pace * dec!(60)).round().to_i64().unwrap_or(0).max(0);
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Render an optional pace, using the conventional "inf" marker for rows
/// whose speed was zero.
pub fn format_pace(pace: Option<Decimal>) -> String {
    match pace {
        Some(p) => format_min_sec(p),
        None => "inf".to_string(),
    }
}
