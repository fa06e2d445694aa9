//! Time encodings used across annotation sources and the blueprint.
//!
//! Three encodings meet here:
//!
//! - annotation exports carry floating-point seconds,
//! - subtitle tracks carry `H:MM:SS.cc` strings (centisecond precision),
//! - the blueprint carries the canonical `HH:MM:SS.mmm` string.
//!
//! Conversions never clamp. A negative or oversized value survives into the
//! canonical string so the validator can report it; a value too large for a
//! millisecond count is rejected with [`CoreError::InvalidTime`].

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MILLIS_PER_SECOND: i64 = 1_000;
const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;

/// 2^63: the first millisecond count an `i64` cannot hold.
const MILLIS_LIMIT: f64 = 9_223_372_036_854_775_808.0;

// ---------------------------------------------------------------------------
// Raw (source-encoded) times
// ---------------------------------------------------------------------------

/// A time value still in the encoding of the source it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTime {
    /// Seconds as exported by the annotation platform.
    Seconds(f64),
    /// A subtitle-track timestamp such as `0:01:02.50`.
    Subtitle(String),
}

impl RawTime {
    pub fn to_seconds(&self) -> Result<f64, CoreError> {
        match self {
            Self::Seconds(s) => Ok(*s),
            Self::Subtitle(s) => subtitle_time_to_seconds(s),
        }
    }

    pub fn to_canonical(&self) -> Result<String, CoreError> {
        self.to_seconds().and_then(seconds_to_canonical)
    }
}

/// A start/end pair in source encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSpan {
    pub start: RawTime,
    pub end: RawTime,
}

impl RawSpan {
    pub fn from_seconds(start: f64, end: f64) -> Self {
        Self {
            start: RawTime::Seconds(start),
            end: RawTime::Seconds(end),
        }
    }

    pub fn from_subtitle(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: RawTime::Subtitle(start.into()),
            end: RawTime::Subtitle(end.into()),
        }
    }

    /// Both bounds in seconds.
    pub fn seconds(&self) -> Result<(f64, f64), CoreError> {
        Ok((self.start.to_seconds()?, self.end.to_seconds()?))
    }

    /// Both bounds in canonical format.
    pub fn canonical(&self) -> Result<(String, String), CoreError> {
        Ok((self.start.to_canonical()?, self.end.to_canonical()?))
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Parse a subtitle timestamp into seconds.
///
/// Accepts `H:MM:SS.cc`, `M:SS.cc` and bare `SS.cc`. Field ranges are not
/// checked (`0:75:00.00` is 75 minutes); a leading `-` is kept.
pub fn subtitle_time_to_seconds(value: &str) -> Result<f64, CoreError> {
    let trimmed = value.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let parts: Vec<&str> = body.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (parse_whole(value, h)?, parse_whole(value, m)?, *s),
        [m, s] => (0, parse_whole(value, m)?, *s),
        [s] => (0, 0, *s),
        _ => return Err(invalid(value, "expected H:MM:SS.cc")),
    };
    let seconds = parse_seconds(value, seconds)?;

    let total = hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds;
    Ok(if negative { -total } else { total })
}

/// Format seconds as the canonical `HH:MM:SS.mmm` string.
///
/// Rounds to the nearest millisecond. Hours widen past two digits when
/// needed; negative inputs keep their sign. Non-finite values and values
/// whose millisecond count does not fit an `i64` are rejected.
pub fn seconds_to_canonical(seconds: f64) -> Result<String, CoreError> {
    let rounded = (seconds * MILLIS_PER_SECOND as f64).round();
    if !rounded.is_finite() || rounded.abs() >= MILLIS_LIMIT {
        return Err(CoreError::InvalidTime {
            value: seconds.to_string(),
            reason: "not representable as a canonical time",
        });
    }
    let total = rounded as i64;
    let sign = if total < 0 { "-" } else { "" };
    let total = total.unsigned_abs();

    let hours = total / MILLIS_PER_HOUR as u64;
    let minutes = (total % MILLIS_PER_HOUR as u64) / MILLIS_PER_MINUTE as u64;
    let secs = (total % MILLIS_PER_MINUTE as u64) / MILLIS_PER_SECOND as u64;
    let millis = total % MILLIS_PER_SECOND as u64;
    Ok(format!("{sign}{hours:02}:{minutes:02}:{secs:02}.{millis:03}"))
}

/// Parse a canonical `HH:MM:SS.mmm` string back into seconds.
///
/// Strict: exactly three clock fields and exactly three fractional digits.
/// Only strings [`seconds_to_canonical`] can produce are accepted, so hours
/// wider than two digits carry no leading zero and zero has no sign.
pub fn canonical_to_seconds(value: &str) -> Result<f64, CoreError> {
    let (negative, body) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };

    let [h, m, s] = body.split(':').collect::<Vec<_>>()[..] else {
        return Err(invalid(value, "expected HH:MM:SS.mmm"));
    };
    let Some((whole, frac)) = s.split_once('.') else {
        return Err(invalid(value, "missing millisecond field"));
    };
    if h.len() < 2 || m.len() != 2 || whole.len() != 2 || frac.len() != 3 {
        return Err(invalid(value, "expected HH:MM:SS.mmm"));
    }
    if h.len() > 2 && h.starts_with('0') {
        return Err(invalid(value, "hours carry a leading zero"));
    }

    let fields = [
        (h, MILLIS_PER_HOUR),
        (m, MILLIS_PER_MINUTE),
        (whole, MILLIS_PER_SECOND),
        (frac, 1),
    ];
    let mut millis: i64 = 0;
    for (field, unit) in fields {
        millis = i64::try_from(parse_whole(value, field)?)
            .ok()
            .and_then(|n| n.checked_mul(unit))
            .and_then(|n| millis.checked_add(n))
            .ok_or_else(|| invalid(value, "time out of range"))?;
    }
    if negative && millis == 0 {
        return Err(invalid(value, "negative zero"));
    }

    let millis = if negative { -millis } else { millis };
    Ok(millis as f64 / MILLIS_PER_SECOND as f64)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn invalid(value: &str, reason: &'static str) -> CoreError {
    CoreError::InvalidTime {
        value: value.to_string(),
        reason,
    }
}

fn parse_whole(value: &str, field: &str) -> Result<u64, CoreError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(value, "non-numeric clock field"));
    }
    field
        .parse()
        .map_err(|_| invalid(value, "clock field out of range"))
}

fn parse_seconds(value: &str, field: &str) -> Result<f64, CoreError> {
    let (whole, frac) = field.split_once('.').unwrap_or((field, ""));
    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() || !digits_only(whole) || !digits_only(frac) {
        return Err(invalid(value, "non-numeric seconds field"));
    }
    field
        .parse()
        .map_err(|_| invalid(value, "non-numeric seconds field"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    // -- subtitle_time_to_seconds --------------------------------------------

    #[test]
    fn subtitle_full_clock() {
        let secs = subtitle_time_to_seconds("1:02:03.45").unwrap();
        assert!((secs - 3723.45).abs() < 1e-9);
    }

    #[test]
    fn subtitle_centiseconds() {
        assert_eq!(subtitle_time_to_seconds("0:00:01.50").unwrap(), 1.5);
    }

    #[test]
    fn subtitle_minutes_and_bare_seconds() {
        assert_eq!(subtitle_time_to_seconds("2:05.00").unwrap(), 125.0);
        assert_eq!(subtitle_time_to_seconds("7.25").unwrap(), 7.25);
    }

    #[test]
    fn subtitle_out_of_range_fields_are_not_clamped() {
        assert_eq!(subtitle_time_to_seconds("0:75:00.00").unwrap(), 4500.0);
    }

    #[test]
    fn subtitle_negative_keeps_sign() {
        assert_eq!(subtitle_time_to_seconds("-0:00:02.00").unwrap(), -2.0);
    }

    #[test]
    fn subtitle_rejects_garbage() {
        assert_matches!(
            subtitle_time_to_seconds("abc"),
            Err(CoreError::InvalidTime { .. })
        );
        assert!(subtitle_time_to_seconds("").is_err());
        assert!(subtitle_time_to_seconds("1:2:3:4").is_err());
        assert!(subtitle_time_to_seconds("0:00:1e3").is_err());
    }

    // -- seconds_to_canonical ------------------------------------------------

    #[test]
    fn canonical_formats_millis() {
        assert_eq!(seconds_to_canonical(0.0).unwrap(), "00:00:00.000");
        assert_eq!(seconds_to_canonical(3723.456).unwrap(), "01:02:03.456");
    }

    #[test]
    fn canonical_rounds_to_nearest_milli() {
        assert_eq!(seconds_to_canonical(1.0004).unwrap(), "00:00:01.000");
        assert_eq!(seconds_to_canonical(1.0006).unwrap(), "00:00:01.001");
    }

    #[test]
    fn canonical_keeps_negative_sign() {
        assert_eq!(seconds_to_canonical(-1.5).unwrap(), "-00:00:01.500");
        assert_eq!(seconds_to_canonical(-0.0001).unwrap(), "00:00:00.000");
    }

    #[test]
    fn canonical_widens_hours() {
        assert_eq!(seconds_to_canonical(100.0 * 3600.0).unwrap(), "100:00:00.000");
        assert_eq!(
            seconds_to_canonical(1e15).unwrap(),
            "277777777777:46:40.000"
        );
    }

    #[test]
    fn canonical_rejects_unrepresentable_seconds() {
        for seconds in [1e17, -1e17, 1e18, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_matches!(
                seconds_to_canonical(seconds),
                Err(CoreError::InvalidTime { .. }),
                "{} should be rejected",
                seconds
            );
        }
    }

    // -- canonical_to_seconds ------------------------------------------------

    #[test]
    fn canonical_round_trip() {
        for t in [
            "00:00:00.000",
            "00:00:01.500",
            "01:02:03.456",
            "23:59:59.999",
            "-00:00:01.500",
            "100:00:00.001",
        ] {
            let secs = canonical_to_seconds(t).unwrap();
            assert_eq!(seconds_to_canonical(secs).unwrap(), t, "round trip of {t}");
        }
    }

    #[test]
    fn canonical_parse_is_strict() {
        assert!(canonical_to_seconds("0:00:01.50").is_err());
        assert!(canonical_to_seconds("00:00:01").is_err());
        assert!(canonical_to_seconds("00:01.500").is_err());
        assert!(canonical_to_seconds("00:00:0x.500").is_err());
    }

    #[test]
    fn canonical_parse_rejects_non_canonical_spellings() {
        assert!(canonical_to_seconds("001:00:00.000").is_err());
        assert!(canonical_to_seconds("-00:00:00.000").is_err());
        assert_eq!(canonical_to_seconds("00:00:00.000").unwrap(), 0.0);
        assert_eq!(canonical_to_seconds("100:00:00.000").unwrap(), 360_000.0);
    }

    #[test]
    fn canonical_parse_rejects_overflow() {
        assert_matches!(
            canonical_to_seconds("9999999999999:00:00.000"),
            Err(CoreError::InvalidTime { .. })
        );
        assert_matches!(
            canonical_to_seconds("99999999999999999999:00:00.000"),
            Err(CoreError::InvalidTime { .. })
        );
    }

    #[test]
    fn raw_time_rejects_unrepresentable_seconds() {
        let span = RawSpan::from_seconds(-1e17, 0.0);
        assert_matches!(span.canonical(), Err(CoreError::InvalidTime { .. }));
    }

    // -- RawSpan -------------------------------------------------------------

    #[test]
    fn raw_span_subtitle_to_canonical() {
        let span = RawSpan::from_subtitle("0:00:01.50", "0:00:03.25");
        assert_eq!(
            span.canonical().unwrap(),
            ("00:00:01.500".to_string(), "00:00:03.250".to_string())
        );
    }

    #[test]
    fn raw_span_seconds_pass_through() {
        let span = RawSpan::from_seconds(1.25, 2.5);
        assert_eq!(span.seconds().unwrap(), (1.25, 2.5));
    }
}
