//! Fingerprint composition: canonical match keys derived from a trigger's
//! room, time bucket, day class, active conditional flags and interaction kind.

use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDateTime, Timelike};
use regex::Regex;
use std::sync::OnceLock;

fn room_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

fn flag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

fn bucket_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{2}[-:]\d{2}(-\d{2}[-:]\d{2})?$").unwrap())
}

pub fn is_valid_room(room: &str) -> bool {
    !room.is_empty() && room_re().is_match(room)
}

pub fn is_valid_flag(flag: &str) -> bool {
    !flag.is_empty() && flag_re().is_match(flag)
}

pub fn is_valid_time_bucket(bucket: &str) -> bool {
    !bucket.is_empty() && bucket_re().is_match(bucket)
}

/// Injectable source of "now", so the builder and its callers are testable
/// without depending on the system clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// A clock fixed to a single instant, used in tests and the simulation endpoint.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Discretize `t` into a time-bucket string per `bucket_minutes`.
///
/// `60` yields `HH-HH` buckets, `30`/`15` yield quarter/half-hour `HH:MM-HH:MM`
/// buckets, and any other positive divisor falls back to the general index
/// computation.
pub fn time_bucket(t: NaiveDateTime, bucket_minutes: u32) -> Result<String> {
    if bucket_minutes == 0 {
        return Err(Error::InvalidInput(
            "time_bucket_minutes must be positive".into(),
        ));
    }
    let hour = t.hour();
    let minute = t.minute();

    match bucket_minutes {
        60 => {
            let next_hour = (hour + 1) % 24;
            Ok(format!("{hour:02}-{next_hour:02}"))
        }
        30 => {
            let (start_min, end_min, end_hour) = if minute < 30 {
                (0, 30, hour)
            } else {
                (30, 0, (hour + 1) % 24)
            };
            Ok(format!("{hour:02}:{start_min:02}-{end_hour:02}:{end_min:02}"))
        }
        15 => {
            let bucket_start = (minute / 15) * 15;
            let mut bucket_end = bucket_start + 15;
            let mut end_hour = hour;
            if bucket_end == 60 {
                bucket_end = 0;
                end_hour = (hour + 1) % 24;
            }
            Ok(format!("{hour:02}:{bucket_start:02}-{end_hour:02}:{bucket_end:02}"))
        }
        n => {
            let total_minutes = hour * 60 + minute;
            let index = total_minutes / n;
            let start = index * n;
            let end = start + n;
            let (start_hour, start_min) = (start / 60 % 24, start % 60);
            let (end_hour, end_min) = (end / 60 % 24, end % 60);
            Ok(format!(
                "{start_hour:02}:{start_min:02}-{end_hour:02}:{end_min:02}"
            ))
        }
    }
}

/// Monday = 0 … Sunday = 6; weekday index >= 5 is a weekend.
pub fn day_type(t: NaiveDateTime) -> &'static str {
    if t.weekday().num_days_from_monday() >= 5 {
        "weekend"
    } else {
        "weekday"
    }
}

/// A fingerprint broken into its named components, independent of the
/// canonical string form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FingerprintParts {
    pub room: String,
    pub time_bucket: String,
    pub day_type: String,
    pub flags: Vec<String>,
    pub interaction_type: String,
}

/// Compose the canonical `|`-joined fingerprint string.
///
/// Flags are sorted lexicographically before joining with `+`. Trailing
/// empty components are dropped; interior empty components (a flags
/// segment present while day_type is empty, say) are preserved so the
/// string still parses back into the same positional components.
pub fn build(parts: &FingerprintParts) -> Result<String> {
    if !is_valid_room(&parts.room) {
        return Err(Error::InvalidInput(format!(
            "invalid room identifier: {:?}",
            parts.room
        )));
    }
    if !is_valid_time_bucket(&parts.time_bucket) {
        return Err(Error::InvalidInput(format!(
            "invalid time bucket: {:?}",
            parts.time_bucket
        )));
    }
    for flag in &parts.flags {
        if !is_valid_flag(flag) {
            return Err(Error::InvalidInput(format!("invalid flag: {flag:?}")));
        }
    }
    if !parts.interaction_type.is_empty() && !is_valid_flag(&parts.interaction_type) {
        return Err(Error::InvalidInput(format!(
            "invalid interaction type: {:?}",
            parts.interaction_type
        )));
    }

    let mut sorted_flags = parts.flags.clone();
    sorted_flags.sort();
    let flags_str = sorted_flags.join("+");

    let mut segments = vec![
        parts.room.clone(),
        parts.time_bucket.clone(),
        parts.day_type.clone(),
        flags_str,
        parts.interaction_type.clone(),
    ];

    // Drop trailing empty segments, but never below the mandatory room|bucket pair.
    while segments.len() > 2 && segments.last().map(|s| s.is_empty()).unwrap_or(false) {
        segments.pop();
    }

    Ok(segments.join("|"))
}

/// Parse a canonical fingerprint string back into its named components.
///
/// Purely positional, mirroring the ABNF grammar: `room|bucket[|day[|flags[|interaction]]]`.
pub fn parse(fingerprint: &str) -> FingerprintParts {
    let parts: Vec<&str> = fingerprint.split('|').collect();
    FingerprintParts {
        room: parts.first().copied().unwrap_or("").to_string(),
        time_bucket: parts.get(1).copied().unwrap_or("").to_string(),
        day_type: parts.get(2).copied().unwrap_or("").to_string(),
        flags: parts
            .get(3)
            .filter(|s| !s.is_empty())
            .map(|s| s.split('+').map(str::to_string).collect())
            .unwrap_or_default(),
        interaction_type: parts.get(4).copied().unwrap_or("").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        // Wednesday 2024-01-03.
        NaiveDate::from_ymd_opt(2024, 1, 3)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn hour_bucket_wraps_at_midnight() {
        assert_eq!(time_bucket(dt(23, 30), 60).unwrap(), "23-00");
    }

    #[test]
    fn quarter_bucket_near_the_hour() {
        assert_eq!(time_bucket(dt(13, 59), 15).unwrap(), "13:45-14:00");
    }

    #[test]
    fn day_type_boundaries() {
        let saturday = NaiveDate::from_ymd_opt(2024, 1, 6)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let friday = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        assert_eq!(day_type(saturday), "weekend");
        assert_eq!(day_type(friday), "weekday");
    }

    #[test]
    fn empty_flags_yield_no_plus_and_no_dangling_pipe() {
        let parts = FingerprintParts {
            room: "kitchen".into(),
            time_bucket: "08-09".into(),
            day_type: String::new(),
            flags: vec![],
            interaction_type: String::new(),
        };
        assert_eq!(build(&parts).unwrap(), "kitchen|08-09");
    }

    #[test]
    fn flag_order_does_not_affect_canonical_form() {
        let mut a = FingerprintParts {
            room: "kitchen".into(),
            time_bucket: "08-09".into(),
            day_type: "weekday".into(),
            flags: vec!["zeta".into(), "alpha".into()],
            interaction_type: "single_press".into(),
        };
        let fp_a = build(&a).unwrap();
        a.flags = vec!["alpha".into(), "zeta".into()];
        let fp_b = build(&a).unwrap();
        assert_eq!(fp_a, fp_b);
        assert_eq!(fp_a, "kitchen|08-09|weekday|alpha+zeta|single_press");
    }

    #[test]
    fn interior_empty_segment_is_preserved() {
        let parts = FingerprintParts {
            room: "kitchen".into(),
            time_bucket: "08-09".into(),
            day_type: String::new(),
            flags: vec!["guest_mode".into()],
            interaction_type: String::new(),
        };
        assert_eq!(build(&parts).unwrap(), "kitchen|08-09||guest_mode");
    }

    #[test]
    fn round_trips_through_parse_and_build() {
        let original = "kitchen|08-09||guest_mode";
        let parsed = parse(original);
        assert_eq!(build(&parsed).unwrap(), original);
    }

    #[test]
    fn rejects_invalid_room() {
        let parts = FingerprintParts {
            room: "2kitchen".into(),
            time_bucket: "08-09".into(),
            ..Default::default()
        };
        assert!(build(&parts).is_err());
    }
}
