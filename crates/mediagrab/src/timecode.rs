//! Clip timecodes: plain seconds or `[HH:]MM:SS`, millisecond precision

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{input}' is not a valid time ({reason}); use seconds or HH:MM:SS")]
pub struct ParseTimecodeError {
    input: String,
    reason: &'static str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timecode {
    millis: u64,
}

impl Timecode {
    pub const ZERO: Timecode = Timecode { millis: 0 };

    pub fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self { millis: secs * 1000 }
    }

    pub fn is_zero(&self) -> bool {
        self.millis == 0
    }

    /// `self - earlier`, or `None` if `earlier` is later.
    pub fn checked_sub(self, earlier: Timecode) -> Option<Timecode> {
        self.millis.checked_sub(earlier.millis).map(Timecode::from_millis)
    }

    /// Seconds for FFmpeg `-ss`/`-t`: `135`, `90.5`, `0.042`.
    pub fn to_seconds_arg(&self) -> String {
        let secs = self.millis / 1000;
        let frac = self.millis % 1000;
        if frac == 0 {
            return secs.to_string();
        }
        let frac = format!("{frac:03}");
        format!("{secs}.{}", frac.trim_end_matches('0'))
    }
}

impl FromStr for Timecode {
    type Err = ParseTimecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let fail = |reason| ParseTimecodeError {
            input: s.to_string(),
            reason,
        };

        if input.is_empty() {
            return Err(fail("empty"));
        }

        let parts: Vec<&str> = input.split(':').collect();
        if parts.len() > 3 {
            return Err(fail("too many fields"));
        }

        let (last, leading) = parts.split_last().ok_or_else(|| fail("empty"))?;
        let sec_millis = parse_seconds(last).ok_or_else(|| fail("bad seconds"))?;

        let mut whole = Vec::with_capacity(leading.len());
        for field in leading {
            whole.push(parse_whole(field).ok_or_else(|| fail("bad hours or minutes"))?);
        }

        // Seconds and minutes must stay below 60 once a larger unit is present.
        if !leading.is_empty() && sec_millis >= 60_000 {
            return Err(fail("seconds must be below 60"));
        }
        if whole.len() == 2 && whole[1] >= 60 {
            return Err(fail("minutes must be below 60"));
        }

        let millis = whole
            .iter()
            .try_fold(0u64, |acc, v| acc.checked_mul(60)?.checked_add(*v))
            .and_then(|minutes| minutes.checked_mul(60_000))
            .and_then(|ms| ms.checked_add(sec_millis))
            .ok_or_else(|| fail("out of range"))?;

        Ok(Timecode { millis })
    }
}

fn parse_whole(field: &str) -> Option<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// `SS` or `SS.fff` in milliseconds. Digits past the third decimal are dropped.
fn parse_seconds(field: &str) -> Option<u64> {
    let (int, frac) = match field.split_once('.') {
        Some((int, frac)) => (int, frac),
        None => (field, ""),
    };

    let secs = parse_whole(int)?;
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut ms = 0u64;
    for (i, b) in frac.bytes().take(3).enumerate() {
        ms += u64::from(b - b'0') * 10u64.pow(2 - i as u32);
    }

    secs.checked_mul(1000)?.checked_add(ms)
}

impl fmt::Display for Timecode {
    /// `HH:MM:SS` with `.mmm` when there is a fractional part.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.millis / 1000;
        let (h, m, s) = (total_secs / 3600, (total_secs / 60) % 60, total_secs % 60);
        let ms = self.millis % 1000;
        if ms == 0 {
            write!(f, "{h:02}:{m:02}:{s:02}")
        } else {
            write!(f, "{h:02}:{m:02}:{s:02}.{ms:03}")
        }
    }
}
