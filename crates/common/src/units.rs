//! CSS units: pixel lengths and time values.

use crate::error::{HeroError, HeroResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// An absolute length in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Px(pub f32);

impl Px {
    pub const ZERO: Px = Px(0.0);

    #[inline]
    pub fn get(self) -> f32 {
        self.0
    }

    /// Parse a `<number>px` value (a bare number is accepted as pixels).
    pub fn parse(value: &str) -> Option<Px> {
        let value = value.trim();
        let number = value.strip_suffix("px").unwrap_or(value).trim_end();
        number.parse::<f32>().ok().filter(|v| v.is_finite()).map(Px)
    }
}

impl fmt::Display for Px {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px", self.0)
    }
}

/// CSS time value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Time {
    Seconds(f32),
    Milliseconds(f32),
}

impl Time {
    /// Parse a time string of the form `<digits/dots> [s|ms]`.
    ///
    /// Seconds keep their fraction; milliseconds (and unit-less numbers)
    /// keep only their integer part, so `"1.5s"` is 1500ms while `"1.5ms"`
    /// and `"1.5"` are both 1ms.
    pub fn parse(input: &str) -> HeroResult<Time> {
        let trimmed = input.trim();
        let digits_end = trimmed
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(trimmed.len());
        let (number, rest) = trimmed.split_at(digits_end);
        if number.is_empty() {
            return Err(HeroError::duration(input));
        }

        match rest.trim_start() {
            "s" => leading_float(number)
                .map(Time::Seconds)
                .ok_or_else(|| HeroError::duration(input)),
            "ms" | "" => leading_integer(number)
                .map(|ms| Time::Milliseconds(ms as f32))
                .ok_or_else(|| HeroError::duration(input)),
            _ => Err(HeroError::duration(input)),
        }
    }

    /// Milliseconds as a time value.
    pub fn from_millis(ms: f32) -> Time {
        Time::Milliseconds(ms)
    }

    pub fn to_milliseconds(&self) -> f32 {
        match self {
            Time::Seconds(v) => v * 1000.0,
            Time::Milliseconds(v) => *v,
        }
    }

    /// Convert to a `Duration`, clamping negative values to zero.
    pub fn to_duration(&self) -> Duration {
        let ms = f64::from(self.to_milliseconds().max(0.0));
        Duration::from_micros((ms * 1000.0).round() as u64)
    }
}

impl Default for Time {
    fn default() -> Self {
        Time::Seconds(0.0)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Time::Seconds(v) => write!(f, "{}s", v),
            Time::Milliseconds(v) => write!(f, "{}ms", v),
        }
    }
}

impl From<Duration> for Time {
    fn from(duration: Duration) -> Self {
        Time::Milliseconds(duration.as_micros() as f32 / 1000.0)
    }
}

/// Longest prefix that parses as a float (`"1.2.3"` -> 1.2).
fn leading_float(number: &str) -> Option<f32> {
    let end = match number.match_indices('.').nth(1) {
        Some((second_dot, _)) => second_dot,
        None => number.len(),
    };
    number[..end].parse::<f32>().ok()
}

/// Integer prefix (`"12.9"` -> 12), saturating at `u64::MAX`; `None` when
/// there is no leading digit.
fn leading_integer(number: &str) -> Option<u64> {
    let end = number
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(number.len());
    let digits = &number[..end];
    if digits.is_empty() {
        return None;
    }
    Some(digits.bytes().fold(0u64, |acc, digit| {
        acc.saturating_mul(10).saturating_add(u64::from(digit - b'0'))
    }))
}
