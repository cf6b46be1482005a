//! CSS timing functions.

use crate::error::{HeroError, HeroResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Step position for step easing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepPosition {
    Start,
    End,
}

/// A single CSS `<easing-function>`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum TimingFunction {
    Linear,
    Ease,
    EaseIn,
    EaseOut,
    EaseInOut,
    CubicBezier(f32, f32, f32, f32),
    Steps(u32, StepPosition),
}

impl Default for TimingFunction {
    fn default() -> Self {
        TimingFunction::Ease
    }
}

impl TimingFunction {
    /// Apply the easing function to a progress value in `0.0..=1.0`.
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            TimingFunction::Linear => t,
            TimingFunction::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, t),
            TimingFunction::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            TimingFunction::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            TimingFunction::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            TimingFunction::CubicBezier(x1, y1, x2, y2) => cubic_bezier(*x1, *y1, *x2, *y2, t),
            TimingFunction::Steps(steps, position) => {
                let steps = (*steps).max(1) as f32;
                let step = (t * steps).floor();
                let value = match position {
                    StepPosition::Start => (step + 1.0) / steps,
                    StepPosition::End => step / steps,
                };
                value.min(1.0)
            }
        }
    }

    /// Parse a CSS easing function such as `ease-in` or `cubic-bezier(0.2, 0, 0, 1)`.
    pub fn parse(input: &str) -> HeroResult<TimingFunction> {
        let value = input.trim().to_ascii_lowercase();
        match value.as_str() {
            "linear" => return Ok(TimingFunction::Linear),
            "ease" => return Ok(TimingFunction::Ease),
            "ease-in" => return Ok(TimingFunction::EaseIn),
            "ease-out" => return Ok(TimingFunction::EaseOut),
            "ease-in-out" => return Ok(TimingFunction::EaseInOut),
            "step-start" => return Ok(TimingFunction::Steps(1, StepPosition::Start)),
            "step-end" => return Ok(TimingFunction::Steps(1, StepPosition::End)),
            _ => {}
        }

        let (name, args) = split_function(&value).ok_or_else(|| HeroError::timing(input))?;
        match name {
            "cubic-bezier" => {
                let numbers: Vec<f32> = args
                    .iter()
                    .map(|a| a.parse::<f32>())
                    .collect::<Result<_, _>>()
                    .map_err(|_| HeroError::timing(input))?;
                match numbers.as_slice() {
                    // x coordinates must stay inside the unit interval
                    [x1, y1, x2, y2] if (0.0..=1.0).contains(x1) && (0.0..=1.0).contains(x2) => {
                        Ok(TimingFunction::CubicBezier(*x1, *y1, *x2, *y2))
                    }
                    _ => Err(HeroError::timing(input)),
                }
            }
            "steps" => {
                let count = args
                    .first()
                    .and_then(|a| a.parse::<u32>().ok())
                    .filter(|n| *n > 0)
                    .ok_or_else(|| HeroError::timing(input))?;
                let position = match args.get(1).copied() {
                    None | Some("end") | Some("jump-end") => StepPosition::End,
                    Some("start") | Some("jump-start") => StepPosition::Start,
                    Some(_) => return Err(HeroError::timing(input)),
                };
                Ok(TimingFunction::Steps(count, position))
            }
            _ => Err(HeroError::timing(input)),
        }
    }
}

impl FromStr for TimingFunction {
    type Err = HeroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimingFunction::parse(s)
    }
}

impl fmt::Display for TimingFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimingFunction::Linear => write!(f, "linear"),
            TimingFunction::Ease => write!(f, "ease"),
            TimingFunction::EaseIn => write!(f, "ease-in"),
            TimingFunction::EaseOut => write!(f, "ease-out"),
            TimingFunction::EaseInOut => write!(f, "ease-in-out"),
            TimingFunction::CubicBezier(x1, y1, x2, y2) => {
                write!(f, "cubic-bezier({}, {}, {}, {})", x1, y1, x2, y2)
            }
            TimingFunction::Steps(n, StepPosition::Start) => write!(f, "steps({}, start)", n),
            TimingFunction::Steps(n, StepPosition::End) => write!(f, "steps({}, end)", n),
        }
    }
}

/// Split `name(a, b, c)` into its name and trimmed arguments.
fn split_function(value: &str) -> Option<(&str, Vec<&str>)> {
    let open = value.find('(')?;
    let inner = value[open + 1..].strip_suffix(')')?;
    let args = inner.split(',').map(str::trim).collect();
    Some((value[..open].trim(), args))
}

/// Cubic bezier easing: solve x(s) = t for the curve parameter, then evaluate y(s).
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, t: f32) -> f32 {
    let cx = 3.0 * x1;
    let bx = 3.0 * (x2 - x1) - cx;
    let ax = 1.0 - cx - bx;

    let cy = 3.0 * y1;
    let by = 3.0 * (y2 - y1) - cy;
    let ay = 1.0 - cy - by;

    let sample_x = |s: f32| ((ax * s + bx) * s + cx) * s;
    let sample_dx = |s: f32| (3.0 * ax * s + 2.0 * bx) * s + cx;

    // Newton-Raphson first, bisection when the slope is too flat
    let mut s = t;
    for _ in 0..8 {
        let err = sample_x(s) - t;
        if err.abs() < 1e-6 {
            return ((ay * s + by) * s + cy) * s;
        }
        let dx = sample_dx(s);
        if dx.abs() < 1e-6 {
            break;
        }
        s -= err / dx;
    }

    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    s = t;
    for _ in 0..32 {
        let x = sample_x(s);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }

    ((ay * s + by) * s + cy) * s
}
