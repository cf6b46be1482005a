//! CSS transitions: shorthand parsing and per-node running transitions.

use crate::node::NodeId;
use common::{Time, TimingFunction};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::time::Duration;

/// One entry of the `transition` shorthand.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionSpec {
    /// Property name, or `all`.
    pub property: String,
    pub duration: Duration,
    pub timing: TimingFunction,
    pub delay: Duration,
}

impl TransitionSpec {
    /// Parse a comma separated `transition` value such as
    /// `left 300ms ease-in, top 0.3s cubic-bezier(0.2, 0, 0, 1) 50ms`.
    ///
    /// Entries that do not parse are dropped; `none` yields an empty list.
    pub fn parse_list(value: &str) -> Vec<TransitionSpec> {
        split_top_level(value, ',')
            .into_iter()
            .filter_map(|entry| Self::parse_single(entry.trim()))
            .collect()
    }

    fn parse_single(entry: &str) -> Option<TransitionSpec> {
        if entry.is_empty() {
            return None;
        }

        let mut property = None;
        let mut times = SmallVec::<[Duration; 2]>::new();
        let mut timing = None;

        for token in split_top_level(entry, ' ') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            if let Some(time) = parse_css_time(token) {
                times.push(time);
            } else if let Ok(function) = TimingFunction::parse(token) {
                timing = Some(function);
            } else if property.is_none() {
                property = Some(token.to_ascii_lowercase());
            } else {
                return None;
            }
        }

        let property = property.unwrap_or_else(|| "all".to_string());
        if property == "none" {
            return None;
        }

        Some(TransitionSpec {
            property,
            duration: times.first().copied().unwrap_or(Duration::ZERO),
            timing: timing.unwrap_or_default(),
            delay: times.get(1).copied().unwrap_or(Duration::ZERO),
        })
    }

    /// Whether this entry covers `property`.
    pub fn applies_to(&self, property: &str) -> bool {
        self.property == "all" || self.property == property
    }

    /// The entry governing `property` in a parsed list (the last match wins).
    pub fn find<'a>(list: &'a [TransitionSpec], property: &str) -> Option<&'a TransitionSpec> {
        list.iter().rev().find(|spec| spec.applies_to(property))
    }
}

/// A CSS `<time>`; unlike the hero duration grammar a unit is mandatory.
fn parse_css_time(token: &str) -> Option<Duration> {
    if !(token.ends_with("ms") || token.ends_with('s')) {
        return None;
    }
    Time::parse(token).ok().map(|t| t.to_duration())
}

/// Split on `sep` outside of parentheses.
fn split_top_level(value: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push(&value[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&value[start..]);
    parts
}

/// A numeric value with its unit suffix (`px` or none).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NumericValue {
    pub value: f32,
    pub unit: &'static str,
}

impl NumericValue {
    pub fn parse(input: &str) -> Option<NumericValue> {
        let input = input.trim();
        let (number, unit) = match input.strip_suffix("px") {
            Some(number) => (number.trim_end(), "px"),
            None => (input, ""),
        };
        let value = number.parse::<f32>().ok().filter(|v| v.is_finite())?;
        Some(NumericValue { value, unit })
    }

    pub fn format(value: f32, unit: &str) -> String {
        // Round away float noise so interpolated values read cleanly
        let rounded = (value * 1000.0).round() / 1000.0;
        format!("{}{}", rounded, unit)
    }
}

/// A transition in progress on one property of one node.
#[derive(Clone, Debug)]
pub struct RunningTransition {
    pub property: String,
    pub from: NumericValue,
    pub to: NumericValue,
    /// When interpolation starts (request time plus delay).
    pub start: Duration,
    pub duration: Duration,
    pub timing: TimingFunction,
}

impl RunningTransition {
    /// When the transition reaches its end value.
    pub fn end(&self) -> Duration {
        self.start + self.duration
    }

    pub fn is_finished(&self, now: Duration) -> bool {
        now >= self.end()
    }

    /// Eased progress in `0.0..=1.0`.
    pub fn progress(&self, now: Duration) -> f32 {
        if now <= self.start {
            return 0.0;
        }
        if self.duration.is_zero() {
            return 1.0;
        }
        let linear = (now - self.start).as_secs_f32() / self.duration.as_secs_f32();
        self.timing.apply(linear.min(1.0))
    }

    /// The value the property reports at `now`.
    pub fn value_at(&self, now: Duration) -> String {
        let t = self.progress(now);
        let value = self.from.value + (self.to.value - self.from.value) * t;
        NumericValue::format(value, self.to.unit)
    }
}

/// All running transitions in a document, keyed by node.
#[derive(Debug, Default)]
pub struct TransitionSet {
    running: HashMap<NodeId, SmallVec<[RunningTransition; 4]>>,
}

impl TransitionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transition, replacing any running one on the same property.
    pub fn start(&mut self, node: NodeId, transition: RunningTransition) {
        let list = self.running.entry(node).or_default();
        list.retain(|t| t.property != transition.property);
        list.push(transition);
    }

    /// Cancel the transition on one property, if any.
    pub fn cancel(&mut self, node: NodeId, property: &str) -> Option<RunningTransition> {
        let list = self.running.get_mut(&node)?;
        let pos = list.iter().position(|t| t.property == property)?;
        let cancelled = list.remove(pos);
        if list.is_empty() {
            self.running.remove(&node);
        }
        Some(cancelled)
    }

    /// Cancel every transition on a node.
    pub fn cancel_node(&mut self, node: NodeId) -> usize {
        self.running.remove(&node).map_or(0, |list| list.len())
    }

    pub fn get(&self, node: NodeId, property: &str) -> Option<&RunningTransition> {
        self.running
            .get(&node)?
            .iter()
            .find(|t| t.property == property)
    }

    /// Number of transitions running on a node.
    pub fn count(&self, node: NodeId) -> usize {
        self.running.get(&node).map_or(0, |list| list.len())
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    /// Remove and return the transitions that have reached their end, oldest end first.
    pub fn take_finished(&mut self, now: Duration) -> Vec<(NodeId, RunningTransition)> {
        let mut finished = Vec::new();
        self.running.retain(|&node, list| {
            let mut i = 0;
            while i < list.len() {
                if list[i].is_finished(now) {
                    finished.push((node, list.remove(i)));
                } else {
                    i += 1;
                }
            }
            !list.is_empty()
        });
        finished.sort_by_key(|(_, t)| t.end());
        finished
    }
}
