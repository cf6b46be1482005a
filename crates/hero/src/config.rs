//! Engine defaults, per-transition configuration and the binding options.

use common::{HeroError, HeroResult, Time, TimingFunction};
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;
use std::time::Duration;

/// How the proxy is positioned while it flies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionMode {
    /// Coordinates relative to the animation container.
    Absolute,
    /// Viewport coordinates.
    #[default]
    Fixed,
}

impl PositionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionMode::Absolute => "absolute",
            PositionMode::Fixed => "fixed",
        }
    }
}

/// Engine-wide settings and the defaults every transition starts from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeroConfig {
    #[serde(with = "millis")]
    pub duration: Duration,
    #[serde(with = "timing")]
    pub timing_function: TimingFunction,
    #[serde(with = "millis")]
    pub delay: Duration,
    pub position: PositionMode,
    pub z_index: i32,
    /// Extra time after a leg should have ended before it is force-completed.
    #[serde(with = "millis")]
    pub completion_grace: Duration,
    /// Attribute stamped on hero elements.
    pub hero_attribute: String,
    /// Attribute that marks proxies.
    pub clone_attribute: String,
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(1000),
            timing_function: TimingFunction::Ease,
            delay: Duration::ZERO,
            position: PositionMode::Fixed,
            z_index: 9999,
            completion_grace: Duration::from_millis(100),
            hero_attribute: "data-hero-id".to_string(),
            clone_attribute: "data-clone".to_string(),
        }
    }
}

impl HeroConfig {
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_timing_function(mut self, timing: TimingFunction) -> Self {
        self.timing_function = timing;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_position(mut self, position: PositionMode) -> Self {
        self.position = position;
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_completion_grace(mut self, grace: Duration) -> Self {
        self.completion_grace = grace;
        self
    }

    pub fn with_hero_attribute(mut self, name: impl Into<String>) -> Self {
        self.hero_attribute = name.into();
        self
    }

    pub fn with_clone_attribute(mut self, name: impl Into<String>) -> Self {
        self.clone_attribute = name.into();
        self
    }

    /// Load from JSON; missing keys keep their defaults.
    pub fn from_json(json: &str) -> HeroResult<Self> {
        serde_json::from_str(json).map_err(|e| HeroError::internal(format!("invalid hero config: {}", e)))
    }
}

/// A shared, late-bound element handle (a framework ref).
pub type ElementRef<E> = Arc<RwLock<Option<E>>>;

/// Where the proxy is inserted while it animates.
#[derive(Clone, Debug)]
pub enum Container<E> {
    /// The host's root (document body).
    Root,
    Element(E),
    Selector(String),
    Ref(ElementRef<E>),
}

impl<E> Default for Container<E> {
    fn default() -> Self {
        Container::Root
    }
}

/// Parameters of one transition.
#[derive(Clone, Debug)]
pub struct AnimationConfig<E> {
    pub id: String,
    pub duration: Duration,
    pub timing_function: TimingFunction,
    pub delay: Duration,
    pub position: PositionMode,
    pub z_index: i32,
    pub container: Container<E>,
}

impl<E> AnimationConfig<E> {
    /// A transition for `id` using the engine defaults.
    pub fn new(id: impl Into<String>, defaults: &HeroConfig) -> Self {
        Self {
            id: id.into(),
            duration: defaults.duration,
            timing_function: defaults.timing_function,
            delay: defaults.delay,
            position: defaults.position,
            z_index: defaults.z_index,
            container: Container::Root,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_timing_function(mut self, timing: TimingFunction) -> Self {
        self.timing_function = timing;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_position(mut self, position: PositionMode) -> Self {
        self.position = position;
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_container(mut self, container: Container<E>) -> Self {
        self.container = container;
        self
    }
}

/// A duration given as milliseconds or as a `<number>[s|ms]` string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeValue {
    Millis(f64),
    Text(String),
}

impl TimeValue {
    pub fn parse(&self) -> HeroResult<Duration> {
        match self {
            TimeValue::Millis(ms) if ms.is_finite() && *ms >= 0.0 => {
                Ok(Duration::from_micros((ms * 1000.0).round() as u64))
            }
            TimeValue::Millis(ms) => Err(HeroError::duration(ms.to_string())),
            TimeValue::Text(text) => Time::parse(text).map(|t| t.to_duration()),
        }
    }
}

impl From<u64> for TimeValue {
    fn from(ms: u64) -> Self {
        TimeValue::Millis(ms as f64)
    }
}

impl From<&str> for TimeValue {
    fn from(text: &str) -> Self {
        TimeValue::Text(text.to_string())
    }
}

/// The value bound to a hero element, as a template would write it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroOptions {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<TimeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing_function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<TimeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
    /// Selector of the animation container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

impl HeroOptions {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_duration(mut self, duration: impl Into<TimeValue>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    pub fn with_timing_function(mut self, timing: impl Into<String>) -> Self {
        self.timing_function = Some(timing.into());
        self
    }

    pub fn with_delay(mut self, delay: impl Into<TimeValue>) -> Self {
        self.delay = Some(delay.into());
        self
    }

    pub fn with_position(mut self, position: PositionMode) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_container(mut self, selector: impl Into<String>) -> Self {
        self.container = Some(selector.into());
        self
    }

    /// Resolve against the engine defaults. Malformed values fall back to the default.
    pub fn resolve<E>(&self, defaults: &HeroConfig) -> AnimationConfig<E> {
        let duration = resolve_time(self.duration.as_ref(), defaults.duration, &self.id, "duration");
        let delay = resolve_time(self.delay.as_ref(), defaults.delay, &self.id, "delay");

        let timing_function = match self.timing_function.as_deref() {
            None => defaults.timing_function,
            Some(text) => TimingFunction::parse(text).unwrap_or_else(|err| {
                tracing::warn!(hero_id = %self.id, %err, "falling back to default timing function");
                defaults.timing_function
            }),
        };

        let container = match &self.container {
            Some(selector) => Container::Selector(selector.clone()),
            None => Container::Root,
        };

        AnimationConfig {
            id: self.id.clone(),
            duration,
            timing_function,
            delay,
            position: self.position.unwrap_or(defaults.position),
            z_index: self.z_index.unwrap_or(defaults.z_index),
            container,
        }
    }
}

fn resolve_time(value: Option<&TimeValue>, default: Duration, id: &str, field: &str) -> Duration {
    match value {
        None => default,
        Some(value) => value.parse().unwrap_or_else(|err| {
            tracing::warn!(hero_id = %id, field, %err, "falling back to default");
            default
        }),
    }
}

/// Serde adapter storing a `Duration` as milliseconds (number or time string).
mod millis {
    use super::*;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        TimeValue::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

/// Serde adapter storing a `TimingFunction` as its CSS text.
mod timing {
    use super::*;

    pub fn serialize<S: Serializer>(timing: &TimingFunction, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(timing)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimingFunction, D::Error> {
        let text = String::deserialize(deserializer)?;
        TimingFunction::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HeroConfig::default();
        assert_eq!(config.duration, Duration::from_secs(1));
        assert_eq!(config.timing_function, TimingFunction::Ease);
        assert_eq!(config.position, PositionMode::Fixed);
        assert_eq!(config.z_index, 9999);
        assert_eq!(config.hero_attribute, "data-hero-id");
    }

    #[test]
    fn test_config_from_json() {
        let config = HeroConfig::from_json(
            r#"{ "duration": "0.5s", "timingFunction": "linear", "zIndex": 10 }"#,
        )
        .unwrap();
        assert_eq!(config.duration, Duration::from_millis(500));
        assert_eq!(config.timing_function, TimingFunction::Linear);
        assert_eq!(config.z_index, 10);
        assert_eq!(config.delay, Duration::ZERO);

        assert!(HeroConfig::from_json(r#"{ "duration": "soon" }"#).is_err());
    }

    #[test]
    fn test_options_deserialize() {
        let options: HeroOptions = serde_json::from_str(
            r##"{ "id": "card-1", "duration": 300, "delay": "50ms", "position": "absolute", "container": "#list" }"##,
        )
        .unwrap();
        assert_eq!(options.duration, Some(TimeValue::Millis(300.0)));
        assert_eq!(options.position, Some(PositionMode::Absolute));

        let config: AnimationConfig<u32> = options.resolve(&HeroConfig::default());
        assert_eq!(config.duration, Duration::from_millis(300));
        assert_eq!(config.delay, Duration::from_millis(50));
        assert!(matches!(config.container, Container::Selector(ref s) if s == "#list"));
    }

    #[test]
    fn test_malformed_options_fall_back() {
        let options = HeroOptions::new("x")
            .with_duration("fast")
            .with_timing_function("bouncy")
            .with_delay("1.5s");
        let config: AnimationConfig<u32> = options.resolve(&HeroConfig::default());
        assert_eq!(config.duration, Duration::from_millis(1000));
        assert_eq!(config.timing_function, TimingFunction::Ease);
        assert_eq!(config.delay, Duration::from_millis(1500));
        assert!(matches!(config.container, Container::Root));
    }

    #[test]
    fn test_duration_grammar() {
        assert_eq!(TimeValue::from("2s").parse().unwrap(), Duration::from_secs(2));
        assert_eq!(TimeValue::from("250").parse().unwrap(), Duration::from_millis(250));
        assert_eq!(TimeValue::from("12.9ms").parse().unwrap(), Duration::from_millis(12));
        assert!(TimeValue::Millis(-1.0).parse().is_err());
    }
}
