//! Common types shared by the DOM host and the hero transition engine.

pub mod easing;
pub mod geometry;
pub mod error;
pub mod units;

pub use easing::{StepPosition, TimingFunction};
pub use geometry::{Point, Rect, Transform};
pub use error::{HeroError, HeroResult};
pub use units::{Px, Time};
