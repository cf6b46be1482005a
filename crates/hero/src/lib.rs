//! Shared-element ("hero") transitions.
//!
//! Two elements that carry the same hero id are treated as one visual
//! object. When one goes away and the other appears, a proxy clone of the
//! outgoing element is flown over the incoming one with a CSS transition
//! (the FLIP technique). Runs against any [`HeroHost`]; [`DomHost`] drives
//! the in-process `dom` crate.

pub mod binding;
pub mod config;
pub mod dom_host;
pub mod engine;
pub mod geometry;
pub mod host;
pub mod registry;
pub mod state;
pub mod styles;

#[cfg(test)]
mod testing;

pub use binding::HeroBinding;
pub use config::{AnimationConfig, Container, ElementRef, HeroConfig, HeroOptions, PositionMode, TimeValue};
pub use dom_host::DomHost;
pub use engine::{HeroEngine, TransitionOutcome};
pub use host::{HeroHost, HostCallback};
pub use registry::{IdentityRegistry, PairInfo, PairMode, PairValidation};
pub use state::{AnimationState, LegDirection, LegId, Resume};
