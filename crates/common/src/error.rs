//! Common error types.

use thiserror::Error;

/// Error type for hero transitions and the hosts that drive them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HeroError {
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Invalid timing function: {0}")]
    InvalidTimingFunction(String),

    #[error("Hero ID \"{id}\" has {count} elements, expected 2")]
    DuplicateHero { id: String, count: usize },

    #[error("Host error: {0}")]
    Host(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HeroResult<T> = Result<T, HeroError>;

impl HeroError {
    pub fn duration(msg: impl Into<String>) -> Self {
        Self::InvalidDuration(msg.into())
    }

    pub fn timing(msg: impl Into<String>) -> Self {
        Self::InvalidTimingFunction(msg.into())
    }

    pub fn duplicate(id: impl Into<String>, count: usize) -> Self {
        Self::DuplicateHero {
            id: id.into(),
            count,
        }
    }

    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
