//! Crate error type
//!
//! Gameplay no-ops (firing on cooldown, launching with no charge) are not
//! errors; they return empty results. This type covers configuration loading
//! and projectile construction failures.

use core::fmt;

#[derive(Debug)]
pub enum Error {
    /// Configuration or settings JSON failed to parse
    Config(serde_json::Error),
    /// Reading a configuration file failed
    Io(std::io::Error),
    /// A projectile was requested at a non-finite position
    NonFinite { what: &'static str, x: f32, y: f32 },
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid configuration: {err}"),
            Self::Io(err) => write!(f, "configuration unavailable: {err}"),
            Self::NonFinite { what, x, y } => {
                write!(f, "{what} spawned at non-finite position ({x}, {y})")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::NonFinite { .. } => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
