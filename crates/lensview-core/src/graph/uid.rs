//! Canonical node identifiers.
//!
//! Dgraph hands out uids as hexadecimal strings (`"0x1a"`). Everything past
//! the database boundary works with [`Uid`], a plain integer. Raw database
//! types keep their uids as `String`, so a uid can only be normalized once.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while parsing a database uid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UidError {
    #[error("empty uid")]
    Empty,

    #[error("uid {0:?} is not hexadecimal")]
    NotHex(String),

    #[error("uid {0:?} does not fit in 64 bits")]
    Overflow(String),
}

/// A normalized node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(u64);

impl Uid {
    /// Wrap an already-normalized integer id.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Parse a database uid in base 16. A leading `0x` / `0X` is optional.
    pub fn from_hex(raw: &str) -> Result<Self, UidError> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.is_empty() {
            return Err(UidError::Empty);
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(UidError::NotHex(raw.to_string()));
        }

        u64::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| UidError::Overflow(raw.to_string()))
    }

    /// The integer value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Format back into Dgraph's hexadecimal notation.
    pub fn to_hex(self) -> String {
        format!("{:#x}", self.0)
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Uid {
    type Err = UidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<u64> for Uid {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
