//! Access levels granted to an API key.

use std::fmt;

use serde::{Deserialize, Serialize};

use feedhub_core::error::AppError;

/// What a presented key may do. Ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AccessLevel {
    Denied,
    ReadOnly,
    ReadWrite,
}

impl AccessLevel {
    /// Parse the tier names used in key documents.
    pub fn from_tier_name(name: &str) -> Option<Self> {
        match name {
            "ReadOnly" => Some(Self::ReadOnly),
            "ReadWrite" => Some(Self::ReadWrite),
            _ => None,
        }
    }

    pub fn can_read(self) -> bool {
        self >= Self::ReadOnly
    }

    pub fn can_write(self) -> bool {
        self == Self::ReadWrite
    }

    /// `Ok(())` when reads are allowed, otherwise an access-denied error.
    pub fn require_read(self) -> Result<(), AppError> {
        if self.can_read() {
            Ok(())
        } else {
            Err(AppError::access_denied("API key does not grant read access"))
        }
    }

    /// `Ok(())` when pushes are allowed, otherwise an access-denied error.
    pub fn require_write(self) -> Result<(), AppError> {
        if self.can_write() {
            Ok(())
        } else {
            Err(AppError::access_denied("API key does not grant write access"))
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Denied => write!(f, "Denied"),
            Self::ReadOnly => write!(f, "ReadOnly"),
            Self::ReadWrite => write!(f, "ReadWrite"),
        }
    }
}
