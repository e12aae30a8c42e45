//! Data-item identifiers.

use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Width of an identifier field in the bundle index.
pub const ID_LEN: usize = 32;

/// A 32-byte data-item id.
///
/// Displayed and parsed as unpadded base64url, which is how ids appear on the
/// gateway (43 characters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId([u8; ID_LEN]);

/// Errors from parsing an [`ItemId`] out of its text form.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ItemIdError {
    /// The text is not valid base64url.
    #[error("invalid base64url id: {0}")]
    Encoding(String),

    /// The decoded id is not 32 bytes long.
    #[error("invalid id length: expected 32 bytes, got {0}")]
    Length(usize),
}

impl ItemId {
    /// Wrap raw id bytes.
    pub const fn new(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }

    /// The raw id bytes.
    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }
}

impl From<[u8; ID_LEN]> for ItemId {
    fn from(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl FromStr for ItemId {
    type Err = ItemIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = URL_SAFE_NO_PAD
            .decode(s.trim_end_matches('='))
            .map_err(|e| ItemIdError::Encoding(e.to_string()))?;
        let len = bytes.len();
        let bytes: [u8; ID_LEN] = bytes.try_into().map_err(|_| ItemIdError::Length(len))?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&URL_SAFE_NO_PAD.encode(self.0))
    }
}

impl Serialize for ItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
