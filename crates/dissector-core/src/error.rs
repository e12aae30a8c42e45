//! Failure taxonomy for the resolve-and-decode pipeline.

use dissector_schema::{DecodeError, ItemError};
use num_bigint::BigUint;
use thiserror::Error;

/// The closed set of ways a dissection can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The transaction (or one of its endpoints) does not resolve at the gateway.
    NotFound,
    /// A response could not be read to completion.
    Unreadable,
    /// A response was read but is missing or has invalid required fields.
    MalformedMetadata,
    /// The transaction is not tagged as an ANS-104 binary bundle.
    InvalidBundleFormat,
    /// Fewer bytes than the bundle layout requires.
    TruncatedInput,
    /// The decoded index is internally inconsistent.
    CorruptBundle,
}

impl ErrorKind {
    /// Stable identifier for reporting.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not-found",
            Self::Unreadable => "unreadable",
            Self::MalformedMetadata => "malformed-metadata",
            Self::InvalidBundleFormat => "invalid-bundle-format",
            Self::TruncatedInput => "truncated-input",
            Self::CorruptBundle => "corrupt-bundle",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by every pipeline step.
#[derive(Error, Debug)]
pub enum DissectError {
    /// Non-2xx status, connection failure, or an empty transaction id.
    #[error("not found: {0}")]
    NotFound(String),

    /// The response body could not be read.
    #[error("unreadable response: {0}")]
    Unreadable(String),

    /// A body was read but does not have the expected shape.
    #[error("malformed metadata: {0}")]
    MalformedMetadata(String),

    /// A required bundle tag is missing or has the wrong value.
    #[error("not an ANS-104 bundle: {0}")]
    InvalidBundleFormat(String),

    /// A read would run past the end of the bundle or item it targets.
    #[error("range holds {size} bytes but {needed} are needed")]
    RangeTooShort {
        /// Bytes the read requires.
        needed: BigUint,
        /// Bytes the bundle or item holds.
        size: BigUint,
    },

    /// A declared length is too large to hold in memory.
    #[error("{len} bytes do not fit in memory")]
    TooLarge {
        /// The declared length.
        len: BigUint,
    },

    /// The index bytes failed to decode.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A data-item header failed to decode.
    #[error(transparent)]
    Item(#[from] ItemError),
}

impl DissectError {
    /// Which failure kind this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unreadable(_) | Self::TooLarge { .. } => ErrorKind::Unreadable,
            Self::MalformedMetadata(_) => ErrorKind::MalformedMetadata,
            Self::InvalidBundleFormat(_) => ErrorKind::InvalidBundleFormat,
            Self::RangeTooShort { .. }
            | Self::Decode(DecodeError::TruncatedInput { .. })
            | Self::Item(ItemError::TruncatedInput { .. }) => ErrorKind::TruncatedInput,
            Self::Decode(DecodeError::CorruptBundle { .. }) | Self::Item(_) => {
                ErrorKind::CorruptBundle
            }
        }
    }

    /// Create a `MalformedMetadata` error naming the offending field.
    pub fn malformed(field: &str, msg: impl std::fmt::Display) -> Self {
        Self::MalformedMetadata(format!("{field}: {msg}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dissector_schema::Section;

    #[test]
    fn decode_errors_keep_their_kind() {
        let truncated = DissectError::from(DecodeError::TruncatedInput {
            section: Section::ItemCount,
            needed: 32,
            available: 3,
        });
        assert_eq!(truncated.kind(), ErrorKind::TruncatedInput);

        let corrupt = DissectError::from(DecodeError::CorruptBundle {
            declared: BigUint::from(2u32),
            decoded: 1,
        });
        assert_eq!(corrupt.kind(), ErrorKind::CorruptBundle);
    }

    #[test]
    fn short_range_is_truncation() {
        let err = DissectError::RangeTooShort {
            needed: BigUint::from(96u32),
            size: BigUint::from(64u32),
        };
        assert_eq!(err.kind(), ErrorKind::TruncatedInput);
        assert_eq!(err.to_string(), "range holds 64 bytes but 96 are needed");
    }

    #[test]
    fn item_errors_keep_their_kind() {
        let truncated = DissectError::from(ItemError::TruncatedInput {
            field: dissector_schema::item::Field::Owner,
            at: 66,
            needed: 32,
            available: 4,
        });
        assert_eq!(truncated.kind(), ErrorKind::TruncatedInput);
        assert_eq!(
            DissectError::from(ItemError::UnknownSignatureType(99)).kind(),
            ErrorKind::CorruptBundle
        );
    }

    #[test]
    fn oversized_length_is_unreadable() {
        let err = DissectError::TooLarge {
            len: BigUint::from(1u32) << 63u32,
        };
        assert_eq!(err.kind(), ErrorKind::Unreadable);
    }

    #[test]
    fn malformed_names_field() {
        let err = DissectError::malformed("size", "not a decimal integer");
        assert_eq!(err.kind(), ErrorKind::MalformedMetadata);
        assert_eq!(err.to_string(), "malformed metadata: size: not a decimal integer");
    }
}
