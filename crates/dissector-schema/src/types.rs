//! Transaction metadata and byte-range types.

use num_bigint::BigUint;

use crate::tag::Tag;

/// Metadata envelope of a transaction, as reported by `GET /tx/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionHeader {
    /// Transaction format (bundles are always format 2).
    pub format: u32,

    /// Merkle root of the transaction data, base64url-encoded.
    pub data_root: String,

    /// Tags in on-wire order, still encoded.
    pub tags: Vec<Tag>,
}

/// Location of a transaction's data in the weave.
///
/// `offset` is the value the gateway reports for `/tx/{id}/offset`: the
/// absolute position of the *last* byte of the data. The first byte sits at
/// [`ByteRange::start`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ByteRange {
    offset: BigUint,
    size: BigUint,
}

impl ByteRange {
    /// Create a range from the reported end offset and data size.
    pub fn new(offset: BigUint, size: BigUint) -> Self {
        Self { offset, size }
    }

    /// The reported offset (absolute position of the last data byte).
    pub fn offset(&self) -> &BigUint {
        &self.offset
    }

    /// Length of the data in bytes.
    pub fn size(&self) -> &BigUint {
        &self.size
    }

    /// Absolute position of the first data byte: `offset - size + 1`.
    ///
    /// Zero for empty data, and saturates at zero for a range that would
    /// begin before the weave does.
    pub fn start(&self) -> BigUint {
        let past_end = &self.offset + 1u32;
        if self.size == BigUint::default() || self.size > past_end {
            BigUint::default()
        } else {
            past_end - &self.size
        }
    }

    /// Whether the range starts at or after the beginning of the weave.
    pub fn is_well_formed(&self) -> bool {
        self.size <= &self.offset + 1u32
    }
}

impl std::fmt::Display for ByteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} bytes ending at {}", self.size, self.offset)
    }
}
