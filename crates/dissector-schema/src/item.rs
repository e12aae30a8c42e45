//! ANS-104 data-item header decoding.
//!
//! Each item in a bundle begins with a signed header:
//!
//! ```text
//! +----------+-----------+-------+------------+------------+------------+-----------+------+------+
//! | sig type | signature | owner | target     | anchor     | tag count  | tag bytes | tags | data |
//! | (2, LE)  | (varies)  | (var) | (1 [+ 32]) | (1 [+ 32]) | (8, LE)    | (8, LE)   |      |      |
//! +----------+-----------+-------+------------+------------+------------+-----------+------+------+
//! ```
//!
//! Signature and owner widths depend on the signature type. Tags are an Avro
//! array of `{name: bytes, value: bytes}` records.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use thiserror::Error;

use crate::tag::Tag;

/// Width of a target or anchor once present.
pub const OPTIONAL_FIELD_LEN: usize = 32;

/// The header field a decode error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Leading signature type.
    SignatureType,
    /// Signature bytes.
    Signature,
    /// Owner public key.
    Owner,
    /// Optional target address.
    Target,
    /// Optional anchor.
    Anchor,
    /// Declared number of tags.
    TagCount,
    /// Declared length of the encoded tags.
    TagBytes,
    /// The encoded tags themselves.
    Tags,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::SignatureType => "signature type",
            Self::Signature => "signature",
            Self::Owner => "owner",
            Self::Target => "target",
            Self::Anchor => "anchor",
            Self::TagCount => "tag count",
            Self::TagBytes => "tag bytes",
            Self::Tags => "tags",
        })
    }
}

/// Errors produced while decoding a data-item header.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    /// The input ended inside a field.
    #[error("truncated data item: {field} at byte {at} needs {needed} bytes, {available} available")]
    TruncatedInput {
        /// The field being read.
        field: Field,
        /// Position of the field from the start of the item.
        at: usize,
        /// Bytes the field requires.
        needed: usize,
        /// Bytes left from `at`.
        available: usize,
    },

    /// The signature type is not one ANS-104 defines.
    #[error("unknown signature type {0}")]
    UnknownSignatureType(u16),

    /// A target or anchor presence flag other than 0 or 1.
    #[error("invalid {field} presence byte {value}")]
    InvalidPresenceByte {
        /// Which optional field.
        field: Field,
        /// The byte found.
        value: u8,
    },

    /// The tag bytes are not a valid Avro tag array.
    #[error("malformed tags: {0}")]
    MalformedTags(String),

    /// The decoded tags disagree with the declared count.
    #[error("data item declares {declared} tags, decoded {decoded}")]
    TagCountMismatch {
        /// Tag count from the header.
        declared: u64,
        /// Tags actually decoded.
        decoded: usize,
    },
}

/// Signature schemes an item can be signed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureType {
    /// Arweave RSA-PSS (4096-bit).
    Arweave,
    /// Ed25519.
    Ed25519,
    /// Ethereum secp256k1.
    Ethereum,
    /// Solana Ed25519.
    Solana,
    /// Aptos Ed25519 via an injected wallet.
    InjectedAptos,
    /// Aptos multi-signature.
    MultiAptos,
    /// Ethereum EIP-712 typed data.
    TypedEthereum,
}

impl SignatureType {
    /// Look up a signature type by its on-wire code.
    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            1 => Self::Arweave,
            2 => Self::Ed25519,
            3 => Self::Ethereum,
            4 => Self::Solana,
            5 => Self::InjectedAptos,
            6 => Self::MultiAptos,
            7 => Self::TypedEthereum,
            _ => return None,
        })
    }

    /// The on-wire code.
    pub fn code(self) -> u16 {
        match self {
            Self::Arweave => 1,
            Self::Ed25519 => 2,
            Self::Ethereum => 3,
            Self::Solana => 4,
            Self::InjectedAptos => 5,
            Self::MultiAptos => 6,
            Self::TypedEthereum => 7,
        }
    }

    /// Byte length of a signature of this type.
    pub fn signature_len(self) -> usize {
        match self {
            Self::Arweave => 512,
            Self::Ed25519 | Self::Solana | Self::InjectedAptos => 64,
            Self::Ethereum | Self::TypedEthereum => 65,
            Self::MultiAptos => 64 * 32 + 4,
        }
    }

    /// Byte length of an owner key of this type.
    pub fn owner_len(self) -> usize {
        match self {
            Self::Arweave => 512,
            Self::Ed25519 | Self::Solana | Self::InjectedAptos => 32,
            Self::Ethereum => 65,
            Self::TypedEthereum => 42,
            Self::MultiAptos => 32 * 32 + 1,
        }
    }
}

impl std::fmt::Display for SignatureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Arweave => "arweave",
            Self::Ed25519 => "ed25519",
            Self::Ethereum => "ethereum",
            Self::Solana => "solana",
            Self::InjectedAptos => "injected-aptos",
            Self::MultiAptos => "multi-aptos",
            Self::TypedEthereum => "typed-ethereum",
        })
    }
}

/// A decoded data-item header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataItemHeader {
    /// How the item is signed.
    pub signature_type: SignatureType,
    /// Raw signature.
    pub signature: Vec<u8>,
    /// Raw owner public key.
    pub owner: Vec<u8>,
    /// Target address, if set.
    pub target: Option<[u8; OPTIONAL_FIELD_LEN]>,
    /// Anchor, if set.
    pub anchor: Option<[u8; OPTIONAL_FIELD_LEN]>,
    /// Tags in on-wire order, base64url-encoded like transaction tags.
    pub tags: Vec<Tag>,
    /// Declared length of the encoded tags.
    pub tag_bytes: u64,
    /// Length of the whole header; the item's data starts here.
    pub header_len: usize,
}

/// Decode a data-item header from the leading bytes of an item.
///
/// Bytes past the header (the item data) are ignored.
///
/// # Errors
///
/// [`ItemError::TruncatedInput`] when a field is cut short. Its `at + needed`
/// is the input length required to get past that field. The other variants
/// report a header that can never decode.
pub fn decode(raw: &[u8]) -> Result<DataItemHeader, ItemError> {
    let mut r = Reader { raw, pos: 0 };

    let code = u16::from_le_bytes(r.array(Field::SignatureType)?);
    let signature_type =
        SignatureType::from_code(code).ok_or(ItemError::UnknownSignatureType(code))?;
    let signature = r.take(Field::Signature, signature_type.signature_len())?.to_vec();
    let owner = r.take(Field::Owner, signature_type.owner_len())?.to_vec();
    let target = r.optional(Field::Target)?;
    let anchor = r.optional(Field::Anchor)?;

    let tag_count = u64::from_le_bytes(r.array(Field::TagCount)?);
    let tag_bytes = u64::from_le_bytes(r.array(Field::TagBytes)?);
    let encoded = r.take(Field::Tags, usize::try_from(tag_bytes).unwrap_or(usize::MAX))?;

    let tags = decode_tags(encoded)?;
    if u64::try_from(tags.len()).ok() != Some(tag_count) {
        return Err(ItemError::TagCountMismatch {
            declared: tag_count,
            decoded: tags.len(),
        });
    }

    Ok(DataItemHeader {
        signature_type,
        signature,
        owner,
        target,
        anchor,
        tags,
        tag_bytes,
        header_len: r.pos,
    })
}

struct Reader<'a> {
    raw: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, field: Field, n: usize) -> Result<&'a [u8], ItemError> {
        let rest = self.raw.get(self.pos..).unwrap_or_default();
        let Some((head, _)) = rest.split_at_checked(n) else {
            return Err(ItemError::TruncatedInput {
                field,
                at: self.pos,
                needed: n,
                available: rest.len(),
            });
        };
        self.pos += n;
        Ok(head)
    }

    fn array<const N: usize>(&mut self, field: Field) -> Result<[u8; N], ItemError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(field, N)?);
        Ok(out)
    }

    fn optional(&mut self, field: Field) -> Result<Option<[u8; OPTIONAL_FIELD_LEN]>, ItemError> {
        match self.array::<1>(field)? {
            [0] => Ok(None),
            [1] => self.array(field).map(Some),
            [value] => Err(ItemError::InvalidPresenceByte { field, value }),
        }
    }
}

/// Decode an Avro array of `{name: bytes, value: bytes}` records.
///
/// An empty input means no tags.
fn decode_tags(mut raw: &[u8]) -> Result<Vec<Tag>, ItemError> {
    let mut tags = Vec::new();
    if raw.is_empty() {
        return Ok(tags);
    }

    loop {
        let (count, negative) = read_long(&mut raw)?;
        if count == 0 {
            break;
        }
        // A negative block count is followed by the block's byte size.
        if negative {
            read_long(&mut raw)?;
        }
        for _ in 0..count {
            let name = read_bytes(&mut raw)?;
            let value = read_bytes(&mut raw)?;
            tags.push(Tag::new(
                URL_SAFE_NO_PAD.encode(name),
                URL_SAFE_NO_PAD.encode(value),
            ));
        }
    }

    if !raw.is_empty() {
        return Err(ItemError::MalformedTags(format!(
            "{} bytes after the tag array",
            raw.len()
        )));
    }
    Ok(tags)
}

/// Read a zig-zag varint, returning its magnitude and sign.
fn read_long(raw: &mut &[u8]) -> Result<(u64, bool), ItemError> {
    let mut value = 0u64;
    for shift in (0..64).step_by(7) {
        let Some((&byte, rest)) = raw.split_first() else {
            return Err(ItemError::MalformedTags("varint cut short".to_string()));
        };
        *raw = rest;
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(if value & 1 == 1 {
                ((value >> 1) + 1, true)
            } else {
                (value >> 1, false)
            });
        }
    }
    Err(ItemError::MalformedTags("varint longer than 10 bytes".to_string()))
}

fn read_bytes<'a>(raw: &mut &'a [u8]) -> Result<&'a [u8], ItemError> {
    let (len, negative) = read_long(raw)?;
    if negative {
        return Err(ItemError::MalformedTags("negative byte length".to_string()));
    }
    let (head, tail) = usize::try_from(len)
        .ok()
        .and_then(|n| raw.split_at_checked(n))
        .ok_or_else(|| {
            ItemError::MalformedTags(format!("{len} byte field with {} bytes left", raw.len()))
        })?;
    *raw = tail;
    Ok(head)
}
