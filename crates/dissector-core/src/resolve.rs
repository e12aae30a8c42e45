//! Transaction metadata and offset resolution.

use dissector_schema::{ByteRange, Tag, TransactionHeader};
use num_bigint::BigUint;
use serde::Deserialize;

use crate::error::DissectError;
use crate::gateway::Gateway;

#[derive(Deserialize)]
struct TxBody {
    #[serde(default = "default_format")]
    format: u32,
    data_root: String,
    tags: Vec<Tag>,
}

fn default_format() -> u32 {
    2
}

#[derive(Deserialize)]
struct OffsetBody {
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    offset: Option<String>,
}

/// Fetch and parse the header of `tx_id`.
///
/// # Errors
///
/// `NotFound` for an empty id or when the gateway does not know the
/// transaction, `Unreadable` if the body cannot be read, `MalformedMetadata`
/// if the body is not a transaction header.
pub async fn resolve<G: Gateway + ?Sized>(
    gateway: &G,
    tx_id: &str,
) -> Result<TransactionHeader, DissectError> {
    require_id(tx_id)?;
    let body = gateway.tx(tx_id).await?;
    parse_tx_header(&body)
}

/// Fetch and parse the location of `tx_id`'s data.
///
/// # Errors
///
/// As [`resolve`], plus `MalformedMetadata` when `size` or `offset` is
/// missing, empty, or not a base-10 integer.
pub async fn resolve_range<G: Gateway + ?Sized>(
    gateway: &G,
    tx_id: &str,
) -> Result<ByteRange, DissectError> {
    require_id(tx_id)?;
    let body = gateway.tx_offset(tx_id).await?;
    parse_range(&body)
}

/// Parse a `/tx/{id}` body. Tags keep their on-wire order.
///
/// # Errors
///
/// `MalformedMetadata` if required fields are absent or of the wrong type.
pub fn parse_tx_header(body: &[u8]) -> Result<TransactionHeader, DissectError> {
    let tx: TxBody =
        serde_json::from_slice(body).map_err(|e| DissectError::malformed("transaction", e))?;

    Ok(TransactionHeader {
        format: tx.format,
        data_root: tx.data_root,
        tags: tx.tags,
    })
}

/// Parse a `/tx/{id}/offset` body.
///
/// # Errors
///
/// `MalformedMetadata` if either field is missing or invalid, or if the
/// range would begin before the start of the weave.
pub fn parse_range(body: &[u8]) -> Result<ByteRange, DissectError> {
    let OffsetBody { size, offset } =
        serde_json::from_slice(body).map_err(|e| DissectError::malformed("offset", e))?;

    let size = parse_decimal("size", size.as_deref().unwrap_or_default())?;
    let offset = parse_decimal("offset", offset.as_deref().unwrap_or_default())?;

    let range = ByteRange::new(offset, size);
    if !range.is_well_formed() {
        return Err(DissectError::malformed(
            "size",
            format!("{} exceeds end offset {} + 1", range.size(), range.offset()),
        ));
    }
    Ok(range)
}

/// Parse an unsigned base-10 integer of any size.
///
/// Only ASCII digits are accepted: no sign, whitespace, or separators.
///
/// # Errors
///
/// `MalformedMetadata` naming `field` if `raw` is empty or not all digits.
pub fn parse_decimal(field: &str, raw: &str) -> Result<BigUint, DissectError> {
    if raw.is_empty() {
        return Err(DissectError::malformed(field, "missing or empty"));
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DissectError::malformed(
            field,
            format!("{raw:?} is not a decimal integer"),
        ));
    }
    BigUint::parse_bytes(raw.as_bytes(), 10)
        .ok_or_else(|| DissectError::malformed(field, format!("{raw:?} is not a decimal integer")))
}

fn require_id(tx_id: &str) -> Result<(), DissectError> {
    if tx_id.is_empty() {
        return Err(DissectError::NotFound("empty transaction id".to_string()));
    }
    Ok(())
}
