//! The resolve-and-decode pipeline for one transaction.

use bytes::Bytes;
use dissector_schema::bundle::{self, BundleHeader};
use dissector_schema::item::{self, DataItemHeader, ItemError};
use dissector_schema::{ByteRange, ItemId, ItemRange, MAX_CHUNK_SIZE, Tag};
use num_bigint::BigUint;

use crate::error::DissectError;
use crate::gateway::Gateway;
use crate::resolve::{resolve, resolve_range};
use crate::validate::validate;

/// Everything learned about a bundle transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dissection {
    /// The transaction that was dissected.
    pub tx_id: String,
    /// Data root from the transaction header.
    pub data_root: String,
    /// Transaction tags, still encoded.
    pub tags: Vec<Tag>,
    /// Where the bundle lives in the weave.
    pub range: ByteRange,
    /// The decoded bundle index.
    pub header: BundleHeader,
}

/// Resolve `tx_id`, validate it as a bundle, and decode its index.
///
/// Steps run strictly in order and stop at the first failure: a transaction
/// that fails validation never has its offset looked up.
///
/// # Errors
///
/// Whatever the failing step reports; see [`crate::ErrorKind`].
pub async fn dissect<G: Gateway + ?Sized>(
    gateway: &G,
    tx_id: &str,
) -> Result<Dissection, DissectError> {
    run(gateway, tx_id)
        .await
        .inspect_err(|e| tracing::warn!("Dissecting {tx_id} failed ({}): {e}", e.kind()))
}

async fn run<G: Gateway + ?Sized>(gateway: &G, tx_id: &str) -> Result<Dissection, DissectError> {
    tracing::debug!("Resolving {tx_id}");
    let tx = resolve(gateway, tx_id).await?;
    let data_root = validate(&tx)?.to_string();

    let range = resolve_range(gateway, tx_id).await?;
    tracing::debug!("{tx_id}: {range}");

    let raw = read_index(gateway, &range).await?;
    let header = bundle::decode(&raw)?;
    tracing::debug!("{tx_id}: {} items", header.items().len());

    Ok(Dissection {
        tx_id: tx_id.to_string(),
        data_root,
        tags: tx.tags,
        range,
        header,
    })
}

/// A data item located in a dissected bundle, with its decoded header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataItem {
    /// Where the item sits, relative to the bundle start.
    pub range: ItemRange,
    /// The item's signed header.
    pub header: DataItemHeader,
}

/// Find `item_id` in a dissected bundle and decode its header.
///
/// Reads up to one chunk of the item first and a second, exactly-sized
/// read only when the header's tags run past it. The item's data is never
/// read beyond its header.
///
/// # Errors
///
/// `NotFound` if the bundle index does not list the item, `TruncatedInput`
/// if its header runs past the item, `CorruptBundle` if the header is
/// invalid, otherwise whatever the gateway reports.
pub async fn read_item<G: Gateway + ?Sized>(
    gateway: &G,
    dissection: &Dissection,
    item_id: &ItemId,
) -> Result<DataItem, DissectError> {
    let range = dissection.header.find(item_id).ok_or_else(|| {
        DissectError::NotFound(format!("item {item_id} is not in bundle {}", dissection.tx_id))
    })?;
    tracing::debug!("{item_id}: {} bytes at {} in {}", range.size, range.offset, dissection.tx_id);

    let first_len = usize::try_from(&range.size).map_or(MAX_CHUNK_SIZE, |s| s.min(MAX_CHUNK_SIZE));
    let head = gateway.fetch_at(&dissection.range, &range.offset, first_len).await?;

    let header = match item::decode(&head) {
        Err(ItemError::TruncatedInput { at, needed, .. })
            if BigUint::from(head.len()) < range.size =>
        {
            let needed = BigUint::from(at) + needed;
            if needed > range.size {
                return Err(DissectError::RangeTooShort {
                    needed,
                    size: range.size.clone(),
                });
            }
            let len = in_memory(&needed)?;
            tracing::debug!("{item_id}: header spans {len} bytes, reading past the first chunk");
            let full = gateway.fetch_at(&dissection.range, &range.offset, len).await?;
            item::decode(&full)?
        }
        decoded => decoded?,
    };

    Ok(DataItem { range, header })
}

/// Fetch the leading bytes of a bundle covering its whole index.
///
/// Reads up to one chunk first. Only when the declared item count needs a
/// longer index is a second, exactly-sized read issued.
///
/// # Errors
///
/// `TruncatedInput` if the bundle is too short for its own index,
/// `Unreadable` if the index could never be held in memory, otherwise
/// whatever the gateway reports.
pub async fn read_index<G: Gateway + ?Sized>(
    gateway: &G,
    range: &ByteRange,
) -> Result<Bytes, DissectError> {
    let first_len = usize::try_from(range.size()).map_or(MAX_CHUNK_SIZE, |s| s.min(MAX_CHUNK_SIZE));
    let head = gateway.fetch_range(range, first_len).await?;

    let count = bundle::decode_item_count(&head)?;
    let index_len = bundle::index_len_for(&count);

    if index_len > *range.size() {
        return Err(DissectError::RangeTooShort {
            needed: index_len,
            size: range.size().clone(),
        });
    }
    if index_len <= BigUint::from(head.len()) {
        return Ok(head);
    }

    let len = in_memory(&index_len)?;
    tracing::debug!("Index spans {len} bytes, reading past the first chunk");
    gateway.fetch_range(range, len).await
}

/// Narrow a declared length to one a single buffer can hold.
fn in_memory(len: &BigUint) -> Result<usize, DissectError> {
    usize::try_from(len)
        .ok()
        .filter(|&n| n <= isize::MAX.unsigned_abs())
        .ok_or_else(|| DissectError::TooLarge { len: len.clone() })
}
