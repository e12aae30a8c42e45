//! ANS-104 bundle index decoding.
//!
//! A binary bundle starts with an index describing the data items it holds:
//!
//! ```text
//! +------------------+------------------+------------------+-----+----------------+
//! | item count (32)  | size 0 (32)      | id 0 (32)        | ... | item data ...  |
//! +------------------+------------------+------------------+-----+----------------+
//! ```
//!
//! Counts and sizes are 256-bit little-endian unsigned integers and are
//! decoded into [`BigUint`] without narrowing. Items follow the index
//! back-to-back in index order.

use num_bigint::BigUint;
use thiserror::Error;

use crate::id::{ID_LEN, ItemId};

/// Width of a numeric field (item count or item size).
pub const FIELD_LEN: usize = 32;

/// Width of one index entry: a size field followed by an id.
pub const ENTRY_LEN: usize = FIELD_LEN + ID_LEN;

/// The part of the index a decode error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// The leading item count.
    ItemCount,
    /// The index entry at this position.
    Entry(usize),
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ItemCount => f.write_str("item count"),
            Self::Entry(i) => write!(f, "entry {i}"),
        }
    }
}

/// Errors produced while decoding a bundle index.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The input ended before a complete field or entry.
    #[error("truncated bundle index: {section} needs {needed} bytes, {available} available")]
    TruncatedInput {
        /// Where decoding stopped.
        section: Section,
        /// Bytes the section requires.
        needed: usize,
        /// Bytes that were left.
        available: usize,
    },

    /// Decoding finished but the entries disagree with the declared count.
    #[error("corrupt bundle index: declared {declared} items, decoded {decoded}")]
    CorruptBundle {
        /// Item count from the index header.
        declared: BigUint,
        /// Entries actually decoded.
        decoded: usize,
    },
}

/// One entry of the bundle index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleItemDescriptor {
    size: BigUint,
    id: ItemId,
}

impl BundleItemDescriptor {
    /// Create a descriptor from a declared size and id.
    pub fn new(size: BigUint, id: ItemId) -> Self {
        Self { size, id }
    }

    /// Declared length of the data item in bytes.
    pub fn size(&self) -> &BigUint {
        &self.size
    }

    /// The data-item id.
    pub fn id(&self) -> &ItemId {
        &self.id
    }
}

/// Position of a data item relative to the first byte of its bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRange {
    /// The data-item id.
    pub id: ItemId,
    /// Offset of the item's first byte from the start of the bundle.
    pub offset: BigUint,
    /// Length of the item in bytes.
    pub size: BigUint,
}

/// A decoded bundle index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleHeader {
    item_count: BigUint,
    items: Vec<BundleItemDescriptor>,
}

impl BundleHeader {
    /// The item count declared by the index.
    pub fn item_count(&self) -> &BigUint {
        &self.item_count
    }

    /// Index entries in on-wire order.
    pub fn items(&self) -> &[BundleItemDescriptor] {
        &self.items
    }

    /// Byte length of the whole index; item data starts here.
    pub fn index_len(&self) -> BigUint {
        index_len_for(&self.item_count)
    }

    /// Bundle-relative ranges of every item.
    ///
    /// Item `i` starts at `index_len + size(0) + ... + size(i - 1)`.
    pub fn item_ranges(&self) -> Vec<ItemRange> {
        let mut offset = self.index_len();
        self.items
            .iter()
            .map(|item| {
                let range = ItemRange {
                    id: item.id,
                    offset: offset.clone(),
                    size: item.size.clone(),
                };
                offset += &item.size;
                range
            })
            .collect()
    }

    /// Locate an item by id.
    pub fn find(&self, id: &ItemId) -> Option<ItemRange> {
        self.item_ranges().into_iter().find(|r| &r.id == id)
    }
}

/// Byte length of an index declaring `count` items.
pub fn index_len_for(count: &BigUint) -> BigUint {
    count * (ENTRY_LEN as u32) + (FIELD_LEN as u32)
}

/// Read only the leading item count.
///
/// # Errors
///
/// Returns [`DecodeError::TruncatedInput`] if fewer than 32 bytes are given.
pub fn decode_item_count(raw: &[u8]) -> Result<BigUint, DecodeError> {
    let mut rest = raw;
    take::<FIELD_LEN>(&mut rest)
        .map(|field| BigUint::from_bytes_le(field))
        .ok_or(DecodeError::TruncatedInput {
            section: Section::ItemCount,
            needed: FIELD_LEN,
            available: raw.len(),
        })
}

/// Decode a bundle index from the leading bytes of a bundle.
///
/// Bytes past the index (the item data) are ignored.
///
/// # Errors
///
/// Returns [`DecodeError::TruncatedInput`] when the count or any entry is cut
/// short, and [`DecodeError::CorruptBundle`] if the decoded entries disagree
/// with the declared count.
pub fn decode(raw: &[u8]) -> Result<BundleHeader, DecodeError> {
    let item_count = decode_item_count(raw)?;
    let mut rest = &raw[FIELD_LEN..];

    // Counts that do not fit a usize can never be satisfied by an in-memory
    // buffer; the loop then stops at the first short entry.
    let expected = usize::try_from(&item_count).ok();
    let mut items = Vec::with_capacity(expected.unwrap_or(0).min(rest.len() / ENTRY_LEN));

    while expected.is_none_or(|n| items.len() < n) {
        let truncated = DecodeError::TruncatedInput {
            section: Section::Entry(items.len()),
            needed: ENTRY_LEN,
            available: rest.len(),
        };
        if rest.len() < ENTRY_LEN {
            return Err(truncated);
        }
        let (Some(size), Some(id)) = (take::<FIELD_LEN>(&mut rest), take::<ID_LEN>(&mut rest))
        else {
            return Err(truncated);
        };
        items.push(BundleItemDescriptor {
            size: BigUint::from_bytes_le(size),
            id: ItemId::new(*id),
        });
    }

    if BigUint::from(items.len()) != item_count {
        return Err(DecodeError::CorruptBundle {
            declared: item_count,
            decoded: items.len(),
        });
    }

    Ok(BundleHeader { item_count, items })
}

fn take<'a, const N: usize>(buf: &mut &'a [u8]) -> Option<&'a [u8; N]> {
    let (head, tail) = buf.split_first_chunk::<N>()?;
    *buf = tail;
    Some(head)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(n: u64) -> [u8; FIELD_LEN] {
        let mut out = [0u8; FIELD_LEN];
        out[..8].copy_from_slice(&n.to_le_bytes());
        out
    }

    fn bundle(count: u64, entries: &[(u64, u8)]) -> Vec<u8> {
        let mut raw = field(count).to_vec();
        for (size, fill) in entries {
            raw.extend_from_slice(&field(*size));
            raw.extend_from_slice(&[*fill; ID_LEN]);
        }
        raw
    }

    #[test]
    fn decodes_entries_in_order() {
        let raw = bundle(3, &[(10, 1), (20, 2), (30, 3)]);
        let header = decode(&raw).unwrap();

        assert_eq!(header.item_count(), &BigUint::from(3u32));
        assert_eq!(header.items().len(), 3);
        for (item, (size, fill)) in header.items().iter().zip([(10u32, 1u8), (20, 2), (30, 3)]) {
            assert_eq!(item.size(), &BigUint::from(size));
            assert_eq!(item.id().as_bytes(), &[fill; ID_LEN]);
        }
    }

    #[test]
    fn decodes_any_number_of_entries() {
        for n in [0u64, 1, 2, 7, 64, 300] {
            let entries: Vec<(u64, u8)> = (0..n).map(|i| (i * 3 + 1, i as u8)).collect();
            let header = decode(&bundle(n, &entries)).unwrap();

            assert_eq!(header.item_count(), &BigUint::from(n));
            assert_eq!(header.items().len(), entries.len());
            for (item, (size, fill)) in header.items().iter().zip(&entries) {
                assert_eq!(item.size(), &BigUint::from(*size));
                assert_eq!(item.id().as_bytes(), &[*fill; ID_LEN]);
            }
        }
    }

    #[test]
    fn empty_bundle_has_no_items() {
        let header = decode(&field(0)).unwrap();
        assert!(header.items().is_empty());
        assert_eq!(header.index_len(), BigUint::from(32u32));
    }

    #[test]
    fn trailing_item_data_is_ignored() {
        let mut raw = bundle(1, &[(4, 9)]);
        raw.extend_from_slice(b"data");
        let header = decode(&raw).unwrap();
        assert_eq!(header.items().len(), 1);
    }

    #[test]
    fn short_input_is_truncated() {
        for len in [0, 1, 31] {
            let err = decode(&vec![0u8; len]).unwrap_err();
            assert_eq!(
                err,
                DecodeError::TruncatedInput {
                    section: Section::ItemCount,
                    needed: 32,
                    available: len,
                }
            );
        }
    }

    #[test]
    fn overstated_count_fails_at_first_missing_entry() {
        let raw = bundle(3, &[(10, 1), (20, 2)]);
        let err = decode(&raw).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedInput {
                section: Section::Entry(2),
                needed: 64,
                available: 0,
            }
        );
    }

    #[test]
    fn partial_entry_is_truncated() {
        let mut raw = bundle(2, &[(10, 1)]);
        raw.extend_from_slice(&field(20));
        let err = decode(&raw).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedInput {
                section: Section::Entry(1),
                needed: 64,
                available: 32,
            }
        );
    }

    #[test]
    fn full_width_count_is_not_narrowed() {
        // 2^255: far past any machine word, so it must read as truncation.
        let mut raw = [0u8; FIELD_LEN];
        raw[FIELD_LEN - 1] = 0x80;
        assert_eq!(decode_item_count(&raw).unwrap(), BigUint::from(1u32) << 255u32);
        assert!(matches!(
            decode(&raw),
            Err(DecodeError::TruncatedInput {
                section: Section::Entry(0),
                ..
            })
        ));
    }

    #[test]
    fn full_width_size_is_preserved() {
        let mut raw = field(1).to_vec();
        raw.extend_from_slice(&[0xff; FIELD_LEN]);
        raw.extend_from_slice(&[7; ID_LEN]);
        let header = decode(&raw).unwrap();
        let max = (BigUint::from(1u32) << 256u32) - 1u32;
        assert_eq!(header.items()[0].size(), &max);
    }

    #[test]
    fn item_ranges_accumulate_sizes() {
        let raw = bundle(3, &[(10, 1), (20, 2), (30, 3)]);
        let header = decode(&raw).unwrap();
        let ranges = header.item_ranges();

        // Index: 32 + 3 * 64 = 224.
        let offsets: Vec<BigUint> = ranges.iter().map(|r| r.offset.clone()).collect();
        assert_eq!(
            offsets,
            vec![
                BigUint::from(224u32),
                BigUint::from(234u32),
                BigUint::from(254u32)
            ]
        );
    }

    #[test]
    fn find_locates_item_by_id() {
        let raw = bundle(2, &[(10, 1), (20, 2)]);
        let header = decode(&raw).unwrap();

        let found = header.find(&ItemId::new([2; ID_LEN])).unwrap();
        assert_eq!(found.offset, BigUint::from(170u32));
        assert_eq!(found.size, BigUint::from(20u32));
        assert!(header.find(&ItemId::new([5; ID_LEN])).is_none());
    }

    #[test]
    fn index_len_scales_with_count() {
        assert_eq!(index_len_for(&BigUint::from(4096u32)), BigUint::from(262_176u32));
    }
}
