//! Shared types and binary codecs for ANS-104 bundles.
//!
//! Everything in this crate is pure: no network or filesystem access. The
//! gateway-facing half of the pipeline lives in `dissector-core`.

pub mod bundle;
pub mod id;
pub mod item;
pub mod tag;
pub mod types;

// Re-exports
pub use bundle::{BundleHeader, BundleItemDescriptor, DecodeError, ItemRange, Section};
pub use id::{ItemId, ItemIdError};
pub use item::{DataItemHeader, ItemError, SignatureType};
pub use tag::Tag;
pub use types::{ByteRange, TransactionHeader};

/// Largest chunk the storage layer serves from a single `/chunk` request (256 KiB).
pub const MAX_CHUNK_SIZE: usize = 262_144;
