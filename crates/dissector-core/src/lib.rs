//! Core library for the bundle dissector.
//!
//! Resolves an Arweave transaction into its ANS-104 bundle index:
//!
//! 1. [`resolve::resolve`] fetches the transaction header.
//! 2. [`validate::validate`] checks the bundle tags.
//! 3. [`resolve::resolve_range`] locates the data in the weave.
//! 4. [`pipeline::read_index`] pulls just enough bytes to cover the index.
//! 5. [`dissector_schema::bundle::decode`] turns those bytes into a [`BundleHeader`].
//!
//! [`pipeline::dissect`] runs all five in order. [`pipeline::read_item`] then
//! decodes the header of one data item in the bundle. Network access goes through
//! the [`Gateway`] trait so every step can be exercised without a live node.

pub mod config;
pub mod error;
pub mod gateway;
pub mod pipeline;
pub mod resolve;
pub mod validate;

pub use config::GatewayConfig;
pub use error::{DissectError, ErrorKind};
pub use gateway::{Gateway, HttpGateway};
pub use pipeline::{DataItem, Dissection, dissect, read_item};

pub use dissector_schema::{BundleHeader, ByteRange, TransactionHeader};

/// User Agent string for gateway requests
pub const USER_AGENT: &str = concat!("dissector-core/", env!("CARGO_PKG_VERSION"));
