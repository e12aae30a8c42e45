//! Gateway access - the only place the pipeline touches the network.

pub mod chunk;
pub mod http;

use async_trait::async_trait;
use bytes::Bytes;
use dissector_schema::ByteRange;
use num_bigint::BigUint;

use crate::error::DissectError;

pub use http::HttpGateway;

/// A source of transaction metadata and data bytes.
///
/// Each method is a single request/response. Implementations report
/// failures and leave retrying to the caller.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Raw body of `GET /tx/{tx_id}`.
    async fn tx(&self, tx_id: &str) -> Result<Bytes, DissectError>;

    /// Raw body of `GET /tx/{tx_id}/offset`.
    async fn tx_offset(&self, tx_id: &str) -> Result<Bytes, DissectError>;

    /// `len` bytes starting `skip` bytes into the data located by `range`.
    ///
    /// Must return exactly `len` bytes or an error, and must reject a read
    /// past the end of `range` without making a request.
    async fn fetch_at(
        &self,
        range: &ByteRange,
        skip: &BigUint,
        len: usize,
    ) -> Result<Bytes, DissectError>;

    /// The first `len` bytes of the data located by `range`.
    async fn fetch_range(&self, range: &ByteRange, len: usize) -> Result<Bytes, DissectError> {
        self.fetch_at(range, &BigUint::default(), len).await
    }
}
