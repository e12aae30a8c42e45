//! HTTP gateway backed by `reqwest`.

use async_trait::async_trait;
use bytes::Bytes;
use dissector_schema::{ByteRange, MAX_CHUNK_SIZE};
use num_bigint::BigUint;
use reqwest::Client;

use super::Gateway;
use super::chunk::decode_chunk;
use crate::config::GatewayConfig;
use crate::error::DissectError;

/// Talks to an Arweave node or gateway over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    config: GatewayConfig,
}

impl HttpGateway {
    /// Build a gateway with its own client.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(config: GatewayConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    async fn get(&self, path: &str) -> Result<Bytes, DissectError> {
        let url = self.config.url(path);
        tracing::debug!("GET {url}");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DissectError::NotFound(format!("{url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DissectError::NotFound(format!("{url} returned {status}")));
        }

        resp.bytes()
            .await
            .map_err(|e| DissectError::Unreadable(format!("{url}: {e}")))
    }

    /// Decoded data of the chunk containing absolute weave offset `offset`.
    ///
    /// # Errors
    ///
    /// Fails like any other request, or with `MalformedMetadata` if the body
    /// is not a chunk response.
    pub async fn chunk(&self, offset: &BigUint) -> Result<Vec<u8>, DissectError> {
        let body = self.get(&format!("chunk/{offset}")).await?;
        decode_chunk(&body)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn tx(&self, tx_id: &str) -> Result<Bytes, DissectError> {
        self.get(&format!("tx/{tx_id}")).await
    }

    async fn tx_offset(&self, tx_id: &str) -> Result<Bytes, DissectError> {
        self.get(&format!("tx/{tx_id}/offset")).await
    }

    /// Stitches consecutive `/chunk` responses starting at `range.start()`.
    ///
    /// Transaction data is chunk-aligned, so the next chunk always begins
    /// right after the bytes already walked. Chunks wholly before `skip` are
    /// fetched and dropped; the gateway cannot seek inside a transaction.
    async fn fetch_at(
        &self,
        range: &ByteRange,
        skip: &BigUint,
        len: usize,
    ) -> Result<Bytes, DissectError> {
        let needed = skip + len;
        if needed > *range.size() {
            return Err(DissectError::RangeTooShort {
                needed,
                size: range.size().clone(),
            });
        }

        let start = range.start();
        let mut walked = BigUint::default();
        let mut buf = Vec::with_capacity(len.min(MAX_CHUNK_SIZE));

        while buf.len() < len {
            let at = &start + &walked;
            let chunk = self.chunk(&at).await?;
            if chunk.is_empty() {
                return Err(DissectError::Unreadable(format!(
                    "empty chunk at offset {at} after {} of {len} bytes",
                    buf.len()
                )));
            }

            let end = &walked + chunk.len();
            if end > *skip {
                // Only the chunk holding `skip` starts part-way in.
                let from = if *skip > walked {
                    usize::try_from(skip - &walked).unwrap_or(chunk.len())
                } else {
                    0
                };
                let want = (len - buf.len()).min(chunk.len() - from);
                buf.extend_from_slice(&chunk[from..from + want]);
                tracing::trace!("Read {} of {len} bytes (chunk at {at})", buf.len());
            } else {
                tracing::trace!("Skipped chunk at {at}");
            }
            walked = end;
        }

        Ok(Bytes::from(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use mockito::Server;

    fn gateway(url: &str) -> HttpGateway {
        HttpGateway::new(GatewayConfig::new(url)).unwrap()
    }

    fn chunk_body(data: &[u8]) -> String {
        format!(r#"{{"chunk":"{}"}}"#, URL_SAFE_NO_PAD.encode(data))
    }

    #[tokio::test]
    async fn missing_transaction_is_not_found() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/tx/missing")
            .with_status(404)
            .with_body("Not Found.")
            .create_async()
            .await;

        let err = gateway(&server.url()).tx("missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn returns_offset_body() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/tx/T1/offset")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"size":"128","offset":"1000"}"#)
            .create_async()
            .await;

        let body = gateway(&server.url()).tx_offset("T1").await.unwrap();
        assert_eq!(&body[..], br#"{"size":"128","offset":"1000"}"#);
    }

    #[tokio::test]
    async fn unreachable_gateway_is_not_found() {
        // Port 9 (discard) is not expected to be listening.
        let err = gateway("http://127.0.0.1:9").tx("T1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn stitches_chunks_and_truncates_surplus() {
        let mut server = Server::new_async().await;
        let first: Vec<u8> = (0..100).collect();
        let second: Vec<u8> = (100..200).collect();

        // Range of 200 bytes ending at 1199 starts at 1000.
        let m1 = server
            .mock("GET", "/chunk/1000")
            .with_status(200)
            .with_body(chunk_body(&first))
            .expect(1)
            .create_async()
            .await;
        let m2 = server
            .mock("GET", "/chunk/1100")
            .with_status(200)
            .with_body(chunk_body(&second))
            .expect(1)
            .create_async()
            .await;

        let range = ByteRange::new(BigUint::from(1199u32), BigUint::from(200u32));
        let bytes = gateway(&server.url()).fetch_range(&range, 150).await.unwrap();

        assert_eq!(bytes.len(), 150);
        assert_eq!(&bytes[..], &(0..150).collect::<Vec<u8>>()[..]);
        m1.assert_async().await;
        m2.assert_async().await;
    }

    #[tokio::test]
    async fn single_chunk_covers_short_read() {
        let mut server = Server::new_async().await;
        let data: Vec<u8> = (0..64).collect();
        let m = server
            .mock("GET", "/chunk/873")
            .with_status(200)
            .with_body(chunk_body(&data))
            .expect(1)
            .create_async()
            .await;

        let range = ByteRange::new(BigUint::from(1000u32), BigUint::from(128u32));
        let bytes = gateway(&server.url()).fetch_range(&range, 32).await.unwrap();

        assert_eq!(&bytes[..], &data[..32]);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn read_past_range_is_rejected_without_requests() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let range = ByteRange::new(BigUint::from(1000u32), BigUint::from(16u32));
        let err = gateway(&server.url()).fetch_range(&range, 32).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TruncatedInput);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn empty_chunk_is_unreadable() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/chunk/0")
            .with_status(200)
            .with_body(r#"{"chunk":""}"#)
            .create_async()
            .await;

        let range = ByteRange::new(BigUint::from(9u32), BigUint::from(10u32));
        let err = gateway(&server.url()).fetch_range(&range, 10).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unreadable);
    }

    #[tokio::test]
    async fn skip_lands_inside_a_later_chunk() {
        let mut server = Server::new_async().await;
        let first: Vec<u8> = (0..100).collect();
        let second: Vec<u8> = (100..200).collect();
        let _m1 = server
            .mock("GET", "/chunk/1000")
            .with_status(200)
            .with_body(chunk_body(&first))
            .create_async()
            .await;
        let _m2 = server
            .mock("GET", "/chunk/1100")
            .with_status(200)
            .with_body(chunk_body(&second))
            .create_async()
            .await;

        let range = ByteRange::new(BigUint::from(1199u32), BigUint::from(200u32));
        let bytes = gateway(&server.url())
            .fetch_at(&range, &BigUint::from(130u32), 20)
            .await
            .unwrap();

        assert_eq!(&bytes[..], &(130..150).collect::<Vec<u8>>()[..]);
    }

    #[tokio::test]
    async fn read_past_end_with_skip_is_rejected() {
        let server = Server::new_async().await;
        let range = ByteRange::new(BigUint::from(1199u32), BigUint::from(200u32));
        let err = gateway(&server.url())
            .fetch_at(&range, &BigUint::from(190u32), 20)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedInput);
    }

    #[tokio::test]
    async fn huge_declared_index_is_rejected_not_allocated() {
        let mut server = Server::new_async().await;
        let _tx = server
            .mock("GET", "/tx/T1")
            .with_status(200)
            .with_body(
                r#"{"data_root":"R1","tags":[
                    {"name":"QnVuZGxlLUZvcm1hdA","value":"YmluYXJ5"},
                    {"name":"QnVuZGxlLVZlcnNpb24","value":"Mi4wLjA"}]}"#,
            )
            .create_async()
            .await;
        let _offset = server
            .mock("GET", "/tx/T1/offset")
            .with_status(200)
            .with_body(r#"{"size":"18446744073709551615","offset":"36893488147419103232"}"#)
            .create_async()
            .await;

        // Item count 2^57: an index of 2^63 + 32 bytes.
        let mut head = vec![0u8; MAX_CHUNK_SIZE];
        head[7] = 0x02;
        let first = server
            .mock("GET", "/chunk/18446744073709551618")
            .with_status(200)
            .with_body(chunk_body(&head))
            .expect(1)
            .create_async()
            .await;

        let err = crate::pipeline::dissect(&gateway(&server.url()), "T1")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unreadable);
        first.assert_async().await;
    }
}
