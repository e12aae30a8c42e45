//! Decoding of `/chunk/{offset}` responses.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use dissector_schema::MAX_CHUNK_SIZE;
use serde::Deserialize;

use crate::error::DissectError;

#[derive(Deserialize)]
struct ChunkBody {
    chunk: String,
}

/// Extract the data bytes from a chunk response body.
///
/// # Errors
///
/// Returns `MalformedMetadata` if the body is not JSON with a base64url
/// `chunk` field, or if the decoded chunk exceeds [`MAX_CHUNK_SIZE`].
pub fn decode_chunk(body: &[u8]) -> Result<Vec<u8>, DissectError> {
    let ChunkBody { chunk } =
        serde_json::from_slice(body).map_err(|e| DissectError::malformed("chunk", e))?;

    let data = URL_SAFE_NO_PAD
        .decode(chunk.trim_end_matches('='))
        .map_err(|e| DissectError::malformed("chunk", e))?;

    if data.len() > MAX_CHUNK_SIZE {
        return Err(DissectError::malformed(
            "chunk",
            format!("{} bytes exceeds the {MAX_CHUNK_SIZE} byte maximum", data.len()),
        ));
    }

    Ok(data)
}
