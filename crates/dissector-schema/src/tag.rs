//! Transaction tags, kept in the base64url form the gateway reports them in.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// `Bundle-Format`, base64url-encoded.
pub const BUNDLE_FORMAT_NAME: &str = "QnVuZGxlLUZvcm1hdA";
/// `binary`, base64url-encoded.
pub const BUNDLE_FORMAT_VALUE: &str = "YmluYXJ5";
/// `Bundle-Version`, base64url-encoded.
pub const BUNDLE_VERSION_NAME: &str = "QnVuZGxlLVZlcnNpb24";
/// `2.0.0`, base64url-encoded.
pub const BUNDLE_VERSION_VALUE: &str = "Mi4wLjA";

/// A single name/value tag attached to a transaction.
///
/// Both fields hold the encoded strings exactly as received. Nothing is
/// decoded unless a caller asks for the plaintext explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    name: String,
    value: String,
}

impl Tag {
    /// Create a tag from already-encoded name and value strings.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// The encoded tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The encoded tag value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The tag name decoded to UTF-8 plaintext, if it is valid base64url.
    pub fn decoded_name(&self) -> Option<String> {
        decode_text(&self.name)
    }

    /// The tag value decoded to UTF-8 plaintext, if it is valid base64url.
    pub fn decoded_value(&self) -> Option<String> {
        decode_text(&self.value)
    }
}

/// Compare a tag against an expected encoded name and value.
///
/// The comparison is exact and case-sensitive on the encoded form. A tag whose
/// value is the plaintext `binary` does not match `YmluYXJ5`.
pub fn matches(tag: &Tag, expected_name: &str, expected_value: &str) -> bool {
    tag.name.as_bytes() == expected_name.as_bytes()
        && tag.value.as_bytes() == expected_value.as_bytes()
}

fn decode_text(encoded: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded.trim_end_matches('='))
        .ok()?;
    String::from_utf8(bytes).ok()
}
