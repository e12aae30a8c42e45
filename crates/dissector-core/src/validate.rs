//! ANS-104 bundle tag validation.

use dissector_schema::TransactionHeader;
use dissector_schema::tag::{
    BUNDLE_FORMAT_NAME, BUNDLE_FORMAT_VALUE, BUNDLE_VERSION_NAME, BUNDLE_VERSION_VALUE, matches,
};

use crate::error::DissectError;

/// Tag pairs a transaction must carry to be read as a binary bundle.
const REQUIRED: [(&str, &str, &str); 2] = [
    (BUNDLE_FORMAT_NAME, BUNDLE_FORMAT_VALUE, "Bundle-Format: binary"),
    (BUNDLE_VERSION_NAME, BUNDLE_VERSION_VALUE, "Bundle-Version: 2.0.0"),
];

/// Confirm `header` is tagged as an ANS-104 v2.0.0 binary bundle and return
/// its data root.
///
/// Tag position does not matter; both pairs just have to be present.
///
/// # Errors
///
/// `InvalidBundleFormat` naming the first required tag that is missing or
/// carries a different value.
pub fn validate(header: &TransactionHeader) -> Result<&str, DissectError> {
    for (name, value, label) in REQUIRED {
        if !header.tags.iter().any(|tag| matches(tag, name, value)) {
            return Err(DissectError::InvalidBundleFormat(format!(
                "missing tag {label}"
            )));
        }
    }
    Ok(&header.data_root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use dissector_schema::Tag;

    fn header(tags: Vec<Tag>) -> TransactionHeader {
        TransactionHeader {
            format: 2,
            data_root: "R1".to_string(),
            tags,
        }
    }

    fn format_tag() -> Tag {
        Tag::new(BUNDLE_FORMAT_NAME, BUNDLE_FORMAT_VALUE)
    }

    fn version_tag(value: &str) -> Tag {
        Tag::new(BUNDLE_VERSION_NAME, value)
    }

    #[test]
    fn accepts_bundle_and_returns_data_root() {
        let h = header(vec![format_tag(), version_tag(BUNDLE_VERSION_VALUE)]);
        assert_eq!(validate(&h).unwrap(), "R1");
    }

    #[test]
    fn order_does_not_matter() {
        let h = header(vec![
            Tag::new("Q29udGVudC1UeXBl", "YXBwbGljYXRpb24vanNvbg"),
            version_tag(BUNDLE_VERSION_VALUE),
            format_tag(),
        ]);
        assert!(validate(&h).is_ok());
    }

    #[test]
    fn wrong_version_is_rejected() {
        // "2.0.1"
        let h = header(vec![format_tag(), version_tag("Mi4wLjE")]);
        let err = validate(&h).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidBundleFormat);
        assert!(err.to_string().contains("Bundle-Version"));
    }

    #[test]
    fn missing_format_is_rejected() {
        let h = header(vec![version_tag(BUNDLE_VERSION_VALUE)]);
        let err = validate(&h).unwrap_err();
        assert!(err.to_string().contains("Bundle-Format"));
    }

    #[test]
    fn plaintext_tags_are_rejected() {
        let h = header(vec![
            Tag::new("Bundle-Format", "binary"),
            Tag::new("Bundle-Version", "2.0.0"),
        ]);
        assert_eq!(validate(&h).unwrap_err().kind(), ErrorKind::InvalidBundleFormat);
    }
}
