//! # Verification Reference Codec
//!
//! A verification reference is the `(document id, hash)` pair, rendered
//! positionally as `{prefix}/{id}/{hash}`. It is derived, never persisted.
//! The same string goes into the QR code and the printed URL.
//!
//! Hashes are restricted to the path-segment-safe alphabet `[A-Za-z0-9_-]`
//! so the URL never needs escaping.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use muni_core::{DocumentId, VerificationPrefix};

/// Errors from encoding or decoding a verification reference.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    /// Input does not contain `{id}/{hash}`, or does not sit under the
    /// expected prefix.
    #[error("malformed verification reference: {0}")]
    Malformed(String),

    /// The id segment is not a positive integer.
    #[error("invalid document id in verification reference: {0:?}")]
    InvalidId(String),

    /// The hash segment is empty or outside the path-safe alphabet.
    #[error("invalid hash in verification reference: {0:?}")]
    InvalidHash(String),
}

/// A decoded `(document id, hash)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReference {
    pub document_id: DocumentId,
    pub hash: String,
}

/// Whether `hash` is non-empty and uses only `[A-Za-z0-9_-]`.
pub fn is_path_safe_hash(hash: &str) -> bool {
    !hash.is_empty()
        && hash
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

impl VerificationReference {
    /// Build a reference, checking the hash alphabet.
    pub fn new(document_id: DocumentId, hash: &str) -> Result<Self, ReferenceError> {
        if !is_path_safe_hash(hash) {
            return Err(ReferenceError::InvalidHash(hash.to_string()));
        }
        Ok(Self {
            document_id,
            hash: hash.to_string(),
        })
    }

    /// `{prefix}/{id}/{hash}`.
    pub fn encode(&self, prefix: &VerificationPrefix) -> String {
        format!("{}/{}/{}", prefix.as_str(), self.document_id, self.hash)
    }

    /// Decode a full URL or a bare `{id}/{hash}` path.
    ///
    /// Query strings and fragments are ignored; the last two non-empty path
    /// segments are taken as id and hash.
    pub fn decode(input: &str) -> Result<Self, ReferenceError> {
        let input = input.trim();
        let segments: Vec<String> = match Url::parse(input) {
            Ok(url) if url.has_host() => url
                .path_segments()
                .map(|s| s.filter(|seg| !seg.is_empty()).map(str::to_string).collect())
                .unwrap_or_default(),
            _ => {
                let path = input.split(['?', '#']).next().unwrap_or_default();
                path.split('/')
                    .filter(|seg| !seg.is_empty())
                    .map(str::to_string)
                    .collect()
            }
        };

        let [.., id, hash] = segments.as_slice() else {
            return Err(ReferenceError::Malformed(format!(
                "expected {{id}}/{{hash}}, found {} path segment(s)",
                segments.len()
            )));
        };
        let document_id =
            DocumentId::parse(id).map_err(|_| ReferenceError::InvalidId(id.clone()))?;
        Self::new(document_id, hash)
    }

    /// Decode, additionally requiring the input to sit directly under
    /// `prefix`.
    pub fn decode_under(input: &str, prefix: &VerificationPrefix) -> Result<Self, ReferenceError> {
        let input = input.trim();
        let rest = input
            .strip_prefix(prefix.as_str())
            .and_then(|r| r.strip_prefix('/'))
            .ok_or_else(|| {
                ReferenceError::Malformed(format!("reference is not under prefix {prefix}"))
            })?;
        let path = rest.split(['?', '#']).next().unwrap_or_default();
        if path.trim_end_matches('/').split('/').count() != 2 {
            return Err(ReferenceError::Malformed(format!(
                "expected exactly {{id}}/{{hash}} after prefix {prefix}"
            )));
        }
        Self::decode(path)
    }
}

/// Encode `(document_id, hash)` under `prefix`.
pub fn encode_reference(
    prefix: &VerificationPrefix,
    document_id: DocumentId,
    hash: &str,
) -> Result<String, ReferenceError> {
    Ok(VerificationReference::new(document_id, hash)?.encode(prefix))
}

/// Decode a full URL or bare `{id}/{hash}` path.
pub fn decode_reference(input: &str) -> Result<VerificationReference, ReferenceError> {
    VerificationReference::decode(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HASH: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

    fn prefix() -> VerificationPrefix {
        VerificationPrefix::parse("https://muni.example/verify").unwrap()
    }

    fn id(n: i64) -> DocumentId {
        DocumentId::new(n).unwrap()
    }

    #[test]
    fn encode_is_positional() {
        assert_eq!(
            encode_reference(&prefix(), id(12), HASH).unwrap(),
            format!("https://muni.example/verify/12/{HASH}")
        );
    }

    #[test]
    fn encode_rejects_path_unsafe_hash() {
        for bad in ["", "abc/def", "ab+cd", "abc=", "ab cd"] {
            assert!(matches!(
                encode_reference(&prefix(), id(1), bad),
                Err(ReferenceError::InvalidHash(_))
            ));
        }
    }

    #[test]
    fn decode_full_url_ignores_query_and_fragment() {
        let r = decode_reference(&format!("https://other.host/a/b/12/{HASH}?utm=qr#top")).unwrap();
        assert_eq!(r.document_id, id(12));
        assert_eq!(r.hash, HASH);
    }

    #[test]
    fn decode_bare_path() {
        let r = decode_reference(&format!("/12/{HASH}/")).unwrap();
        assert_eq!(r, VerificationReference::new(id(12), HASH).unwrap());
    }

    #[test]
    fn decode_errors_are_specific() {
        assert!(matches!(decode_reference("https://muni.example/"), Err(ReferenceError::Malformed(_))));
        assert!(matches!(decode_reference(HASH), Err(ReferenceError::Malformed(_))));
        assert!(matches!(decode_reference(&format!("abc/{HASH}")), Err(ReferenceError::InvalidId(_))));
        assert!(matches!(decode_reference(&format!("0/{HASH}")), Err(ReferenceError::InvalidId(_))));
        assert!(matches!(decode_reference("12/ab%2Fcd"), Err(ReferenceError::InvalidHash(_))));
    }

    #[test]
    fn decode_under_requires_prefix() {
        let url = format!("https://muni.example/verify/5/{HASH}");
        assert_eq!(VerificationReference::decode_under(&url, &prefix()).unwrap().document_id, id(5));

        let elsewhere = format!("https://evil.example/verify/5/{HASH}");
        assert!(matches!(
            VerificationReference::decode_under(&elsewhere, &prefix()),
            Err(ReferenceError::Malformed(_))
        ));

        let nested = format!("https://muni.example/verify/x/5/{HASH}");
        assert!(VerificationReference::decode_under(&nested, &prefix()).is_err());
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(raw in 1i64..=i64::MAX, hash in "[A-Za-z0-9_-]{1,88}") {
            let url = encode_reference(&prefix(), id(raw), &hash).unwrap();
            let back = decode_reference(&url).unwrap();
            prop_assert_eq!(back.document_id, id(raw));
            prop_assert_eq!(back.hash, hash);
        }
    }
}
