//! Integrity verification of pinned binary artifacts.
//!
//! A pinned resource carries an expected SHA-384 digest produced at build
//! time. Verification hashes the whole payload and compares byte for byte.
//! The verifier never errors: anything that prevents a clean comparison is an
//! [`Verdict::Invalid`], so the caller's refetch path always runs.

use std::fmt;

use bytes::Bytes;
use intercache_core::{Error, PinnedResource};
use regex::Regex;
use sha2::{Digest, Sha384};
use url::Url;

/// Textual prefix of a pinned digest.
pub const DIGEST_PREFIX: &str = "sha384-";

/// SHA-384 output width in bytes.
pub const DIGEST_LEN: usize = 48;

/// Error type for digest parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DigestError {
    #[error("digest must start with \"sha384-\"")]
    MissingPrefix,

    #[error("digest must be 48 bytes, got {0}")]
    WrongLength(usize),

    #[error("digest is not hex: {0}")]
    InvalidHex(String),
}

/// The reference value a resource must hash to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedDigest {
    Pinned([u8; DIGEST_LEN]),
    /// No usable pinned value. Every verification fails.
    Unpinned,
}

impl ExpectedDigest {
    /// Parse `sha384-<96 hex chars>`.
    pub fn parse(value: &str) -> Result<Self, DigestError> {
        let hex_part = value.trim().strip_prefix(DIGEST_PREFIX).ok_or(DigestError::MissingPrefix)?;
        let raw = hex::decode(hex_part).map_err(|e| DigestError::InvalidHex(e.to_string()))?;
        let bytes: [u8; DIGEST_LEN] = raw.as_slice().try_into().map_err(|_| DigestError::WrongLength(raw.len()))?;
        Ok(Self::Pinned(bytes))
    }

    /// Lenient form used for build-time input: anything unusable is unpinned.
    pub fn from_config(value: Option<&str>) -> Self {
        match value.map(Self::parse) {
            Some(Ok(digest)) => digest,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "ignoring malformed pinned digest; verification will fail closed");
                Self::Unpinned
            }
            None => Self::Unpinned,
        }
    }

    /// Digest of `payload`, for producing pinned values.
    pub fn of(payload: &[u8]) -> Self {
        Self::Pinned(sha384(payload))
    }

    pub fn is_pinned(&self) -> bool {
        matches!(self, Self::Pinned(_))
    }
}

impl fmt::Display for ExpectedDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pinned(bytes) => write!(f, "{DIGEST_PREFIX}{}", hex::encode(bytes)),
            Self::Unpinned => f.write_str("unpinned"),
        }
    }
}

fn sha384(payload: &[u8]) -> [u8; DIGEST_LEN] {
    let digest = Sha384::digest(payload);
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&digest);
    out
}

/// Why a payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    Mismatch,
    Unpinned,
    Internal(String),
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mismatch => f.write_str("digest mismatch"),
            Self::Unpinned => f.write_str("no pinned digest"),
            Self::Internal(msg) => write!(f, "verifier failed: {msg}"),
        }
    }
}

/// Outcome of a verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid(InvalidReason),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }
}

/// Stateless SHA-384 verifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegrityVerifier;

impl IntegrityVerifier {
    /// Hash `payload` on the blocking pool and compare it to `expected`.
    pub async fn verify(&self, payload: Bytes, expected: &ExpectedDigest) -> Verdict {
        let ExpectedDigest::Pinned(want) = expected else {
            return Verdict::Invalid(InvalidReason::Unpinned);
        };
        let want = *want;

        match tokio::task::spawn_blocking(move || sha384(&payload)).await {
            Ok(got) if got == want => Verdict::Valid,
            Ok(_) => Verdict::Invalid(InvalidReason::Mismatch),
            Err(e) => Verdict::Invalid(InvalidReason::Internal(e.to_string())),
        }
    }
}

/// URL patterns of pinned resources with their expected digests.
#[derive(Debug, Clone, Default)]
pub struct PinnedSet {
    entries: Vec<(Regex, ExpectedDigest)>,
}

impl PinnedSet {
    /// Compile the configured patterns.
    pub fn from_config(resources: &[PinnedResource]) -> Result<Self, Error> {
        let entries = resources
            .iter()
            .map(|r| {
                let pattern = Regex::new(&r.pattern)
                    .map_err(|e| Error::InvalidInput(format!("bad pinned pattern {:?}: {e}", r.pattern)))?;
                Ok((pattern, ExpectedDigest::from_config(r.digest.as_deref())))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(Self { entries })
    }

    pub fn matches(&self, url: &Url) -> bool {
        self.expected_for(url).is_some()
    }

    /// Digest for the first pattern matching `url`.
    pub fn expected_for(&self, url: &Url) -> Option<&ExpectedDigest> {
        self.entries
            .iter()
            .find(|(pattern, _)| pattern.is_match(url.as_str()))
            .map(|(_, digest)| digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WASM: &[u8] = b"\0asm\x01\0\0\0 pretend module";

    #[test]
    fn test_parse_round_trips_display() {
        let digest = ExpectedDigest::of(WASM);
        let text = digest.to_string();
        assert!(text.starts_with(DIGEST_PREFIX));
        assert_eq!(text.len(), DIGEST_PREFIX.len() + DIGEST_LEN * 2);
        assert_eq!(ExpectedDigest::parse(&text).unwrap(), digest);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(ExpectedDigest::parse("sha256-abcd"), Err(DigestError::MissingPrefix));
        assert_eq!(ExpectedDigest::parse("sha384-abcd"), Err(DigestError::WrongLength(2)));
        assert!(matches!(ExpectedDigest::parse("sha384-zz"), Err(DigestError::InvalidHex(_))));
    }

    #[test]
    fn test_placeholder_is_unpinned() {
        let digest = ExpectedDigest::from_config(Some("sha384-placeholder-hash-will-be-generated-at-build-time"));
        assert_eq!(digest, ExpectedDigest::Unpinned);
        assert_eq!(ExpectedDigest::from_config(None), ExpectedDigest::Unpinned);
    }

    #[tokio::test]
    async fn test_verify_valid() {
        let expected = ExpectedDigest::of(WASM);
        let verdict = IntegrityVerifier.verify(Bytes::from_static(WASM), &expected).await;
        assert_eq!(verdict, Verdict::Valid);
    }

    #[tokio::test]
    async fn test_verify_mismatch() {
        let expected = ExpectedDigest::of(WASM);
        let verdict = IntegrityVerifier.verify(Bytes::from_static(b"tampered"), &expected).await;
        assert_eq!(verdict, Verdict::Invalid(InvalidReason::Mismatch));
    }

    #[tokio::test]
    async fn test_verify_unpinned_fails_closed() {
        let verdict = IntegrityVerifier.verify(Bytes::from_static(WASM), &ExpectedDigest::Unpinned).await;
        assert_eq!(verdict, Verdict::Invalid(InvalidReason::Unpinned));
    }

    #[tokio::test]
    async fn test_verify_is_deterministic() {
        let expected = ExpectedDigest::of(WASM);
        let first = IntegrityVerifier.verify(Bytes::from_static(WASM), &expected).await;
        let second = IntegrityVerifier.verify(Bytes::from_static(WASM), &expected).await;
        assert_eq!(first, second);
    }

    #[test]
    fn test_verdict_is_valid() {
        assert!(Verdict::Valid.is_valid());
        assert!(!Verdict::Invalid(InvalidReason::Mismatch).is_valid());
        assert!(!Verdict::Invalid(InvalidReason::Unpinned).is_valid());
    }

    #[test]
    fn test_pinned_set_lookup() {
        let set = PinnedSet::from_config(&[
            PinnedResource { pattern: r"/algorithms\.wasm(\?|$)".into(), digest: Some(ExpectedDigest::of(WASM).to_string()) },
            PinnedResource { pattern: r"/algorithms\.js(\?|$)".into(), digest: None },
        ])
        .unwrap();

        let wasm = Url::parse("https://localhost/algorithms.wasm").unwrap();
        let loader = Url::parse("https://localhost/algorithms.js?v=3").unwrap();
        let other = Url::parse("https://localhost/algorithms.json").unwrap();

        assert!(set.expected_for(&wasm).unwrap().is_pinned());
        assert_eq!(set.expected_for(&loader), Some(&ExpectedDigest::Unpinned));
        assert!(!set.matches(&other));
    }

    #[test]
    fn test_pinned_set_bad_pattern() {
        let result = PinnedSet::from_config(&[PinnedResource { pattern: "(".into(), digest: None }]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
