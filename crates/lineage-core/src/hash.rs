//! Content hash keys
//!
//! A [`HashKey`] is a content-addressed IRI of the form
//! `hash://<algorithm>/<digest>`. Parsing doubles as validation: a string
//! that does not parse is "not a content node".

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::HashKeyError;

/// Digest algorithms recognized in hash keys
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    #[default]
    Sha256,
}

impl HashAlgorithm {
    /// All supported algorithms
    pub const ALL: [HashAlgorithm; 3] = [Self::Md5, Self::Sha1, Self::Sha256];

    /// Name as it appears in the key
    pub fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }

    /// Length of the hex digest in characters
    pub fn digest_len(&self) -> usize {
        match self {
            Self::Md5 => 32,
            Self::Sha1 => 40,
            Self::Sha256 => 64,
        }
    }

    /// Look up an algorithm by its key name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|alg| alg.name() == name)
    }

    /// Whether digests of this algorithm can be computed locally.
    ///
    /// md5 and sha1 keys are recognized so that older logs stay readable,
    /// but new content is only ever keyed by sha256.
    pub fn is_computable(&self) -> bool {
        matches!(self, Self::Sha256)
    }

    /// Compute the key of `data`, if this algorithm is computable
    pub fn compute(&self, data: &[u8]) -> Option<HashKey> {
        match self {
            Self::Sha256 => Some(HashKey {
                algorithm: *self,
                digest: hex::encode(Sha256::digest(data)),
            }),
            Self::Md5 | Self::Sha1 => None,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| HashKeyError::UnsupportedAlgorithm(s.to_string()))
    }
}

/// Content-addressed identifier
///
/// The digest is always stored lowercase, so two keys for the same content
/// compare equal regardless of how they were written in the log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HashKey {
    algorithm: HashAlgorithm,
    digest: String,
}

impl HashKey {
    /// URI scheme prefix of every hash key
    pub const SCHEME: &'static str = "hash://";

    /// Parse and normalize a hash key.
    ///
    /// Surrounding whitespace and a surrounding `<...>` pair are ignored.
    pub fn parse(input: &str) -> Result<Self, HashKeyError> {
        let trimmed = input.trim();
        let trimmed = trimmed
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .unwrap_or(trimmed);

        let rest = trimmed
            .strip_prefix(Self::SCHEME)
            .ok_or_else(|| HashKeyError::MissingScheme(trimmed.to_string()))?;

        let (name, digest) = rest.split_once('/').unwrap_or((rest, ""));
        let algorithm = HashAlgorithm::from_name(name)
            .ok_or_else(|| HashKeyError::UnsupportedAlgorithm(name.to_string()))?;

        let actual = digest.chars().count();
        if actual != algorithm.digest_len() {
            return Err(HashKeyError::InvalidDigestLength {
                algorithm: algorithm.name(),
                expected: algorithm.digest_len(),
                actual,
            });
        }

        if let Some(found) = digest.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(HashKeyError::InvalidDigestCharacter {
                algorithm: algorithm.name(),
                found,
            });
        }

        Ok(Self {
            algorithm,
            digest: digest.to_ascii_lowercase(),
        })
    }

    /// Check whether a string is a valid hash key
    pub fn is_valid(input: &str) -> bool {
        Self::parse(input).is_ok()
    }

    /// The sha256 key of `data`
    pub fn sha256(data: &[u8]) -> Self {
        Self {
            algorithm: HashAlgorithm::Sha256,
            digest: hex::encode(Sha256::digest(data)),
        }
    }

    /// Compute a key of `data` with the given algorithm
    pub fn compute(algorithm: HashAlgorithm, data: &[u8]) -> Option<Self> {
        algorithm.compute(data)
    }

    /// Digest algorithm
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Lowercase hex digest
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Short digest for display (first 8 chars)
    pub fn short_digest(&self) -> &str {
        &self.digest[..8]
    }

    /// Check whether `data` reproduces this key.
    ///
    /// Returns `None` when the algorithm cannot be computed locally.
    pub fn verifies(&self, data: &[u8]) -> Option<bool> {
        self.algorithm
            .compute(data)
            .map(|computed| computed.digest == self.digest)
    }
}

impl fmt::Display for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", Self::SCHEME, self.algorithm, self.digest)
    }
}

impl FromStr for HashKey {
    type Err = HashKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for HashKey {
    type Error = HashKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HashKey> for String {
    fn from(key: HashKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SHA256_OF_HELLO: &str =
        "hash://sha256/2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn test_sha256_of_data() {
        let key = HashKey::sha256(b"hello");
        assert_eq!(key.to_string(), SHA256_OF_HELLO);
        assert_eq!(key.algorithm(), HashAlgorithm::Sha256);
        assert_eq!(key.short_digest(), "2cf24dba");
    }

    #[test]
    fn test_parse_normalizes() {
        let upper = SHA256_OF_HELLO.replace("2cf24dba", "2CF24DBA");
        let key = HashKey::parse(&format!("  <{}> ", upper)).unwrap();
        assert_eq!(key.to_string(), SHA256_OF_HELLO);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            HashKey::parse("sha256/abc"),
            Err(HashKeyError::MissingScheme(_))
        ));
        assert!(matches!(
            HashKey::parse("hash://sha512/abc"),
            Err(HashKeyError::UnsupportedAlgorithm(_))
        ));
        assert!(matches!(
            HashKey::parse("hash://sha256/abc"),
            Err(HashKeyError::InvalidDigestLength { actual: 3, .. })
        ));
        assert!(matches!(
            HashKey::parse("hash://sha256"),
            Err(HashKeyError::InvalidDigestLength { actual: 0, .. })
        ));
        let bad_char = format!("hash://md5/{}z", "a".repeat(31));
        assert!(matches!(
            HashKey::parse(&bad_char),
            Err(HashKeyError::InvalidDigestCharacter { found: 'z', .. })
        ));
    }

    #[test]
    fn test_verifies() {
        let key = HashKey::sha256(b"content");
        assert_eq!(key.verifies(b"content"), Some(true));
        assert_eq!(key.verifies(b"other"), Some(false));

        let md5 = HashKey::parse(&format!("hash://md5/{}", "0".repeat(32))).unwrap();
        assert_eq!(md5.verifies(b"content"), None);
    }

    #[test]
    fn test_string_conversions() {
        let key = HashKey::sha256(b"hello");
        assert_eq!(String::from(key.clone()), SHA256_OF_HELLO);
        assert_eq!(SHA256_OF_HELLO.parse::<HashKey>().unwrap(), key);
        assert!(HashKey::try_from("hash://nope/1".to_string()).is_err());
    }

    fn algorithm() -> impl Strategy<Value = HashAlgorithm> {
        prop::sample::select(HashAlgorithm::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn accepts_well_formed_digests(alg in algorithm(), seed in prop::collection::vec(any::<u8>(), 32)) {
            let digest: String = hex::encode(&seed).chars().cycle().take(alg.digest_len()).collect();
            let text = format!("hash://{}/{}", alg, digest);
            let key = HashKey::parse(&text).unwrap();
            prop_assert_eq!(key.to_string(), text);
        }

        #[test]
        fn rejects_wrong_length(alg in algorithm(), len in 0usize..80) {
            prop_assume!(len != alg.digest_len());
            let text = format!("hash://{}/{}", alg, "a".repeat(len));
            prop_assert!(!HashKey::is_valid(&text));
        }

        #[test]
        fn rejects_wrong_alphabet(alg in algorithm(), pos in 0usize..32, bad in "[g-zG-Z_\\-!]") {
            let mut digest = "0".repeat(alg.digest_len());
            digest.replace_range(pos..pos + 1, &bad);
            let text = format!("hash://{}/{}", alg, digest);
            prop_assert!(!HashKey::is_valid(&text));
        }

        #[test]
        fn rejects_missing_scheme(alg in algorithm()) {
            let text = format!("{}/{}", alg, "0".repeat(alg.digest_len()));
            prop_assert!(!HashKey::is_valid(&text));
        }
    }
}
