use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

use super::error::StorageError;

/// Name of a stored image: the SHA-256 of its bytes plus a file extension,
/// rendered as `<64 hex chars>.<ext>`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AssetKey {
    digest: [u8; 32],
    extension: String,
}

impl AssetKey {
    pub fn for_content(data: &[u8], extension: &str) -> Self {
        Self {
            digest: Sha256::digest(data).into(),
            extension: extension.to_ascii_lowercase(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

impl FromStr for AssetKey {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (digest_hex, extension) = s
            .split_once('.')
            .ok_or_else(|| StorageError::InvalidKey(format!("missing extension in {s:?}")))?;
        if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(StorageError::InvalidKey(format!("bad extension in {s:?}")));
        }
        let bytes = hex::decode(digest_hex)
            .map_err(|e| StorageError::InvalidKey(format!("invalid hex: {e}")))?;
        let digest: [u8; 32] = bytes
            .try_into()
            .map_err(|_| StorageError::InvalidKey("digest must be 32 bytes".into()))?;
        Ok(Self {
            digest,
            extension: extension.to_ascii_lowercase(),
        })
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.digest_hex(), self.extension)
    }
}

impl fmt::Debug for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetKey({self})")
    }
}
