//! Binary encoding of cached result pages.
//!
//! A page is a fixed header followed by a `bincode` payload of
//! [`SearchHit`] values. Readers reject unknown magic and versions so a
//! format change never yields a mis-decoded page.

use bincode::{deserialize, serialize_into};
use thiserror::Error;

use crate::SearchHit;

/// Identifier at the start of every cached page.
pub(crate) const PAGE_MAGIC: [u8; 4] = *b"WSRC";

/// Supported version of the cached page format.
pub(crate) const PAGE_VERSION: u16 = 2;

const HEADER_LEN: usize = PAGE_MAGIC.len() + size_of::<u16>();

/// Error emitted when a cached page cannot be encoded or decoded.
#[derive(Debug, Error)]
pub enum PageCodecError {
    /// The payload was shorter than the fixed header.
    #[error("cached page is truncated: {len} bytes")]
    Truncated {
        /// Length of the rejected payload.
        len: usize,
    },
    /// The payload did not start with the expected magic.
    #[error("invalid cached page magic: expected {expected:?}, found {found:?}")]
    InvalidMagic {
        /// Expected byte sequence identifying a cached page.
        expected: [u8; 4],
        /// Sequence read from the payload.
        found: [u8; 4],
    },
    /// The payload uses an unsupported format version.
    #[error("unsupported cached page version {found}; supported version is {supported}")]
    UnsupportedVersion {
        /// Version present in the header.
        found: u16,
        /// Version written by this build.
        supported: u16,
    },
    /// The `bincode` body could not be encoded or decoded.
    #[error("failed to encode or decode cached page: {0}")]
    Body(#[from] bincode::Error),
}

/// Encode a page of hits with the current header.
pub(crate) fn encode_page(hits: &[SearchHit]) -> Result<Vec<u8>, PageCodecError> {
    let mut bytes = Vec::with_capacity(HEADER_LEN);
    bytes.extend_from_slice(&PAGE_MAGIC);
    bytes.extend_from_slice(&PAGE_VERSION.to_le_bytes());
    serialize_into(&mut bytes, hits)?;
    Ok(bytes)
}

/// Decode a page previously written by [`encode_page`].
pub(crate) fn decode_page(bytes: &[u8]) -> Result<Vec<SearchHit>, PageCodecError> {
    let (Some(magic), Some(version), Some(body)) = (
        bytes.get(..4),
        bytes.get(4..HEADER_LEN),
        bytes.get(HEADER_LEN..),
    ) else {
        return Err(PageCodecError::Truncated { len: bytes.len() });
    };

    let mut found = [0_u8; 4];
    found.copy_from_slice(magic);
    if found != PAGE_MAGIC {
        return Err(PageCodecError::InvalidMagic {
            expected: PAGE_MAGIC,
            found,
        });
    }

    let version = u16::from_le_bytes([version[0], version[1]]);
    if version != PAGE_VERSION {
        return Err(PageCodecError::UnsupportedVersion {
            found: version,
            supported: PAGE_VERSION,
        });
    }

    Ok(deserialize(body)?)
}
