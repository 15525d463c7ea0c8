//! Cursor Codec Module
//!
//! Encodes a listing position, a (created-at, identifier) pair, into an
//! opaque URL-safe token and decodes it back.
//!
//! # Wire layout
//! ```text
//! [version: u8][micros: i64 BE][id_len: u32 BE][id: utf-8][checksum: 4 bytes]
//! ```
//! The checksum is the first four bytes of SHA-256 over everything before it.
//! The buffer is base64 encoded with the URL-safe alphabet and no padding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::error::CheckoutError;
use crate::models::truncate_to_micros;

// == Constants ==
const CURSOR_VERSION: u8 = 1;
const CHECKSUM_LEN: usize = 4;
/// version + micros + id length
const HEADER_LEN: usize = 1 + 8 + 4;

// == Cursor Error ==
/// Why a cursor token was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CursorError {
    #[error("cursor is not valid base64")]
    Encoding,

    #[error("cursor is truncated")]
    Truncated,

    #[error("unsupported cursor version {0}")]
    UnsupportedVersion(u8),

    #[error("cursor checksum mismatch")]
    Checksum,

    #[error("cursor has {0} trailing bytes")]
    TrailingBytes(usize),

    #[error("cursor timestamp out of range")]
    Timestamp,

    #[error("cursor identifier is empty or not utf-8")]
    Identifier,
}

impl From<CursorError> for CheckoutError {
    fn from(err: CursorError) -> Self {
        CheckoutError::MalformedCursor(err.to_string())
    }
}

// == Cursor Position ==
/// A strict position in the (created-at, identifier) listing order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CursorPosition {
    pub timestamp: DateTime<Utc>,
    pub id: String,
}

impl CursorPosition {
    /// Builds a position, truncating the timestamp to microseconds.
    pub fn new(timestamp: DateTime<Utc>, id: impl Into<String>) -> Self {
        Self {
            timestamp: truncate_to_micros(timestamp),
            id: id.into(),
        }
    }
}

// == Encode ==
/// Encodes a (timestamp, identifier) pair into an opaque cursor string.
///
/// Sub-microsecond precision is dropped first, so two instants that only
/// differ below a microsecond produce the same token.
pub fn encode(timestamp: DateTime<Utc>, id: &str) -> String {
    let micros = timestamp.timestamp_micros();
    let id_bytes = id.as_bytes();

    let mut buf = Vec::with_capacity(HEADER_LEN + id_bytes.len() + CHECKSUM_LEN);
    buf.push(CURSOR_VERSION);
    buf.extend_from_slice(&micros.to_be_bytes());
    buf.extend_from_slice(&(id_bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(id_bytes);
    let checksum = checksum(&buf);
    buf.extend_from_slice(&checksum);

    URL_SAFE_NO_PAD.encode(buf)
}

// == Decode ==
/// Decodes a cursor string produced by [`encode`].
///
/// Any structural problem is reported as a [`CursorError`]; a partially
/// valid token never yields a position.
pub fn decode(cursor: &str) -> Result<CursorPosition, CursorError> {
    let buf = URL_SAFE_NO_PAD
        .decode(cursor.as_bytes())
        .map_err(|_| CursorError::Encoding)?;

    if buf.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(CursorError::Truncated);
    }

    let version = buf[0];
    if version != CURSOR_VERSION {
        return Err(CursorError::UnsupportedVersion(version));
    }

    let micros = i64::from_be_bytes(read_array(&buf[1..9])?);
    let id_len = u32::from_be_bytes(read_array(&buf[9..HEADER_LEN])?) as usize;

    let body_len = HEADER_LEN
        .checked_add(id_len)
        .ok_or(CursorError::Truncated)?;
    let total_len = body_len
        .checked_add(CHECKSUM_LEN)
        .ok_or(CursorError::Truncated)?;
    if buf.len() < total_len {
        return Err(CursorError::Truncated);
    }
    if buf.len() > total_len {
        return Err(CursorError::TrailingBytes(buf.len() - total_len));
    }

    let (body, tail) = buf.split_at(body_len);
    if checksum(body) != tail {
        return Err(CursorError::Checksum);
    }

    let id = std::str::from_utf8(&body[HEADER_LEN..])
        .map_err(|_| CursorError::Identifier)?;
    if id.is_empty() {
        return Err(CursorError::Identifier);
    }

    let timestamp = DateTime::from_timestamp_micros(micros).ok_or(CursorError::Timestamp)?;

    Ok(CursorPosition {
        timestamp,
        id: id.to_string(),
    })
}

// == Helpers ==
fn checksum(body: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = Sha256::digest(body);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}

fn read_array<const N: usize>(bytes: &[u8]) -> Result<[u8; N], CursorError> {
    bytes.try_into().map_err(|_| CursorError::Truncated)
}
