//! Compact token encoding of edit scripts
//!
//! A [`DiffResult`] compresses into one `{t, o, n, v}` token per change plus
//! a small header, and decodes back to an equal value. The wire form wraps
//! the JSON token stream in a zlib stream behind a fixed binary header:
//!
//! ```text
//! "SDIF" | format version (u32, network order) | payload length (u32) | zlib payload
//! ```

use crate::artifacts::diff::{Algorithm, Change, DiffResult};
use byteorder::{ByteOrder, NetworkEndian, WriteBytesExt};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use thiserror::Error;

/// Marker bytes opening every serialized diff
const DIFF_MAGIC: &[u8; 4] = b"SDIF";
/// Current wire format version
const FORMAT_VERSION: u32 = 1;
/// Magic plus version plus payload length
const HEADER_SIZE: usize = 12;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("payload too short: {0} bytes")]
    Truncated(usize),
    #[error("bad magic marker")]
    BadMagic,
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u32),
    #[error("payload length mismatch: header declares {declared} bytes, found {found}")]
    PayloadLength { declared: usize, found: usize },
    #[error("malformed change token: {0}")]
    MalformedToken(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Token-encoded form of a [`DiffResult`]
///
/// `t` is the change kind (`=`, `+`, `-`), `o`/`n` the original/modified
/// line indices where the kind defines them, `v` the line list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressedDiff {
    #[serde(rename = "a")]
    algorithm: Algorithm,
    #[serde(rename = "ol")]
    old_len: usize,
    #[serde(rename = "nl")]
    new_len: usize,
    #[serde(rename = "ot")]
    old_ends_with_newline: bool,
    #[serde(rename = "nt")]
    new_ends_with_newline: bool,
    #[serde(rename = "ts")]
    created_at: DateTime<Utc>,
    #[serde(rename = "c")]
    changes: Vec<CompressedChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressedChange {
    t: char,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    o: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    n: Option<usize>,
    v: Vec<String>,
}

impl CompressedDiff {
    pub fn change_count(&self) -> usize {
        self.changes.len()
    }

    /// Serialize to the framed zlib wire form
    pub fn to_bytes(&self) -> Result<Bytes, CodecError> {
        let payload = compress_payload(&serde_json::to_vec(self)?)?;

        let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
        bytes.write_all(DIFF_MAGIC)?;
        bytes.write_u32::<NetworkEndian>(FORMAT_VERSION)?;
        bytes.write_u32::<NetworkEndian>(payload.len() as u32)?;
        bytes.write_all(&payload)?;

        Ok(Bytes::from(bytes))
    }

    /// Parse the framed zlib wire form back into token form
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() < HEADER_SIZE {
            return Err(CodecError::Truncated(bytes.len()));
        }
        if &bytes[0..4] != DIFF_MAGIC {
            return Err(CodecError::BadMagic);
        }

        let version = NetworkEndian::read_u32(&bytes[4..8]);
        if version != FORMAT_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }

        let declared = NetworkEndian::read_u32(&bytes[8..12]) as usize;
        let found = bytes.len() - HEADER_SIZE;
        if declared != found {
            return Err(CodecError::PayloadLength { declared, found });
        }

        let payload = decompress_payload(&bytes[HEADER_SIZE..])?;
        Ok(serde_json::from_slice(&payload)?)
    }
}

fn compress_payload(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn decompress_payload(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut decoder = flate2::read::ZlibDecoder::new(data);
    let mut payload = Vec::new();
    decoder.read_to_end(&mut payload)?;
    Ok(payload)
}

/// Encode a diff into token form
pub fn compress(diff: &DiffResult) -> CompressedDiff {
    let changes = diff
        .changes()
        .iter()
        .map(|change| match change {
            Change::Equal {
                old_index,
                new_index,
                lines,
            } => CompressedChange {
                t: '=',
                o: Some(*old_index),
                n: Some(*new_index),
                v: lines.clone(),
            },
            Change::Insert { new_index, lines } => CompressedChange {
                t: '+',
                o: None,
                n: Some(*new_index),
                v: lines.clone(),
            },
            Change::Delete { old_index, lines } => CompressedChange {
                t: '-',
                o: Some(*old_index),
                n: None,
                v: lines.clone(),
            },
        })
        .collect();

    CompressedDiff {
        algorithm: diff.algorithm(),
        old_len: diff.old_len(),
        new_len: diff.new_len(),
        old_ends_with_newline: diff.old_ends_with_newline(),
        new_ends_with_newline: diff.new_ends_with_newline(),
        created_at: diff.created_at(),
        changes,
    }
}

/// Decode token form back into an equal [`DiffResult`]
///
/// Fails only on structurally invalid tokens: an unknown kind, a missing
/// index for the kind, an empty line list, or indices outside the declared
/// line ranges.
pub fn decompress(compressed: &CompressedDiff) -> Result<DiffResult, CodecError> {
    let mut changes = Vec::with_capacity(compressed.changes.len());

    for token in &compressed.changes {
        if token.v.is_empty() {
            return Err(CodecError::MalformedToken(format!(
                "'{}' token carries no lines",
                token.t
            )));
        }

        let change = match token.t {
            '=' => {
                let old_index = require_index(token, token.o, "o", compressed.old_len)?;
                let new_index = require_index(token, token.n, "n", compressed.new_len)?;
                Change::Equal {
                    old_index,
                    new_index,
                    lines: token.v.clone(),
                }
            }
            '+' => Change::Insert {
                new_index: require_index(token, token.n, "n", compressed.new_len)?,
                lines: token.v.clone(),
            },
            '-' => Change::Delete {
                old_index: require_index(token, token.o, "o", compressed.old_len)?,
                lines: token.v.clone(),
            },
            other => {
                return Err(CodecError::MalformedToken(format!(
                    "unknown change kind '{other}'"
                )));
            }
        };
        changes.push(change);
    }

    Ok(DiffResult::new(
        compressed.algorithm,
        changes,
        compressed.old_len,
        compressed.new_len,
        compressed.old_ends_with_newline,
        compressed.new_ends_with_newline,
        compressed.created_at,
    ))
}

fn require_index(
    token: &CompressedChange,
    index: Option<usize>,
    field: &str,
    len: usize,
) -> Result<usize, CodecError> {
    let index = index.ok_or_else(|| {
        CodecError::MalformedToken(format!("'{}' token is missing '{field}'", token.t))
    })?;

    if index.checked_add(token.v.len()).is_none_or(|end| end > len) {
        return Err(CodecError::MalformedToken(format!(
            "'{}' token spans lines {index}..{} beyond the declared {len}",
            token.t,
            index.saturating_add(token.v.len()),
        )));
    }

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::diff::engine::compute;
    use pretty_assertions::assert_eq;
    use proptest::proptest;
    use rstest::rstest;

    #[rstest]
    #[case("a\nb\nc", "a\nX\nc")]
    #[case("", "x\ny\n")]
    #[case("same\n", "same\n")]
    #[case("", "")]
    fn token_round_trip_preserves_equality(#[case] original: &str, #[case] modified: &str) {
        let diff = compute(original, modified);
        let decoded = decompress(&compress(&diff)).unwrap();

        assert_eq!(decoded, diff);
    }

    #[test]
    fn wire_round_trip_preserves_equality() {
        let diff = compute("fn main() {}\n", "fn main() {\n    run();\n}\n");
        let compressed = compress(&diff);

        let bytes = compressed.to_bytes().unwrap();
        let restored = CompressedDiff::from_bytes(&bytes).unwrap();

        assert_eq!(restored, compressed);
        assert_eq!(decompress(&restored).unwrap(), diff);
    }

    #[test]
    fn wire_form_opens_with_the_magic_marker() {
        let bytes = compress(&compute("a", "b")).to_bytes().unwrap();
        assert_eq!(&bytes[0..4], DIFF_MAGIC);
    }

    #[test]
    fn truncated_input_is_rejected() {
        let error = CompressedDiff::from_bytes(&[0x53, 0x44]).unwrap_err();
        assert!(matches!(error, CodecError::Truncated(2)));
    }

    #[test]
    fn foreign_magic_is_rejected() {
        let mut bytes = compress(&compute("a", "b")).to_bytes().unwrap().to_vec();
        bytes[0] = b'X';

        let error = CompressedDiff::from_bytes(&bytes).unwrap_err();
        assert!(matches!(error, CodecError::BadMagic));
    }

    #[test]
    fn future_version_is_rejected() {
        let mut bytes = compress(&compute("a", "b")).to_bytes().unwrap().to_vec();
        bytes[7] = 99;

        let error = CompressedDiff::from_bytes(&bytes).unwrap_err();
        assert!(matches!(error, CodecError::UnsupportedVersion(_)));
    }

    #[test]
    fn payload_length_mismatch_is_rejected() {
        let mut bytes = compress(&compute("a", "b")).to_bytes().unwrap().to_vec();
        bytes.push(0);

        let error = CompressedDiff::from_bytes(&bytes).unwrap_err();
        assert!(matches!(error, CodecError::PayloadLength { .. }));
    }

    #[test]
    fn corrupt_payload_is_rejected() {
        let mut bytes = compress(&compute("a\nb\nc", "x")).to_bytes().unwrap().to_vec();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        bytes[last - 1] ^= 0xff;

        let error = CompressedDiff::from_bytes(&bytes).unwrap_err();
        assert!(matches!(error, CodecError::Io(_) | CodecError::Json(_)));
    }

    #[rstest]
    #[case('x', Some(0), Some(0), vec!["a"], "unknown change kind")]
    #[case('=', None, Some(0), vec!["a"], "missing 'o'")]
    #[case('+', None, None, vec!["a"], "missing 'n'")]
    #[case('-', Some(9), None, vec!["a"], "beyond the declared")]
    #[case('-', Some(usize::MAX), None, vec!["a"], "beyond the declared")]
    #[case('=', Some(0), Some(0), vec![], "carries no lines")]
    fn malformed_tokens_are_rejected(
        #[case] t: char,
        #[case] o: Option<usize>,
        #[case] n: Option<usize>,
        #[case] v: Vec<&str>,
        #[case] message: &str,
    ) {
        let compressed = CompressedDiff {
            algorithm: Algorithm::Myers,
            old_len: 3,
            new_len: 3,
            old_ends_with_newline: false,
            new_ends_with_newline: false,
            created_at: Utc::now(),
            changes: vec![CompressedChange {
                t,
                o,
                n,
                v: v.into_iter().map(str::to_string).collect(),
            }],
        };

        let error = decompress(&compressed).unwrap_err();
        assert!(
            error.to_string().contains(message),
            "unexpected error: {error}"
        );
    }

    proptest! {
        #[test]
        fn compress_round_trips_for_arbitrary_inputs(
            original in "[abc\n]{0,50}",
            modified in "[abc\n]{0,50}"
        ) {
            let diff = compute(&original, &modified);
            let bytes = compress(&diff).to_bytes().unwrap();
            let decoded = decompress(&CompressedDiff::from_bytes(&bytes).unwrap()).unwrap();
            proptest::prop_assert_eq!(decoded, diff);
        }
    }
}
