//! Inner framing of every message before it is handed to age.
//!
//! Layout:
//!
//! ```text
//! magic "KSM1" | compression u8 | signature u8 | [signer 20B | signature 64B] | body
//! ```
//!
//! The signature covers the uncompressed plaintext.

use std::io::{Read, Write};

use flate2::Compression as ZlibLevel;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::core::errors::{KeysealError, Result};
use crate::core::models::message::Compression;

const MAGIC: &[u8; 4] = b"KSM1";
const COMPRESSION_NONE: u8 = 0;
const COMPRESSION_ZLIB: u8 = 1;
const SIGNATURE_NONE: u8 = 0;
const SIGNATURE_ED25519: u8 = 1;

pub(super) const SIGNER_LEN: usize = 20;
pub(super) const SIGNATURE_LEN: usize = 64;
const HEADER_LEN: usize = MAGIC.len() + 2;

/// Detached signature carried in a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct FrameSignature {
    pub(super) signer: [u8; SIGNER_LEN],
    pub(super) signature: [u8; SIGNATURE_LEN],
}

/// A decoded frame.
#[derive(Debug)]
pub(super) struct Frame {
    pub(super) plaintext: Vec<u8>,
    pub(super) signature: Option<FrameSignature>,
}

pub(super) fn encode(
    plaintext: &[u8],
    compression: Compression,
    level: u32,
    signature: Option<&FrameSignature>,
) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(HEADER_LEN + plaintext.len());
    out.extend_from_slice(MAGIC);
    out.push(match compression {
        Compression::None => COMPRESSION_NONE,
        Compression::Zlib => COMPRESSION_ZLIB,
    });

    match signature {
        Some(sig) => {
            out.push(SIGNATURE_ED25519);
            out.extend_from_slice(&sig.signer);
            out.extend_from_slice(&sig.signature);
        }
        None => out.push(SIGNATURE_NONE),
    }

    match compression {
        Compression::None => out.extend_from_slice(plaintext),
        Compression::Zlib => {
            let mut encoder = ZlibEncoder::new(out, ZlibLevel::new(level));
            encoder
                .write_all(plaintext)
                .map_err(|e| KeysealError::EncryptionFailed {
                    reason: format!("Compression failed: {e}"),
                })?;
            out = encoder
                .finish()
                .map_err(|e| KeysealError::EncryptionFailed {
                    reason: format!("Compression finish failed: {e}"),
                })?;
        }
    }

    Ok(out)
}

/// Decode a frame, refusing bodies that inflate past `max_size` bytes.
pub(super) fn decode(bytes: &[u8], max_size: usize) -> Result<Frame> {
    let corrupt = |detail: &str| KeysealError::DecryptionFailed {
        reason: format!("corrupt message frame: {detail}"),
    };

    if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Err(corrupt("missing header"));
    }
    let compression = bytes[MAGIC.len()];
    let signature_kind = bytes[MAGIC.len() + 1];
    let mut rest = &bytes[HEADER_LEN..];

    let signature = match signature_kind {
        SIGNATURE_NONE => None,
        SIGNATURE_ED25519 => {
            if rest.len() < SIGNER_LEN + SIGNATURE_LEN {
                return Err(corrupt("truncated signature"));
            }
            let (signer, tail) = rest.split_at(SIGNER_LEN);
            let (signature, body) = tail.split_at(SIGNATURE_LEN);
            rest = body;
            Some(FrameSignature {
                signer: signer.try_into().map_err(|_| corrupt("signer"))?,
                signature: signature.try_into().map_err(|_| corrupt("signature"))?,
            })
        }
        other => return Err(corrupt(&format!("unknown signature type {other}"))),
    };

    let plaintext = match compression {
        COMPRESSION_NONE => {
            if rest.len() > max_size {
                return Err(corrupt("body exceeds the maximum message size"));
            }
            rest.to_vec()
        }
        COMPRESSION_ZLIB => {
            let mut inflated = Vec::new();
            ZlibDecoder::new(rest)
                .take(max_size as u64 + 1)
                .read_to_end(&mut inflated)
                .map_err(|e| corrupt(&format!("decompression failed: {e}")))?;
            if inflated.len() > max_size {
                return Err(corrupt("body exceeds the maximum message size"));
            }
            inflated
        }
        other => return Err(corrupt(&format!("unknown compression type {other}"))),
    };

    Ok(Frame {
        plaintext,
        signature,
    })
}
