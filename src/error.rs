//! Decode error taxonomy.
//!
//! Every variant that corresponds to a position in the input carries the
//! stream offset at which the problem was detected, so a failing decode of a
//! real-world file can be lined up against a hex dump directly.
//!
//! There is no error recovery inside object bodies: the first structural
//! mismatch aborts the decode.  The single sanctioned exception is the
//! size-prefixed layer-extension skip in `objects::feature_layer`.

use std::io;
use thiserror::Error;

use crate::clsid::Clsid;

#[derive(Error, Debug)]
pub enum DecodeError {
    /// A 16-byte class identifier that no registry entry matches.
    /// Unknown identity means unknown layout — nothing after this point in
    /// the stream can be located, so decoding MUST stop.
    #[error("Unknown object {clsid} at offset {offset:#x} — cannot decode past it")]
    UnknownClsid { clsid: Clsid, offset: u64 },

    /// A class identifier the registry recognises by name but has no body
    /// decoder for.  Distinct from [`DecodeError::UnknownClsid`] so callers
    /// can report "known but unsupported" rather than "never seen before".
    #[error("Object {name} ({clsid}) at offset {offset:#x} is recognised but not supported")]
    NotSupported { name: &'static str, clsid: Clsid, offset: u64 },

    /// A fixed byte sequence expected at a known position did not match.
    #[error("Magic mismatch at offset {offset:#x}: found {found}, expected {expected}")]
    MagicMismatch { offset: u64, found: String, expected: String },

    /// Structurally valid bytes that violate a layout rule — a non-zero
    /// string terminator, an object body that overran its declared size, a
    /// count field that cannot fit in the remaining stream.
    #[error("Layout mismatch at offset {offset:#x}: {detail}")]
    LayoutMismatch { offset: u64, detail: String },

    /// The stream ended before a read of `needed` bytes could complete.
    #[error("Truncated stream at offset {offset:#x}: needed {needed} more bytes")]
    Truncated { offset: u64, needed: usize },

    /// An enumeration field held a value outside its known set.
    #[error("Unknown {what} value {value} at offset {offset:#x}")]
    UnknownEnumValue { what: &'static str, value: u32, offset: u64 },

    /// A version word outside the decoder's supported set for that object.
    #[error("Unsupported {name} version {version} (supported: {supported})")]
    UnsupportedVersion { name: &'static str, version: u16, supported: String },

    /// The document is zero bytes long.
    #[error("Empty document")]
    EmptyDocument,

    /// The document starts with the magic of a compound-document container
    /// rather than a raw object stream.  The caller must extract the inner
    /// stream first.
    #[error("Not a raw object stream (compound document container detected)")]
    WrongDocumentType,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl DecodeError {
    /// The stream offset attached to this error, if the variant carries one.
    pub fn offset(&self) -> Option<u64> {
        match self {
            DecodeError::UnknownClsid { offset, .. }
            | DecodeError::NotSupported { offset, .. }
            | DecodeError::MagicMismatch { offset, .. }
            | DecodeError::LayoutMismatch { offset, .. }
            | DecodeError::Truncated { offset, .. }
            | DecodeError::UnknownEnumValue { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}
