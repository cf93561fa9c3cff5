//! Top-level document entry points.
//!
//! Two container shapes exist in the wild:
//!   - **Style blob**: one symbol-family object starting with a two-byte
//!     short tag.  No reference ids, no version words at the root — the
//!     caller supplies the root version (gallery files store it out of band).
//!   - **Layer stream**: one object starting with a full 16-byte CLSID,
//!     reference protocol active, version words on disk.
//!
//! A stream that starts with the compound-document container magic is a
//! whole carrier file rather than the raw object stream inside it;
//! extracting the inner stream is the caller's job and such input fails
//! with [`DecodeError::WrongDocumentType`].

use std::io::SeekFrom;

use crate::clsid::Clsid;
use crate::error::DecodeError;
use crate::graph::{DecodedObject, ObjHandle, ObjectGraph};
use crate::objects::{ObjectDef, MAGIC_SYMBOL};
use crate::registry::{Registry, Resolution};
use crate::stream::{ByteSource, Stream};

/// Compound-document (OLE) container magic.
const OLE_MAGIC: [u8; 8] = [0xd0, 0xcf, 0x11, 0xe0, 0xa1, 0xb1, 0x1a, 0xe1];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    StyleBlob,
    LayerStream,
}

/// A fully decoded document: the object arena plus the root handle.
#[derive(Debug)]
pub struct DecodedDocument {
    pub graph: ObjectGraph,
    pub root:  ObjHandle,
}

impl DecodedDocument {
    pub fn root(&self) -> &DecodedObject {
        self.graph.get(self.root)
    }

    /// Pure-data projection of the whole document.  Shared references are
    /// expanded to independent copies.
    pub fn to_json(&self) -> serde_json::Value {
        self.graph.to_json(self.root)
    }
}

// ── Sniffing ─────────────────────────────────────────────────────────────────

/// Read up to `n` bytes without moving the cursor.
fn peek(source: &mut dyn ByteSource, n: usize) -> Result<Vec<u8>, DecodeError> {
    let start = source.stream_position()?;
    let mut buf = vec![0u8; n];
    let mut filled = 0;
    while filled < n {
        let k = source.read(&mut buf[filled..])?;
        if k == 0 {
            break;
        }
        filled += k;
    }
    buf.truncate(filled);
    source.seek(SeekFrom::Start(start))?;
    Ok(buf)
}

/// Classify a document by its opening bytes.  The cursor is not moved.
pub fn sniff(
    source:   &mut dyn ByteSource,
    registry: &Registry,
) -> Result<DocumentKind, DecodeError> {
    let head = peek(source, 16)?;
    if head.is_empty() {
        return Err(DecodeError::EmptyDocument);
    }
    if head.len() >= 8 && head[..8] == OLE_MAGIC {
        return Err(DecodeError::WrongDocumentType);
    }
    if head.len() >= 2 && registry.resolve_short_tag([head[0], head[1]]).is_some() {
        return Ok(DocumentKind::StyleBlob);
    }
    if head.len() == 16 {
        let mut raw = [0u8; 16];
        raw.copy_from_slice(&head);
        let clsid = Clsid::from_le_bytes(raw);
        if !clsid.is_null() && !matches!(registry.resolve(clsid), Resolution::Unknown) {
            return Ok(DocumentKind::LayerStream);
        }
    }
    Err(DecodeError::WrongDocumentType)
}

// ── Entry points ─────────────────────────────────────────────────────────────

/// Decode a style-gallery blob, taking the newest supported version of the
/// root type.
pub fn decode_symbol(
    source:   &mut dyn ByteSource,
    registry: &Registry,
) -> Result<DecodedDocument, DecodeError> {
    // Resolve the root first so the default version is known.
    let head = peek(source, 2)?;
    if head.is_empty() {
        return Err(DecodeError::EmptyDocument);
    }
    if head.len() < 2 {
        return Err(DecodeError::WrongDocumentType);
    }
    let def = registry
        .resolve_short_tag([head[0], head[1]])
        .ok_or(DecodeError::WrongDocumentType)?;
    let version = match def.versions() {
        Some(set) => set.last().copied().unwrap_or(1),
        None => 1,
    };
    decode_symbol_with_version(source, registry, version)
}

/// Decode a style-gallery blob with a caller-supplied root version (gallery
/// files store the version out of band, next to the blob).
pub fn decode_symbol_with_version(
    source:   &mut dyn ByteSource,
    registry: &Registry,
    version:  u16,
) -> Result<DecodedDocument, DecodeError> {
    match sniff(source, registry)? {
        DocumentKind::StyleBlob => {}
        DocumentKind::LayerStream => return Err(DecodeError::WrongDocumentType),
    }

    let mut stream = Stream::new(source, registry)?;
    let tag = stream.read_bytes(2)?;
    let def = registry
        .resolve_short_tag([tag[0], tag[1]])
        .ok_or(DecodeError::WrongDocumentType)?;
    stream.read_assert(&MAGIC_SYMBOL)?;
    let root = stream.read_object_as(def, version)?;
    Ok(DecodedDocument { graph: stream.into_graph(), root })
}

/// Decode a layer object stream (the content stream of a `.lyr` carrier).
pub fn decode_layer_object(
    source:   &mut dyn ByteSource,
    registry: &Registry,
) -> Result<DecodedDocument, DecodeError> {
    match sniff(source, registry)? {
        DocumentKind::LayerStream => {}
        DocumentKind::StyleBlob => return Err(DecodeError::WrongDocumentType),
    }

    let mut stream = Stream::new(source, registry)?;
    stream.enable_references();
    match stream.read_object(true)? {
        Some(root) => Ok(DecodedDocument { graph: stream.into_graph(), root }),
        None => Err(DecodeError::WrongDocumentType),
    }
}
