//! Built-in object decoders.
//!
//! Each decodable type is a unit struct implementing [`ObjectDef`].  The
//! definitions are stateless; all decoded state goes into the
//! [`DecodedObject`] the stream hands to `read`.  Body layouts were
//! recovered by observation of real files and carry opaque spans where the
//! meaning of a run of bytes is still unknown — those are consumed under a
//! stable name via `Stream::skip_unknown`, never interpreted.

use crate::clsid::Clsid;
use crate::error::DecodeError;
use crate::graph::DecodedObject;
use crate::registry::Registry;
use crate::stream::Stream;

pub mod colors;
pub mod feature_layer;
pub mod fills;
pub mod lines;
pub mod markers;
pub mod names;
pub mod renderers;
pub mod symbols;

// ── Magic sequences ──────────────────────────────────────────────────────────

/// Shared trailing 14 bytes of every symbol-family CLSID.  Follows each
/// two-byte short tag on disk and is asserted while resolving the
/// identifier.
pub const MAGIC_SYMBOL: [u8; 14] = [
    0x14, 0x79, 0x92, 0xc8, 0xd0, 0x11, 0x8b, 0xb6,
    0x08, 0x00, 0x09, 0xee, 0x4e, 0x41,
];

/// 18-byte sequence written after embedded colour data in leaf symbols.
pub const MAGIC_COLOR: [u8; 18] = [
    0xc4, 0xe9, 0x7e, 0x23, 0xd1, 0xd0, 0x11, 0x83, 0x83,
    0x08, 0x00, 0x09, 0xb9, 0x96, 0xcc, 0x01, 0x00, 0x01,
];

/// Terminator byte closing many leaf symbol bodies.
pub const TERMINATOR: u8 = 0x0d;

// ── ObjectDef trait ──────────────────────────────────────────────────────────

/// A decodable object type: frozen CLSID identity, version policy, and the
/// body decoder.
pub trait ObjectDef: Sync {
    fn clsid(&self) -> Clsid;
    fn name(&self) -> &'static str;

    /// `None` means the type writes no version word (version pinned at 1, or
    /// supplied by the caller at the top level).  `Some` is the closed set
    /// of supported on-disk versions.
    fn versions(&self) -> Option<&'static [u16]> {
        None
    }

    /// Whether this type participates in the reference-sharing protocol of
    /// layer-stream containers.
    fn supports_references(&self) -> bool {
        true
    }

    /// Decode the body.  The identifier, reference id and version word have
    /// already been consumed.
    fn read(
        &self,
        stream:  &mut Stream<'_>,
        version: u16,
        obj:     &mut DecodedObject,
    ) -> Result<(), DecodeError>;
}

// ── Shared layout helpers ────────────────────────────────────────────────────

/// Symbol level: `u32` raster-op (always 13, asserted) then the `u32` level.
/// A level of `0xffffffff` means "merge and join".
pub(crate) fn read_symbol_level(stream: &mut Stream<'_>) -> Result<u32, DecodeError> {
    stream.read_assert(&[0x0d, 0x00, 0x00, 0x00])?;
    stream.read_u32()
}

/// Register every built-in decoder.
pub(crate) fn register_builtin(registry: &mut Registry) {
    registry.register(&lines::SIMPLE_LINE_SYMBOL);
    registry.register(&lines::CARTOGRAPHIC_LINE_SYMBOL);
    registry.register(&lines::MARKER_LINE_SYMBOL);
    registry.register(&lines::LINE_TEMPLATE);
    registry.register(&lines::LINE_DECORATION);
    registry.register(&lines::SIMPLE_LINE_DECORATION_ELEMENT);
    registry.register(&fills::SIMPLE_FILL_SYMBOL);
    registry.register(&markers::SIMPLE_MARKER_SYMBOL);
    registry.register(&symbols::MULTI_LAYER_LINE_SYMBOL);
    registry.register(&symbols::MULTI_LAYER_FILL_SYMBOL);
    registry.register(&symbols::MULTI_LAYER_MARKER_SYMBOL);
    registry.register(&colors::RGB_COLOR);
    registry.register(&colors::HSV_COLOR);
    registry.register(&colors::HLS_COLOR);
    registry.register(&colors::GRAY_COLOR);
    registry.register(&colors::CMYK_COLOR);
    registry.register(&names::FEATURE_CLASS_NAME);
    registry.register(&names::WORKSPACE_NAME);
    registry.register(&renderers::SIMPLE_RENDERER);
    registry.register(&renderers::LEGEND_GROUP);
    registry.register(&renderers::LEGEND_CLASS);
    registry.register(&feature_layer::FEATURE_LAYER);
}
