//! Decoder for the binary object streams inside legacy ArcGIS `.style` and
//! `.lyr` files.
//!
//! The format was never published; every layout here was recovered by
//! observation of real files.  The decoder is strict by default — an
//! unknown class identifier, a bad magic sequence or an out-of-set version
//! word aborts the decode with an offset-carrying error — because guessing
//! at an unknown layout corrupts everything after it.
//!
//! Entry points live in [`document`]: [`decode_symbol`] for style-gallery
//! blobs, [`decode_layer_object`] for layer object streams.  The result is
//! an [`ObjectGraph`] arena plus a root handle, projectable to plain JSON
//! via [`DecodedDocument::to_json`].

pub mod clsid;
pub mod document;
pub mod error;
pub mod graph;
pub mod objects;
pub mod registry;
pub mod stream;

pub use clsid::Clsid;
pub use document::{
    decode_layer_object, decode_symbol, decode_symbol_with_version, sniff, DecodedDocument,
    DocumentKind,
};
pub use error::DecodeError;
pub use graph::{DecodedObject, ObjHandle, ObjectGraph, Value};
pub use registry::{Registry, Resolution};
pub use stream::{ByteSource, Stream};
