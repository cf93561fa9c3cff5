//! Multi-layer symbol composites.
//!
//! Shared shape: symbol level, a count-prefixed run of layer objects, then
//! one enabled flag and one locked flag per layer.  The flags arrive after
//! the layers have already been frozen into the arena, so they are recorded
//! as parallel lists on the composite rather than written back into the
//! layer objects.

use uuid::uuid;

use crate::clsid::Clsid;
use crate::error::DecodeError;
use crate::graph::{DecodedObject, Value};
use crate::stream::Stream;

use super::{read_symbol_level, ObjectDef};

/// On-disk version that adds per-layer tag strings.
const V_LAYER_TAGS: u16 = 2;

fn read_layers(stream: &mut Stream<'_>) -> Result<Vec<Value>, DecodeError> {
    let offset = stream.tell()?;
    let count = stream.read_u32()?;
    // Each layer is at least a two-byte identifier.
    if count as u64 * 2 > stream.remaining()? {
        return Err(DecodeError::LayoutMismatch {
            offset,
            detail: format!("layer count {count} exceeds remaining stream"),
        });
    }
    let mut layers = Vec::with_capacity(count as usize);
    for _ in 0..count {
        layers.push(Value::from(stream.read_object(true)?));
    }
    Ok(layers)
}

fn read_per_layer_flags(stream: &mut Stream<'_>, n: usize) -> Result<Vec<Value>, DecodeError> {
    let mut flags = Vec::with_capacity(n);
    for _ in 0..n {
        flags.push(Value::Bool(stream.read_u32()? != 0));
    }
    Ok(flags)
}

fn read_per_layer_tags(stream: &mut Stream<'_>, n: usize) -> Result<Vec<Value>, DecodeError> {
    let mut tags = Vec::with_capacity(n);
    for _ in 0..n {
        tags.push(Value::Str(stream.read_string()?));
    }
    Ok(tags)
}

// ── MultiLayerLineSymbol ─────────────────────────────────────────────────────

pub struct MultiLayerLineSymbol;

pub static MULTI_LAYER_LINE_SYMBOL: MultiLayerLineSymbol = MultiLayerLineSymbol;

impl ObjectDef for MultiLayerLineSymbol {
    fn clsid(&self) -> Clsid {
        Clsid::new(uuid!("7914e5fa-c892-11d0-8bb6-080009ee4e41"))
    }

    fn name(&self) -> &'static str {
        "MultiLayerLineSymbol"
    }

    fn versions(&self) -> Option<&'static [u16]> {
        Some(&[1, 2])
    }

    fn read(
        &self,
        stream:  &mut Stream<'_>,
        version: u16,
        obj:     &mut DecodedObject,
    ) -> Result<(), DecodeError> {
        let symbol_level = read_symbol_level(stream)?;
        let layers = read_layers(stream)?;
        let n = layers.len();
        let enabled = read_per_layer_flags(stream, n)?;
        let locked = read_per_layer_flags(stream, n)?;

        obj.set("symbol_level", symbol_level);
        obj.set("layers", Value::List(layers));
        obj.set("enabled", Value::List(enabled));
        obj.set("locked", Value::List(locked));

        if version >= V_LAYER_TAGS {
            obj.set("tags", Value::List(read_per_layer_tags(stream, n)?));
        }
        Ok(())
    }
}

// ── MultiLayerFillSymbol ─────────────────────────────────────────────────────

pub struct MultiLayerFillSymbol;

pub static MULTI_LAYER_FILL_SYMBOL: MultiLayerFillSymbol = MultiLayerFillSymbol;

impl ObjectDef for MultiLayerFillSymbol {
    fn clsid(&self) -> Clsid {
        Clsid::new(uuid!("7914e604-c892-11d0-8bb6-080009ee4e41"))
    }

    fn name(&self) -> &'static str {
        "MultiLayerFillSymbol"
    }

    fn versions(&self) -> Option<&'static [u16]> {
        Some(&[1, 2])
    }

    fn read(
        &self,
        stream:  &mut Stream<'_>,
        version: u16,
        obj:     &mut DecodedObject,
    ) -> Result<(), DecodeError> {
        let symbol_level = read_symbol_level(stream)?;
        // Present in every file, ignored by the original renderer.
        let background_color = stream.read_object(true)?;
        let layers = read_layers(stream)?;
        let n = layers.len();
        let enabled = read_per_layer_flags(stream, n)?;
        let locked = read_per_layer_flags(stream, n)?;

        obj.set("symbol_level", symbol_level);
        obj.set("background_color", background_color);
        obj.set("layers", Value::List(layers));
        obj.set("enabled", Value::List(enabled));
        obj.set("locked", Value::List(locked));

        if version >= V_LAYER_TAGS {
            obj.set("tags", Value::List(read_per_layer_tags(stream, n)?));
        }
        Ok(())
    }
}

// ── MultiLayerMarkerSymbol ───────────────────────────────────────────────────

pub struct MultiLayerMarkerSymbol;

pub static MULTI_LAYER_MARKER_SYMBOL: MultiLayerMarkerSymbol = MultiLayerMarkerSymbol;

impl ObjectDef for MultiLayerMarkerSymbol {
    fn clsid(&self) -> Clsid {
        Clsid::new(uuid!("7914e5ff-c892-11d0-8bb6-080009ee4e41"))
    }

    fn name(&self) -> &'static str {
        "MultiLayerMarkerSymbol"
    }

    fn versions(&self) -> Option<&'static [u16]> {
        Some(&[1, 2, 3])
    }

    fn read(
        &self,
        stream:  &mut Stream<'_>,
        version: u16,
        obj:     &mut DecodedObject,
    ) -> Result<(), DecodeError> {
        let symbol_level = read_symbol_level(stream)?;
        let halo = stream.read_u32()? != 0;
        let halo_size = stream.read_f64()?;
        let halo_symbol = stream.read_object(true)?;
        let layers = read_layers(stream)?;
        let n = layers.len();
        let enabled = read_per_layer_flags(stream, n)?;
        let locked = read_per_layer_flags(stream, n)?;

        obj.set("symbol_level", symbol_level);
        obj.set("halo", halo);
        obj.set("halo_size", halo_size);
        obj.set("halo_symbol", halo_symbol);
        obj.set("layers", Value::List(layers));
        obj.set("enabled", Value::List(enabled));
        obj.set("locked", Value::List(locked));

        if version >= V_LAYER_TAGS {
            obj.set("tags", Value::List(read_per_layer_tags(stream, n)?));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::lines::SIMPLE_LINE_SYMBOL;
    use crate::objects::{MAGIC_COLOR, MAGIC_SYMBOL, TERMINATOR};
    use crate::registry::Registry;
    use std::io::Cursor;

    fn simple_line_with_tag() -> Vec<u8> {
        let mut bytes = SIMPLE_LINE_SYMBOL.clsid().short_tag().to_vec();
        bytes.extend_from_slice(&MAGIC_SYMBOL);
        bytes.push(0x01);
        bytes.extend_from_slice(&[0x10, 0x20, 0x30, 0x00, 0x00]); // record, no padding
        bytes.extend_from_slice(&MAGIC_COLOR);
        bytes.extend_from_slice(&0.5f64.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes()); // solid
        bytes.push(TERMINATOR);
        bytes.extend_from_slice(&[0u8; 7]);
        bytes
    }

    fn multi_line_bytes(version: u16) -> Vec<u8> {
        let mut bytes = vec![0xfa, 0xe5];
        bytes.extend_from_slice(&MAGIC_SYMBOL);
        bytes.extend_from_slice(&version.to_le_bytes());
        bytes.extend_from_slice(&[0x0d, 0x00, 0x00, 0x00]); // raster op
        bytes.extend_from_slice(&0u32.to_le_bytes()); // level
        bytes.extend_from_slice(&2u32.to_le_bytes()); // two layers
        bytes.extend_from_slice(&simple_line_with_tag());
        bytes.extend_from_slice(&simple_line_with_tag());
        bytes.extend_from_slice(&1u32.to_le_bytes()); // enabled[0]
        bytes.extend_from_slice(&0u32.to_le_bytes()); // enabled[1]
        bytes.extend_from_slice(&0u32.to_le_bytes()); // locked[0]
        bytes.extend_from_slice(&1u32.to_le_bytes()); // locked[1]
        if version >= 2 {
            for _ in 0..2 {
                bytes.extend_from_slice(&0u32.to_le_bytes()); // empty tag
                bytes.extend_from_slice(&[0x00, 0x00]); // terminator
            }
        }
        bytes
    }

    #[test]
    fn multi_layer_line_v1_decodes_layers_and_flags() {
        let reg = Registry::builtin();
        let mut src = Cursor::new(multi_line_bytes(1));
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        let handle = stream.read_object(true).unwrap().unwrap();
        let obj = stream.graph().get(handle);
        match (obj.get("layers"), obj.get("enabled"), obj.get("locked")) {
            (Some(Value::List(layers)), Some(Value::List(enabled)), Some(Value::List(locked))) => {
                assert_eq!(layers.len(), 2);
                assert_eq!(enabled, &[Value::Bool(true), Value::Bool(false)]);
                assert_eq!(locked, &[Value::Bool(false), Value::Bool(true)]);
            }
            other => panic!("unexpected shape: {other:?}"),
        }
        assert!(obj.get("tags").is_none());
    }

    #[test]
    fn multi_layer_line_v2_reads_tags() {
        let reg = Registry::builtin();
        let mut src = Cursor::new(multi_line_bytes(2));
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        let handle = stream.read_object(true).unwrap().unwrap();
        let obj = stream.graph().get(handle);
        match obj.get("tags") {
            Some(Value::List(tags)) => assert_eq!(tags.len(), 2),
            other => panic!("expected tags list, got {other:?}"),
        }
    }

    #[test]
    fn layer_count_larger_than_stream_is_rejected() {
        let reg = Registry::builtin();
        let mut bytes = vec![0xfa, 0xe5];
        bytes.extend_from_slice(&MAGIC_SYMBOL);
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&[0x0d, 0x00, 0x00, 0x00]);
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&0x00ff_ffffu32.to_le_bytes()); // absurd count
        let mut src = Cursor::new(bytes);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        assert!(matches!(
            stream.read_object(true),
            Err(DecodeError::LayoutMismatch { .. })
        ));
    }
}
