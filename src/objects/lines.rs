//! Line symbol layers, line templates and line decorations.

use uuid::uuid;

use crate::clsid::Clsid;
use crate::error::DecodeError;
use crate::graph::{DecodedObject, Value};
use crate::stream::Stream;

use super::colors::{read_color_model, ColorRecord};
use super::{ObjectDef, MAGIC_COLOR, TERMINATOR};

pub(crate) const LINE_TYPES: &[(u32, &str)] = &[
    (0, "solid"),
    (1, "dashed"),
    (2, "dotted"),
    (3, "dash_dot"),
    (4, "dash_dot_dot"),
    (5, "null"),
];

pub(crate) const LINE_CAPS: &[(u32, &str)] = &[(0, "butt"), (1, "round"), (2, "square")];

pub(crate) const LINE_JOINS: &[(u32, &str)] = &[(0, "miter"), (1, "round"), (2, "bevel")];

// ── SimpleLineSymbol ─────────────────────────────────────────────────────────

pub struct SimpleLineSymbol;

pub static SIMPLE_LINE_SYMBOL: SimpleLineSymbol = SimpleLineSymbol;

impl ObjectDef for SimpleLineSymbol {
    fn clsid(&self) -> Clsid {
        Clsid::new(uuid!("7914e5f9-c892-11d0-8bb6-080009ee4e41"))
    }

    fn name(&self) -> &'static str {
        "SimpleLineSymbol"
    }

    fn read(
        &self,
        stream:   &mut Stream<'_>,
        _version: u16,
        obj:      &mut DecodedObject,
    ) -> Result<(), DecodeError> {
        stream.read_assert(&[0x01])?;
        stream.consume_padding()?;
        let color = ColorRecord::decode(stream)?;
        stream.read_assert(&MAGIC_COLOR)?;
        let width = stream.read_f64()?;
        let line_type = stream.read_enum("line type", LINE_TYPES)?;
        stream.read_assert(&[TERMINATOR])?;
        stream.skip_unknown("simple line trailer", 7)?;

        obj.set("color", color.to_value());
        obj.set("width", width);
        obj.set("line_type", line_type);
        Ok(())
    }
}

// ── CartographicLineSymbol ───────────────────────────────────────────────────

pub struct CartographicLineSymbol;

pub static CARTOGRAPHIC_LINE_SYMBOL: CartographicLineSymbol = CartographicLineSymbol;

impl ObjectDef for CartographicLineSymbol {
    fn clsid(&self) -> Clsid {
        Clsid::new(uuid!("7914e5fb-c892-11d0-8bb6-080009ee4e41"))
    }

    fn name(&self) -> &'static str {
        "CartographicLineSymbol"
    }

    fn read(
        &self,
        stream:   &mut Stream<'_>,
        _version: u16,
        obj:      &mut DecodedObject,
    ) -> Result<(), DecodeError> {
        stream.read_assert(&[0x01, 0x00])?;
        let cap = stream.read_enum("line cap", LINE_CAPS)?;
        let join = stream.read_enum("line join", LINE_JOINS)?;
        let width = stream.read_f64()?;
        stream.read_assert(&[0x00])?;
        let offset = stream.read_f64()?;
        let model = read_color_model(stream)?;
        stream.read_assert(&MAGIC_COLOR)?;
        stream.consume_padding()?;
        let color = ColorRecord::decode(stream)?;
        stream.skip_unknown("cartographic line pattern block", 46)?;
        stream.read_assert(&[TERMINATOR])?;
        stream.skip_unknown("cartographic line trailer", 24)?;

        obj.set("cap", cap);
        obj.set("join", join);
        obj.set("width", width);
        obj.set("offset", offset);
        obj.set("color_model", model);
        obj.set("color", color.to_value());
        Ok(())
    }
}

// ── MarkerLineSymbol ─────────────────────────────────────────────────────────

pub struct MarkerLineSymbol;

pub static MARKER_LINE_SYMBOL: MarkerLineSymbol = MarkerLineSymbol;

impl ObjectDef for MarkerLineSymbol {
    fn clsid(&self) -> Clsid {
        Clsid::new(uuid!("7914e5fd-c892-11d0-8bb6-080009ee4e41"))
    }

    fn name(&self) -> &'static str {
        "MarkerLineSymbol"
    }

    fn read(
        &self,
        stream:   &mut Stream<'_>,
        _version: u16,
        obj:      &mut DecodedObject,
    ) -> Result<(), DecodeError> {
        stream.read_assert(&[0x01])?;
        let cap = stream.read_enum("line cap", LINE_CAPS)?;
        let offset = stream.read_f64()?;
        let marker = stream.read_object(true)?;
        let template = stream.read_object(true)?;
        let decoration = stream.read_object(true)?;
        stream.read_assert(&[TERMINATOR])?;
        stream.skip_unknown("marker line trailer", 25)?;

        obj.set("cap", cap);
        obj.set("offset", offset);
        obj.set("marker", marker);
        obj.set("template", template);
        obj.set("decoration", decoration);
        Ok(())
    }
}

// ── LineTemplate ─────────────────────────────────────────────────────────────

/// Dash pattern: alternating filled/empty part lengths in units of the
/// pattern interval.
pub struct LineTemplate;

pub static LINE_TEMPLATE: LineTemplate = LineTemplate;

impl ObjectDef for LineTemplate {
    fn clsid(&self) -> Clsid {
        Clsid::new(uuid!("41093a71-cce1-11d0-bfaa-0080c7e24280"))
    }

    fn name(&self) -> &'static str {
        "LineTemplate"
    }

    fn versions(&self) -> Option<&'static [u16]> {
        Some(&[1])
    }

    fn read(
        &self,
        stream:   &mut Stream<'_>,
        _version: u16,
        obj:      &mut DecodedObject,
    ) -> Result<(), DecodeError> {
        let interval = stream.read_f64()?;
        let offset = stream.tell()?;
        let count = stream.read_u32()?;
        if count as u64 * 16 > stream.remaining()? {
            return Err(DecodeError::LayoutMismatch {
                offset,
                detail: format!("template part count {count} exceeds remaining stream"),
            });
        }
        let mut parts = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let filled = stream.read_f64()?;
            let empty = stream.read_f64()?;
            parts.push(Value::Record(vec![
                ("filled", Value::F64(filled)),
                ("empty", Value::F64(empty)),
            ]));
        }
        obj.set("pattern_interval", interval);
        obj.set("parts", Value::List(parts));
        Ok(())
    }
}

// ── Line decorations ─────────────────────────────────────────────────────────

pub struct LineDecoration;

pub static LINE_DECORATION: LineDecoration = LineDecoration;

impl ObjectDef for LineDecoration {
    fn clsid(&self) -> Clsid {
        Clsid::new(uuid!("533d88f5-0a1a-11d2-b27f-0000f878229e"))
    }

    fn name(&self) -> &'static str {
        "LineDecoration"
    }

    fn versions(&self) -> Option<&'static [u16]> {
        Some(&[1])
    }

    fn read(
        &self,
        stream:   &mut Stream<'_>,
        _version: u16,
        obj:      &mut DecodedObject,
    ) -> Result<(), DecodeError> {
        let count = stream.read_u32()?;
        let mut elements = Vec::with_capacity(count as usize);
        for _ in 0..count {
            elements.push(Value::from(stream.read_object(true)?));
        }
        obj.set("elements", Value::List(elements));
        Ok(())
    }
}

pub struct SimpleLineDecorationElement;

pub static SIMPLE_LINE_DECORATION_ELEMENT: SimpleLineDecorationElement =
    SimpleLineDecorationElement;

impl ObjectDef for SimpleLineDecorationElement {
    fn clsid(&self) -> Clsid {
        Clsid::new(uuid!("533d88f3-0a1a-11d2-b27f-0000f878229e"))
    }

    fn name(&self) -> &'static str {
        "SimpleLineDecorationElement"
    }

    fn versions(&self) -> Option<&'static [u16]> {
        Some(&[1])
    }

    fn read(
        &self,
        stream:   &mut Stream<'_>,
        _version: u16,
        obj:      &mut DecodedObject,
    ) -> Result<(), DecodeError> {
        let fixed_angle = stream.read_u8()? == 0;
        let flip_first = stream.read_u8()? != 0;
        let flip_all = stream.read_u8()? != 0;
        let position_as_ratio = stream.read_u16()? != 0;
        let marker = stream.read_object(true)?;
        let count = stream.read_u32()?;
        let mut positions = Vec::with_capacity(count as usize);
        for _ in 0..count {
            positions.push(Value::F64(stream.read_f64()?));
        }

        obj.set("fixed_angle", fixed_angle);
        obj.set("flip_first", flip_first);
        obj.set("flip_all", flip_all);
        obj.set("position_as_ratio", position_as_ratio);
        obj.set("marker", marker);
        obj.set("positions", Value::List(positions));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use std::io::Cursor;

    // Body bytes for a SimpleLineSymbol (everything after the identifier).
    fn simple_line_body(r: u8, g: u8, b: u8, width: f64, line_type: u32) -> Vec<u8> {
        let mut bytes = vec![0x01];
        bytes.extend_from_slice(&[0x00, 0x00]); // padding
        bytes.extend_from_slice(&[r, g, b, 0x00, 0x00]); // color record
        bytes.extend_from_slice(&MAGIC_COLOR);
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&line_type.to_le_bytes());
        bytes.push(TERMINATOR);
        bytes.extend_from_slice(&[0u8; 7]);
        bytes
    }

    #[test]
    fn simple_line_decodes() {
        let reg = Registry::builtin();
        let bytes = simple_line_body(200, 100, 50, 1.5, 1);
        let mut src = Cursor::new(bytes);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        let handle = stream.read_object_as(&SIMPLE_LINE_SYMBOL, 1).unwrap();
        let obj = stream.graph().get(handle);
        assert_eq!(obj.get("width"), Some(&Value::F64(1.5)));
        assert_eq!(obj.get("line_type"), Some(&Value::Str("dashed".to_string())));
        match obj.get("color") {
            Some(Value::Record(fields)) => {
                assert_eq!(fields[0], ("R", Value::U32(200)));
                assert_eq!(fields[4], ("is_null", Value::Bool(false)));
            }
            other => panic!("expected inline color record, got {other:?}"),
        }
    }

    #[test]
    fn simple_line_magic_mismatch_carries_offset() {
        let reg = Registry::builtin();
        // Red channel must be non-zero or the padding scan would run into
        // the record itself.
        let mut bytes = simple_line_body(10, 0, 0, 0.0, 0);
        // Corrupt one byte in the middle of the colour magic.
        // Body layout: 1 assert + 2 padding + 5 record = 8 bytes before it.
        bytes[8 + 4] ^= 0xff;
        let mut src = Cursor::new(bytes);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        match stream.read_object_as(&SIMPLE_LINE_SYMBOL, 1) {
            Err(DecodeError::MagicMismatch { offset, .. }) => assert_eq!(offset, 8),
            other => panic!("expected MagicMismatch, got {other:?}"),
        }
    }

    #[test]
    fn line_type_seven_is_unknown_enum() {
        let reg = Registry::builtin();
        let bytes = simple_line_body(10, 0, 0, 0.5, 7);
        let mut src = Cursor::new(bytes);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        match stream.read_object_as(&SIMPLE_LINE_SYMBOL, 1) {
            Err(DecodeError::UnknownEnumValue { what, value, .. }) => {
                assert_eq!(what, "line type");
                assert_eq!(value, 7);
            }
            other => panic!("expected UnknownEnumValue, got {other:?}"),
        }
    }

    #[test]
    fn line_template_reads_parts() {
        let reg = Registry::builtin();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&LINE_TEMPLATE.clsid().to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&4.0f64.to_le_bytes()); // interval
        bytes.extend_from_slice(&2u32.to_le_bytes());
        for part in [(3.0f64, 1.0f64), (1.0, 1.0)] {
            bytes.extend_from_slice(&part.0.to_le_bytes());
            bytes.extend_from_slice(&part.1.to_le_bytes());
        }
        let mut src = Cursor::new(bytes);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        let handle = stream.read_object(true).unwrap().unwrap();
        let obj = stream.graph().get(handle);
        assert_eq!(obj.get("pattern_interval"), Some(&Value::F64(4.0)));
        match obj.get("parts") {
            Some(Value::List(parts)) => assert_eq!(parts.len(), 2),
            other => panic!("expected parts list, got {other:?}"),
        }
    }

    #[test]
    fn line_template_rejects_absurd_count() {
        let reg = Registry::builtin();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&LINE_TEMPLATE.clsid().to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&4.0f64.to_le_bytes());
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        let mut src = Cursor::new(bytes);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        match stream.read_object(true) {
            Err(DecodeError::LayoutMismatch { offset, .. }) => assert_eq!(offset, 26),
            other => panic!("expected LayoutMismatch, got {other:?}"),
        }
    }
}
