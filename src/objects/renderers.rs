//! Renderers and legend objects.

use uuid::uuid;

use crate::clsid::Clsid;
use crate::error::DecodeError;
use crate::graph::{DecodedObject, Value};
use crate::stream::Stream;

use super::ObjectDef;

/// On-disk version that appends the rotation/graduation block.
const V_ROTATION_BLOCK: u16 = 3;

pub struct SimpleRenderer;

pub static SIMPLE_RENDERER: SimpleRenderer = SimpleRenderer;

impl ObjectDef for SimpleRenderer {
    fn clsid(&self) -> Clsid {
        Clsid::new(uuid!("f3435801-5779-11d0-98bf-00805f7ced21"))
    }

    fn name(&self) -> &'static str {
        "SimpleRenderer"
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
        let symbol = stream.read_object(true)?;
        let legend_group = stream.read_object(true)?;
        stream.read_assert(&[0x00, 0x00])?;
        stream.skip_unknown("renderer reserved", 16)?;
        let rotation_attribute = stream.read_string()?;
        let rotation_type = stream.read_u32()?;
        let transparency_attribute = stream.read_string()?;

        obj.set("symbol", symbol);
        obj.set("legend_group", legend_group);
        obj.set("rotation_attribute", rotation_attribute);
        obj.set("rotation_type", rotation_type);
        obj.set("transparency_attribute", transparency_attribute);

        if version >= V_ROTATION_BLOCK {
            stream.skip_unknown("rotation and graduation block", 35)?;
        }
        Ok(())
    }
}

pub struct LegendGroup;

pub static LEGEND_GROUP: LegendGroup = LegendGroup;

impl ObjectDef for LegendGroup {
    fn clsid(&self) -> Clsid {
        Clsid::new(uuid!("167c5ea2-af20-11d1-8817-080009ec732a"))
    }

    fn name(&self) -> &'static str {
        "LegendGroup"
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
        let visible = stream.read_u16()? != 0;
        let editable = stream.read_u16()? != 0;
        let heading = stream.read_string()?;
        let offset = stream.tell()?;
        let count = stream.read_u32()?;
        if count as u64 * 2 > stream.remaining()? {
            return Err(DecodeError::LayoutMismatch {
                offset,
                detail: format!("legend class count {count} exceeds remaining stream"),
            });
        }
        let mut classes = Vec::with_capacity(count as usize);
        for _ in 0..count {
            classes.push(Value::from(stream.read_object(true)?));
        }

        obj.set("visible", visible);
        obj.set("editable", editable);
        obj.set("heading", heading);
        obj.set("classes", Value::List(classes));
        Ok(())
    }
}

pub struct LegendClass;

pub static LEGEND_CLASS: LegendClass = LegendClass;

impl ObjectDef for LegendClass {
    fn clsid(&self) -> Clsid {
        Clsid::new(uuid!("167c5ea3-af20-11d1-8817-080009ec732a"))
    }

    fn name(&self) -> &'static str {
        "LegendClass"
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
        let symbol = stream.read_object(true)?;
        let label = stream.read_string()?;
        let description = stream.read_string()?;

        obj.set("symbol", symbol);
        obj.set("label", label);
        obj.set("description", description);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use std::io::Cursor;

    fn utf16(text: &str) -> Vec<u8> {
        let mut bytes = (text.encode_utf16().count() as u32).to_le_bytes().to_vec();
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes.extend_from_slice(&[0x00, 0x00]);
        bytes
    }

    fn legend_class_bytes(label: &str) -> Vec<u8> {
        let mut bytes = LEGEND_CLASS.clsid().to_le_bytes().to_vec();
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 16]); // null symbol
        bytes.extend_from_slice(&utf16(label));
        bytes.extend_from_slice(&utf16(""));
        bytes
    }

    #[test]
    fn legend_group_decodes_nested_classes() {
        let reg = Registry::builtin();
        let mut bytes = LEGEND_GROUP.clsid().to_le_bytes().to_vec();
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes()); // visible
        bytes.extend_from_slice(&0u16.to_le_bytes()); // editable
        bytes.extend_from_slice(&utf16("Streets"));
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&legend_class_bytes("major"));
        bytes.extend_from_slice(&legend_class_bytes("minor"));

        let mut src = Cursor::new(bytes);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        let handle = stream.read_object(true).unwrap().unwrap();
        let obj = stream.graph().get(handle);
        assert_eq!(obj.get("visible"), Some(&Value::Bool(true)));
        match obj.get("classes") {
            Some(Value::List(classes)) => {
                assert_eq!(classes.len(), 2);
                match &classes[0] {
                    Value::Object(h) => {
                        let class = stream.graph().get(*h);
                        assert_eq!(class.get("label"), Some(&Value::Str("major".to_string())));
                    }
                    other => panic!("expected class object, got {other:?}"),
                }
            }
            other => panic!("expected classes list, got {other:?}"),
        }
    }

    #[test]
    fn simple_renderer_v3_consumes_rotation_block() {
        let reg = Registry::builtin();
        let mut bytes = SIMPLE_RENDERER.clsid().to_le_bytes().to_vec();
        bytes.extend_from_slice(&3u16.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 16]); // null symbol
        bytes.extend_from_slice(&[0u8; 16]); // null legend group
        bytes.extend_from_slice(&[0x00, 0x00]); // assert
        bytes.extend_from_slice(&[0u8; 16]); // reserved
        bytes.extend_from_slice(&utf16("ANGLE"));
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&utf16(""));
        bytes.extend_from_slice(&[0u8; 35]); // rotation/graduation block

        let mut src = Cursor::new(bytes);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        let handle = stream.read_object(true).unwrap().unwrap();
        let obj = stream.graph().get(handle);
        assert_eq!(
            obj.get("rotation_attribute"),
            Some(&Value::Str("ANGLE".to_string()))
        );
        assert_eq!(stream.remaining().unwrap(), 0);
    }
}
