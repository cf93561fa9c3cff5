//! Marker symbol layers.

use uuid::uuid;

use crate::clsid::Clsid;
use crate::error::DecodeError;
use crate::graph::DecodedObject;
use crate::stream::Stream;

use super::{read_symbol_level, ObjectDef};

pub(crate) const MARKER_TYPES: &[(u32, &str)] = &[
    (0, "circle"),
    (1, "square"),
    (2, "cross"),
    (3, "x"),
    (4, "diamond"),
];

/// On-disk version that adds the rotate-with-transform flag.
const V_ROTATE_FLAG: u16 = 2;

pub struct SimpleMarkerSymbol;

pub static SIMPLE_MARKER_SYMBOL: SimpleMarkerSymbol = SimpleMarkerSymbol;

impl ObjectDef for SimpleMarkerSymbol {
    fn clsid(&self) -> Clsid {
        Clsid::new(uuid!("7914e5fe-c892-11d0-8bb6-080009ee4e41"))
    }

    fn name(&self) -> &'static str {
        "SimpleMarkerSymbol"
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
        let color = stream.read_object(true)?;
        let size = stream.read_f64()?;
        let marker_type = stream.read_enum("marker type", MARKER_TYPES)?;
        let symbol_level = read_symbol_level(stream)?;
        let angle = stream.read_f64()?;
        let x_offset = stream.read_f64()?;
        let y_offset = stream.read_f64()?;
        let outline = stream.read_u8()? != 0;
        let outline_width = stream.read_f64()?;
        let outline_color = stream.read_object(true)?;

        obj.set("color", color);
        obj.set("size", size);
        obj.set("marker_type", marker_type);
        obj.set("symbol_level", symbol_level);
        obj.set("angle", angle);
        obj.set("x_offset", x_offset);
        obj.set("y_offset", y_offset);
        obj.set("outline", outline);
        obj.set("outline_width", outline_width);
        obj.set("outline_color", outline_color);

        if version >= V_ROTATE_FLAG {
            obj.set("rotate_with_transform", stream.read_u16()? != 0);
        }
        Ok(())
    }
}
