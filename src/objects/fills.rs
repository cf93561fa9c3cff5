//! Fill symbol layers.

use uuid::uuid;

use crate::clsid::Clsid;
use crate::error::DecodeError;
use crate::graph::DecodedObject;
use crate::stream::Stream;

use super::{read_symbol_level, ObjectDef};

pub(crate) const FILL_STYLES: &[(u32, &str)] = &[
    (0, "solid"),
    (1, "null"),
    (2, "horizontal"),
    (3, "vertical"),
    (4, "forward_diagonal"),
    (5, "backward_diagonal"),
    (6, "cross"),
    (7, "diagonal_cross"),
];

pub struct SimpleFillSymbol;

pub static SIMPLE_FILL_SYMBOL: SimpleFillSymbol = SimpleFillSymbol;

impl ObjectDef for SimpleFillSymbol {
    fn clsid(&self) -> Clsid {
        Clsid::new(uuid!("7914e603-c892-11d0-8bb6-080009ee4e41"))
    }

    fn name(&self) -> &'static str {
        "SimpleFillSymbol"
    }

    fn read(
        &self,
        stream:   &mut Stream<'_>,
        _version: u16,
        obj:      &mut DecodedObject,
    ) -> Result<(), DecodeError> {
        // Fixed two-byte header.  A padding scan would be wrong here: the
        // outline object may be null, and its CLSID starts with zero bytes.
        stream.read_assert(&[0x01, 0x00])?;
        let outline = stream.read_object(true)?;
        let color = stream.read_object(true)?;
        let symbol_level = read_symbol_level(stream)?;
        let fill_style = stream.read_enum("fill style", FILL_STYLES)?;

        obj.set("outline", outline);
        obj.set("color", color);
        obj.set("symbol_level", symbol_level);
        obj.set("fill_style", fill_style);
        Ok(())
    }
}
