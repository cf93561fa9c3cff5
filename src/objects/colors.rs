//! Colour leaves: the 5-byte colour record, the colour-model byte, and the
//! full colour object family.
//!
//! Two representations coexist on disk.  Leaf symbols embed a bare colour
//! record directly in their body; layer streams persist colours as proper
//! objects with their own CLSIDs (and reference ids, colours being the most
//! commonly shared objects in real files).

use uuid::uuid;

use crate::clsid::Clsid;
use crate::error::DecodeError;
use crate::graph::{DecodedObject, Value};
use crate::stream::Stream;

use super::ObjectDef;

// ── Colour model byte ────────────────────────────────────────────────────────

const COLOR_MODELS: &[(u8, &str)] = &[(0x96, "rgb"), (0x92, "hsv"), (0x97, "cmyk")];

/// Single-byte colour model discriminant embedded in leaf symbols.
pub(crate) fn read_color_model(stream: &mut Stream<'_>) -> Result<&'static str, DecodeError> {
    let offset = stream.tell()?;
    let value = stream.read_u8()?;
    COLOR_MODELS
        .iter()
        .find(|(code, _)| *code == value)
        .map(|(_, name)| *name)
        .ok_or(DecodeError::UnknownEnumValue {
            what:  "color model",
            value: value as u32,
            offset,
        })
}

// ── Colour record ────────────────────────────────────────────────────────────

/// The 5-byte embedded colour record: R, G, B, dither flag, null flag.
/// Byte-for-byte round-trippable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorRecord {
    pub r:       u8,
    pub g:       u8,
    pub b:       u8,
    pub dither:  bool,
    pub is_null: bool,
}

impl ColorRecord {
    pub fn decode(stream: &mut Stream<'_>) -> Result<Self, DecodeError> {
        let r = stream.read_u8()?;
        let g = stream.read_u8()?;
        let b = stream.read_u8()?;
        let dither = stream.read_u8()? == 0x01;
        let is_null = stream.read_u8()? == 0xff;
        Ok(ColorRecord { r, g, b, dither, is_null })
    }

    pub fn encode(&self) -> [u8; 5] {
        [
            self.r,
            self.g,
            self.b,
            if self.dither { 0x01 } else { 0x00 },
            if self.is_null { 0xff } else { 0x00 },
        ]
    }

    /// Inline record value for embedding in a symbol's fields.
    pub fn to_value(self) -> Value {
        Value::Record(vec![
            ("R", Value::U32(self.r as u32)),
            ("G", Value::U32(self.g as u32)),
            ("B", Value::U32(self.b as u32)),
            ("dither", Value::Bool(self.dither)),
            ("is_null", Value::Bool(self.is_null)),
        ])
    }
}

// ── Colour objects ───────────────────────────────────────────────────────────

/// The RGB-family colour objects share one layout and differ only in CLSID
/// and nominal model.
pub struct RgbFamilyColor {
    clsid: Clsid,
    name:  &'static str,
    model: &'static str,
}

pub static RGB_COLOR: RgbFamilyColor = RgbFamilyColor {
    clsid: Clsid::new(uuid!("7ee9c496-d123-11d0-8383-080009b996cc")),
    name:  "RgbColor",
    model: "rgb",
};
pub static HSV_COLOR: RgbFamilyColor = RgbFamilyColor {
    clsid: Clsid::new(uuid!("7ee9c492-d123-11d0-8383-080009b996cc")),
    name:  "HsvColor",
    model: "hsv",
};
pub static HLS_COLOR: RgbFamilyColor = RgbFamilyColor {
    clsid: Clsid::new(uuid!("7ee9c493-d123-11d0-8383-080009b996cc")),
    name:  "HlsColor",
    model: "hls",
};
pub static GRAY_COLOR: RgbFamilyColor = RgbFamilyColor {
    clsid: Clsid::new(uuid!("7ee9c495-d123-11d0-8383-080009b996cc")),
    name:  "GrayColor",
    model: "gray",
};

impl ObjectDef for RgbFamilyColor {
    fn clsid(&self) -> Clsid {
        self.clsid
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn versions(&self) -> Option<&'static [u16]> {
        Some(&[1])
    }

    fn read(
        &self,
        stream:  &mut Stream<'_>,
        _version: u16,
        obj:     &mut DecodedObject,
    ) -> Result<(), DecodeError> {
        stream.read_assert(&[0x01, 0x00, 0x00])?;
        let record = ColorRecord::decode(stream)?;
        obj.set("model", self.model);
        obj.set("R", record.r as u32);
        obj.set("G", record.g as u32);
        obj.set("B", record.b as u32);
        obj.set("dither", record.dither);
        obj.set("is_null", record.is_null);
        Ok(())
    }
}

pub struct CmykColor;

pub static CMYK_COLOR: CmykColor = CmykColor;

impl ObjectDef for CmykColor {
    fn clsid(&self) -> Clsid {
        Clsid::new(uuid!("7ee9c497-d123-11d0-8383-080009b996cc"))
    }

    fn name(&self) -> &'static str {
        "CmykColor"
    }

    fn versions(&self) -> Option<&'static [u16]> {
        Some(&[4])
    }

    fn read(
        &self,
        stream:  &mut Stream<'_>,
        _version: u16,
        obj:     &mut DecodedObject,
    ) -> Result<(), DecodeError> {
        stream.skip_unknown("cmyk header", 2)?;
        // Direct byte representation of the four components.
        let c = stream.read_u8()?;
        let m = stream.read_u8()?;
        let y = stream.read_u8()?;
        let k = stream.read_u8()?;
        let dither = stream.read_u8()? == 0x01;
        let is_null = stream.read_u8()? == 0xff;
        obj.set("model", "cmyk");
        obj.set("C", c as u32);
        obj.set("M", m as u32);
        obj.set("Y", y as u32);
        obj.set("K", k as u32);
        obj.set("dither", dither);
        obj.set("is_null", is_null);
        Ok(())
    }
}
