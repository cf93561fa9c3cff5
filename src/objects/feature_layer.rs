//! FeatureLayer — the most heavily versioned composite in the format.
//!
//! Twelve on-disk versions survive in the wild, spanning roughly a decade of
//! releases.  Newer versions only ever append fields, so the body is a fixed
//! prefix followed by a ladder of version gates: a version below a gate
//! returns early and the later keys are simply absent from the projection.
//!
//! The layer-extension block is the one place in the whole format where
//! decoding may recover from an unknown CLSID: each extension is
//! size-prefixed, so an unknown or unsupported extension can be skipped by
//! seeking to its declared end.  Everywhere else an unknown identity is
//! fatal.

use log::trace;
use uuid::uuid;

use crate::clsid::Clsid;
use crate::error::DecodeError;
use crate::graph::{DecodedObject, Value};
use crate::stream::Stream;

use super::ObjectDef;

// Version gates.  Each constant is the first version that includes the
// fields it guards.
const V_JOIN_TYPE:          u16 = 15;
const V_FOLDER_PATH_GONE:   u16 = 16;
const V_UID:                u16 = 17;
const V_DESCRIPTION:        u16 = 18;
const V_SEARCH_ORDER:       u16 = 22;
const V_EXTRA_FLAG:         u16 = 23;
const V_FILTER_PAIRS:       u16 = 24;
const V_HTML_POPUP:         u16 = 25;
const V_DISPLAY_EXPRESSION: u16 = 33;
const V_POPUP_ATTACHMENTS:  u16 = 34;

/// Extension size fields include the 4-byte zero word and the 16-byte CLSID.
const EXTENSION_HEADER_LEN: u64 = 20;

pub struct FeatureLayer;

pub static FEATURE_LAYER: FeatureLayer = FeatureLayer;

impl ObjectDef for FeatureLayer {
    fn clsid(&self) -> Clsid {
        Clsid::new(uuid!("e663a651-8aad-11d0-bec7-00805f7c4268"))
    }

    fn name(&self) -> &'static str {
        "FeatureLayer"
    }

    fn versions(&self) -> Option<&'static [u16]> {
        Some(&[6, 15, 16, 17, 18, 21, 22, 23, 24, 25, 33, 34])
    }

    fn read(
        &self,
        stream:  &mut Stream<'_>,
        version: u16,
        obj:     &mut DecodedObject,
    ) -> Result<(), DecodeError> {
        // ── Fixed prefix (all versions) ──────────────────────────────────────
        obj.set("name", stream.read_string()?);
        obj.set("datasource_type", stream.read_string()?);
        obj.set("visible", stream.read_u16()? != 0);
        obj.set("show_map_tips", stream.read_u16()? != 0);
        obj.set("cached", stream.read_u16()? != 0);
        obj.set("dataset_name", stream.read_object(true)?);
        obj.set("renderer", stream.read_object(true)?);
        // Property-page CLSID for the renderer UI.  Recorded verbatim, never
        // resolved against the registry.
        obj.set("renderer_page", stream.read_clsid()?);
        obj.set("display_field", stream.read_string()?);
        obj.set("zoom_max", stream.read_f64()?);
        obj.set("zoom_min", stream.read_f64()?);
        obj.set("labels_enabled", stream.read_u16()? != 0);

        let hyperlink_count = stream.read_u32()?;
        let mut hyperlinks = Vec::with_capacity(hyperlink_count as usize);
        for _ in 0..hyperlink_count {
            hyperlinks.push(Value::from(stream.read_object(true)?));
        }
        obj.set("hyperlinks", Value::List(hyperlinks));

        obj.set("selection_color", stream.read_object(true)?);
        obj.set("definition_query", stream.read_string()?);
        obj.set("hyperlink_field", stream.read_string()?);
        obj.set("hyperlink_type", stream.read_u32()?);

        let field_count = stream.read_u32()?;
        let mut field_info = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            let field = stream.read_string()?;
            let format = stream.read_object(true)?;
            field_info.push(Value::Record(vec![
                ("field", Value::Str(field)),
                ("format", Value::from(format)),
            ]));
        }
        obj.set("field_info", Value::List(field_info));

        obj.set("annotation_collection", stream.read_object(true)?);
        obj.set("show_selection_using_symbol", stream.read_u16()? != 0);
        obj.set("excluded_features", stream.read_object(true)?);

        let selection_count = stream.read_u32()?;
        let mut selection_set = Vec::with_capacity(selection_count as usize);
        for _ in 0..selection_count {
            selection_set.push(Value::U32(stream.read_u32()?));
        }
        obj.set("selection_set", Value::List(selection_set));

        obj.set("scale_symbols", stream.read_u16()? != 0);
        obj.set("display_filter", stream.read_object(true)?);
        obj.set("transparency", stream.read_u16()? as u32);
        obj.set("brightness", stream.read_u16()? as u32);
        stream.skip_unknown("feature layer reserved word", 2)?;

        // ── Version ladder ───────────────────────────────────────────────────
        if version >= V_JOIN_TYPE {
            obj.set("join_type", stream.read_u32()?);
        }
        obj.set("join", stream.read_object(true)?);

        if version < V_FOLDER_PATH_GONE {
            // Legacy folder path, dropped from the format afterwards.
            stream.read_string()?;
        }
        if version < V_JOIN_TYPE {
            return Ok(());
        }

        let relation_count = stream.read_u32()?;
        let mut relations = Vec::with_capacity(relation_count as usize);
        for _ in 0..relation_count {
            relations.push(Value::from(stream.read_object(true)?));
        }
        obj.set("relations", Value::List(relations));

        obj.set("hyperlink_macro_name", stream.read_string()?);
        obj.set("area_of_interest", stream.read_object(true)?);
        stream.skip_index_array("feature layer index array")?;

        obj.set("extensions", Value::List(read_extensions(stream)?));

        obj.set("weight", stream.read_f64()?);
        obj.set("selected_feature_symbol", stream.read_object(true)?);
        obj.set("selectable", stream.read_u16()? != 0);
        obj.set("shape_type", stream.read_u32()?);
        obj.set("layer_extent", stream.read_object(true)?);
        if version < V_UID {
            return Ok(());
        }

        obj.set("uid", stream.read_object(true)?);
        if version < V_DESCRIPTION {
            return Ok(());
        }

        obj.set("description", stream.read_string()?);
        // Two values occur in real files, nothing in between.
        stream.read_assert_any(&[&[0x00, 0x00], &[0xff, 0xff]])?;
        obj.set("stored_zoom_max", stream.read_f64()?);
        obj.set("stored_zoom_min", stream.read_f64()?);
        // Inverted on disk: zero means the advanced drawing dialog is in use.
        obj.set("use_advanced_symbol_levels", stream.read_u16()? == 0);
        if version < V_SEARCH_ORDER {
            return Ok(());
        }

        obj.set("definition_search_order", stream.read_u32()?);
        if version < V_EXTRA_FLAG {
            return Ok(());
        }

        stream.read_assert_any(&[&[0x00, 0x00], &[0xff, 0xff]])?;
        if version < V_FILTER_PAIRS {
            return Ok(());
        }

        let pair_count = stream.read_u32()?;
        for _ in 0..pair_count {
            stream.read_string()?;
            stream.read_string()?;
        }
        if version < V_HTML_POPUP {
            return Ok(());
        }

        obj.set("html_popup_style", stream.read_u32()?);
        obj.set("html_popup_enabled", stream.read_u16()? != 0);
        obj.set("map_tip_hide_field_name", stream.read_u16()? != 0);
        obj.set("map_tip_show_coded", stream.read_u16()? != 0);
        obj.set("map_tip_field_name", stream.read_string()?);
        obj.set("map_tip_url_prefix", stream.read_string()?);
        obj.set("map_tip_url_suffix", stream.read_string()?);
        obj.set("map_tip_xsl", stream.read_string()?);
        if version < V_DISPLAY_EXPRESSION {
            return Ok(());
        }

        obj.set("display_expression", stream.read_object(true)?);
        obj.set("use_page_definition_query", stream.read_u16()? != 0);
        obj.set("page_name_field", stream.read_string()?);
        obj.set("page_name_match_operator", stream.read_string()?);
        stream.read_string()?; // current page value, session state only

        let time_dimension_count = stream.read_u16()?;
        obj.set("time_dimension_count", time_dimension_count as u32);
        obj.set("time_enabled", stream.read_u16()? != 0);
        obj.set("time_zone", stream.read_object(true)?);
        obj.set("time_data_changes_regularly", stream.read_u16()? != 0);
        // Multi-dimension layers write one extra word here.
        if time_dimension_count > 1 {
            stream.read_assert(&[0x01, 0x00])?;
        }
        obj.set("time_field", stream.read_string()?);
        obj.set("end_time_field", stream.read_string()?);
        obj.set("time_format", stream.read_string()?);
        obj.set("track_id_field", stream.read_string()?);
        obj.set("time_extent", stream.read_object(true)?);
        stream.read_assert(&[0x01, 0x00])?;
        obj.set("time_dimension_name", stream.read_string()?);
        obj.set("time_dimension_format", stream.read_string()?);
        stream.read_assert(&[0x01, 0x00])?;
        obj.set("time_display_cumulative", stream.read_u16()? != 0);
        obj.set("time_step", stream.read_f64()?);
        obj.set("time_step_units", stream.read_u32()?);
        obj.set("time_offset", stream.read_f64()?);
        obj.set("time_offset_units", stream.read_u32()?);
        obj.set("hyperlink_expression", stream.read_object(true)?);
        if version < V_POPUP_ATTACHMENTS {
            return Ok(());
        }

        obj.set("html_popup_download_attachment", stream.read_u16()? != 0);
        Ok(())
    }
}

/// The size-prefixed layer-extension block.
///
/// Each entry: `u32` declared size (payload + 20-byte header), `u32` zero
/// word, then either a bare CLSID (size == 20) or a nested object.  An
/// unknown or known-unsupported extension CLSID is skipped by seeking to
/// the declared end — the single sanctioned recovery in the decoder.
fn read_extensions(stream: &mut Stream<'_>) -> Result<Vec<Value>, DecodeError> {
    let count = stream.read_u32()?;
    let mut extensions = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let declared = stream.read_u32()? as u64 + EXTENSION_HEADER_LEN;
        let start = stream.tell()?;
        stream.read_assert(&[0x00, 0x00, 0x00, 0x00])?;

        if declared == EXTENSION_HEADER_LEN {
            // Bare reference to an extension with no persisted state.
            extensions.push(Value::Clsid(stream.read_clsid()?));
            continue;
        }

        // Extensions never carry reference ids, even in layer streams.
        match stream.read_object(false) {
            Ok(handle) => {
                let end = stream.tell()?;
                if end != start + declared {
                    return Err(DecodeError::LayoutMismatch {
                        offset: end,
                        detail: format!(
                            "extension ended at {end:#x}, declared end {:#x}",
                            start + declared
                        ),
                    });
                }
                extensions.push(Value::from(handle));
            }
            Err(DecodeError::UnknownClsid { clsid, offset }) => {
                trace!("skipping unknown extension {clsid} at {offset:#x}");
                stream.seek(start + declared)?;
            }
            Err(DecodeError::NotSupported { name, offset, .. }) => {
                trace!("skipping unsupported extension {name} at {offset:#x}");
                stream.seek(start + declared)?;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(extensions)
}
