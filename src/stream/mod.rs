//! Stream cursor over a raw object stream.
//!
//! # Reads
//! All binary I/O is strictly little-endian.  Every typed read records the
//! offset it started at so a failure can point back into the input.  A read
//! that runs off the end of the source is [`DecodeError::Truncated`], never a
//! bare IO error.
//!
//! # Object composition
//! [`Stream::read_object`] is the single composition point: it resolves the
//! identifier (two-byte short tag or full 16-byte CLSID) against the
//! [`Registry`], consumes the reference id and version word where the
//! grammar calls for them, dispatches to the type's body decoder and freezes
//! the result into the arena.  Back-references return the already-decoded
//! handle without consuming body bytes.
//!
//! # References
//! The reference table maps on-disk reference ids to arena handles.  An
//! object is registered only after its body has fully decoded, so a
//! back-reference can never observe a half-built object.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use log::trace;

use crate::clsid::Clsid;
use crate::error::DecodeError;
use crate::graph::{DecodedObject, ObjHandle, ObjectGraph};
use crate::objects::{ObjectDef, MAGIC_SYMBOL};
use crate::registry::{Registry, Resolution};

/// Any seekable byte source.  Blanket-implemented, so `Cursor<Vec<u8>>`,
/// `File` and friends all qualify.
pub trait ByteSource: Read + Seek {}
impl<T: Read + Seek> ByteSource for T {}

// ── Stream ───────────────────────────────────────────────────────────────────

pub struct Stream<'a> {
    source:   &'a mut dyn ByteSource,
    registry: &'a Registry,
    graph:    ObjectGraph,
    refs:     HashMap<u32, ObjHandle>,
    /// Whether full-CLSID objects carry a reference id.  Layer streams do,
    /// style-gallery blobs do not.
    references_enabled: bool,
    /// Absolute end of the source, captured once at construction.
    end: u64,
}

impl<'a> Stream<'a> {
    /// Wrap a source positioned anywhere.  The cursor is left where it was.
    pub fn new(
        source:   &'a mut dyn ByteSource,
        registry: &'a Registry,
    ) -> Result<Self, DecodeError> {
        let pos = source.stream_position()?;
        let end = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(pos))?;
        Ok(Stream {
            source,
            registry,
            graph: ObjectGraph::new(),
            refs:  HashMap::new(),
            references_enabled: false,
            end,
        })
    }

    /// Enable the reference-id protocol (layer-stream containers only).
    pub fn enable_references(&mut self) {
        self.references_enabled = true;
    }

    pub fn graph(&self) -> &ObjectGraph {
        &self.graph
    }

    pub fn into_graph(self) -> ObjectGraph {
        self.graph
    }

    /// Number of distinct reference-table entries seen so far.
    pub fn shared_object_count(&self) -> usize {
        self.refs.len()
    }

    // ── Cursor ───────────────────────────────────────────────────────────────

    pub fn tell(&mut self) -> Result<u64, DecodeError> {
        Ok(self.source.stream_position()?)
    }

    pub fn seek(&mut self, pos: u64) -> Result<(), DecodeError> {
        self.source.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    pub fn remaining(&mut self) -> Result<u64, DecodeError> {
        let pos = self.tell()?;
        Ok(self.end.saturating_sub(pos))
    }

    // ── Primitive reads ──────────────────────────────────────────────────────

    fn map_read_err(e: std::io::Error, offset: u64, needed: usize) -> DecodeError {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            DecodeError::Truncated { offset, needed }
        } else {
            DecodeError::Io(e)
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let offset = self.tell()?;
        self.source.read_u8().map_err(|e| Self::map_read_err(e, offset, 1))
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let offset = self.tell()?;
        self.source
            .read_u16::<LittleEndian>()
            .map_err(|e| Self::map_read_err(e, offset, 2))
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let offset = self.tell()?;
        self.source
            .read_u32::<LittleEndian>()
            .map_err(|e| Self::map_read_err(e, offset, 4))
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        let offset = self.tell()?;
        self.source
            .read_i32::<LittleEndian>()
            .map_err(|e| Self::map_read_err(e, offset, 4))
    }

    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        let offset = self.tell()?;
        self.source
            .read_f64::<LittleEndian>()
            .map_err(|e| Self::map_read_err(e, offset, 8))
    }

    /// Read exactly `n` bytes.  Checked against the source length up front so
    /// a garbage count field cannot trigger a huge allocation.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, DecodeError> {
        let offset = self.tell()?;
        if n as u64 > self.end.saturating_sub(offset) {
            return Err(DecodeError::Truncated { offset, needed: n });
        }
        let mut buf = vec![0u8; n];
        self.source
            .read_exact(&mut buf)
            .map_err(|e| Self::map_read_err(e, offset, n))?;
        Ok(buf)
    }

    // ── Structured reads ─────────────────────────────────────────────────────

    /// Read a fixed byte sequence or fail with [`DecodeError::MagicMismatch`].
    pub fn read_assert(&mut self, expected: &[u8]) -> Result<(), DecodeError> {
        let offset = self.tell()?;
        let found = self.read_bytes(expected.len())?;
        if found != expected {
            return Err(DecodeError::MagicMismatch {
                offset,
                found:    hex::encode(&found),
                expected: hex::encode(expected),
            });
        }
        Ok(())
    }

    /// Like [`Stream::read_assert`], for positions where more than one byte
    /// sequence occurs in well-formed files.  Candidates MUST share one
    /// length.  The error lists every candidate.
    pub fn read_assert_any(&mut self, expected: &[&[u8]]) -> Result<(), DecodeError> {
        let offset = self.tell()?;
        let len = expected.first().map(|e| e.len()).unwrap_or(0);
        let found = self.read_bytes(len)?;
        if !expected.iter().any(|e| *e == found.as_slice()) {
            return Err(DecodeError::MagicMismatch {
                offset,
                found:    hex::encode(&found),
                expected: expected.iter().map(hex::encode).collect::<Vec<_>>().join("|"),
            });
        }
        Ok(())
    }

    /// Count-prefixed array of `u32` index entries whose meaning is not
    /// understood.  Consumed under a stable name, never interpreted.
    pub fn skip_index_array(&mut self, name: &'static str) -> Result<(), DecodeError> {
        let offset = self.tell()?;
        let count = self.read_u32()?;
        if count as u64 * 4 > self.remaining()? {
            return Err(DecodeError::LayoutMismatch {
                offset,
                detail: format!("{name} count {count} exceeds remaining stream"),
            });
        }
        for _ in 0..count {
            self.read_u32()?;
        }
        trace!("skipped {name} ({count} entries at {offset:#x})");
        Ok(())
    }

    /// UTF-16LE string: `u32` char count, that many code units, `u16` zero
    /// terminator.
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let offset = self.tell()?;
        let count = self.read_u32()? as u64;
        if count * 2 > self.remaining()? {
            return Err(DecodeError::Truncated { offset, needed: (count * 2) as usize });
        }
        let mut units = Vec::with_capacity(count as usize);
        for _ in 0..count {
            units.push(self.read_u16()?);
        }
        let term_offset = self.tell()?;
        let terminator = self.read_u16()?;
        if terminator != 0 {
            return Err(DecodeError::LayoutMismatch {
                offset: term_offset,
                detail: format!("non-zero string terminator {terminator:#06x}"),
            });
        }
        String::from_utf16(&units).map_err(|_| DecodeError::LayoutMismatch {
            offset,
            detail: "unpaired surrogate in string".to_string(),
        })
    }

    /// Latin-1 string: `u32` byte length, raw bytes, no terminator.
    pub fn read_ascii(&mut self) -> Result<String, DecodeError> {
        let offset = self.tell()?;
        let len = self.read_u32()? as u64;
        if len > self.remaining()? {
            return Err(DecodeError::Truncated { offset, needed: len as usize });
        }
        let bytes = self.read_bytes(len as usize)?;
        Ok(bytes.iter().map(|&b| b as char).collect())
    }

    /// 16-byte CLSID in on-disk (little-endian field) order.
    pub fn read_clsid(&mut self) -> Result<Clsid, DecodeError> {
        let bytes = self.read_bytes(16)?;
        let mut raw = [0u8; 16];
        raw.copy_from_slice(&bytes);
        Ok(Clsid::from_le_bytes(raw))
    }

    /// Closed `u32` code table.  A value outside the table is
    /// [`DecodeError::UnknownEnumValue`], never defaulted.
    pub fn read_enum(
        &mut self,
        what:  &'static str,
        table: &[(u32, &'static str)],
    ) -> Result<&'static str, DecodeError> {
        let offset = self.tell()?;
        let value = self.read_u32()?;
        table
            .iter()
            .find(|(code, _)| *code == value)
            .map(|(_, name)| *name)
            .ok_or(DecodeError::UnknownEnumValue { what, value, offset })
    }

    /// Consume a run of zero bytes.  Stops at the first non-zero byte
    /// (leaving it unconsumed) or at end of stream.  Idempotent.
    pub fn consume_padding(&mut self) -> Result<(), DecodeError> {
        loop {
            let mut byte = [0u8; 1];
            let n = self.source.read(&mut byte)?;
            if n == 0 {
                return Ok(()); // end of stream
            }
            if byte[0] != 0x00 {
                self.source.seek(SeekFrom::Current(-1))?;
                return Ok(());
            }
        }
    }

    /// Consume exactly `n` bytes whose meaning is not understood, under a
    /// stable name.  The bytes are logged, never interpreted.
    pub fn skip_unknown(&mut self, name: &'static str, n: usize) -> Result<(), DecodeError> {
        let offset = self.tell()?;
        let bytes = self.read_bytes(n)?;
        trace!("skipped {name} ({n} bytes at {offset:#x}): {}", hex::encode(bytes));
        Ok(())
    }

    // ── Object reads ─────────────────────────────────────────────────────────

    /// Read one object at the cursor.
    ///
    /// Returns `Ok(None)` for the all-zero CLSID ("no object here").
    /// `allow_reference` is false at positions where the container grammar
    /// never writes a reference id even when references are enabled (layer
    /// extensions).
    pub fn read_object(
        &mut self,
        allow_reference: bool,
    ) -> Result<Option<ObjHandle>, DecodeError> {
        let registry = self.registry;
        let start = self.tell()?;

        let tag_bytes = self.read_bytes(2)?;
        let tag = [tag_bytes[0], tag_bytes[1]];

        if let Some(def) = registry.resolve_short_tag(tag) {
            // Short tag: the next 14 bytes are the shared family tail,
            // asserted as a magic sequence.
            self.read_assert(&MAGIC_SYMBOL)?;
            let version = self.read_version_word(def)?;
            return Ok(Some(self.read_body(def, version, None)?));
        }

        // Full 16-byte CLSID.
        let rest = self.read_bytes(14)?;
        let mut raw = [0u8; 16];
        raw[..2].copy_from_slice(&tag);
        raw[2..].copy_from_slice(&rest);
        let clsid = Clsid::from_le_bytes(raw);

        if clsid.is_null() {
            return Ok(None);
        }

        let def = match registry.resolve(clsid) {
            Resolution::Supported(def) => def,
            Resolution::Recognized(name) => {
                return Err(DecodeError::NotSupported { name, clsid, offset: start });
            }
            Resolution::Unknown => {
                return Err(DecodeError::UnknownClsid { clsid, offset: start });
            }
        };

        let mut ref_id = None;
        if allow_reference && self.references_enabled && def.supports_references() {
            let id = self.read_u32()?;
            if id != 0 {
                if let Some(&handle) = self.refs.get(&id) {
                    trace!("back-reference {id} -> {} at {start:#x}", def.name());
                    return Ok(Some(handle));
                }
                ref_id = Some(id);
            }
        }

        let version = self.read_version_word(def)?;
        Ok(Some(self.read_body(def, version, ref_id)?))
    }

    /// Read an object body directly, bypassing the identifier.  Used for the
    /// root of a style-gallery blob, where the identifier has already been
    /// sniffed and the version comes from the caller instead of the stream.
    pub fn read_object_as(
        &mut self,
        def:     &'static dyn ObjectDef,
        version: u16,
    ) -> Result<ObjHandle, DecodeError> {
        let version = match def.versions() {
            Some(set) => {
                if !set.contains(&version) {
                    return Err(DecodeError::UnsupportedVersion {
                        name: def.name(),
                        version,
                        supported: supported_list(set),
                    });
                }
                version
            }
            None => 1,
        };
        self.read_body(def, version, None)
    }

    /// Version word, where the type declares one.  Versionless types are
    /// pinned at 1 and consume nothing.
    fn read_version_word(&mut self, def: &'static dyn ObjectDef) -> Result<u16, DecodeError> {
        match def.versions() {
            None => Ok(1),
            Some(set) => {
                let version = self.read_u16()?;
                if !set.contains(&version) {
                    return Err(DecodeError::UnsupportedVersion {
                        name: def.name(),
                        version,
                        supported: supported_list(set),
                    });
                }
                Ok(version)
            }
        }
    }

    fn read_body(
        &mut self,
        def:     &'static dyn ObjectDef,
        version: u16,
        ref_id:  Option<u32>,
    ) -> Result<ObjHandle, DecodeError> {
        let start = self.tell()?;
        trace!("{} v{version} begin at {start:#x}", def.name());

        let mut obj = DecodedObject::new(def.name(), def.clsid(), version, ref_id);
        def.read(self, version, &mut obj)?;

        let end = self.tell()?;
        trace!("{} end at {end:#x}", def.name());

        let handle = self.graph.insert(obj);
        // Registered only now — a back-reference can never see a
        // partially-decoded object.
        if let Some(id) = ref_id {
            self.refs.insert(id, handle);
        }
        Ok(handle)
    }
}

fn supported_list(set: &[u16]) -> String {
    set.iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn registry() -> Registry {
        Registry::builtin()
    }

    #[test]
    fn truncated_read_reports_offset_and_need() {
        let reg = registry();
        let mut src = Cursor::new(vec![0x01, 0x02]);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        stream.read_u8().unwrap();
        match stream.read_f64() {
            Err(DecodeError::Truncated { offset, needed }) => {
                assert_eq!(offset, 1);
                assert_eq!(needed, 8);
            }
            other => panic!("expected Truncated, got {other:?}"),
        }
    }

    #[test]
    fn oversized_count_fails_without_allocating() {
        let reg = registry();
        let mut src = Cursor::new(vec![0u8; 8]);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        match stream.read_bytes(usize::MAX / 2) {
            Err(DecodeError::Truncated { offset, .. }) => assert_eq!(offset, 0),
            other => panic!("expected Truncated, got {other:?}"),
        }
    }

    #[test]
    fn read_assert_reports_hex() {
        let reg = registry();
        let mut src = Cursor::new(vec![0xde, 0xad]);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        match stream.read_assert(&[0x01, 0x00]) {
            Err(DecodeError::MagicMismatch { offset, found, expected }) => {
                assert_eq!(offset, 0);
                assert_eq!(found, "dead");
                assert_eq!(expected, "0100");
            }
            other => panic!("expected MagicMismatch, got {other:?}"),
        }
    }

    #[test]
    fn assert_any_accepts_every_candidate() {
        let reg = registry();
        let mut src = Cursor::new(vec![0xff, 0xff, 0x00, 0x00]);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        stream.read_assert_any(&[&[0x00, 0x00], &[0xff, 0xff]]).unwrap();
        stream.read_assert_any(&[&[0x00, 0x00], &[0xff, 0xff]]).unwrap();
    }

    #[test]
    fn assert_any_failure_lists_all_candidates() {
        let reg = registry();
        let mut src = Cursor::new(vec![0x01, 0x00]);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        match stream.read_assert_any(&[&[0x00, 0x00], &[0xff, 0xff]]) {
            Err(DecodeError::MagicMismatch { offset, found, expected }) => {
                assert_eq!(offset, 0);
                assert_eq!(found, "0100");
                assert_eq!(expected, "0000|ffff");
            }
            other => panic!("expected MagicMismatch, got {other:?}"),
        }
    }

    #[test]
    fn index_array_consumes_count_entries() {
        let reg = registry();
        let mut bytes = 2u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&7u32.to_le_bytes());
        bytes.extend_from_slice(&9u32.to_le_bytes());
        bytes.push(0xab); // next field
        let mut src = Cursor::new(bytes);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        stream.skip_index_array("index array").unwrap();
        assert_eq!(stream.read_u8().unwrap(), 0xab);
    }

    #[test]
    fn empty_index_array_is_one_word() {
        let reg = registry();
        let mut src = Cursor::new(vec![0x00, 0x00, 0x00, 0x00, 0xab]);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        stream.skip_index_array("index array").unwrap();
        assert_eq!(stream.tell().unwrap(), 4);
    }

    #[test]
    fn index_array_rejects_absurd_count() {
        let reg = registry();
        let mut src = Cursor::new(u32::MAX.to_le_bytes().to_vec());
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        match stream.skip_index_array("index array") {
            Err(DecodeError::LayoutMismatch { offset, .. }) => assert_eq!(offset, 0),
            other => panic!("expected LayoutMismatch, got {other:?}"),
        }
    }

    #[test]
    fn consume_padding_stops_at_first_nonzero() {
        let reg = registry();
        let mut src = Cursor::new(vec![0x00, 0x00, 0x00, 0x42]);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        stream.consume_padding().unwrap();
        assert_eq!(stream.tell().unwrap(), 3);
        // Idempotent: a second call consumes nothing.
        stream.consume_padding().unwrap();
        assert_eq!(stream.tell().unwrap(), 3);
        assert_eq!(stream.read_u8().unwrap(), 0x42);
    }

    #[test]
    fn consume_padding_tolerates_end_of_stream() {
        let reg = registry();
        let mut src = Cursor::new(vec![0x00, 0x00]);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        stream.consume_padding().unwrap();
        assert_eq!(stream.remaining().unwrap(), 0);
    }

    #[test]
    fn utf16_string_roundtrip() {
        let reg = registry();
        let mut bytes = Vec::new();
        let text = "Road casing";
        bytes.extend_from_slice(&(text.len() as u32).to_le_bytes());
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes.extend_from_slice(&[0x00, 0x00]);

        let mut src = Cursor::new(bytes);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        assert_eq!(stream.read_string().unwrap(), text);
    }

    #[test]
    fn utf16_string_rejects_bad_terminator() {
        let reg = registry();
        // One char, then a non-zero terminator.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&(b'A' as u16).to_le_bytes());
        bytes.extend_from_slice(&[0x41, 0x00]);

        let mut src = Cursor::new(bytes);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        match stream.read_string() {
            Err(DecodeError::LayoutMismatch { offset, .. }) => assert_eq!(offset, 6),
            other => panic!("expected LayoutMismatch, got {other:?}"),
        }
    }

    #[test]
    fn enum_value_outside_table_is_rejected() {
        let reg = registry();
        let mut src = Cursor::new(7u32.to_le_bytes().to_vec());
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        let table: &[(u32, &str)] = &[(0, "butt"), (1, "round"), (2, "square")];
        match stream.read_enum("line cap", table) {
            Err(DecodeError::UnknownEnumValue { what, value, offset }) => {
                assert_eq!(what, "line cap");
                assert_eq!(value, 7);
                assert_eq!(offset, 0);
            }
            other => panic!("expected UnknownEnumValue, got {other:?}"),
        }
    }

    #[test]
    fn null_clsid_reads_as_no_object() {
        let reg = registry();
        let mut src = Cursor::new(vec![0u8; 16]);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        assert!(stream.read_object(true).unwrap().is_none());
        assert_eq!(stream.tell().unwrap(), 16);
    }

    #[test]
    fn unknown_clsid_is_fatal_with_offset() {
        let reg = registry();
        let mut bytes = vec![0xaa; 4]; // some preamble
        bytes.extend_from_slice(&[0x11; 16]);
        let mut src = Cursor::new(bytes);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        stream.read_bytes(4).unwrap();
        match stream.read_object(true) {
            Err(DecodeError::UnknownClsid { offset, .. }) => assert_eq!(offset, 4),
            other => panic!("expected UnknownClsid, got {other:?}"),
        }
    }
}
