//! 128-bit class identifiers.
//!
//! # Identity rules
//! Every decodable object is identified by a 16-byte CLSID.  That CLSID is:
//!   - Written at the head of every object record on disk.
//!   - The authoritative key for registry lookup.
//! CLSIDs are frozen: the originating application never reused one, and
//! neither do we.  An unrecognised CLSID aborts the decode — unknown
//! identity means unknown layout.
//!
//! # Endianness
//! On disk a CLSID is the 16 raw bytes in little-endian field order
//! (time_low, time_mid, time_hi LE; clock_seq and node verbatim).  All
//! display formatting uses the canonical hyphenated order.

use std::fmt;

use uuid::Uuid;

/// A 16-byte class identifier in canonical field order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Clsid(Uuid);

impl Clsid {
    /// The all-zero CLSID.  On disk it marks "no object here".
    pub const NULL: Clsid = Clsid(Uuid::nil());

    pub const fn new(uuid: Uuid) -> Self {
        Clsid(uuid)
    }

    /// Decode the 16-byte on-disk (little-endian field order) form.
    pub fn from_le_bytes(bytes: [u8; 16]) -> Self {
        Clsid(Uuid::from_bytes_le(bytes))
    }

    /// Encode back to the on-disk form.
    pub fn to_le_bytes(self) -> [u8; 16] {
        self.0.to_bytes_le()
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self.0.is_nil()
    }

    /// First two on-disk bytes.  For the symbol family these two bytes are
    /// unique per class, which is what makes the abbreviated two-byte tag
    /// form decodable at all.
    #[inline]
    pub fn short_tag(self) -> [u8; 2] {
        let b = self.to_le_bytes();
        [b[0], b[1]]
    }

    /// Last 14 on-disk bytes — shared across an entire class family.
    /// When an abbreviated tag is used, this tail is what the writer emitted
    /// (and what the reader asserts) in place of the full CLSID.
    pub fn family_tail(self) -> [u8; 14] {
        let b = self.to_le_bytes();
        let mut tail = [0u8; 14];
        tail.copy_from_slice(&b[2..16]);
        tail
    }
}

impl fmt::Display for Clsid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Clsid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Clsid({})", self.0)
    }
}
