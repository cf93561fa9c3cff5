//! Object registry: frozen CLSID identities + the short-tag fast path.
//!
//! # Identity rules
//! Every decodable type is keyed by its 16-byte CLSID.  Resolution has
//! exactly three outcomes:
//!   - `Supported`: a body decoder exists — decoding proceeds.
//!   - `Recognized`: the CLSID is known by name but deliberately has no
//!     decoder (licensed/extension types).  Decoding MUST stop; the caller
//!     gets the name in the error.
//!   - `Unknown`: never seen before.  Decoding MUST stop — unknown identity
//!     means unknown layout, and nothing after this point can be located.
//!
//! Short tags (the first two on-disk bytes of a symbol-family CLSID) are
//! registered automatically for types whose CLSID carries the shared
//! symbol-family tail.  They exist because style-gallery blobs abbreviate
//! the identifier to two bytes.

use std::collections::HashMap;

use uuid::uuid;

use crate::clsid::Clsid;
use crate::objects::{self, ObjectDef, MAGIC_SYMBOL};

/// Result of a CLSID lookup.
pub enum Resolution {
    Supported(&'static dyn ObjectDef),
    Recognized(&'static str),
    Unknown,
}

// ── Recognized-but-unsupported CLSIDs ────────────────────────────────────────
//
// Types the originating application persists that this decoder deliberately
// does not decode.  Kept so the error names the type instead of reporting a
// bare unknown identifier.

const RECOGNIZED: &[(Clsid, &str)] = &[
    (Clsid::new(uuid!("d02371c9-35f7-11d2-b1f2-00c04f8edeff")), "RasterLayer"),
    (Clsid::new(uuid!("edad6647-1810-11d1-86ae-0000f8751720")), "GroupLayer"),
    (Clsid::new(uuid!("c3346d29-b2bc-11d1-8817-080009ec732a")), "UniqueValueRenderer"),
    (Clsid::new(uuid!("ae5f7ea2-8b48-11d0-8356-080009b996cc")), "ClassBreaksRenderer"),
    (Clsid::new(uuid!("7a3f91e6-b9e3-11d1-8756-0000f8751720")), "LegendClassFormat"),
    (Clsid::new(uuid!("aa157208-e079-11d2-9f48-00c04f6bc6a5")), "AnnotationJScriptEngine"),
];

// ── Registry ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct Registry {
    defs:       HashMap<Clsid, &'static dyn ObjectDef>,
    short_tags: HashMap<[u8; 2], &'static dyn ObjectDef>,
    recognized: HashMap<Clsid, &'static str>,
}

impl Registry {
    /// An empty registry.  Useful in tests; real callers want
    /// [`Registry::builtin`].
    pub fn new() -> Self {
        Registry::default()
    }

    /// Every built-in decoder plus the recognized-but-unsupported table.
    pub fn builtin() -> Self {
        let mut registry = Registry::new();
        objects::register_builtin(&mut registry);
        for &(clsid, name) in RECOGNIZED {
            registry.register_recognized(clsid, name);
        }
        registry
    }

    /// Register a decoder under its CLSID.  Symbol-family types (shared
    /// CLSID tail) get a short-tag entry automatically.
    pub fn register(&mut self, def: &'static dyn ObjectDef) {
        let clsid = def.clsid();
        if clsid.family_tail() == MAGIC_SYMBOL {
            self.short_tags.insert(clsid.short_tag(), def);
        }
        self.defs.insert(clsid, def);
    }

    /// Record a CLSID as known-by-name without a decoder.
    pub fn register_recognized(&mut self, clsid: Clsid, name: &'static str) {
        self.recognized.insert(clsid, name);
    }

    pub fn resolve(&self, clsid: Clsid) -> Resolution {
        if let Some(&def) = self.defs.get(&clsid) {
            Resolution::Supported(def)
        } else if let Some(&name) = self.recognized.get(&clsid) {
            Resolution::Recognized(name)
        } else {
            Resolution::Unknown
        }
    }

    pub fn resolve_short_tag(&self, tag: [u8; 2]) -> Option<&'static dyn ObjectDef> {
        self.short_tags.get(&tag).copied()
    }
}
