//! Decoded object graph.
//!
//! Objects are appended to an arena as they finish decoding and are frozen
//! from then on — later bytes in the stream never mutate an earlier object.
//! Cross-references are arena handles, which is what lets the reference
//! table share one decoded object between many parents without cycles or
//! reference counting.
//!
//! The JSON projection ([`ObjectGraph::to_json`]) expands shared handles to
//! independent copies: consumers of the projection see a plain tree.

use serde_json::{json, Map};

use crate::clsid::Clsid;

/// Index of a decoded object in its [`ObjectGraph`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjHandle(pub(crate) u32);

// ── Field values ─────────────────────────────────────────────────────────────

/// A decoded field value.
///
/// `Record` holds an inline group of named values that never forms a graph
/// node of its own (colour records embedded in symbol bodies).  `Object` is
/// a handle into the arena and may be shared between parents.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    U32(u32),
    I32(i32),
    F64(f64),
    Str(String),
    Clsid(Clsid),
    List(Vec<Value>),
    Record(Vec<(&'static str, Value)>),
    Object(ObjHandle),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self { Value::Bool(v) }
}
impl From<u32> for Value {
    fn from(v: u32) -> Self { Value::U32(v) }
}
impl From<i32> for Value {
    fn from(v: i32) -> Self { Value::I32(v) }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self { Value::F64(v) }
}
impl From<String> for Value {
    fn from(v: String) -> Self { Value::Str(v) }
}
impl From<&str> for Value {
    fn from(v: &str) -> Self { Value::Str(v.to_string()) }
}
impl From<Clsid> for Value {
    fn from(v: Clsid) -> Self { Value::Clsid(v) }
}
impl From<ObjHandle> for Value {
    fn from(v: ObjHandle) -> Self { Value::Object(v) }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None        => Value::Null,
        }
    }
}

impl Value {
    fn to_json(&self, graph: &ObjectGraph) -> serde_json::Value {
        match self {
            Value::Null       => serde_json::Value::Null,
            Value::Bool(b)    => json!(b),
            Value::U32(n)     => json!(n),
            Value::I32(n)     => json!(n),
            Value::F64(n)     => json!(n),
            Value::Str(s)     => json!(s),
            Value::Clsid(c)   => json!(c.to_string()),
            Value::List(vs)   => {
                serde_json::Value::Array(vs.iter().map(|v| v.to_json(graph)).collect())
            }
            Value::Record(fields) => {
                let mut map = Map::new();
                for (key, value) in fields {
                    map.insert((*key).to_string(), value.to_json(graph));
                }
                serde_json::Value::Object(map)
            }
            // Shared handles expand to copies — the projection is a tree.
            Value::Object(h)  => graph.to_json(*h),
        }
    }
}

// ── Decoded objects ──────────────────────────────────────────────────────────

/// One fully-decoded object.  Field order follows read order.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedObject {
    name:    &'static str,
    clsid:   Clsid,
    version: u16,
    ref_id:  Option<u32>,
    fields:  Vec<(&'static str, Value)>,
}

impl DecodedObject {
    pub(crate) fn new(name: &'static str, clsid: Clsid, version: u16, ref_id: Option<u32>) -> Self {
        DecodedObject { name, clsid, version, ref_id, fields: Vec::new() }
    }

    pub fn name(&self) -> &'static str { self.name }
    pub fn clsid(&self) -> Clsid       { self.clsid }
    pub fn version(&self) -> u16       { self.version }

    /// The reference-table slot this object was registered under, if any.
    pub fn ref_id(&self) -> Option<u32> { self.ref_id }

    pub fn set(&mut self, key: &'static str, value: impl Into<Value>) {
        self.fields.push((key, value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn fields(&self) -> &[(&'static str, Value)] {
        &self.fields
    }
}

// ── Arena ────────────────────────────────────────────────────────────────────

/// Append-only arena of decoded objects.
#[derive(Debug, Default)]
pub struct ObjectGraph {
    objects: Vec<DecodedObject>,
}

impl ObjectGraph {
    pub fn new() -> Self {
        ObjectGraph::default()
    }

    pub(crate) fn insert(&mut self, obj: DecodedObject) -> ObjHandle {
        let handle = ObjHandle(self.objects.len() as u32);
        self.objects.push(obj);
        handle
    }

    pub fn get(&self, handle: ObjHandle) -> &DecodedObject {
        &self.objects[handle.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Project one object (and everything it references) to JSON.
    ///
    /// Every object gets `"type"` and `"version"` keys ahead of its decoded
    /// fields.  Handles expand recursively; sharing becomes copying.
    pub fn to_json(&self, handle: ObjHandle) -> serde_json::Value {
        let obj = self.get(handle);
        let mut map = Map::new();
        map.insert("type".to_string(), json!(obj.name));
        map.insert("version".to_string(), json!(obj.version));
        for (key, value) in &obj.fields {
            map.insert((*key).to_string(), value.to_json(self));
        }
        serde_json::Value::Object(map)
    }
}
