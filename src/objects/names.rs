//! Dataset and workspace name objects — where a layer's source data lives.

use uuid::uuid;

use crate::clsid::Clsid;
use crate::error::DecodeError;
use crate::graph::DecodedObject;
use crate::stream::Stream;

use super::ObjectDef;

/// On-disk version that appends the topology object list.
const V_TOPOLOGIES: u16 = 2;

pub struct FeatureClassName;

pub static FEATURE_CLASS_NAME: FeatureClassName = FeatureClassName;

impl ObjectDef for FeatureClassName {
    fn clsid(&self) -> Clsid {
        Clsid::new(uuid!("198846d0-ca42-11d1-aa7c-00c04fa33a15"))
    }

    fn name(&self) -> &'static str {
        "FeatureClassName"
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
        let name = stream.read_string()?;
        let alias = stream.read_string()?;
        let datasource_type = stream.read_string()?;
        let shape_field = stream.read_string()?;
        let shape_type = stream.read_u32()?;
        let feature_type = stream.read_u32()?;
        stream.skip_unknown("feature class flags", 2)?;
        let dataset_name = stream.read_object(true)?;

        obj.set("name", name);
        obj.set("alias", alias);
        obj.set("datasource_type", datasource_type);
        obj.set("shape_field", shape_field);
        obj.set("shape_type", shape_type);
        obj.set("feature_type", feature_type);
        obj.set("dataset_name", dataset_name);

        if version >= V_TOPOLOGIES {
            // Consumed for stream alignment; the objects carry nothing the
            // projection needs.
            let count = stream.read_u16()?;
            for _ in 0..count {
                stream.read_object(true)?;
            }
        }
        Ok(())
    }
}

pub struct WorkspaceName;

pub static WORKSPACE_NAME: WorkspaceName = WorkspaceName;

impl ObjectDef for WorkspaceName {
    fn clsid(&self) -> Clsid {
        Clsid::new(uuid!("5a350011-e371-11d1-aa82-00c04fa33a15"))
    }

    fn name(&self) -> &'static str {
        "WorkspaceName"
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
        let path = stream.read_string()?;
        let browse_name = stream.read_string()?;
        // Factory progid is the one latin-1 string in the format.
        let factory_progid = stream.read_ascii()?;
        let workspace_type = stream.read_u32()?;

        obj.set("path", path);
        obj.set("browse_name", browse_name);
        obj.set("factory_progid", factory_progid);
        obj.set("workspace_type", workspace_type);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Value;
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

    fn ascii(text: &str) -> Vec<u8> {
        let mut bytes = (text.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(text.as_bytes());
        bytes
    }

    #[test]
    fn workspace_name_decodes() {
        let reg = Registry::builtin();
        let mut bytes = WORKSPACE_NAME.clsid().to_le_bytes().to_vec();
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&utf16(r"C:\data\roads.gdb"));
        bytes.extend_from_slice(&utf16("roads"));
        bytes.extend_from_slice(&ascii("esriDataSourcesGDB.FileGDBWorkspaceFactory"));
        bytes.extend_from_slice(&1u32.to_le_bytes());

        let mut src = Cursor::new(bytes);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        let handle = stream.read_object(true).unwrap().unwrap();
        let obj = stream.graph().get(handle);
        assert_eq!(obj.get("path"), Some(&Value::Str(r"C:\data\roads.gdb".to_string())));
        assert_eq!(obj.get("workspace_type"), Some(&Value::U32(1)));
    }

    #[test]
    fn feature_class_name_v2_consumes_topologies() {
        let reg = Registry::builtin();
        let mut bytes = FEATURE_CLASS_NAME.clsid().to_le_bytes().to_vec();
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&utf16("roads"));
        bytes.extend_from_slice(&utf16("Roads"));
        bytes.extend_from_slice(&utf16("File Geodatabase Feature Class"));
        bytes.extend_from_slice(&utf16("Shape"));
        bytes.extend_from_slice(&3u32.to_le_bytes()); // shape type
        bytes.extend_from_slice(&1u32.to_le_bytes()); // feature type
        bytes.extend_from_slice(&[0x00, 0x00]); // opaque
        bytes.extend_from_slice(&[0u8; 16]); // null dataset name
        bytes.extend_from_slice(&0u16.to_le_bytes()); // no topologies

        let mut src = Cursor::new(bytes);
        let mut stream = Stream::new(&mut src, &reg).unwrap();
        let handle = stream.read_object(true).unwrap().unwrap();
        let obj = stream.graph().get(handle);
        assert_eq!(obj.get("name"), Some(&Value::Str("roads".to_string())));
        assert_eq!(obj.get("dataset_name"), Some(&Value::Null));
        assert_eq!(stream.remaining().unwrap(), 0);
    }
}
