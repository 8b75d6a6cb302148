//! Raw PDF object model exposed by the document source.
//!
//! Annotation dictionaries, the outline tree and the page-label number tree
//! all arrive as nested [`PDFObject`] values that may contain indirect
//! references; [`Resolve::resolve1`] follows them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{AnnotError, Result};

/// Longest chain of references followed before giving up.
const MAX_REF_CHAIN: usize = 32;

/// PDF Object types - the fundamental value type in PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PDFObject {
    /// Null object
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Real (floating point) value
    Real(f64),
    /// Name object (e.g., /Highlight, /XYZ)
    Name(String),
    /// String (byte array)
    String(#[serde(with = "text_bytes")] Vec<u8>),
    /// Array of objects
    Array(Vec<Self>),
    /// Dictionary (name -> object mapping)
    Dict(HashMap<String, Self>),
    /// Indirect object reference
    Ref(PDFObjRef),
}

impl PDFObject {
    /// Check if this is a null object
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get as integer
    pub const fn as_int(&self) -> Result<i64> {
        match self {
            Self::Int(n) => Ok(*n),
            _ => Err(AnnotError::TypeError {
                expected: "int",
                got: self.type_name(),
            }),
        }
    }

    /// Get numeric value (int or real coerced to f64)
    pub const fn as_num(&self) -> Result<f64> {
        match self {
            Self::Int(n) => Ok(*n as f64),
            Self::Real(n) => Ok(*n),
            _ => Err(AnnotError::TypeError {
                expected: "number",
                got: self.type_name(),
            }),
        }
    }

    /// Get as name string
    pub fn as_name(&self) -> Result<&str> {
        match self {
            Self::Name(s) => Ok(s),
            _ => Err(AnnotError::TypeError {
                expected: "name",
                got: self.type_name(),
            }),
        }
    }

    /// Get as byte string
    pub fn as_string(&self) -> Result<&[u8]> {
        match self {
            Self::String(s) => Ok(s),
            _ => Err(AnnotError::TypeError {
                expected: "string",
                got: self.type_name(),
            }),
        }
    }

    /// Get as array
    pub const fn as_array(&self) -> Result<&Vec<Self>> {
        match self {
            Self::Array(arr) => Ok(arr),
            _ => Err(AnnotError::TypeError {
                expected: "array",
                got: self.type_name(),
            }),
        }
    }

    /// Get as dictionary
    pub const fn as_dict(&self) -> Result<&HashMap<String, Self>> {
        match self {
            Self::Dict(d) => Ok(d),
            _ => Err(AnnotError::TypeError {
                expected: "dict",
                got: self.type_name(),
            }),
        }
    }

    /// Get as object reference
    pub const fn as_ref(&self) -> Result<&PDFObjRef> {
        match self {
            Self::Ref(r) => Ok(r),
            _ => Err(AnnotError::TypeError {
                expected: "ref",
                got: self.type_name(),
            }),
        }
    }

    /// Get type name for error messages
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::Name(_) => "name",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
            Self::Ref(_) => "ref",
        }
    }
}

/// PDF indirect object reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PDFObjRef {
    /// Object ID
    pub objid: u32,
    /// Generation number
    #[serde(default)]
    pub genno: u32,
}

impl PDFObjRef {
    /// Create a new object reference.
    pub const fn new(objid: u32, genno: u32) -> Self {
        Self { objid, genno }
    }
}

/// Indirect object lookup.
pub trait Resolve {
    /// Fetches the object with the given id.
    fn getobj(&self, objid: u32) -> Result<PDFObject>;

    /// Follows references until a direct object is reached.
    fn resolve1(&self, obj: &PDFObject) -> Result<PDFObject> {
        let mut current = obj.clone();
        for _ in 0..MAX_REF_CHAIN {
            match current {
                PDFObject::Ref(r) => current = self.getobj(r.objid)?,
                direct => return Ok(direct),
            }
        }
        Err(AnnotError::TypeError {
            expected: "direct object",
            got: "reference chain",
        })
    }

    /// Looks up `key` in a dictionary and resolves the value.
    ///
    /// A missing key and an explicit null are both `Ok(None)`.
    fn resolve_key(&self, dict: &HashMap<String, PDFObject>, key: &str) -> Result<Option<PDFObject>> {
        match dict.get(key) {
            None => Ok(None),
            Some(obj) => {
                let obj = self.resolve1(obj)?;
                Ok((!obj.is_null()).then_some(obj))
            }
        }
    }
}

/// Serde helper: byte strings read from a JSON string or a byte array.
mod text_bytes {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Raw(Vec<u8>),
    }

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        match std::str::from_utf8(bytes) {
            Ok(s) => Repr::Text(s.to_string()).serialize(serializer),
            Err(_) => Repr::Raw(bytes.to_vec()).serialize(serializer),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        Ok(match Repr::deserialize(deserializer)? {
            Repr::Text(s) => s.into_bytes(),
            Repr::Raw(b) => b,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Objects(HashMap<u32, PDFObject>);

    impl Resolve for Objects {
        fn getobj(&self, objid: u32) -> Result<PDFObject> {
            self.0
                .get(&objid)
                .cloned()
                .ok_or(AnnotError::ObjectNotFound(objid))
        }
    }

    #[test]
    fn resolve1_follows_chains() {
        let objs = Objects(HashMap::from([
            (1, PDFObject::Ref(PDFObjRef::new(2, 0))),
            (2, PDFObject::Int(7)),
        ]));
        let got = objs.resolve1(&PDFObject::Ref(PDFObjRef::new(1, 0))).unwrap();
        assert_eq!(got, PDFObject::Int(7));
    }

    #[test]
    fn resolve1_rejects_cycles() {
        let objs = Objects(HashMap::from([(1, PDFObject::Ref(PDFObjRef::new(1, 0)))]));
        assert!(objs.resolve1(&PDFObject::Ref(PDFObjRef::new(1, 0))).is_err());
    }

    #[test]
    fn resolve_key_treats_null_as_absent() {
        let objs = Objects(HashMap::new());
        let dict = HashMap::from([("A".to_string(), PDFObject::Null)]);
        assert!(objs.resolve_key(&dict, "A").unwrap().is_none());
        assert!(objs.resolve_key(&dict, "B").unwrap().is_none());
    }

    #[test]
    fn strings_deserialize_from_text_or_bytes() {
        let a: PDFObject = serde_json::from_str(r#"{"String": "hi"}"#).unwrap();
        let b: PDFObject = serde_json::from_str(r#"{"String": [104, 105]}"#).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_string().unwrap(), b"hi");
    }
}
