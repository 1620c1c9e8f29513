//! The proto-XML tree: the authoritative manifest representation.
//!
//! A real `AndroidManifest.xml` inside a bundle module is proto-encoded,
//! not textual XML; attributes carry a resource id as well as a name so
//! that writers can round-trip even when the attribute name has no
//! well-known id. We keep that shape (namespace, name, resource id,
//! typed value, ordered children) and serialize it to/from textual XML at
//! the edges, since the proto<->binary-XML conversion itself is delegated
//! to an external `aapt2` invocation and is not this crate's concern.

use indexmap::IndexMap;

/// A typed attribute value. Proto-XML attributes carry their original
/// type so a later consumer (e.g. aapt2) does not have to re-infer it
/// from a string.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Str(String),
    Bool(bool),
    Int(i64),
    /// A reference to another resource, e.g. `@mipmap/ic_launcher`,
    /// stored as its resolved `0xPPTTNNNN` id.
    ResourceRef(u32),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Textual rendering used by the XML writer.
    pub fn to_xml_string(&self) -> String {
        match self {
            AttributeValue::Str(s) => s.clone(),
            AttributeValue::Bool(b) => b.to_string(),
            AttributeValue::Int(i) => i.to_string(),
            AttributeValue::ResourceRef(id) => format!("@0x{:08x}", id),
        }
    }
}

/// A single attribute: an optional namespace prefix, a local name, an
/// optional well-known resource id, and a typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlAttribute {
    pub namespace: Option<String>,
    pub name: String,
    pub resource_id: Option<u32>,
    pub value: AttributeValue,
}

impl XmlAttribute {
    pub fn new(namespace: Option<&str>, name: &str, value: AttributeValue) -> Self {
        XmlAttribute {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
            resource_id: None,
            value,
        }
    }

    pub fn with_resource_id(mut self, id: u32) -> Self {
        self.resource_id = Some(id);
        self
    }

    /// The qualified name as used in textual XML (`android:name`).
    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}:{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// A node in the proto-XML tree.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlNode {
    pub namespace: Option<String>,
    pub name: String,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        XmlNode {
            namespace: None,
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Find an attribute by known resource id first, falling back to
    /// namespace+name — the same lookup rule the data model mandates for
    /// every well-known field.
    pub fn attr_by_id_or_name(
        &self,
        resource_id: Option<u32>,
        namespace: Option<&str>,
        name: &str,
    ) -> Option<&XmlAttribute> {
        if let Some(id) = resource_id {
            if let Some(found) = self.attributes.iter().find(|a| a.resource_id == Some(id)) {
                return Some(found);
            }
        }
        self.attributes
            .iter()
            .find(|a| a.namespace.as_deref() == namespace && a.name == name)
    }

    /// Insert or replace an attribute identified by resource id (or, if
    /// absent, by namespace+name). Idempotent: calling twice with the
    /// same key overwrites rather than duplicating.
    pub fn set_attr(&mut self, attr: XmlAttribute) {
        let existing = self.attributes.iter_mut().find(|a| {
            if attr.resource_id.is_some() {
                a.resource_id == attr.resource_id
            } else {
                a.namespace == attr.namespace && a.name == attr.name
            }
        });
        match existing {
            Some(slot) => *slot = attr,
            None => self.attributes.push(attr),
        }
    }

    pub fn remove_attr(&mut self, namespace: Option<&str>, name: &str) {
        self.attributes
            .retain(|a| !(a.namespace.as_deref() == namespace && a.name == name));
    }

    pub fn find_child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn find_child_mut(&mut self, name: &str) -> Option<&mut XmlNode> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Find a direct child by name, creating an empty one (appended at
    /// the end) if none exists yet.
    pub fn find_or_create_child(&mut self, name: &str) -> &mut XmlNode {
        if self.find_child(name).is_none() {
            self.children.push(XmlNode::new(name));
        }
        self.find_child_mut(name).expect("just inserted")
    }

    pub fn push_child(&mut self, child: XmlNode) {
        self.children.push(child);
    }
}

/// A resource table's worth of string-keyed, ordered extras used by the
/// obfuscation preprocessor's rename map; kept here because both the
/// manifest editor and the bundle preprocessors need the same
/// insertion-order-preserving map type.
pub type OrderedStringMap = IndexMap<String, String>;
