//! Parses textual `AndroidManifest.xml` into the generic proto-XML tree.
//!
//! Bundle modules carry the manifest proto-encoded; this parser instead
//! reads the textual form produced once `aapt2` (or a test fixture) has
//! rendered it, and is the form the writer produces for handing back to
//! that same external collaborator.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

use crate::manifest::Manifest;
use crate::tree::{AttributeValue, XmlAttribute, XmlNode};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),
    #[error("invalid manifest structure: {0}")]
    InvalidStructure(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("invalid attribute: {0}")]
    InvalidAttr(#[from] quick_xml::events::attributes::AttrError),
}

pub struct ManifestParser;

impl ManifestParser {
    pub async fn parse_file(path: impl AsRef<Path>) -> Result<Manifest, ParseError> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::parse_string(&content)
    }

    pub fn parse_string(xml: &str) -> Result<Manifest, ParseError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut buf = Vec::new();
        // Stack of nodes currently open; the top is the node receiving
        // new children. Seeded with a synthetic root so the very first
        // `Start`/`Empty` event (the `<manifest>` element) has somewhere
        // to attach.
        let mut stack: Vec<XmlNode> = vec![XmlNode::new("#document")];

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    stack.push(node_from_start(e)?);
                }
                Ok(Event::Empty(ref e)) => {
                    let node = node_from_start(e)?;
                    attach_to_parent(&mut stack, node);
                }
                Ok(Event::End(_)) => {
                    if stack.len() <= 1 {
                        return Err(ParseError::InvalidStructure(
                            "unbalanced closing tag".to_string(),
                        ));
                    }
                    let finished = stack.pop().expect("checked len above");
                    attach_to_parent(&mut stack, finished);
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(ParseError::XmlError(e)),
                _ => {}
            }
            buf.clear();
        }

        let mut document = stack
            .pop()
            .ok_or_else(|| ParseError::InvalidStructure("empty document".to_string()))?;
        if document.children.len() != 1 || document.children[0].name != "manifest" {
            return Err(ParseError::InvalidStructure(
                "expected a single root <manifest> element".to_string(),
            ));
        }
        Ok(Manifest::new(document.children.remove(0)))
    }
}

fn attach_to_parent(stack: &mut [XmlNode], node: XmlNode) {
    if let Some(parent) = stack.last_mut() {
        parent.push_child(node);
    }
}

fn node_from_start(e: &BytesStart) -> Result<XmlNode, ParseError> {
    let raw_name = std::str::from_utf8(e.name().as_ref())?.to_string();
    let (namespace, name) = split_qualified(&raw_name);
    let mut node = XmlNode {
        namespace,
        name,
        attributes: Vec::new(),
        children: Vec::new(),
    };

    for attr in e.attributes() {
        let attr = attr?;
        let raw_key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let (ns, attr_name) = split_qualified(&raw_key);
        let raw_value = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        node.attributes.push(XmlAttribute::new(
            ns.as_deref(),
            &attr_name,
            infer_value(&raw_value),
        ));
    }

    Ok(node)
}

fn split_qualified(raw: &str) -> (Option<String>, String) {
    match raw.split_once(':') {
        Some((ns, local)) => (Some(ns.to_string()), local.to_string()),
        None => (None, raw.to_string()),
    }
}

/// Infer a typed attribute value from its textual rendering: `true`/
/// `false` become booleans, a plain integer becomes an int, everything
/// else (including resource references, left untouched as strings here)
/// stays a string.
fn infer_value(raw: &str) -> AttributeValue {
    match raw {
        "true" => AttributeValue::Bool(true),
        "false" => AttributeValue::Bool(false),
        _ => match raw.parse::<i64>() {
            Ok(i) => AttributeValue::Int(i),
            Err(_) => AttributeValue::Str(raw.to_string()),
        },
    }
}
