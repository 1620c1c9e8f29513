//! Serializes the proto-XML tree back to textual XML.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

use crate::manifest::Manifest;
use crate::tree::XmlNode;

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("XML writing error: {0}")]
    XmlError(#[from] quick_xml::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub struct ManifestWriter {
    indent: usize,
}

impl Default for ManifestWriter {
    fn default() -> Self {
        ManifestWriter { indent: 4 }
    }
}

impl ManifestWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent(indent: usize) -> Self {
        ManifestWriter { indent }
    }

    pub fn write_to_string(&self, manifest: &Manifest) -> Result<String, WriteError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', self.indent);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        write_node(&mut writer, &manifest.root)?;
        let bytes = writer.into_inner().into_inner();
        Ok(String::from_utf8(bytes)?)
    }

    pub async fn write_to_file(
        &self,
        manifest: &Manifest,
        path: impl AsRef<Path>,
    ) -> Result<(), WriteError> {
        let contents = self.write_to_string(manifest)?;
        tokio::fs::write(path.as_ref(), contents).await?;
        Ok(())
    }
}

fn write_node<W: std::io::Write>(
    writer: &mut Writer<W>,
    node: &XmlNode,
) -> Result<(), WriteError> {
    let qualified = match &node.namespace {
        Some(ns) => format!("{ns}:{}", node.name),
        None => node.name.clone(),
    };

    if node.children.is_empty() {
        let mut start = BytesStart::new(qualified.clone());
        for attr in &node.attributes {
            start.push_attribute((attr.qualified_name().as_str(), attr.value.to_xml_string().as_str()));
        }
        writer.write_event(Event::Empty(start))?;
    } else {
        let mut start = BytesStart::new(qualified.clone());
        for attr in &node.attributes {
            start.push_attribute((attr.qualified_name().as_str(), attr.value.to_xml_string().as_str()));
        }
        writer.write_event(Event::Start(start))?;
        for child in &node.children {
            write_node(writer, child)?;
        }
        writer.write_event(Event::End(BytesEnd::new(qualified)))?;
    }
    Ok(())
}

/// Writes a single text child. Not used by `write_node` itself since the
/// manifest tree carries no text nodes, but kept for callers that render
/// ad hoc debug output through the same writer.
#[allow(dead_code)]
fn write_text<W: std::io::Write>(writer: &mut Writer<W>, text: &str) -> Result<(), WriteError> {
    writer.write_event(Event::Text(BytesText::new(text)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ManifestParser;
    use crate::resource_ids as rid;
    use crate::tree::{AttributeValue, XmlAttribute};

    #[test]
    fn write_then_parse_round_trips_package_and_version() {
        let mut root = XmlNode::new("manifest");
        root.set_attr(XmlAttribute::new(None, "package", AttributeValue::Str("com.example.app".into())));
        root.set_attr(
            XmlAttribute::new(Some(rid::ANDROID_NS), "versionCode", AttributeValue::Int(7))
                .with_resource_id(rid::VERSION_CODE),
        );
        let manifest = Manifest::new(root);

        let xml = ManifestWriter::new().write_to_string(&manifest).unwrap();
        let reparsed = ManifestParser::parse_string(&xml).unwrap();

        assert_eq!(reparsed.package(), Some("com.example.app"));
        assert_eq!(reparsed.version_code(), Some(7));
    }

    #[test]
    fn empty_element_has_no_closing_tag_pair() {
        let manifest = Manifest::new(XmlNode::new("manifest"));
        let xml = ManifestWriter::new().write_to_string(&manifest).unwrap();
        assert!(xml.contains("<manifest/>"));
    }
}
