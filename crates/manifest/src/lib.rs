//! aabforge-manifest — the proto-XML manifest tree, its parser/writer
//! pair, and the typed editor mutators used when rewriting a module's
//! manifest for a particular split or variant.

pub mod editor;
pub mod manifest;
pub mod parser;
pub mod resource_ids;
pub mod tree;
pub mod writer;

pub use editor::{ManifestEditor, MetadataValue, FUSED_MODULES_METADATA_KEY};
pub use manifest::{Manifest, ModuleDelivery};
pub use parser::{ManifestParser, ParseError};
pub use tree::{AttributeValue, OrderedStringMap, XmlAttribute, XmlNode};
pub use writer::{ManifestWriter, WriteError};
