//! aabforge-bundle — the bundle/module/resource-table data model, bundle
//! ingestion, and the fixed-order preprocessor pipeline.

pub mod model;
pub mod preprocess;
pub mod reader;
pub mod resource_table;
pub mod sanitizer;
pub mod zip_source;

pub use model::{Bundle, BundleConfig, BundleMetadata, BundleType, Module, ModuleEntry, ModuleType, PinnedResource};
pub use preprocess::{run_preprocessors, Preprocessor};
pub use reader::read_bundle;
pub use resource_table::{ConfigValue, ResourceConfig, ResourceEntry, ResourcePackage, ResourceTable, ResourceType, ResourceValue};
pub use sanitizer::sanitize_dex_path;
pub use zip_source::ZipByteSource;
