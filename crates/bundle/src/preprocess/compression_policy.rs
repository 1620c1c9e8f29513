//! Step 2: entry compression policy.

use aabforge_core::Result;
use aabforge_manifest::resource_ids as rid;

use super::Preprocessor;
use crate::model::Bundle;

const UNCOMPRESSED_DEX_MIN_SDK: i64 = 28;

pub struct EntryCompressionPolicy;

impl Preprocessor for EntryCompressionPolicy {
    fn name(&self) -> &'static str {
        "entry_compression_policy"
    }

    fn apply(&self, mut bundle: Bundle) -> Result<Bundle> {
        for module in bundle.modules.values_mut() {
            let dex_uncompressed =
                bundle.config.uncompress_dex_files || module.manifest.min_sdk_version().unwrap_or(0) >= UNCOMPRESSED_DEX_MIN_SDK;
            let extract_native_libs_false = module
                .manifest
                .root
                .find_child("application")
                .and_then(|app| {
                    app.attr_by_id_or_name(
                        Some(rid::EXTRACT_NATIVE_LIBS),
                        Some(rid::ANDROID_NS),
                        "extractNativeLibs",
                    )
                })
                .and_then(|a| a.value.as_bool())
                .map(|v| !v)
                .unwrap_or(false);
            let native_libs_uncompressed = bundle.config.uncompress_native_libraries || extract_native_libs_false;

            for (path, entry) in module.entries.iter_mut() {
                let is_dex = path.name_count() == 2 && path.components()[0] == "dex" && path.file_name().map(|n| n.ends_with(".dex")).unwrap_or(false);
                let is_native_lib = path.components().first().map(String::as_str) == Some("lib");
                if (is_dex && dex_uncompressed) || (is_native_lib && native_libs_uncompressed) {
                    entry.force_uncompressed = true;
                }
            }
        }
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BundleConfig, Module, ModuleEntry, ModuleType};
    use aabforge_core::{MemoryByteSource, ZipPath};
    use aabforge_manifest::{tree::{AttributeValue, XmlAttribute, XmlNode}, Manifest};
    use std::sync::Arc;

    fn module_with(min_sdk: Option<i64>, extract_native_libs: Option<bool>) -> Module {
        let mut root = XmlNode::new("manifest");
        if let Some(min_sdk) = min_sdk {
            let mut uses_sdk = XmlNode::new("uses-sdk");
            uses_sdk.set_attr(
                XmlAttribute::new(Some(rid::ANDROID_NS), "minSdkVersion", AttributeValue::Int(min_sdk))
                    .with_resource_id(rid::MIN_SDK_VERSION),
            );
            root.push_child(uses_sdk);
        }
        let mut application = XmlNode::new("application");
        if let Some(value) = extract_native_libs {
            application.set_attr(
                XmlAttribute::new(Some(rid::ANDROID_NS), "extractNativeLibs", AttributeValue::Bool(value))
                    .with_resource_id(rid::EXTRACT_NATIVE_LIBS),
            );
        }
        root.push_child(application);

        let mut module = Module::new("base", ModuleType::Feature, Manifest::new(root)).unwrap();
        for path in ["dex/classes.dex", "lib/arm64-v8a/libfoo.so", "res/raw/data.bin"] {
            let zip_path = ZipPath::parse(path).unwrap();
            let source = Arc::new(MemoryByteSource::new(b"x".to_vec()));
            module.entries.insert(zip_path.clone(), ModuleEntry::new(zip_path, source));
        }
        module
    }

    #[test]
    fn marks_dex_uncompressed_at_api_28_and_above() {
        let mut bundle = Bundle::new(BundleConfig::default());
        bundle.insert_module(module_with(Some(28), None)).unwrap();
        let result = EntryCompressionPolicy.apply(bundle).unwrap();
        let dex = &result.modules["base"].entries[&ZipPath::parse("dex/classes.dex").unwrap()];
        assert!(dex.force_uncompressed);
        let asset = &result.modules["base"].entries[&ZipPath::parse("res/raw/data.bin").unwrap()];
        assert!(!asset.force_uncompressed);
    }

    #[test]
    fn marks_native_libs_uncompressed_when_extraction_disabled() {
        let mut bundle = Bundle::new(BundleConfig::default());
        bundle.insert_module(module_with(Some(21), Some(false))).unwrap();
        let result = EntryCompressionPolicy.apply(bundle).unwrap();
        let lib = &result.modules["base"].entries[&ZipPath::parse("lib/arm64-v8a/libfoo.so").unwrap()];
        assert!(lib.force_uncompressed);
    }

    #[test]
    fn leaves_entries_compressed_below_threshold() {
        let mut bundle = Bundle::new(BundleConfig::default());
        bundle.insert_module(module_with(Some(21), None)).unwrap();
        let result = EntryCompressionPolicy.apply(bundle).unwrap();
        let dex = &result.modules["base"].entries[&ZipPath::parse("dex/classes.dex").unwrap()];
        assert!(!dex.force_uncompressed);
    }
}
