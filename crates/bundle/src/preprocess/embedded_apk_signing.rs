//! Step 3: embedded-APK signing marker.

use aabforge_core::Result;

use super::Preprocessor;
use crate::model::Bundle;

pub struct EmbeddedApkSigningMarker;

impl Preprocessor for EmbeddedApkSigningMarker {
    fn name(&self) -> &'static str {
        "embedded_apk_signing_marker"
    }

    /// Wear-embedded APKs ship as opaque `.apk` entries inside the
    /// carrying app's own archive; they must be re-signed with the
    /// carrying app's key before the split set is finalized.
    fn apply(&self, mut bundle: Bundle) -> Result<Bundle> {
        for module in bundle.modules.values_mut() {
            for (path, entry) in module.entries.iter_mut() {
                if path.file_name().map(|n| n.ends_with(".apk")).unwrap_or(false) {
                    entry.should_sign = true;
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
    use aabforge_manifest::{tree::XmlNode, Manifest};
    use std::sync::Arc;

    #[test]
    fn marks_embedded_apk_entries_for_signing() {
        let mut module = Module::new("base", ModuleType::Feature, Manifest::new(XmlNode::new("manifest"))).unwrap();
        for path in ["res/raw/wear_app.apk", "res/raw/data.bin"] {
            let zip_path = ZipPath::parse(path).unwrap();
            let source = Arc::new(MemoryByteSource::new(b"x".to_vec()));
            module.entries.insert(zip_path.clone(), ModuleEntry::new(zip_path, source));
        }
        let mut bundle = Bundle::new(BundleConfig::default());
        bundle.insert_module(module).unwrap();

        let result = EmbeddedApkSigningMarker.apply(bundle).unwrap();
        let entries = &result.modules["base"].entries;
        assert!(entries[&ZipPath::parse("res/raw/wear_app.apk").unwrap()].should_sign);
        assert!(!entries[&ZipPath::parse("res/raw/data.bin").unwrap()].should_sign);
    }
}
