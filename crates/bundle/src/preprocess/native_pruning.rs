//! Step 1: 64-bit native library pruning.

use aabforge_core::Result;

use super::Preprocessor;
use crate::model::Bundle;

const SIXTY_FOUR_BIT_ABIS: &[&str] = &["arm64-v8a", "x86_64"];

pub struct Native64BitPruning;

impl Preprocessor for Native64BitPruning {
    fn name(&self) -> &'static str {
        "native_64_bit_pruning"
    }

    /// A no-op unless the bundle is restricted to 32-bit-only devices
    /// (set by the sharder when building a 32-bit-only shard variant);
    /// in that case every `lib/<64-bit abi>/...` entry is dropped.
    fn apply(&self, mut bundle: Bundle) -> Result<Bundle> {
        if !bundle.config.restrict_to_32_bit_abis {
            return Ok(bundle);
        }
        for module in bundle.modules.values_mut() {
            module.entries.retain(|path, _| {
                !(path.name_count() >= 2
                    && path.components()[0] == "lib"
                    && SIXTY_FOUR_BIT_ABIS.contains(&path.components()[1].as_str()))
            });
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

    fn module_with_abi_libs() -> Module {
        let mut module = Module::new("base", ModuleType::Feature, Manifest::new(XmlNode::new("manifest"))).unwrap();
        for path in ["lib/arm64-v8a/libfoo.so", "lib/armeabi-v7a/libfoo.so"] {
            let zip_path = ZipPath::parse(path).unwrap();
            let source = Arc::new(MemoryByteSource::new(b"lib".to_vec()));
            module.entries.insert(zip_path.clone(), ModuleEntry::new(zip_path, source));
        }
        module
    }

    #[test]
    fn no_op_when_not_restricted() {
        let mut bundle = Bundle::new(BundleConfig::default());
        bundle.insert_module(module_with_abi_libs()).unwrap();
        let result = Native64BitPruning.apply(bundle).unwrap();
        assert_eq!(result.modules["base"].entries.len(), 2);
    }

    #[test]
    fn strips_64_bit_abis_when_restricted() {
        let mut config = BundleConfig::default();
        config.restrict_to_32_bit_abis = true;
        let mut bundle = Bundle::new(config);
        bundle.insert_module(module_with_abi_libs()).unwrap();
        let result = Native64BitPruning.apply(bundle).unwrap();
        let entries = &result.modules["base"].entries;
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key(&ZipPath::parse("lib/armeabi-v7a/libfoo.so").unwrap()));
    }
}
