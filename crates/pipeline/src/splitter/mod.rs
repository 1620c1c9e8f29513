//! Per-dimension module splitters and the composed pipeline that runs
//! all six over a module's master split.

mod abi;
mod common;
mod country_set;
mod density;
mod device_tier;
mod language;
mod texture;

pub use abi::split_by_abi;
pub use country_set::split_by_country_set;
pub use density::split_by_density;
pub use device_tier::split_by_device_tier;
pub use language::split_by_language;
pub use texture::{split_by_texture_format, strip_tcf_suffix};

use aabforge_core::ZipPath;
use std::collections::HashSet;

use crate::variant::ModuleSplit;

/// Runs all six splitters in sequence. Only the first splitter sees a
/// default `apk_targeting`; every splitter after it intentionally
/// returns non-default-targeting inputs unchanged, so running all six
/// over every split produced so far composes correctly into the full
/// per-module split set. `pinned` holds every file path a splitter must
/// leave on the master split no matter what qualifier its path carries.
pub fn split_module(master: ModuleSplit, pinned: &HashSet<ZipPath>) -> Vec<ModuleSplit> {
    let mut splits = vec![master];
    splits = splits.into_iter().flat_map(|s| split_by_abi(s, pinned)).collect();
    splits = splits.into_iter().flat_map(|s| split_by_density(s, pinned)).collect();
    splits = splits.into_iter().flat_map(|s| split_by_language(s, pinned)).collect();
    splits = splits.into_iter().flat_map(|s| split_by_texture_format(s, pinned)).collect();
    splits = splits.into_iter().flat_map(|s| split_by_device_tier(s, pinned)).collect();
    splits = splits.into_iter().flat_map(|s| split_by_country_set(s, pinned)).collect();
    splits
}

#[cfg(test)]
mod tests {
    use super::*;
    use aabforge_bundle::ModuleEntry;
    use aabforge_core::{MemoryByteSource, ZipPath};
    use aabforge_manifest::{tree::XmlNode, Manifest};
    use indexmap::IndexMap;
    use std::sync::Arc;

    #[test]
    fn composed_pipeline_preserves_entry_set() {
        let mut entries = IndexMap::new();
        for path in [
            "lib/arm64-v8a/libfoo.so",
            "res/drawable-xhdpi/icon.png",
            "res/values-en/strings.xml",
            "assets/data.bin",
        ] {
            let zip_path = ZipPath::parse(path).unwrap();
            entries.insert(zip_path.clone(), ModuleEntry::new(zip_path, Arc::new(MemoryByteSource::new(b"x".to_vec()))));
        }
        let master = ModuleSplit::new_master(
            "base",
            Default::default(),
            Manifest::new(XmlNode::new("manifest")),
            None,
            entries,
        );

        let splits = split_module(master, &HashSet::new());
        let total_entries: usize = splits.iter().map(|s| s.entries.len()).sum();
        assert_eq!(total_entries, 4);
        assert_eq!(splits.iter().filter(|s| s.is_master).count(), 1);
    }

    #[test]
    fn pinned_entry_survives_full_pipeline_on_master() {
        let mut entries = IndexMap::new();
        for path in ["res/drawable-xhdpi/icon.png", "res/drawable-hdpi/icon.png"] {
            let zip_path = ZipPath::parse(path).unwrap();
            entries.insert(zip_path.clone(), ModuleEntry::new(zip_path, Arc::new(MemoryByteSource::new(b"x".to_vec()))));
        }
        let master = ModuleSplit::new_master(
            "base",
            Default::default(),
            Manifest::new(XmlNode::new("manifest")),
            None,
            entries,
        );
        let pinned: HashSet<ZipPath> = [ZipPath::parse("res/drawable-xhdpi/icon.png").unwrap()].into_iter().collect();

        let splits = split_module(master, &pinned);
        let masters: Vec<_> = splits.iter().filter(|s| s.is_master).collect();
        assert_eq!(masters.len(), 1);
        assert!(masters[0].entries.contains_key(&ZipPath::parse("res/drawable-xhdpi/icon.png").unwrap()));
    }
}
