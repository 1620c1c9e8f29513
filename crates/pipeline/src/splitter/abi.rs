//! Splits a module by the ABI segment of `lib/<abi>/...` entries.

use aabforge_core::ZipPath;
use std::collections::HashSet;

use super::common::split_by_qualifier;
use crate::variant::ModuleSplit;

pub fn split_by_abi(input: ModuleSplit, pinned: &HashSet<ZipPath>) -> Vec<ModuleSplit> {
    split_by_qualifier(
        input,
        pinned,
        |path| {
            if path.name_count() >= 2 && path.components()[0] == "lib" {
                Some(path.components()[1].clone())
            } else {
                None
            }
        },
        |targeting, dimension| targeting.abi = dimension,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use aabforge_bundle::ModuleEntry;
    use aabforge_core::MemoryByteSource;
    use aabforge_manifest::{tree::XmlNode, Manifest};
    use indexmap::IndexMap;
    use std::sync::Arc;

    fn entry(path: &str) -> (ZipPath, ModuleEntry) {
        let zip_path = ZipPath::parse(path).unwrap();
        let source = Arc::new(MemoryByteSource::new(b"x".to_vec()));
        (zip_path.clone(), ModuleEntry::new(zip_path, source))
    }

    #[test]
    fn partitions_by_abi_and_preserves_entry_set() {
        let mut entries = IndexMap::new();
        for (p, e) in [
            entry("lib/arm64-v8a/libfoo.so"),
            entry("lib/armeabi-v7a/libfoo.so"),
            entry("assets/data.bin"),
        ] {
            entries.insert(p, e);
        }
        let input = ModuleSplit::new_master(
            "base",
            Default::default(),
            Manifest::new(XmlNode::new("manifest")),
            None,
            entries,
        );

        let splits = split_by_abi(input, &HashSet::new());
        assert_eq!(splits.len(), 3); // master + 2 abi splits
        assert_eq!(splits.iter().filter(|s| s.is_master).count(), 1);

        let total_entries: usize = splits.iter().map(|s| s.entries.len()).sum();
        assert_eq!(total_entries, 3);

        let arm64 = splits
            .iter()
            .find(|s| s.apk_targeting.abi.values.contains("arm64-v8a"))
            .unwrap();
        assert!(arm64.apk_targeting.abi.alternatives.contains("armeabi-v7a"));
    }

    #[test]
    fn returns_unchanged_when_targeting_is_not_default() {
        let mut input = ModuleSplit::new_master(
            "base",
            Default::default(),
            Manifest::new(XmlNode::new("manifest")),
            None,
            IndexMap::new(),
        );
        input.apk_targeting.abi.values.insert("arm64-v8a".to_string());
        let splits = split_by_abi(input, &HashSet::new());
        assert_eq!(splits.len(), 1);
    }

    #[test]
    fn pinned_entry_stays_on_master() {
        let mut entries = IndexMap::new();
        for (p, e) in [entry("lib/arm64-v8a/libfoo.so"), entry("lib/armeabi-v7a/libfoo.so")] {
            entries.insert(p, e);
        }
        let input = ModuleSplit::new_master(
            "base",
            Default::default(),
            Manifest::new(XmlNode::new("manifest")),
            None,
            entries,
        );
        let pinned: HashSet<ZipPath> = [ZipPath::parse("lib/arm64-v8a/libfoo.so").unwrap()].into_iter().collect();

        let splits = split_by_abi(input, &pinned);
        let master = splits.iter().find(|s| s.is_master).unwrap();
        assert!(master.entries.contains_key(&ZipPath::parse("lib/arm64-v8a/libfoo.so").unwrap()));
        assert!(!splits
            .iter()
            .any(|s| !s.is_master && s.entries.contains_key(&ZipPath::parse("lib/arm64-v8a/libfoo.so").unwrap())));
    }
}
