//! Splits a module by the screen-density qualifier on `res/` directory
//! names (e.g. `res/drawable-xhdpi/icon.png`).

use aabforge_core::ZipPath;
use std::collections::HashSet;

use super::common::split_by_qualifier;
use crate::variant::ModuleSplit;

const DENSITY_BUCKETS: &[&str] = &["ldpi", "mdpi", "hdpi", "xhdpi", "xxhdpi", "xxxhdpi", "nodpi", "tvdpi"];

fn density_qualifier(dir_name: &str) -> Option<String> {
    dir_name
        .split('-')
        .find(|segment| DENSITY_BUCKETS.contains(segment))
        .map(str::to_string)
}

pub fn split_by_density(input: ModuleSplit, pinned: &HashSet<ZipPath>) -> Vec<ModuleSplit> {
    split_by_qualifier(
        input,
        pinned,
        |path| {
            if path.components().first().map(String::as_str) != Some("res") || path.name_count() < 2 {
                return None;
            }
            density_qualifier(&path.components()[1])
        },
        |targeting, dimension| targeting.screen_density = dimension,
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
    fn partitions_by_density_bucket() {
        let mut entries = IndexMap::new();
        for (p, e) in [
            entry("res/drawable-xhdpi/icon.png"),
            entry("res/drawable-hdpi/icon.png"),
            entry("res/values/strings.xml"),
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

        let splits = split_by_density(input, &HashSet::new());
        assert_eq!(splits.len(), 3);
        let master = splits.iter().find(|s| s.is_master).unwrap();
        assert!(master.entries.contains_key(&ZipPath::parse("res/values/strings.xml").unwrap()));
    }

    #[test]
    fn pinned_density_entry_stays_on_master() {
        let mut entries = IndexMap::new();
        for (p, e) in [entry("res/drawable-xhdpi/icon.png"), entry("res/drawable-hdpi/icon.png")] {
            entries.insert(p, e);
        }
        let input = ModuleSplit::new_master(
            "base",
            Default::default(),
            Manifest::new(XmlNode::new("manifest")),
            None,
            entries,
        );
        let pinned: HashSet<ZipPath> = [ZipPath::parse("res/drawable-xhdpi/icon.png").unwrap()].into_iter().collect();

        let splits = split_by_density(input, &pinned);
        let master = splits.iter().find(|s| s.is_master).unwrap();
        assert!(master.entries.contains_key(&ZipPath::parse("res/drawable-xhdpi/icon.png").unwrap()));
    }
}
