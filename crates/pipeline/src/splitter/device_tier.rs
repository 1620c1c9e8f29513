//! Splits a module by integer device-tier suffix on `assets/`
//! directories, e.g. `assets/textures#tier_2/...`.

use aabforge_core::ZipPath;
use std::collections::HashSet;

use super::common::split_by_qualifier;
use crate::variant::ModuleSplit;

const TIER_MARKER: &str = "#tier_";

fn tier_qualifier(dir_name: &str) -> Option<String> {
    let tier = dir_name.split(TIER_MARKER).nth(1)?;
    tier.parse::<u32>().ok()?;
    Some(tier.to_string())
}

pub fn split_by_device_tier(input: ModuleSplit, pinned: &HashSet<ZipPath>) -> Vec<ModuleSplit> {
    split_by_qualifier(
        input,
        pinned,
        |path| {
            if path.components().first().map(String::as_str) != Some("assets") || path.name_count() < 2 {
                return None;
            }
            tier_qualifier(&path.components()[1])
        },
        |targeting, dimension| targeting.device_tier = dimension,
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

    #[test]
    fn partitions_by_device_tier() {
        let mut entries = IndexMap::new();
        for path in ["assets/hi_res#tier_2/tex.bin", "assets/hi_res#tier_0/tex.bin"] {
            let zip_path = ZipPath::parse(path).unwrap();
            entries.insert(zip_path.clone(), ModuleEntry::new(zip_path, Arc::new(MemoryByteSource::new(b"x".to_vec()))));
        }
        let input = ModuleSplit::new_master(
            "base",
            Default::default(),
            Manifest::new(XmlNode::new("manifest")),
            None,
            entries,
        );

        let splits = split_by_device_tier(input, &HashSet::new());
        assert!(splits.iter().any(|s| s.apk_targeting.device_tier.values.contains("2")));
        assert!(splits.iter().any(|s| s.apk_targeting.device_tier.values.contains("0")));
    }

    #[test]
    fn pinned_device_tier_entry_stays_on_master() {
        let mut entries = IndexMap::new();
        for path in ["assets/hi_res#tier_2/tex.bin", "assets/hi_res#tier_0/tex.bin"] {
            let zip_path = ZipPath::parse(path).unwrap();
            entries.insert(zip_path.clone(), ModuleEntry::new(zip_path, Arc::new(MemoryByteSource::new(b"x".to_vec()))));
        }
        let input = ModuleSplit::new_master(
            "base",
            Default::default(),
            Manifest::new(XmlNode::new("manifest")),
            None,
            entries,
        );
        let pinned: HashSet<ZipPath> = [ZipPath::parse("assets/hi_res#tier_2/tex.bin").unwrap()].into_iter().collect();

        let splits = split_by_device_tier(input, &pinned);
        let master = splits.iter().find(|s| s.is_master).unwrap();
        assert!(master.entries.contains_key(&ZipPath::parse("assets/hi_res#tier_2/tex.bin").unwrap()));
    }
}
