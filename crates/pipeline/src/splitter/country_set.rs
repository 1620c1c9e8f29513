//! Splits a module by named country-set suffix on `assets/`
//! directories, e.g. `assets/textures#countries_latam/...`.

use aabforge_core::ZipPath;
use std::collections::HashSet;

use super::common::split_by_qualifier;
use crate::variant::ModuleSplit;

const COUNTRY_SET_MARKER: &str = "#countries_";

fn country_set_qualifier(dir_name: &str) -> Option<String> {
    dir_name.split(COUNTRY_SET_MARKER).nth(1).map(str::to_string)
}

pub fn split_by_country_set(input: ModuleSplit, pinned: &HashSet<ZipPath>) -> Vec<ModuleSplit> {
    split_by_qualifier(
        input,
        pinned,
        |path| {
            if path.components().first().map(String::as_str) != Some("assets") || path.name_count() < 2 {
                return None;
            }
            country_set_qualifier(&path.components()[1])
        },
        |targeting, dimension| targeting.country_set = dimension,
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
    fn partitions_by_country_set() {
        let mut entries = IndexMap::new();
        for path in ["assets/promo#countries_latam/banner.png", "assets/promo#countries_emea/banner.png"] {
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

        let splits = split_by_country_set(input, &HashSet::new());
        assert!(splits.iter().any(|s| s.apk_targeting.country_set.values.contains("latam")));
    }

    #[test]
    fn pinned_country_set_entry_stays_on_master() {
        let mut entries = IndexMap::new();
        for path in ["assets/promo#countries_latam/banner.png", "assets/promo#countries_emea/banner.png"] {
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
        let pinned: HashSet<ZipPath> = [ZipPath::parse("assets/promo#countries_latam/banner.png").unwrap()].into_iter().collect();

        let splits = split_by_country_set(input, &pinned);
        let master = splits.iter().find(|s| s.is_master).unwrap();
        assert!(master.entries.contains_key(&ZipPath::parse("assets/promo#countries_latam/banner.png").unwrap()));
    }
}
