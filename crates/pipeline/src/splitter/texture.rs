//! Splits a module by texture-compression-format suffix on `assets/`
//! directories, e.g. `assets/textures#tcf_astc/...`.

use aabforge_core::ZipPath;
use std::collections::HashSet;

use super::common::split_by_qualifier;
use crate::variant::ModuleSplit;

const TCF_MARKER: &str = "#tcf_";

fn tcf_qualifier(dir_name: &str) -> Option<String> {
    dir_name.split(TCF_MARKER).nth(1).map(str::to_string)
}

/// Strips the `#tcf_<format>` suffix back off, for master splits that
/// carry suffix-stripped asset directories.
pub fn strip_tcf_suffix(dir_name: &str) -> &str {
    dir_name.split(TCF_MARKER).next().unwrap_or(dir_name)
}

pub fn split_by_texture_format(input: ModuleSplit, pinned: &HashSet<ZipPath>) -> Vec<ModuleSplit> {
    split_by_qualifier(
        input,
        pinned,
        |path| {
            if path.components().first().map(String::as_str) != Some("assets") || path.name_count() < 2 {
                return None;
            }
            tcf_qualifier(&path.components()[1])
        },
        |targeting, dimension| targeting.texture_compression_format = dimension,
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
    fn partitions_by_texture_format_suffix() {
        let mut entries = IndexMap::new();
        for path in ["assets/textures#tcf_astc/tex.bin", "assets/textures#tcf_etc2/tex.bin"] {
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

        let splits = split_by_texture_format(input, &HashSet::new());
        assert_eq!(splits.len(), 3);
        assert!(splits.iter().any(|s| s.apk_targeting.texture_compression_format.values.contains("astc")));
    }

    #[test]
    fn strips_tcf_suffix_for_display_names() {
        assert_eq!(strip_tcf_suffix("textures#tcf_astc"), "textures");
        assert_eq!(strip_tcf_suffix("textures"), "textures");
    }

    #[test]
    fn pinned_texture_entry_stays_on_master() {
        let mut entries = IndexMap::new();
        for path in ["assets/textures#tcf_astc/tex.bin", "assets/textures#tcf_etc2/tex.bin"] {
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
        let pinned: HashSet<ZipPath> = [ZipPath::parse("assets/textures#tcf_astc/tex.bin").unwrap()].into_iter().collect();

        let splits = split_by_texture_format(input, &pinned);
        let master = splits.iter().find(|s| s.is_master).unwrap();
        assert!(master.entries.contains_key(&ZipPath::parse("assets/textures#tcf_astc/tex.bin").unwrap()));
    }
}
