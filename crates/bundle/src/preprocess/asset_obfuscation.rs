//! Step 6: asset obfuscation (optional).

use aabforge_core::{Result, ZipPath};
use std::collections::BTreeMap;

use super::Preprocessor;
use crate::model::Bundle;

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub struct AssetObfuscation;

impl Preprocessor for AssetObfuscation {
    fn name(&self) -> &'static str {
        "asset_obfuscation"
    }

    /// No-op unless `BundleConfig::obfuscate_assets` is set. When it is,
    /// every entry under `res/` is renamed to a content-addressed hashed
    /// name (`res/<sha256-hex>.<original extension>`), modules and
    /// entries visited in a fixed, sorted key order so the renaming is
    /// reproducible across runs.
    fn apply(&self, mut bundle: Bundle) -> Result<Bundle> {
        if !bundle.config.obfuscate_assets {
            return Ok(bundle);
        }

        let module_names: Vec<String> = {
            let mut names: Vec<String> = bundle.modules.keys().cloned().collect();
            names.sort();
            names
        };

        for module_name in module_names {
            let module = bundle.modules.get_mut(&module_name).expect("name came from bundle.modules keys");

            let mut paths: Vec<ZipPath> = module.entries.keys().cloned().collect();
            paths.sort();

            let mut rename_map: BTreeMap<String, String> = BTreeMap::new();
            for path in &paths {
                if path.components().first().map(String::as_str) != Some("res") {
                    continue;
                }
                let entry = &module.entries[path];
                let hash = entry.sha256().map_err(|e| {
                    aabforge_core::AabForgeError::invalid_bundle(format!("failed hashing {path} for obfuscation: {e}"))
                })?;
                let extension = path.file_name().and_then(|n| n.rsplit_once('.')).map(|(_, ext)| ext);
                let hashed_name = match extension {
                    Some(ext) => format!("{}.{ext}", to_hex(&hash)),
                    None => to_hex(&hash),
                };
                let new_path = path.resolve_sibling(&hashed_name).expect("hashed_name is a valid component");
                rename_map.insert(path.to_string(), new_path.to_string());
            }

            for (old, new) in &rename_map {
                let old_path = ZipPath::parse(old).expect("old path round-trips");
                let new_path = ZipPath::parse(new).expect("new path round-trips");
                if let Some(mut entry) = module.entries.shift_remove(&old_path) {
                    entry.path = new_path.clone();
                    module.entries.insert(new_path, entry);
                }
            }

            if let Some(table) = module.resource_table.as_mut() {
                table.for_each_file_reference_mut(|reference| {
                    if let Some(renamed) = rename_map.get(reference.as_str()) {
                        *reference = renamed.clone();
                    }
                });
            }
        }

        Ok(bundle)
    }
}
