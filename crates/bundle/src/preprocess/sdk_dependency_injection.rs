//! Step 5: runtime-enabled SDK dependency injection.
//!
//! A module declared `SDK_DEPENDENCY_MODULE` ships the Android SDK
//! runtime's own code and resources. It is absorbed into the app as an
//! ordinary feature module once its resource package id is remapped
//! clear of the base module's, its delivery is converted to on-demand,
//! and its auto-generated `RPackage` dex is stripped — the app's base
//! module now provides that class.

use aabforge_core::{AabForgeError, Result, ZipPath};
use aabforge_manifest::{AttributeValue, ManifestEditor, XmlNode};

use super::Preprocessor;
use crate::model::{Bundle, ModuleType};

/// The first package id absorbed SDK modules are remapped into;
/// incremented per absorbed module so no two collide.
const FIRST_INJECTED_PACKAGE_ID: u8 = 0x80;

pub struct SdkDependencyInjection;

impl Preprocessor for SdkDependencyInjection {
    fn name(&self) -> &'static str {
        "sdk_dependency_injection"
    }

    fn apply(&self, mut bundle: Bundle) -> Result<Bundle> {
        let sdk_module_names: Vec<String> = bundle
            .modules
            .values()
            .filter(|m| m.module_type == ModuleType::SdkDependency)
            .map(|m| m.name.clone())
            .collect();

        for (offset, name) in sdk_module_names.into_iter().enumerate() {
            let new_package_id = FIRST_INJECTED_PACKAGE_ID
                .checked_add(offset as u8)
                .ok_or_else(|| AabForgeError::invalid_bundle("too many runtime-enabled SDK dependencies to remap"))?;
            remap_sdk_module(&mut bundle, &name, new_package_id)?;
        }
        Ok(bundle)
    }
}

fn remap_sdk_module(bundle: &mut Bundle, module_name: &str, new_package_id: u8) -> Result<()> {
    let module = bundle
        .modules
        .get_mut(module_name)
        .expect("module_name came from bundle.modules keys");

    if let Some(table) = module.resource_table.as_mut() {
        if table.packages.len() > 1 {
            return Err(AabForgeError::invalid_bundle(format!(
                "SDK dependency module {module_name:?} has more than one resource package"
            )));
        }
        let old_package_id = table.packages.first().map(|p| p.package_id);
        if let Some(package) = table.packages.first_mut() {
            package.package_id = new_package_id;
        }
        if let Some(old_package_id) = old_package_id {
            table.for_each_reference_mut(|id| {
                if (*id >> 24) as u8 == old_package_id {
                    *id = (*id & 0x00FF_FFFF) | ((new_package_id as u32) << 24);
                }
            });
            remap_manifest_resource_refs(&mut module.manifest.root, old_package_id, new_package_id);
        }
    }

    let mut editor = ManifestEditor::new(module.manifest.clone());
    editor.build_delivery_tree(true);
    module.manifest = editor.save();

    if let Some(last_dex_path) = last_dex_entry(module) {
        module.entries.shift_remove(&last_dex_path);
    }

    Ok(())
}

/// Mirrors the resource-table reference rewrite onto the manifest's own
/// attribute resource references, so a `0x7F...`-range ref surviving in
/// the absorbed module's `AndroidManifest.xml` (e.g. `android:theme`,
/// `android:icon`) follows its table entry to the new package id.
fn remap_manifest_resource_refs(node: &mut XmlNode, old_package_id: u8, new_package_id: u8) {
    for attr in &mut node.attributes {
        if let AttributeValue::ResourceRef(id) = &mut attr.value {
            if (*id >> 24) as u8 == old_package_id {
                *id = (*id & 0x00FF_FFFF) | ((new_package_id as u32) << 24);
            }
        }
    }
    for child in &mut node.children {
        remap_manifest_resource_refs(child, old_package_id, new_package_id);
    }
}

fn last_dex_entry(module: &crate::model::Module) -> Option<ZipPath> {
    module
        .entries
        .keys()
        .filter(|p| p.name_count() == 2 && p.components()[0] == "dex")
        .max()
        .cloned()
}
