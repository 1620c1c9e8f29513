//! A trimmed but real model of the compiled resource table: packages,
//! types, entries and per-configuration values, each entry addressable
//! by its 32-bit `0xPPTTNNNN` id.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::model::PinnedResource;

/// A single configuration qualifier set a `ConfigValue` is scoped to.
/// Only the qualifiers the splitters and the remapper actually inspect
/// are modeled; anything else collapses to the default (unqualified)
/// configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub density: Option<u16>,
    pub locale: Option<String>,
}

impl ResourceConfig {
    pub fn is_default(&self) -> bool {
        self.density.is_none() && self.locale.is_none()
    }
}

/// What a `ConfigValue` actually holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResourceValue {
    /// A path into `res/` or `assets/` backing this config's content.
    FileReference(String),
    StringValue(String),
    /// A reference to another resource id, e.g. a style parent, an item
    /// value, a styleable entry, an array element, a plural entry, or an
    /// attribute symbol. The only value the package-id remapper rewrites.
    Reference(u32),
}

impl ResourceValue {
    /// Mutable access to the referenced id, if this value is a
    /// `Reference`. Used by the package-id remapper to walk and rewrite
    /// every reference in place.
    pub fn reference_mut(&mut self) -> Option<&mut u32> {
        match self {
            ResourceValue::Reference(id) => Some(id),
            _ => None,
        }
    }

    /// Mutable access to the backing path, if this value is a
    /// `FileReference`. Used by the asset obfuscation preprocessor to
    /// rewrite paths after renaming the entries they point to.
    pub fn file_reference_mut(&mut self) -> Option<&mut String> {
        match self {
            ResourceValue::FileReference(path) => Some(path),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigValue {
    pub config: ResourceConfig,
    pub value: ResourceValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub entry_id: u16,
    pub entry_name: String,
    pub config_values: Vec<ConfigValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceType {
    pub type_id: u8,
    pub type_name: String,
    pub entries: Vec<ResourceEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePackage {
    pub package_id: u8,
    pub package_name: String,
    pub types: Vec<ResourceType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceTable {
    pub packages: Vec<ResourcePackage>,
}

/// Packs a package id, type id and entry id into a resource's
/// fully-qualified 32-bit id.
pub fn resource_id(package_id: u8, type_id: u8, entry_id: u16) -> u32 {
    ((package_id as u32) << 24) | ((type_id as u32) << 16) | entry_id as u32
}

impl ResourceEntry {
    pub fn id(&self, package_id: u8, type_id: u8) -> u32 {
        resource_id(package_id, type_id, self.entry_id)
    }
}

impl ResourceTable {
    /// Walk every `Reference` value in the table, mutably, so a caller
    /// remapping package ids can rewrite them in place.
    pub fn for_each_reference_mut(&mut self, mut f: impl FnMut(&mut u32)) {
        for package in &mut self.packages {
            for ty in &mut package.types {
                for entry in &mut ty.entries {
                    for cv in &mut entry.config_values {
                        if let Some(id) = cv.value.reference_mut() {
                            f(id);
                        }
                    }
                }
            }
        }
    }

    /// Walk every `FileReference` value in the table, mutably.
    pub fn for_each_file_reference_mut(&mut self, mut f: impl FnMut(&mut String)) {
        for package in &mut self.packages {
            for ty in &mut package.types {
                for entry in &mut ty.entries {
                    for cv in &mut entry.config_values {
                        if let Some(path) = cv.value.file_reference_mut() {
                            f(path);
                        }
                    }
                }
            }
        }
    }

    /// Looks up the entry identified by the fully-qualified `0xPPTTNNNN` id.
    pub fn find_entry(&self, id: u32) -> Option<(&ResourcePackage, &ResourceType, &ResourceEntry)> {
        let package_id = (id >> 24) as u8;
        let type_id = ((id >> 16) & 0xFF) as u8;
        let entry_id = (id & 0xFFFF) as u16;
        let package = self.packages.iter().find(|p| p.package_id == package_id)?;
        let ty = package.types.iter().find(|t| t.type_id == type_id)?;
        let entry = ty.entries.iter().find(|e| e.entry_id == entry_id)?;
        Some((package, ty, entry))
    }

    /// Every file path backing a resource named or id'd by `pinned`.
    /// These must remain in the master split regardless of config
    /// targeting, so the splitters consult this set before moving a
    /// `res/`/`assets/` entry into a per-config split.
    pub fn pinned_file_paths(&self, pinned: &[PinnedResource]) -> HashSet<String> {
        let mut paths = HashSet::new();
        if pinned.is_empty() {
            return paths;
        }
        for package in &self.packages {
            for ty in &package.types {
                for entry in &ty.entries {
                    let id = entry.id(package.package_id, ty.type_id);
                    let is_pinned = pinned
                        .iter()
                        .any(|p| p.id == Some(id) || p.name.as_deref() == Some(entry.entry_name.as_str()));
                    if !is_pinned {
                        continue;
                    }
                    for cv in &entry.config_values {
                        if let ResourceValue::FileReference(path) = &cv.value {
                            paths.insert(path.clone());
                        }
                    }
                }
            }
        }
        paths
    }
}
