//! The bundle/module/entry value types.

use aabforge_core::{AabForgeError, ByteSource, Result, ZipPath};
use aabforge_manifest::{Manifest, ModuleDelivery};
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use std::sync::Arc;

use crate::resource_table::ResourceTable;

/// Module kind, as declared by the module's own `<module type="...">`
/// attribute in its manifest (or inferred for legacy asset packs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleType {
    Feature,
    Asset,
    Ml,
    SdkDependency,
}

/// A pinned resource reference: by id, by name, or both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedResource {
    pub id: Option<u32>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleType {
    Regular,
    AssetOnly,
    Apex,
}

#[derive(Debug, Clone)]
pub struct BundleConfig {
    pub bundle_type: BundleType,
    pub uncompress_native_libraries: bool,
    pub uncompress_dex_files: bool,
    pub pinned_resources: Vec<PinnedResource>,
    pub store_archive: bool,
    /// Set for shard variants that must run on 32-bit-only devices; the
    /// 64-bit native pruning preprocessor strips `lib/<64-bit abi>/...`
    /// entries when this is set.
    pub restrict_to_32_bit_abis: bool,
    /// Suffix appended to split ids and local-testing metadata when
    /// building a local-testing APK set. `None` skips that rewrite.
    pub local_testing_suffix: Option<String>,
    /// When set, `res/` entries are renamed to content-addressed hashed
    /// names and every `FileReference` in each module's resource table
    /// is rewritten to match.
    pub obfuscate_assets: bool,
}

impl Default for BundleConfig {
    fn default() -> Self {
        BundleConfig {
            bundle_type: BundleType::Regular,
            uncompress_native_libraries: false,
            uncompress_dex_files: false,
            pinned_resources: Vec::new(),
            store_archive: false,
            restrict_to_32_bit_abis: false,
            local_testing_suffix: None,
            obfuscate_assets: false,
        }
    }
}

/// Opaque `BUNDLE-METADATA/<namespace>/<file>` payloads, copied through
/// unchanged by every stage except the preprocessors that explicitly
/// know how to interpret one (e.g. an obfuscation map).
#[derive(Debug, Clone, Default)]
pub struct BundleMetadata {
    entries: IndexMap<(String, String), Vec<u8>>,
}

impl BundleMetadata {
    pub fn insert(&mut self, namespace: impl Into<String>, file: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert((namespace.into(), file.into()), bytes);
    }

    pub fn get(&self, namespace: &str, file: &str) -> Option<&[u8]> {
        self.entries
            .get(&(namespace.to_string(), file.to_string()))
            .map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(String, String), &Vec<u8>)> {
        self.entries.iter()
    }
}

/// A lazily-opened, re-openable archive entry.
pub struct ModuleEntry {
    pub path: ZipPath,
    pub content: Arc<dyn ByteSource>,
    pub force_uncompressed: bool,
    pub should_sign: bool,
    cached_sha256: OnceCell<[u8; 32]>,
}

impl ModuleEntry {
    pub fn new(path: ZipPath, content: Arc<dyn ByteSource>) -> Self {
        ModuleEntry {
            path,
            content,
            force_uncompressed: false,
            should_sign: false,
            cached_sha256: OnceCell::new(),
        }
    }

    pub fn with_force_uncompressed(mut self, value: bool) -> Self {
        self.force_uncompressed = value;
        self
    }

    pub fn with_should_sign(mut self, value: bool) -> Self {
        self.should_sign = value;
        self
    }

    /// Memoized SHA-256 of the content, computed at most once even
    /// though `content` may be reopened many times.
    pub fn sha256(&self) -> std::io::Result<[u8; 32]> {
        self.cached_sha256
            .get_or_try_init(|| self.content.sha256())
            .copied()
    }
}

impl Clone for ModuleEntry {
    fn clone(&self) -> Self {
        ModuleEntry {
            path: self.path.clone(),
            content: Arc::clone(&self.content),
            force_uncompressed: self.force_uncompressed,
            should_sign: self.should_sign,
            // A fresh cell: correctness doesn't depend on sharing the
            // memoized hash across clones, only on recomputing the same
            // value if asked again.
            cached_sha256: self.cached_sha256.get().copied().map(OnceCell::with_value).unwrap_or_default(),
        }
    }
}

impl PartialEq for ModuleEntry {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.force_uncompressed == other.force_uncompressed
            && self.should_sign == other.should_sign
            && self.sha256().ok() == other.sha256().ok()
    }
}

impl Eq for ModuleEntry {}

impl std::fmt::Debug for ModuleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleEntry")
            .field("path", &self.path)
            .field("force_uncompressed", &self.force_uncompressed)
            .field("should_sign", &self.should_sign)
            .finish()
    }
}

/// A bundle subtree: its own manifest, typed sidecars, and the rest of
/// its entries.
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub module_type: ModuleType,
    pub delivery: ModuleDelivery,
    pub manifest: Manifest,
    pub resource_table: Option<ResourceTable>,
    pub entries: IndexMap<ZipPath, ModuleEntry>,
}

impl Module {
    /// `^[A-Za-z][A-Za-z0-9_]*$`, checked without a regex dependency.
    pub fn is_valid_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    pub fn new(name: impl Into<String>, module_type: ModuleType, manifest: Manifest) -> Result<Self> {
        let name = name.into();
        if !Self::is_valid_name(&name) {
            return Err(AabForgeError::invalid_bundle(format!(
                "module name {name:?} does not match ^[A-Za-z][A-Za-z0-9_]*$"
            )));
        }
        let delivery = manifest.resolve_delivery();
        Ok(Module {
            name,
            module_type,
            delivery,
            manifest,
            resource_table: None,
            entries: IndexMap::new(),
        })
    }

    pub fn is_base(&self) -> bool {
        self.name == "base"
    }
}

/// An ordered `module name -> Module` mapping plus bundle-wide config
/// and metadata.
#[derive(Debug, Clone, Default)]
pub struct Bundle {
    pub modules: IndexMap<String, Module>,
    pub config: BundleConfig,
    pub metadata: BundleMetadata,
}

impl Bundle {
    pub fn new(config: BundleConfig) -> Self {
        Bundle {
            modules: IndexMap::new(),
            config,
            metadata: BundleMetadata::default(),
        }
    }

    pub fn insert_module(&mut self, module: Module) -> Result<()> {
        if module.is_base() && self.modules.values().any(Module::is_base) {
            return Err(AabForgeError::invalid_bundle("a bundle may contain at most one module named `base`"));
        }
        self.modules.insert(module.name.clone(), module);
        Ok(())
    }

    pub fn base_module(&self) -> Option<&Module> {
        self.modules.get("base")
    }

    /// Validates the base-module invariant honoring the asset-only
    /// declaration in `BundleConfig`.
    pub fn validate(&self) -> Result<()> {
        if self.base_module().is_none() && self.config.bundle_type != BundleType::AssetOnly {
            return Err(AabForgeError::invalid_bundle(
                "bundle has no `base` module and is not declared asset-only",
            ));
        }
        for module in self.modules.values() {
            for dep in module.manifest.root.children.iter().filter(|c| c.name == "uses-split") {
                if let Some(dep_name) = dep
                    .attr_by_id_or_name(None, None, "name")
                    .and_then(|a| a.value.as_str())
                {
                    if !self.modules.contains_key(dep_name) {
                        return Err(AabForgeError::invalid_bundle(format!(
                            "module {:?} depends on unknown module {dep_name:?}",
                            module.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
