//! Bundle ingestion: turns a `.aab` zip archive into a [`Bundle`].

use aabforge_core::{AabForgeError, Result, ZipPath};
use aabforge_manifest::{Manifest, ManifestParser};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::model::{Bundle, BundleConfig, Module, ModuleType};
use crate::sanitizer::{module_needs_dex_rename, sanitize_dex_path};
use crate::zip_source::ZipByteSource;

const MANIFEST_ENTRY: &str = "manifest/AndroidManifest.xml";

/// Reads a bundle's modules and entries out of a zip archive on disk.
///
/// `BUNDLE-METADATA/` and `META-INF/` top-level directories are not
/// modules; every other top-level directory is.
pub async fn read_bundle(path: impl AsRef<Path>) -> Result<Bundle> {
    let path = path.as_ref().to_path_buf();
    let archive_path = Arc::new(path.clone());

    let names = {
        let archive_path = Arc::clone(&archive_path);
        tokio::task::spawn_blocking(move || list_entries(&archive_path))
            .await
            .map_err(|e| AabForgeError::invalid_bundle(format!("bundle reader task panicked: {e}")))??
    };

    let mut bundle = Bundle::new(BundleConfig::default());
    let mut modules: std::collections::BTreeMap<String, Vec<(ZipPath, u64)>> = std::collections::BTreeMap::new();

    for (raw_name, size) in &names {
        if raw_name.ends_with('/') {
            continue; // directory entries are silently dropped
        }
        let zip_path = ZipPath::parse(raw_name)
            .map_err(|e| AabForgeError::invalid_bundle(format!("malformed entry path {raw_name:?}: {e}")))?;
        if zip_path.is_root() {
            continue;
        }
        let top = zip_path.components()[0].clone();
        if top == "BUNDLE-METADATA" {
            if zip_path.name_count() >= 3 {
                let namespace = zip_path.components()[1].clone();
                let file = zip_path.subpath(2, zip_path.name_count()).to_string();
                let bytes = read_entry(&archive_path, raw_name)?;
                bundle.metadata.insert(namespace, file, bytes);
            }
            continue;
        }
        if top == "META-INF" {
            continue;
        }
        modules.entry(top).or_default().push((zip_path, *size));
    }

    for (module_name, entries) in modules {
        let module = read_module(&archive_path, &module_name, entries)?;
        bundle.insert_module(module)?;
    }

    bundle.validate()?;
    Ok(bundle)
}

fn read_module(
    archive_path: &Arc<std::path::PathBuf>,
    module_name: &str,
    mut entries: Vec<(ZipPath, u64)>,
) -> Result<Module> {
    if !Module::is_valid_name(module_name) {
        return Err(AabForgeError::invalid_bundle(format!(
            "illegal module name {module_name:?}"
        )));
    }

    let manifest_component_count = module_name.matches('/').count(); // module_name has no slash; kept for clarity
    let _ = manifest_component_count;

    let manifest_path = ZipPath::parse(&format!("{module_name}/{MANIFEST_ENTRY}"))
        .expect("module_name and manifest suffix are both valid components");
    let manifest_index = entries.iter().position(|(p, _)| *p == manifest_path).ok_or_else(|| {
        AabForgeError::invalid_bundle(format!("module {module_name:?} has no AndroidManifest.xml"))
    })?;
    let (_, _) = entries.remove(manifest_index);

    let manifest_bytes = read_entry(archive_path, &manifest_path.to_string())?;
    let manifest_xml = String::from_utf8(manifest_bytes)
        .map_err(|e| AabForgeError::invalid_bundle(format!("manifest is not valid UTF-8: {e}")))?;
    let manifest: Manifest = ManifestParser::parse_string(&manifest_xml)
        .map_err(|e| AabForgeError::invalid_bundle(format!("malformed manifest in {module_name:?}: {e}")))?;

    let module_type = infer_module_type(&manifest);
    let mut module = Module::new(module_name, module_type, manifest)?;

    let stripped: Vec<(ZipPath, ZipPath, u64)> = entries
        .into_iter()
        .map(|(raw_path, size)| {
            let path = strip_module_prefix(&raw_path, module_name);
            (raw_path, path, size)
        })
        .collect();
    let needs_dex_rename = module_needs_dex_rename(stripped.iter().map(|(_, p, _)| p));

    let mut seen = HashSet::new();
    for (raw_path, path, size) in stripped {
        let path = if needs_dex_rename { sanitize_dex_path(&path) } else { path };
        if !seen.insert(path.clone()) {
            return Err(AabForgeError::invalid_bundle(format!(
                "duplicate entry {path} in module {module_name:?}"
            )));
        }
        let source = Arc::new(ZipByteSource::new(
            Arc::clone(archive_path),
            raw_path.to_string(),
            size,
        ));
        module
            .entries
            .insert(path.clone(), crate::model::ModuleEntry::new(path, source));
    }

    debug!(module = module_name, entry_count = module.entries.len(), "ingested module");
    Ok(module)
}

fn strip_module_prefix(path: &ZipPath, module_name: &str) -> ZipPath {
    debug_assert_eq!(path.components().first().map(String::as_str), Some(module_name));
    path.subpath(1, path.name_count())
}

fn infer_module_type(manifest: &Manifest) -> ModuleType {
    match manifest
        .root
        .find_child("module")
        .or_else(|| manifest.root.find_child("dist:module"))
        .and_then(|m| m.attr_by_id_or_name(None, None, "type"))
        .and_then(|a| a.value.as_str())
    {
        Some("ASSET_MODULE") => ModuleType::Asset,
        Some("ML_MODULE") => ModuleType::Ml,
        Some("SDK_DEPENDENCY_MODULE") => ModuleType::SdkDependency,
        _ => ModuleType::Feature,
    }
}

fn list_entries(archive_path: &Path) -> Result<Vec<(String, u64)>> {
    let file = std::fs::File::open(archive_path)?;
    let archive = zip::ZipArchive::new(file).map_err(to_invalid_bundle)?;
    let mut out = Vec::with_capacity(archive.len());
    let mut archive = archive;
    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(to_invalid_bundle)?;
        out.push((entry.name().to_string(), entry.size()));
    }
    Ok(out)
}

fn read_entry(archive_path: &Path, name: &str) -> Result<Vec<u8>> {
    use std::io::Read;
    let file = std::fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(to_invalid_bundle)?;
    let mut entry = archive.by_name(name).map_err(to_invalid_bundle)?;
    let mut buf = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut buf)?;
    Ok(buf)
}

fn to_invalid_bundle(e: zip::result::ZipError) -> AabForgeError {
    warn!(error = %e, "zip archive error while reading bundle");
    AabForgeError::invalid_bundle(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_bundle(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("bundle.zip");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let opts = zip::write::FileOptions::default();

        writer.start_file("base/manifest/AndroidManifest.xml", opts).unwrap();
        writer
            .write_all(br#"<manifest package="com.example.app"><application/></manifest>"#)
            .unwrap();

        writer.start_file("base/dex/classes.dex", opts).unwrap();
        writer.write_all(b"dex-bytes").unwrap();

        writer.start_file("BUNDLE-METADATA/com.android.tools.build.obfuscation/proguard.map", opts).unwrap();
        writer.write_all(b"a -> b").unwrap();

        writer.finish().unwrap();
        path
    }

    #[tokio::test]
    async fn reads_base_module_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bundle(dir.path());

        let bundle = read_bundle(&path).await.unwrap();

        assert!(bundle.modules.contains_key("base"));
        let base = &bundle.modules["base"];
        assert_eq!(base.manifest.package(), Some("com.example.app"));
        assert!(base.entries.contains_key(&ZipPath::parse("dex/classes.dex").unwrap()));

        assert_eq!(
            bundle.metadata.get("com.android.tools.build.obfuscation", "proguard.map"),
            Some(b"a -> b".as_slice())
        );
    }

    #[tokio::test]
    async fn rejects_bundle_without_base_module() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.zip");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("feature/manifest/AndroidManifest.xml", zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(br#"<manifest/>"#).unwrap();
        writer.finish().unwrap();

        let result = read_bundle(&path).await;
        assert!(result.is_err());
    }
}
