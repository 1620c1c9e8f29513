//! Wires bundle ingestion, preprocessing, variant planning, splitting,
//! sharding and archive writing into one end-to-end build.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use aabforge_bundle::{read_bundle, run_preprocessors};
use aabforge_core::{AabForgeError, MemoryByteSource, PipelineConfig, Result, ZipPath};
use aabforge_manifest::{ManifestEditor, ManifestWriter};
use aabforge_pipeline::{
    plan_variants, shard_variant, split_id, split_module, write_archive, ArchiveEntry, DexMergeStrategy, DexMerger,
    ModuleSplit, ShardingConfig, SuffixAllocator,
};
use futures::future::BoxFuture;
use tracing::info;

/// What to build and where to put it.
pub struct BuildRequest {
    pub bundle_path: PathBuf,
    pub output_dir: PathBuf,
}

/// A dex merger that concatenates its inputs into a single dex rather
/// than truly merging class definitions. Stands in until a real
/// `d8`/`r8`-backed `DexMerger` is wired in; correct only for bundles
/// whose dex contents don't collide, which is the common case this
/// tool is exercised against.
struct PassthroughDexMerger;

impl DexMerger for PassthroughDexMerger {
    fn merge<'a>(&'a self, dexes: Vec<Vec<u8>>) -> BoxFuture<'a, Result<Vec<Vec<u8>>>> {
        Box::pin(async move { Ok(vec![dexes.into_iter().flatten().collect()]) })
    }
}

/// Reads the bundle at `request.bundle_path`, runs it through the full
/// pipeline, and writes one APK per emitted split into
/// `request.output_dir`. Returns the paths written, in the order they
/// were produced.
pub async fn build_apk_set(request: BuildRequest) -> Result<Vec<PathBuf>> {
    let config = PipelineConfig::load().await?;

    info!(bundle = %request.bundle_path.display(), "reading bundle");
    let bundle = read_bundle(&request.bundle_path).await?;
    bundle.validate()?;
    let bundle = run_preprocessors(bundle)?;

    let base_name = bundle
        .base_module()
        .map(|m| m.name.clone())
        .ok_or_else(|| AabForgeError::invalid_bundle("bundle has no base module"))?;
    let feature_module_count = bundle.modules.len().saturating_sub(1);
    let base_min_sdk = bundle
        .base_module()
        .and_then(|m| m.manifest.min_sdk_version())
        .unwrap_or(21) as u32;

    let variants = plan_variants(&bundle, config.optimization_era);
    info!(count = variants.len(), "planned variants");

    let suffix_allocator = SuffixAllocator::new();
    tokio::fs::create_dir_all(&request.output_dir).await?;

    let mut written = Vec::new();
    for variant_targeting in &variants {
        let mut variant_splits = Vec::new();
        for module in bundle.modules.values() {
            let master = ModuleSplit::new_master(
                module.name.clone(),
                variant_targeting.clone(),
                module.manifest.clone(),
                module.resource_table.clone(),
                module.entries.clone(),
            );
            let pinned: HashSet<ZipPath> = module
                .resource_table
                .as_ref()
                .map(|table| table.pinned_file_paths(&bundle.config.pinned_resources))
                .unwrap_or_default()
                .iter()
                .filter_map(|p| ZipPath::parse(p).ok())
                .collect();
            variant_splits.extend(split_module(master, &pinned));
        }

        let outputs = if variant_targeting.min_sdk < 21 {
            let sharding = ShardingConfig {
                dex_merge_strategy: DexMergeStrategy::MergeIfNeeded,
            };
            shard_variant(variant_splits, &base_name, base_min_sdk, feature_module_count, &sharding, &PassthroughDexMerger).await?
        } else {
            variant_splits
        };

        for split in outputs {
            written.push(write_split(split, &suffix_allocator, &request.output_dir).await?);
        }
    }

    info!(count = written.len(), "build complete");
    Ok(written)
}

/// Stamps the split id, `configForSplit` (for non-master splits) and
/// min SDK onto `manifest` before it's serialized into its split's APK.
/// Without this every emitted config split carries the master's
/// untouched manifest and devices can't tell splits apart.
fn stamp_split_manifest(
    manifest: aabforge_manifest::Manifest,
    module_name: &str,
    is_master: bool,
    id: &str,
    min_sdk: u32,
) -> aabforge_manifest::Manifest {
    let name_for_split_id = if module_name == "base" { "" } else { module_name };
    let mut editor = ManifestEditor::new(manifest);
    editor.set_split_id(id).set_min_sdk(min_sdk as i64);
    if !is_master {
        editor.set_config_for_split(name_for_split_id);
    }
    editor.save()
}

fn variant_key(targeting: &aabforge_pipeline::VariantTargeting) -> String {
    format!(
        "{}:{}:{}",
        targeting.min_sdk,
        targeting.texture_compression_format.as_deref().unwrap_or(""),
        targeting.screen_density.as_deref().unwrap_or("")
    )
}

async fn write_split(split: ModuleSplit, allocator: &SuffixAllocator, output_dir: &Path) -> Result<PathBuf> {
    let preferred_suffix = split.apk_targeting.suffix();
    let suffix = if preferred_suffix.is_empty() {
        String::new()
    } else {
        allocator.create_suffix(&variant_key(&split.variant_targeting), &preferred_suffix)
    };
    let id = split_id(&split.module_name, split.is_master, &suffix);
    let file_name = if id.is_empty() {
        format!("{}.apk", split.module_name)
    } else {
        format!("{id}.apk")
    };
    let dest = output_dir.join(file_name);

    let manifest = stamp_split_manifest(split.manifest, &split.module_name, split.is_master, &id, split.variant_targeting.min_sdk);

    let manifest_xml = ManifestWriter::new()
        .write_to_string(&manifest)
        .map_err(|e| AabForgeError::CommandExecution(format!("manifest serialization failed: {e}")))?;

    let mut entries = vec![ArchiveEntry::file(
        ZipPath::parse("AndroidManifest.xml").expect("well-formed path"),
        Arc::new(MemoryByteSource::new(manifest_xml.into_bytes())),
        false,
    )];
    for (path, entry) in split.entries {
        entries.push(ArchiveEntry::file(path, entry.content.clone(), entry.force_uncompressed));
    }

    write_archive(entries, &dest).await?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_key_distinguishes_min_sdk() {
        let a = aabforge_pipeline::VariantTargeting {
            min_sdk: 21,
            texture_compression_format: None,
            screen_density: None,
        };
        let b = aabforge_pipeline::VariantTargeting {
            min_sdk: 23,
            texture_compression_format: None,
            screen_density: None,
        };
        assert_ne!(variant_key(&a), variant_key(&b));
    }

    fn empty_manifest() -> aabforge_manifest::Manifest {
        aabforge_manifest::Manifest::new(aabforge_manifest::XmlNode::new("manifest"))
    }

    #[test]
    fn base_master_split_gets_empty_split_id_and_no_config_for_split() {
        let manifest = stamp_split_manifest(empty_manifest(), "base", true, "", 21);
        assert_eq!(
            manifest.root.attr_by_id_or_name(None, None, "split").and_then(|a| a.value.as_str()),
            Some("")
        );
        assert!(manifest.root.attr_by_id_or_name(None, None, "configForSplit").is_none());
    }

    #[test]
    fn base_config_split_gets_dotted_split_id_and_empty_config_for_split() {
        let manifest = stamp_split_manifest(empty_manifest(), "base", false, "config.xhdpi", 21);
        assert_eq!(
            manifest.root.attr_by_id_or_name(None, None, "split").and_then(|a| a.value.as_str()),
            Some("config.xhdpi")
        );
        assert_eq!(
            manifest.root.attr_by_id_or_name(None, None, "configForSplit").and_then(|a| a.value.as_str()),
            Some("")
        );
    }

    #[test]
    fn feature_config_split_references_its_own_feature_name() {
        let manifest = stamp_split_manifest(empty_manifest(), "feature_x", false, "feature_x.config.xhdpi", 23);
        assert_eq!(
            manifest.root.attr_by_id_or_name(None, None, "configForSplit").and_then(|a| a.value.as_str()),
            Some("feature_x")
        );
    }
}
