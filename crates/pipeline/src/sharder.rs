//! Sharder / merger: fuses a variant's module splits into standalone
//! archives for devices that cannot install multiple split APKs.
//!
//! Sharding is driven by the ABI and screen-density dimensions, the two
//! that realistically vary a device's installable set; the other four
//! dimensions stay attached to whichever split carried them (a
//! standalone archive still ships every language/texture/tier/country
//! variant it contains, it just isn't cross-producted over them).

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

use aabforge_bundle::ModuleEntry;
use aabforge_core::{AabForgeError, Result, ZipPath};
use futures::future::BoxFuture;
use indexmap::IndexMap;

use crate::targeting::ApkTargeting;
use crate::variant::{ModuleSplit, SplitType};

/// How aggressively dex files are merged when fusing modules that each
/// ship their own dex into one standalone archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DexMergeStrategy {
    /// Merge only if the base module's `minSdkVersion` is below 21 and
    /// more than one feature module contributes dex files.
    MergeIfNeeded,
    /// Never invoke the external merger; renumber and concatenate dex
    /// files from each module instead.
    Never,
}

#[derive(Debug, Clone, Copy)]
pub struct ShardingConfig {
    pub dex_merge_strategy: DexMergeStrategy,
}

impl Default for ShardingConfig {
    fn default() -> Self {
        ShardingConfig {
            dex_merge_strategy: DexMergeStrategy::MergeIfNeeded,
        }
    }
}

/// External dex-merging tool, invoked only when [`DexMergeStrategy::MergeIfNeeded`]
/// applies. Implementation is free; the core only needs the contract.
pub trait DexMerger: Send + Sync {
    fn merge<'a>(&'a self, dexes: Vec<Vec<u8>>) -> BoxFuture<'a, Result<Vec<Vec<u8>>>>;
}

/// Fuses every split belonging to one variant, across every module,
/// into one standalone [`ModuleSplit`] per distinct ABI/density
/// combination actually present in the input.
///
/// `base_module_name` identifies which module's manifest and resource
/// table the fused archive carries forward; `feature_module_count` is
/// the number of non-base modules in the bundle, used by the dex-merge
/// decision.
pub async fn shard_variant(
    splits: Vec<ModuleSplit>,
    base_module_name: &str,
    base_min_sdk: u32,
    feature_module_count: usize,
    config: &ShardingConfig,
    dex_merger: &dyn DexMerger,
) -> Result<Vec<ModuleSplit>> {
    let mut by_module: IndexMap<String, Vec<ModuleSplit>> = IndexMap::new();
    for split in splits {
        by_module.entry(split.module_name.clone()).or_default().push(split);
    }

    merge_targeted_asset_directories(&by_module)?;

    let all_abis = distinct_values(&by_module, |t| &t.abi);
    let all_densities = distinct_values(&by_module, |t| &t.screen_density);

    let abi_choices: Vec<Option<String>> = if all_abis.is_empty() {
        vec![None]
    } else {
        all_abis.iter().cloned().map(Some).collect()
    };
    let density_choices: Vec<Option<String>> = if all_densities.is_empty() {
        vec![None]
    } else {
        all_densities.iter().cloned().map(Some).collect()
    };

    let should_merge_dex =
        config.dex_merge_strategy == DexMergeStrategy::MergeIfNeeded && base_min_sdk < 21 && feature_module_count > 1;

    let mut standalones = Vec::with_capacity(abi_choices.len() * density_choices.len());
    for abi in &abi_choices {
        for density in &density_choices {
            standalones.push(fuse_one(&by_module, base_module_name, abi.as_deref(), density.as_deref(), &all_abis, &all_densities, should_merge_dex, dex_merger).await?);
        }
    }
    Ok(standalones)
}

fn distinct_values(by_module: &IndexMap<String, Vec<ModuleSplit>>, pick: impl Fn(&ApkTargeting) -> &crate::targeting::DimensionTargeting) -> BTreeSet<String> {
    let mut values = BTreeSet::new();
    for splits in by_module.values() {
        for split in splits {
            values.extend(pick(&split.apk_targeting).values.iter().cloned());
        }
    }
    values
}

fn module_splits_for<'a>(splits: &'a [ModuleSplit], abi: Option<&str>, density: Option<&str>) -> Vec<&'a ModuleSplit> {
    splits
        .iter()
        .filter(|s| {
            let abi_matches = s.apk_targeting.abi.values.is_empty()
                || abi.map(|a| s.apk_targeting.abi.values.contains(a)).unwrap_or(false);
            let density_matches = s.apk_targeting.screen_density.values.is_empty()
                || density.map(|d| s.apk_targeting.screen_density.values.contains(d)).unwrap_or(false);
            abi_matches && density_matches
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
async fn fuse_one(
    by_module: &IndexMap<String, Vec<ModuleSplit>>,
    base_module_name: &str,
    abi: Option<&str>,
    density: Option<&str>,
    all_abis: &BTreeSet<String>,
    all_densities: &BTreeSet<String>,
    should_merge_dex: bool,
    dex_merger: &dyn DexMerger,
) -> Result<ModuleSplit> {
    let mut entries: IndexMap<ZipPath, ModuleEntry> = IndexMap::new();
    let mut combined_targeting = ApkTargeting::default();
    let mut dex_sources: Vec<(usize, Vec<u8>)> = Vec::new();

    for splits in by_module.values() {
        let chosen = module_splits_for(splits, abi, density);
        for split in &chosen {
            combined_targeting = combined_targeting
                .merge(&split.apk_targeting)
                .map_err(|e| AabForgeError::invalid_bundle(format!("cannot fuse standalone archive: {e}")))?;

            for (path, entry) in &split.entries {
                if path.name_count() == 2 && path.components()[0] == "dex" {
                    let mut bytes = Vec::new();
                    entry.content.open_stream()?.read_to_end(&mut bytes)?;
                    dex_sources.push((dex_sources.len(), bytes));
                    continue;
                }
                if entries.insert(path.clone(), entry.clone()).is_some() {
                    return Err(AabForgeError::invalid_bundle(format!(
                        "duplicate entry {path} when fusing standalone archive"
                    )));
                }
            }
        }
    }

    let final_dexes = if should_merge_dex && dex_sources.len() > 1 {
        dex_merger.merge(dex_sources.into_iter().map(|(_, bytes)| bytes).collect()).await?
    } else {
        dex_sources.into_iter().map(|(_, bytes)| bytes).collect()
    };
    for (index, bytes) in final_dexes.into_iter().enumerate() {
        let name = if index == 0 { "dex/classes.dex".to_string() } else { format!("dex/classes{}.dex", index + 1) };
        let path = ZipPath::parse(&name).expect("well-formed dex path");
        entries.insert(path.clone(), ModuleEntry::new(path, std::sync::Arc::new(aabforge_core::MemoryByteSource::new(bytes))));
    }

    if let Some(abi) = abi {
        combined_targeting.abi.values = [abi.to_string()].into_iter().collect();
        combined_targeting.abi.alternatives = all_abis.iter().filter(|a| a.as_str() != abi).cloned().collect();
    }
    if let Some(density) = density {
        combined_targeting.screen_density.values = [density.to_string()].into_iter().collect();
        combined_targeting.screen_density.alternatives = all_densities.iter().filter(|d| d.as_str() != density).cloned().collect();
    }

    let base_splits = by_module.get(base_module_name).ok_or_else(|| {
        AabForgeError::invalid_bundle(format!("base module {base_module_name:?} missing from sharding input"))
    })?;
    let base_master = base_splits
        .iter()
        .find(|s| s.is_master)
        .ok_or_else(|| AabForgeError::invalid_bundle("base module has no master split to fuse from"))?;

    Ok(ModuleSplit {
        apk_targeting: combined_targeting.normalize(),
        variant_targeting: base_master.variant_targeting.clone(),
        split_type: SplitType::Standalone,
        is_master: true,
        module_name: base_module_name.to_string(),
        manifest: base_master.manifest.clone(),
        resource_table: base_master.resource_table.clone(),
        entries,
    })
}

/// When two modules declare assets under the same directory path, their
/// targeting must match exactly, or the bundle is invalid.
fn merge_targeted_asset_directories(by_module: &IndexMap<String, Vec<ModuleSplit>>) -> Result<()> {
    let mut seen: BTreeMap<String, ApkTargeting> = BTreeMap::new();
    for splits in by_module.values() {
        for split in splits {
            for path in split.entries.keys() {
                if path.components().first().map(String::as_str) != Some("assets") || path.name_count() < 2 {
                    continue;
                }
                let dir = path.components()[..path.name_count() - 1].join("/");
                match seen.get(&dir) {
                    Some(existing) if *existing != split.apk_targeting => {
                        return Err(AabForgeError::invalid_bundle(format!(
                            "asset directory {dir:?} declared with conflicting targeting across modules"
                        )));
                    }
                    Some(_) => {}
                    None => {
                        seen.insert(dir, split.apk_targeting.clone());
                    }
                }
            }
        }
    }
    Ok(())
}
