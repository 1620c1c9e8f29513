//! The [`Variant`]/[`VariantTargeting`] types and the variant planner.

use aabforge_bundle::{Bundle, ModuleEntry, ResourceTable};
use aabforge_core::{OptimizationEra, ZipPath};
use aabforge_manifest::Manifest;
use indexmap::IndexMap;

use crate::targeting::ApkTargeting;

/// Targeting that distinguishes whole variants from one another. A
/// device selects exactly one variant; it never mixes splits across
/// variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct VariantTargeting {
    pub min_sdk: u32,
    pub texture_compression_format: Option<String>,
    pub screen_density: Option<String>,
}

/// The kind of split a [`ModuleSplit`] is. Devices consume a `split`
/// plus its master; pre-Lollipop devices instead get one `standalone`
/// archive holding everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitType {
    Instant,
    Standalone,
    Split,
    AssetSlice,
    Archive,
    System,
}

impl SplitType {
    /// `instant < standalone < split < asset-slice < archive < system`.
    /// `AssetSlice` is not ordered in the data model's ordering rule;
    /// it is placed immediately after `Split` since asset slices are
    /// delivered the same way split APKs are. See `DESIGN.md`.
    fn order(self) -> u8 {
        match self {
            SplitType::Instant => 0,
            SplitType::Standalone => 1,
            SplitType::Split => 2,
            SplitType::AssetSlice => 3,
            SplitType::Archive => 4,
            SplitType::System => 5,
        }
    }
}

impl PartialOrd for SplitType {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SplitType {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.order().cmp(&other.order())
    }
}

/// A family of splits a device selects as a whole.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Variant {
    pub split_type: SplitType,
    pub variant_targeting: VariantTargeting,
}

/// The splitter's output unit.
#[derive(Debug, Clone)]
pub struct ModuleSplit {
    pub apk_targeting: ApkTargeting,
    pub variant_targeting: VariantTargeting,
    pub split_type: SplitType,
    pub is_master: bool,
    pub module_name: String,
    pub manifest: Manifest,
    pub resource_table: Option<ResourceTable>,
    pub entries: IndexMap<ZipPath, ModuleEntry>,
}

impl ModuleSplit {
    /// A fresh split carrying the default (empty) `apk_targeting`, as
    /// every splitter's input contract requires.
    pub fn new_master(
        module_name: impl Into<String>,
        variant_targeting: VariantTargeting,
        manifest: Manifest,
        resource_table: Option<ResourceTable>,
        entries: IndexMap<ZipPath, ModuleEntry>,
    ) -> Self {
        ModuleSplit {
            apk_targeting: ApkTargeting::default(),
            variant_targeting,
            split_type: SplitType::Split,
            is_master: true,
            module_name: module_name.into(),
            manifest,
            resource_table,
            entries,
        }
    }
}

/// Enumerates the variants a bundle must be split for: the unconditional
/// API-21 default plus one variant per boundary the configured
/// optimization era introduces.
pub fn plan_variants(_bundle: &Bundle, era: OptimizationEra) -> Vec<VariantTargeting> {
    let mut targetings: Vec<VariantTargeting> = vec![VariantTargeting {
        min_sdk: 21,
        texture_compression_format: None,
        screen_density: None,
    }];

    for boundary in era.variant_boundaries() {
        targetings.push(VariantTargeting {
            min_sdk: *boundary,
            texture_compression_format: None,
            screen_density: None,
        });
    }

    targetings.sort();
    targetings.dedup();
    targetings
}

#[cfg(test)]
mod tests {
    use super::*;
    use aabforge_bundle::BundleConfig;

    #[test]
    fn baseline_era_produces_only_the_default_variant() {
        let bundle = Bundle::new(BundleConfig::default());
        let variants = plan_variants(&bundle, OptimizationEra::Baseline);
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].min_sdk, 21);
    }

    #[test]
    fn current_era_adds_one_variant_per_boundary() {
        let bundle = Bundle::new(BundleConfig::default());
        let variants = plan_variants(&bundle, OptimizationEra::Current);
        let min_sdks: Vec<u32> = variants.iter().map(|v| v.min_sdk).collect();
        assert_eq!(min_sdks, vec![21, 23, 28]);
    }

    #[test]
    fn split_type_ordering_matches_the_documented_order() {
        assert!(SplitType::Instant < SplitType::Standalone);
        assert!(SplitType::Standalone < SplitType::Split);
        assert!(SplitType::Split < SplitType::Archive);
        assert!(SplitType::Archive < SplitType::System);
    }
}
