//! Shared machinery every dimension splitter is built from.
//!
//! Splitters key entries by a qualifier extracted from their path (the
//! ABI segment of `lib/<abi>/...`, the density suffix of a `res/`
//! directory, a locale or texture-format or device-tier or country-set
//! suffix on an `assets/` directory). Entries with no qualifier stay on
//! the master split; entries with a qualifier get partitioned into one
//! split per distinct value, with `apk_targeting` set to that value and
//! every other observed value recorded as an alternative.

use aabforge_core::ZipPath;
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashSet};

use crate::targeting::DimensionTargeting;
use crate::variant::ModuleSplit;

/// Splits `input` by the qualifier `key_of` extracts from each entry
/// path. Returns the input unchanged (satisfying the splitter contract)
/// if its `apk_targeting` is not the default. Entries named in `pinned`
/// stay on the master split regardless of what `key_of` would otherwise
/// partition them into.
pub fn split_by_qualifier(
    input: ModuleSplit,
    pinned: &HashSet<ZipPath>,
    key_of: impl Fn(&ZipPath) -> Option<String>,
    set_dimension: impl Fn(&mut crate::targeting::ApkTargeting, DimensionTargeting),
) -> Vec<ModuleSplit> {
    if !input.apk_targeting.is_default() {
        return vec![input];
    }

    let shell = input.clone_shell();
    let mut by_key: IndexMap<String, IndexMap<ZipPath, aabforge_bundle::ModuleEntry>> = IndexMap::new();
    let mut master_entries: IndexMap<ZipPath, aabforge_bundle::ModuleEntry> = IndexMap::new();

    for (path, entry) in input.entries {
        match if pinned.contains(&path) { None } else { key_of(&path) } {
            Some(key) => {
                by_key.entry(key).or_default().insert(path, entry);
            }
            None => {
                master_entries.insert(path, entry);
            }
        }
    }

    if by_key.is_empty() {
        let mut master = shell.clone_shell();
        master.entries = master_entries;
        return vec![master];
    }

    let all_values: BTreeSet<String> = by_key.keys().cloned().collect();

    let mut splits = Vec::with_capacity(by_key.len() + 1);

    let mut master = shell.clone_shell();
    master.entries = master_entries;
    master.is_master = true;
    splits.push(master);

    for (value, entries) in by_key {
        let mut split = shell.clone_shell();
        split.is_master = false;
        split.entries = entries;
        let alternatives: BTreeSet<String> = all_values.iter().filter(|v| **v != value).cloned().collect();
        set_dimension(
            &mut split.apk_targeting,
            DimensionTargeting {
                values: [value].into_iter().collect(),
                alternatives,
            },
        );
        splits.push(split);
    }

    splits
}

impl ModuleSplit {
    /// A copy of every field except `entries`, which starts empty —
    /// used by splitters to stamp out sibling splits from one input.
    pub(crate) fn clone_shell(&self) -> ModuleSplit {
        ModuleSplit {
            apk_targeting: self.apk_targeting.clone(),
            variant_targeting: self.variant_targeting.clone(),
            split_type: self.split_type,
            is_master: self.is_master,
            module_name: self.module_name.clone(),
            manifest: self.manifest.clone(),
            resource_table: self.resource_table.clone(),
            entries: IndexMap::new(),
        }
    }
}
