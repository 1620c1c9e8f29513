//! Splits a module by locale qualifier on `res/` directories and on
//! `assets/` directories.

use aabforge_core::ZipPath;
use std::collections::HashSet;

use super::common::split_by_qualifier;
use crate::variant::ModuleSplit;

/// A BCP-47-ish locale qualifier: two or three lowercase letters,
/// optionally followed by `-r<REGION>` or `-b+<lang>+<region>`. Real
/// resource-config parsing is far more exhaustive; this covers the
/// common `-en`, `-fr`, `-en-rUS` shapes.
fn locale_qualifier(segment: &str) -> Option<String> {
    let base = segment.split('-').find(|part| {
        part.len() == 2 || part.len() == 3
    })?;
    if base.chars().all(|c| c.is_ascii_lowercase()) {
        Some(base.to_string())
    } else {
        None
    }
}

pub fn split_by_language(input: ModuleSplit, pinned: &HashSet<ZipPath>) -> Vec<ModuleSplit> {
    split_by_qualifier(
        input,
        pinned,
        |path| {
            let top = path.components().first().map(String::as_str)?;
            if (top != "res" && top != "assets") || path.name_count() < 2 {
                return None;
            }
            locale_qualifier(&path.components()[1])
        },
        |targeting, dimension| targeting.language = dimension,
    )
}
