//! A process-wide, thread-safe `variant_targeting -> set<suffix>`
//! allocator, guaranteeing every split in a variant gets a unique suffix
//! even when two splits would otherwise compute the same one.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

#[derive(Default)]
pub struct SuffixAllocator {
    allocated: Mutex<HashMap<String, HashSet<String>>>,
}

impl SuffixAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `preferred_suffix` if it is unused within `variant_key`,
    /// otherwise appends `_2`, `_3`, ... until an unused suffix is
    /// found, records the choice, and returns it. Callers offering
    /// splits for the same variant from multiple threads must still
    /// offer them in a stable order for the result to be deterministic.
    pub fn create_suffix(&self, variant_key: &str, preferred_suffix: &str) -> String {
        let mut allocated = self.allocated.lock();
        let used = allocated.entry(variant_key.to_string()).or_default();

        if !used.contains(preferred_suffix) {
            used.insert(preferred_suffix.to_string());
            return preferred_suffix.to_string();
        }

        let mut attempt = 2u32;
        loop {
            let candidate = format!("{preferred_suffix}_{attempt}");
            if !used.contains(&candidate) {
                used.insert(candidate.clone());
                return candidate;
            }
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_offer_keeps_preferred_suffix() {
        let allocator = SuffixAllocator::new();
        assert_eq!(allocator.create_suffix("v1", "arm64_v8a"), "arm64_v8a");
    }

    #[test]
    fn colliding_offers_get_distinct_suffixes() {
        let allocator = SuffixAllocator::new();
        let a = allocator.create_suffix("v1", "xhdpi");
        let b = allocator.create_suffix("v1", "xhdpi");
        let c = allocator.create_suffix("v1", "xhdpi");
        assert_eq!(a, "xhdpi");
        assert_eq!(b, "xhdpi_2");
        assert_eq!(c, "xhdpi_3");
    }

    #[test]
    fn different_variants_do_not_share_suffix_namespaces() {
        let allocator = SuffixAllocator::new();
        assert_eq!(allocator.create_suffix("v1", "xhdpi"), "xhdpi");
        assert_eq!(allocator.create_suffix("v2", "xhdpi"), "xhdpi");
    }
}
