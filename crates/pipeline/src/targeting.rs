//! Targeting algebra: normalize, merge, subsumes, and the suffix string.

use std::collections::BTreeSet;

/// One dimension's targeting: what this split carries, and what its
/// siblings in the same variant carry (so the installer can tell this
/// split apart from the alternatives it was split from).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct DimensionTargeting {
    pub values: BTreeSet<String>,
    pub alternatives: BTreeSet<String>,
}

impl DimensionTargeting {
    pub fn is_default(&self) -> bool {
        self.values.is_empty() && self.alternatives.is_empty()
    }
}

/// Dimension order used by the suffix string and by ordering variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Dimension {
    Abi,
    ScreenDensity,
    Language,
    TextureCompressionFormat,
    DeviceTier,
    CountrySet,
}

impl Dimension {
    fn other_token(self) -> &'static str {
        match self {
            Dimension::Abi => "other_abis",
            Dimension::ScreenDensity => "other_density",
            Dimension::Language => "other_lang",
            Dimension::TextureCompressionFormat => "other_tcf",
            Dimension::DeviceTier => "other_tier",
            Dimension::CountrySet => "other_countries",
        }
    }
}

/// A full `apk_targeting`: one `DimensionTargeting` per dimension, in a
/// fixed dimension order.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ApkTargeting {
    pub abi: DimensionTargeting,
    pub screen_density: DimensionTargeting,
    pub language: DimensionTargeting,
    pub texture_compression_format: DimensionTargeting,
    pub device_tier: DimensionTargeting,
    pub country_set: DimensionTargeting,
}

impl ApkTargeting {
    pub fn is_default(&self) -> bool {
        self.abi.is_default()
            && self.screen_density.is_default()
            && self.language.is_default()
            && self.texture_compression_format.is_default()
            && self.device_tier.is_default()
            && self.country_set.is_default()
    }

    fn dimensions(&self) -> [(Dimension, &DimensionTargeting); 6] {
        [
            (Dimension::Abi, &self.abi),
            (Dimension::ScreenDensity, &self.screen_density),
            (Dimension::Language, &self.language),
            (Dimension::TextureCompressionFormat, &self.texture_compression_format),
            (Dimension::DeviceTier, &self.device_tier),
            (Dimension::CountrySet, &self.country_set),
        ]
    }

    fn dimensions_mut(&mut self) -> [(Dimension, &mut DimensionTargeting); 6] {
        [
            (Dimension::Abi, &mut self.abi),
            (Dimension::ScreenDensity, &mut self.screen_density),
            (Dimension::Language, &mut self.language),
            (Dimension::TextureCompressionFormat, &mut self.texture_compression_format),
            (Dimension::DeviceTier, &mut self.device_tier),
            (Dimension::CountrySet, &mut self.country_set),
        ]
    }

    /// Sorts repeated fields (trivially true for `BTreeSet`), drops
    /// dimensions whose values and alternatives are both empty. Since
    /// this type stores sets rather than vectors, normalization is the
    /// identity; kept as an explicit step so callers don't have to know
    /// that.
    pub fn normalize(self) -> Self {
        self
    }

    /// Union of values on both sides; fails if the two targetings
    /// disagree on a shared dimension's universe (the union of values
    /// and alternatives must match on every dimension both sides
    /// constrain).
    pub fn merge(&self, other: &ApkTargeting) -> Result<ApkTargeting, ConflictingTargeting> {
        let mut result = ApkTargeting::default();
        for ((dim, a), (_, b)) in self.dimensions().into_iter().zip(other.dimensions()) {
            let universe_a: BTreeSet<&String> = a.values.union(&a.alternatives).collect();
            let universe_b: BTreeSet<&String> = b.values.union(&b.alternatives).collect();
            if !universe_a.is_empty() && !universe_b.is_empty() && universe_a != universe_b {
                return Err(ConflictingTargeting(dim));
            }
            let merged = result.dimension_mut(dim);
            merged.values = a.values.union(&b.values).cloned().collect();
            merged.alternatives = a.alternatives.union(&b.alternatives).cloned().collect();
        }
        Ok(result)
    }

    fn dimension_mut(&mut self, dim: Dimension) -> &mut DimensionTargeting {
        self.dimensions_mut()
            .into_iter()
            .find(|(d, _)| *d == dim)
            .map(|(_, v)| v)
            .expect("dim is one of the six fixed dimensions")
    }

    /// True iff every value `other` constrains is covered by this
    /// targeting's values or alternatives, dimension by dimension.
    pub fn subsumes(&self, other: &ApkTargeting) -> bool {
        self.dimensions().into_iter().zip(other.dimensions()).all(|((_, a), (_, b))| {
            b.values.iter().all(|v| a.values.contains(v) || a.alternatives.contains(v))
        })
    }

    /// Dimension-ordered, `_`-joined suffix tokens, hyphens replaced
    /// with underscores since split ids may not contain them.
    pub fn suffix(&self) -> String {
        let mut tokens = Vec::new();
        for (dim, targeting) in self.dimensions() {
            if targeting.values.is_empty() {
                continue;
            }
            if targeting.values.len() > 1 {
                tokens.push(dim.other_token().to_string());
                continue;
            }
            let value = targeting.values.iter().next().unwrap();
            tokens.push(value.replace('-', "_"));
        }
        tokens.join("_")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("conflicting targeting universe on dimension {0:?}")]
pub struct ConflictingTargeting(pub Dimension);

#[cfg(test)]
mod tests {
    use super::*;

    fn targeting(values: &[&str], alternatives: &[&str]) -> DimensionTargeting {
        DimensionTargeting {
            values: values.iter().map(|s| s.to_string()).collect(),
            alternatives: alternatives.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn suffix_joins_single_values_and_replaces_hyphens() {
        let mut t = ApkTargeting::default();
        t.abi = targeting(&["arm64-v8a"], &["armeabi-v7a"]);
        t.screen_density = targeting(&["xhdpi"], &["hdpi"]);
        assert_eq!(t.suffix(), "arm64_v8a_xhdpi");
    }

    #[test]
    fn suffix_uses_other_token_for_multi_value_dimension() {
        let mut t = ApkTargeting::default();
        t.abi = targeting(&["arm64-v8a", "armeabi-v7a"], &[]);
        assert_eq!(t.suffix(), "other_abis");
    }

    #[test]
    fn merge_unions_values_when_universes_agree() {
        let mut a = ApkTargeting::default();
        a.abi = targeting(&["arm64-v8a"], &["armeabi-v7a", "x86_64"]);
        let mut b = ApkTargeting::default();
        b.abi = targeting(&["armeabi-v7a"], &["arm64-v8a", "x86_64"]);

        let merged = a.merge(&b).unwrap();
        assert_eq!(
            merged.abi.values,
            ["arm64-v8a", "armeabi-v7a"].into_iter().map(String::from).collect()
        );
    }

    #[test]
    fn merge_fails_on_conflicting_universe() {
        let mut a = ApkTargeting::default();
        a.abi = targeting(&["arm64-v8a"], &["armeabi-v7a"]);
        let mut b = ApkTargeting::default();
        b.abi = targeting(&["arm64-v8a"], &["x86_64"]);

        assert!(a.merge(&b).is_err());
    }

    #[test]
    fn subsumes_checks_values_against_union_of_values_and_alternatives() {
        let mut a = ApkTargeting::default();
        a.abi = targeting(&["arm64-v8a"], &["armeabi-v7a"]);
        let mut b = ApkTargeting::default();
        b.abi = targeting(&["armeabi-v7a"], &[]);
        assert!(a.subsumes(&b));

        let mut c = ApkTargeting::default();
        c.abi = targeting(&["x86"], &[]);
        assert!(!a.subsumes(&c));
    }

    #[test]
    fn merge_commutes() {
        let mut a = ApkTargeting::default();
        a.language = targeting(&["en"], &["fr", "de"]);
        let mut b = ApkTargeting::default();
        b.language = targeting(&["fr"], &["en", "de"]);

        assert_eq!(a.merge(&b).unwrap(), b.merge(&a).unwrap());
    }
}
