//! The fixed-order preprocessor pipeline applied to a freshly-ingested
//! bundle before variant planning and splitting see it.

mod asset_obfuscation;
mod compression_policy;
mod embedded_apk_signing;
mod local_testing;
mod native_pruning;
mod sdk_dependency_injection;

pub use asset_obfuscation::AssetObfuscation;
pub use compression_policy::EntryCompressionPolicy;
pub use embedded_apk_signing::EmbeddedApkSigningMarker;
pub use local_testing::LocalTestingRewrite;
pub use native_pruning::Native64BitPruning;
pub use sdk_dependency_injection::SdkDependencyInjection;

use aabforge_core::Result;
use crate::model::Bundle;

/// A pure `Bundle -> Bundle` transformation.
pub trait Preprocessor {
    fn name(&self) -> &'static str;
    fn apply(&self, bundle: Bundle) -> Result<Bundle>;
}

/// Runs the fixed-order preprocessor pipeline: native pruning, entry
/// compression policy, embedded-APK signing markers, local-testing
/// rewrite, runtime-enabled SDK dependency injection, asset obfuscation.
pub fn run_preprocessors(bundle: Bundle) -> Result<Bundle> {
    let pipeline: Vec<Box<dyn Preprocessor>> = vec![
        Box::new(Native64BitPruning),
        Box::new(EntryCompressionPolicy),
        Box::new(EmbeddedApkSigningMarker),
        Box::new(LocalTestingRewrite),
        Box::new(SdkDependencyInjection),
        Box::new(AssetObfuscation),
    ];

    let mut bundle = bundle;
    for step in &pipeline {
        tracing::debug!(step = step.name(), "running preprocessor");
        bundle = step.apply(bundle)?;
    }
    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BundleConfig, Module, ModuleType};
    use aabforge_manifest::{tree::XmlNode, Manifest};

    #[test]
    fn pipeline_runs_over_an_empty_base_module_without_error() {
        let mut bundle = Bundle::new(BundleConfig::default());
        let module = Module::new("base", ModuleType::Feature, Manifest::new(XmlNode::new("manifest"))).unwrap();
        bundle.insert_module(module).unwrap();

        let result = run_preprocessors(bundle);
        assert!(result.is_ok());
    }
}
