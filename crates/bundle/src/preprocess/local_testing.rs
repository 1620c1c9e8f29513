//! Step 4: local-testing rewrite (optional).

use aabforge_core::Result;
use aabforge_manifest::{ManifestEditor, MetadataValue};

use super::Preprocessor;
use crate::model::Bundle;

const LOCAL_TESTING_METADATA_KEY: &str = "com.android.dynamic.apk.fused.local_testing";

pub struct LocalTestingRewrite;

impl Preprocessor for LocalTestingRewrite {
    fn name(&self) -> &'static str {
        "local_testing_rewrite"
    }

    /// No-op unless `BundleConfig::local_testing_suffix` is set. When it
    /// is, every module's split name (if present) gets the suffix
    /// appended and the base module records the suffix as metadata so
    /// the on-device local-testing harness can find it.
    fn apply(&self, mut bundle: Bundle) -> Result<Bundle> {
        let Some(suffix) = bundle.config.local_testing_suffix.clone() else {
            return Ok(bundle);
        };

        for module in bundle.modules.values_mut() {
            let mut editor = ManifestEditor::new(module.manifest.clone());
            if let Some(split_name) = module.manifest.split_name() {
                editor.set_split_id(format!("{split_name}.{suffix}"));
            }
            if module.is_base() {
                editor.add_meta_data(LOCAL_TESTING_METADATA_KEY, MetadataValue::Str(suffix.clone()));
            }
            module.manifest = editor.save();
        }
        Ok(bundle)
    }
}
