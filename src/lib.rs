//! aabforge: transforms an Android App Bundle into a device-installable
//! APK set.
//!
//! The crate is a thin orchestration layer over `aabforge-bundle`
//! (ingestion and preprocessing) and `aabforge-pipeline` (variant
//! planning, splitting, sharding, and archive writing); the real work
//! lives in those crates so it can be exercised without a CLI.

pub mod orchestrate;

pub use aabforge_bundle as bundle;
pub use aabforge_core as core;
pub use aabforge_manifest as manifest;
pub use aabforge_pipeline as pipeline;

pub use orchestrate::{build_apk_set, BuildRequest};
