//! Variant planning, module splitting, sharding and archive writing: the
//! part of the pipeline downstream of bundle ingestion and the
//! preprocessors in `aabforge-bundle`.

pub mod archive_writer;
pub mod sharder;
pub mod split_id;
pub mod splitter;
pub mod suffix;
pub mod targeting;
pub mod toolchain;
pub mod variant;

pub use archive_writer::{write_archive, ArchiveEntry};
pub use sharder::{shard_variant, DexMergeStrategy, DexMerger, ShardingConfig};
pub use split_id::split_id;
pub use splitter::split_module;
pub use suffix::SuffixAllocator;
pub use targeting::{ApkTargeting, ConflictingTargeting, Dimension, DimensionTargeting};
pub use toolchain::{Aapt2Command, Aapt2Subprocess, Signer, SubprocessSigner};
pub use variant::{plan_variants, ModuleSplit, SplitType, Variant, VariantTargeting};
