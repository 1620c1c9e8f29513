//! aabforge-core — shared value types, error taxonomy and ambient
//! configuration used by every other crate in the workspace.

pub mod byte_source;
pub mod config;
pub mod error;
pub mod zip_path;

pub use byte_source::{ByteSource, FileByteSource, MemoryByteSource};
pub use config::{OptimizationEra, PipelineConfig};
pub use error::{AabForgeError, Result};
pub use zip_path::{InvalidComponent, ZipPath};

/// aabforge version, as reported in table-of-contents output.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
