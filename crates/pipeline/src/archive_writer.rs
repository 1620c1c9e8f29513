//! Deterministic zip archive writer.
//!
//! Writes a fixed insertion-ordered sequence of entries to a temporary
//! file and atomically renames it into place. Two archives built from
//! the same entries in the same order always produce byte-identical
//! output: every entry gets the epoch-0 timestamp, and compression
//! method is fully determined by `force_uncompressed`.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use aabforge_core::{AabForgeError, ByteSource, Result, ZipPath};

/// One entry to be written. `is_directory` entries carry no content and
/// are serialized with a trailing `/` on the name.
pub struct ArchiveEntry {
    pub path: ZipPath,
    pub content: Option<Arc<dyn ByteSource>>,
    pub force_uncompressed: bool,
}

impl ArchiveEntry {
    pub fn file(path: ZipPath, content: Arc<dyn ByteSource>, force_uncompressed: bool) -> Self {
        ArchiveEntry {
            path,
            content: Some(content),
            force_uncompressed,
        }
    }

    pub fn directory(path: ZipPath) -> Self {
        ArchiveEntry {
            path,
            content: None,
            force_uncompressed: true,
        }
    }
}

/// Entries above this size are read off the writer thread by a bounded
/// pool of blocking tasks so a handful of large native libraries don't
/// serialize behind each other; the writer itself still appends them to
/// the zip in submission order.
const PARALLEL_READ_THRESHOLD: u64 = 100 * 1024;

/// Writes `entries` to `destination`. Fails with `invalid-command` on a
/// duplicate path; never overwrites an existing destination.
pub async fn write_archive(entries: Vec<ArchiveEntry>, destination: &Path) -> Result<()> {
    if destination.exists() {
        return Err(AabForgeError::InvalidCommand(format!(
            "refusing to overwrite existing archive at {}",
            destination.display()
        )));
    }

    let mut seen = HashSet::new();
    for entry in &entries {
        if !seen.insert(entry.path.clone()) {
            return Err(AabForgeError::invalid_bundle(format!("duplicate archive entry {}", entry.path)));
        }
    }

    let materialized = materialize(entries).await?;

    let temp_path = temp_path_next_to(destination);
    let write_result = write_zip(&materialized, &temp_path);
    match write_result {
        Ok(()) => {
            std::fs::rename(&temp_path, destination)?;
            Ok(())
        }
        Err(e) => {
            let _ = std::fs::remove_file(&temp_path);
            Err(e)
        }
    }
}

struct MaterializedEntry {
    path: ZipPath,
    bytes: Option<Vec<u8>>,
    force_uncompressed: bool,
}

async fn materialize(entries: Vec<ArchiveEntry>) -> Result<Vec<MaterializedEntry>> {
    let mut tasks = Vec::with_capacity(entries.len());
    for entry in entries {
        let ArchiveEntry { path, content, force_uncompressed } = entry;
        let task = match content {
            None => tokio::task::spawn_blocking(move || Ok(None)),
            Some(source) => {
                let known_size = source.size_if_known().unwrap_or(0);
                if known_size >= PARALLEL_READ_THRESHOLD {
                    tokio::task::spawn_blocking(move || read_all(&source).map(Some))
                } else {
                    let bytes = read_all(&source)?;
                    tokio::task::spawn_blocking(move || Ok(Some(bytes)))
                }
            }
        };
        tasks.push((path, force_uncompressed, task));
    }

    let mut materialized = Vec::with_capacity(tasks.len());
    for (path, force_uncompressed, task) in tasks {
        let bytes = task
            .await
            .map_err(|e| AabForgeError::CommandExecution(format!("archive read task panicked: {e}")))??;
        materialized.push(MaterializedEntry { path, bytes, force_uncompressed });
    }
    Ok(materialized)
}

fn read_all(source: &Arc<dyn ByteSource>) -> Result<Vec<u8>> {
    use std::io::Read;
    let mut buf = Vec::new();
    source.open_stream()?.read_to_end(&mut buf)?;
    Ok(buf)
}

fn write_zip(entries: &[MaterializedEntry], temp_path: &Path) -> Result<()> {
    let file = std::fs::File::create(temp_path)?;
    let mut writer = zip::ZipWriter::new(file);
    let epoch = zip::DateTime::default();

    let to_err = |e: zip::result::ZipError| AabForgeError::CommandExecution(format!("archive write failed: {e}"));

    for entry in entries {
        let name = match &entry.bytes {
            None => format!("{}/", entry.path),
            Some(_) => entry.path.to_string(),
        };

        let method = if entry.force_uncompressed {
            zip::CompressionMethod::Stored
        } else {
            zip::CompressionMethod::Deflated
        };
        let options = zip::write::FileOptions::default().compression_method(method).last_modified_time(epoch);

        match &entry.bytes {
            None => {
                writer.add_directory(name, options).map_err(to_err)?;
            }
            Some(bytes) => {
                writer.start_file(name, options).map_err(to_err)?;
                writer.write_all(bytes)?;
            }
        }
    }

    writer.finish().map_err(to_err)?;
    Ok(())
}

fn temp_path_next_to(destination: &Path) -> PathBuf {
    let file_name = destination.file_name().and_then(|n| n.to_str()).unwrap_or("archive");
    destination.with_file_name(format!(".{file_name}.tmp"))
}
