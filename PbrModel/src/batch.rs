//! Batch model operations
//!
//! Finds model files under a directory and processes them in parallel,
//! mirroring the source layout in the destination.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::error::Result;
use crate::sdr::{Variant, WriteOptions};
use crate::texture::export_png;

/// Result of a batch operation
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Number of successful operations
    pub success_count: usize,
    /// Number of failed operations
    pub fail_count: usize,
    /// Messages for each file processed
    pub results: Vec<String>,
}

/// What to do with each model of a batch.
#[derive(Debug, Clone, Copy)]
pub enum BatchOperation {
    /// Parse and re-serialize each model.
    Rebuild(WriteOptions),
    /// Export each model's textures as PNG into a folder named after it.
    ExportTextures,
    /// Write each model's summary as JSON.
    Info,
}

/// Find all model files (.sdr, .odr, .mdr) in a directory recursively.
///
/// The list is sorted.
pub fn find_model_files<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let mut files: Vec<_> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.path().is_file() && Variant::from_extension(e.path()).is_some())
        .map(|e| e.path().to_path_buf())
        .collect();

    files.sort();
    files
}

/// Export every texture of the model at `source` into `dest_dir`.
///
/// Files are named `<stem>_<index>.png`. Returns the written paths.
///
/// # Errors
/// Returns an error if the model cannot be parsed or a PNG cannot be written.
pub fn export_textures(source: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>> {
    let parsed = crate::read_model(source)?;
    let stem = source.file_stem().unwrap_or_default().to_string_lossy();
    std::fs::create_dir_all(dest_dir)?;

    let mut written = Vec::with_capacity(parsed.model.textures.len());
    for (i, texture) in parsed.model.textures.iter().enumerate() {
        let path = dest_dir.join(format!("{stem}_{i}.png"));
        export_png(&parsed.model.images[texture.image], &path)?;
        written.push(path);
    }
    Ok(written)
}

fn process(operation: BatchOperation, source: &Path, dest: &Path) -> Result<String> {
    match operation {
        BatchOperation::Rebuild(options) => {
            let parsed = crate::read_model(source)?;
            crate::write_model(dest, &parsed.model, options)?;
            Ok(format!("{} warnings", parsed.warnings.len()))
        }
        BatchOperation::ExportTextures => {
            let written = export_textures(source, &dest.with_extension(""))?;
            Ok(format!("{} textures", written.len()))
        }
        BatchOperation::Info => {
            let info = crate::inspect::inspect_model(source)?;
            let json = serde_json::to_string_pretty(&info)
                .map_err(|e| crate::Error::InvalidModel(format!("cannot encode summary: {e}")))?;
            std::fs::write(dest.with_extension("json"), json)?;
            Ok(format!("{} meshes", info.meshes.len()))
        }
    }
}

/// Run `operation` over `files` in parallel.
///
/// Outputs keep each file's path relative to `source_base` under
/// `dest_base`. `progress` receives the running count, the total and the
/// file being processed.
pub fn batch_process<F>(
    files: &[PathBuf],
    source_base: &Path,
    dest_base: &Path,
    operation: BatchOperation,
    progress: F,
) -> BatchResult
where
    F: Fn(usize, usize, &str) + Send + Sync,
{
    let success_counter = AtomicUsize::new(0);
    let fail_counter = AtomicUsize::new(0);
    let processed = AtomicUsize::new(0);
    let total = files.len();

    let results: Vec<String> = files
        .par_iter()
        .map(|path| {
            let relative_path = path.strip_prefix(source_base).unwrap_or(path.as_path());
            let display_path = relative_path.to_string_lossy();

            let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(current, total, &display_path);

            let dest = dest_base.join(relative_path);
            if let Some(parent) = dest.parent()
                && let Err(e) = std::fs::create_dir_all(parent)
            {
                fail_counter.fetch_add(1, Ordering::SeqCst);
                return format!("Failed to create folder for {display_path}: {e}");
            }

            match process(operation, path, &dest) {
                Ok(summary) => {
                    success_counter.fetch_add(1, Ordering::SeqCst);
                    format!("Processed: {display_path} ({summary})")
                }
                Err(e) => {
                    tracing::warn!("{display_path}: {e}");
                    fail_counter.fetch_add(1, Ordering::SeqCst);
                    format!("Failed {display_path}: {e}")
                }
            }
        })
        .collect();

    BatchResult {
        success_count: success_counter.load(Ordering::SeqCst),
        fail_count: fail_counter.load(Ordering::SeqCst),
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_model_files_filters_extensions() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.SDR"), b"").unwrap();
        std::fs::write(dir.path().join("nested/a.mdr"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let files = find_model_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| Variant::from_extension(f).is_some()));
    }

    #[test]
    fn test_batch_counts_failures() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("broken.odr");
        std::fs::write(&broken, [0u8; 4]).unwrap();
        let out = dir.path().join("out");

        let result = batch_process(&[broken], dir.path(), &out, BatchOperation::Info, |_, _, _| {});
        assert_eq!(result.success_count, 0);
        assert_eq!(result.fail_count, 1);
        assert!(result.results[0].starts_with("Failed broken.odr"));
    }
}
