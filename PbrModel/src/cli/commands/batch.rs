//! CLI command for batch model processing

use std::path::Path;
use std::time::Instant;

use crate::batch::{BatchOperation, batch_process, find_model_files};
use crate::cli::progress::{print_done, simple_bar};

/// Run `operation` over every model file under `source`.
pub fn run(source: &Path, dest: &Path, operation: BatchOperation, quiet: bool) -> anyhow::Result<()> {
    let start = Instant::now();
    let files = find_model_files(source);

    if files.is_empty() {
        println!("No model files found in: {}", source.display());
        return Ok(());
    }

    println!("Found {} model files to process", files.len());

    let pb = simple_bar(files.len() as u64, quiet);
    let result = batch_process(&files, source, dest, operation, |current, _, name| {
        pb.set_position(current as u64);
        pb.set_message(name.to_string());
    });
    pb.finish_and_clear();

    println!();
    println!("Batch complete:");
    println!("  Success: {}", result.success_count);
    println!("  Failed: {}", result.fail_count);

    if result.fail_count > 0 {
        println!();
        println!("Failures:");
        for msg in result.results.iter().filter(|m| m.starts_with("Failed")) {
            println!("  {msg}");
        }
    }

    print_done(start.elapsed());
    Ok(())
}
