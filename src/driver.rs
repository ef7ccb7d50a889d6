//! File-level orchestration: one `.vm` output per `.jack` input.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};

use crate::compile_class;
use crate::config::Options;

pub const SOURCE_EXTENSION: &str = "jack";
pub const OUTPUT_EXTENSION: &str = "vm";

/// Expands directories into their `.jack` files (non-recursive, sorted).
/// Files named explicitly are taken as they are.
pub fn collect_sources(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut sources = vec![];
    for path in paths {
        if path.is_dir() {
            let mut found = vec![];
            let entries = fs::read_dir(path)
                .with_context(|| format!("failed to read directory {}", path.display()))?;
            for entry in entries {
                let p = entry?.path();
                if p.is_file() && p.extension() == Some(OsStr::new(SOURCE_EXTENSION)) {
                    found.push(p);
                }
            }
            if found.is_empty() {
                bail!("no .{} files in {}", SOURCE_EXTENSION, path.display());
            }
            found.sort();
            sources.extend(found);
        } else if path.is_file() {
            sources.push(path.clone());
        } else {
            bail!("{} does not exist", path.display());
        }
    }
    Ok(sources)
}

pub fn output_path(source: &Path) -> PathBuf {
    source.with_extension(OUTPUT_EXTENSION)
}

/// Compiles one file and writes its VM code next to it. Nothing is written
/// when compilation fails.
pub fn compile_file(path: &Path, options: &Options) -> Result<PathBuf> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let class = compile_class(&source).with_context(|| format!("{}", path.display()))?;

    if path.file_stem().and_then(OsStr::to_str) != Some(class.name.as_str()) {
        warn!(
            "{} declares class {}; output is still named after the file",
            path.display(),
            class.name
        );
    }

    let out = output_path(path);
    fs::write(&out, class.render(options))
        .with_context(|| format!("failed to write {}", out.display()))?;
    info!("{} -> {}", path.display(), out.display());
    Ok(out)
}

/// Compiles every file independently on up to `jobs` threads. Results come
/// back in input order; one failure does not stop the others.
pub fn compile_all(files: &[PathBuf], options: &Options, jobs: usize) -> Vec<Result<PathBuf>> {
    if files.is_empty() {
        return vec![];
    }
    let jobs = jobs.clamp(1, files.len());
    let chunk_size = files.len().div_ceil(jobs);
    debug!("compiling {} file(s) on {} thread(s)", files.len(), jobs);

    thread::scope(|scope| {
        let handles: Vec<_> = files
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|file| compile_file(file, options))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    })
}
