use anyhow::{Context, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

use crate::diagnostics::{Diagnostics, FailureKind, ScanFailure};
use crate::enumerate::{ScanOptions, WalkOutcome};
use crate::loader::ClassLoader;
use crate::names::{
    is_inner_class, is_valid_package_name, qualify, strip_class_suffix, to_package_name,
};

/// Reads every entry name of a jar/zip archive, sorted, with a single
/// leading `/` stripped.
pub fn entry_names(archive_path: &Path) -> Result<Vec<String>> {
    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;
    // SAFETY: The file is opened read-only and outlives the mapping, which is
    // dropped before this function returns.
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to mmap archive: {}", archive_path.display()))?;
    let archive = ZipArchive::new(Cursor::new(&mmap[..]))
        .with_context(|| format!("Failed to read zip structure: {}", archive_path.display()))?;

    let mut names: Vec<String> = archive
        .file_names()
        .map(|name| name.strip_prefix('/').unwrap_or(name).to_string())
        .collect();
    names.sort();
    Ok(names)
}

/// True when `names` holds at least one entry below `dir_path`.
pub fn contains_dir(names: &[String], dir_path: &str) -> bool {
    let dir_path = dir_path.trim_matches('/');
    names.iter().any(|name| relative_to(name, dir_path).is_some())
}

/// Initializes every class inside `archive` that lives under `entry_dir`,
/// which is the in-archive directory of `package`.
///
/// The owning package of each entry comes from that entry's own directory
/// relative to `entry_dir`, so nested packages are named correctly no
/// matter what order the archive lists them in. When `options.recursive` is
/// off only classes sitting directly in `entry_dir` qualify.
pub fn walk_archive(
    package: &str,
    archive: &Path,
    entry_dir: &str,
    options: &ScanOptions,
    loader: &mut dyn ClassLoader,
    sink: &mut dyn Diagnostics,
) -> WalkOutcome {
    let mut outcome = WalkOutcome::default();
    match entry_names(archive) {
        Ok(names) => walk_entries_into(package, &names, entry_dir, options, loader, sink, &mut outcome),
        Err(err) => report_unreadable(archive, &err, sink, &mut outcome),
    }
    outcome
}

/// Walks already-read entry names, recording progress in `outcome` as it
/// goes so a caller still holds it if the loader unwinds.
pub(crate) fn walk_entries_into(
    package: &str,
    names: &[String],
    entry_dir: &str,
    options: &ScanOptions,
    loader: &mut dyn ClassLoader,
    sink: &mut dyn Diagnostics,
    outcome: &mut WalkOutcome,
) {
    let entry_dir = entry_dir.trim_matches('/');
    for name in names {
        let Some(fqn) = class_name_for_entry(package, entry_dir, name, options) else {
            continue;
        };
        if !is_valid_package_name(&fqn) {
            debug!(entry = %name, "not a loadable class name, skipping");
            continue;
        }
        outcome.load(&fqn, loader, sink);
    }
}

pub(crate) fn report_unreadable(
    archive: &Path,
    err: &anyhow::Error,
    sink: &mut dyn Diagnostics,
    outcome: &mut WalkOutcome,
) {
    outcome.fail(
        ScanFailure::new(
            archive.display().to_string(),
            FailureKind::ArchiveUnreadable,
            format!("{err:#}"),
        ),
        sink,
    );
}

fn class_name_for_entry(
    package: &str,
    entry_dir: &str,
    name: &str,
    options: &ScanOptions,
) -> Option<String> {
    // Directory entries end with a separator.
    if name.ends_with('/') {
        return None;
    }
    let relative = relative_to(name, entry_dir)?;
    let (sub_dir, file_name) = match relative.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, relative),
    };
    if sub_dir.is_some() && !options.recursive {
        return None;
    }

    let stem = strip_class_suffix(file_name)?;
    if options.skip_inner_classes && is_inner_class(stem) {
        return None;
    }

    let owning_package = match sub_dir {
        Some(dir) => qualify(package, &to_package_name(dir)),
        None => package.to_string(),
    };
    Some(qualify(&owning_package, stem))
}

// `a/bc/X.class` is not under `a/b`.
fn relative_to<'a>(name: &'a str, dir: &str) -> Option<&'a str> {
    if dir.is_empty() {
        return Some(name);
    }
    name.strip_prefix(dir)?.strip_prefix('/')
}
