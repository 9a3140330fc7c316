use anyhow::Context;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::diagnostics::{Diagnostics, FailureKind, ScanFailure};
use crate::enumerate::{ScanOptions, WalkOutcome};
use crate::loader::ClassLoader;
use crate::names::{is_inner_class, is_valid_package_name, qualify, strip_class_suffix};

enum DirEntry {
    SubPackage { path: PathBuf, name: String },
    Class { stem: String },
}

/// Initializes every class file under `root`, treating `root` as the
/// directory of `package`.
///
/// A missing root is an empty package: nothing is loaded and nothing is
/// reported. Sub-directories are only descended when `options.recursive`
/// is set.
pub fn walk_directory(
    package: &str,
    root: &Path,
    options: &ScanOptions,
    loader: &mut dyn ClassLoader,
    sink: &mut dyn Diagnostics,
) -> WalkOutcome {
    let mut outcome = WalkOutcome::default();
    walk_directory_into(package, root, options, loader, sink, &mut outcome);
    outcome
}

/// Same walk as [`walk_directory`], recording progress in `outcome` as it
/// goes so a caller still holds it if the loader unwinds.
pub(crate) fn walk_directory_into(
    package: &str,
    root: &Path,
    options: &ScanOptions,
    loader: &mut dyn ClassLoader,
    sink: &mut dyn Diagnostics,
    outcome: &mut WalkOutcome,
) {
    if !root.is_dir() {
        debug!(root = %root.display(), "package directory missing, nothing to scan");
        return;
    }

    let mut visited = HashSet::new();
    let mut stack = vec![(root.to_path_buf(), package.to_string())];

    while let Some((dir, pkg)) = stack.pop() {
        // Symlinked directories can point back up the tree.
        if let Ok(canonical) = dir.canonicalize()
            && !visited.insert(canonical)
        {
            debug!(dir = %dir.display(), "directory already visited");
            continue;
        }

        let listing = match std::fs::read_dir(&dir)
            .with_context(|| format!("Failed to list directory: {}", dir.display()))
        {
            Ok(read) => list_entries(&dir, read, options.recursive),
            Err(err) => {
                outcome.fail(unreadable(&dir, &err), sink);
                continue;
            }
        };
        for err in &listing.errors {
            outcome.fail(unreadable(&dir, err), sink);
        }

        let mut sub_packages = Vec::new();
        for entry in listing.entries {
            match entry {
                DirEntry::SubPackage { path, name } => {
                    sub_packages.push((path, qualify(&pkg, &name)));
                }
                DirEntry::Class { stem } => {
                    if options.skip_inner_classes && is_inner_class(&stem) {
                        continue;
                    }
                    let fqn = qualify(&pkg, &stem);
                    if !is_valid_package_name(&fqn) {
                        debug!(class = %fqn, "not a loadable class name, skipping");
                        continue;
                    }
                    outcome.load(&fqn, loader, sink);
                }
            }
        }

        // Reversed so siblings pop off the stack in name order.
        stack.extend(sub_packages.into_iter().rev());
    }
}

fn unreadable(dir: &Path, err: &anyhow::Error) -> ScanFailure {
    ScanFailure::new(
        dir.display().to_string(),
        FailureKind::DirectoryUnreadable,
        format!("{err:#}"),
    )
}

#[derive(Default)]
struct Listing {
    entries: Vec<DirEntry>,
    errors: Vec<anyhow::Error>,
}

/// A bad entry is recorded in `errors` and the rest of the listing is kept.
fn list_entries<I>(dir: &Path, read: I, include_dirs: bool) -> Listing
where
    I: IntoIterator<Item = std::io::Result<std::fs::DirEntry>>,
{
    let mut listing = Listing::default();
    let mut named = Vec::new();
    for entry in read {
        let entry = match entry
            .with_context(|| format!("Failed to read entry in: {}", dir.display()))
        {
            Ok(entry) => entry,
            Err(err) => {
                listing.errors.push(err);
                continue;
            }
        };
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            debug!(path = %entry.path().display(), "non UTF-8 file name, skipping");
            continue;
        };
        named.push((name, entry.path()));
    }
    named.sort_by(|a, b| a.0.cmp(&b.0));

    for (name, path) in named {
        if path.is_dir() {
            if include_dirs {
                listing.entries.push(DirEntry::SubPackage { path, name });
            }
        } else if let Some(stem) = strip_class_suffix(&name) {
            listing.entries.push(DirEntry::Class {
                stem: stem.to_string(),
            });
        }
    }
    listing
}
