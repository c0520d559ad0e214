//! Depth-first project walk.

use super::{DetectedDataDir, DetectedPackage, IgnoreSpec, ScanResult};
use crate::config::ProjectLayout;
use std::collections::BTreeSet;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Scans the project described by `layout`.
///
/// Directories named in the layout's exclusion set are pruned first, then
/// anything the ignore spec matches. Always-bundle roots from the layout are
/// added to the data directories when they exist on disk and are not ignored.
/// Results are sorted, so an unchanged tree always scans the same way.
pub fn scan(layout: &ProjectLayout, ignore: &IgnoreSpec) -> ScanResult {
    let root = layout.root.as_path();
    let mut all_packages = BTreeSet::new();
    let mut data_dirs = BTreeSet::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| keep_entry(entry, root, layout, ignore));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry during scan: {e}");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(parent) = entry.path().parent().and_then(|p| relative(p, root)) else {
            continue;
        };
        // Files at the project root never make the root a package or data dir.
        if parent.is_empty() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if name == layout.package_marker.as_str() {
            all_packages.insert(parent.clone());
        }
        if !is_code_file(&name, &layout.code_extension) {
            data_dirs.insert(parent);
        }
    }

    for forced in layout.always_bundle.iter() {
        if data_dirs.contains(forced) {
            continue;
        }
        if ignore.is_ignored(forced, true)
            || forced
                .split('/')
                .any(|part| layout.excluded_dirs.contains(part))
        {
            log::warn!("Always-bundle root {forced} is ignored; not bundling it");
            continue;
        }
        if layout.resolve(forced).is_dir() {
            log::debug!("Force-including always-bundle root {forced}");
            data_dirs.insert(forced.to_string());
        }
    }

    ScanResult {
        packages: fold_nested(&all_packages)
            .into_iter()
            .map(DetectedPackage)
            .collect(),
        data_dirs: data_dirs.into_iter().map(DetectedDataDir).collect(),
    }
}

pub(super) fn keep_entry(
    entry: &DirEntry,
    root: &Path,
    layout: &ProjectLayout,
    ignore: &IgnoreSpec,
) -> bool {
    let file_type = entry.file_type();
    if file_type.is_symlink() {
        return false;
    }
    let is_dir = file_type.is_dir();
    if is_dir
        && layout
            .excluded_dirs
            .contains(&*entry.file_name().to_string_lossy())
    {
        return false;
    }
    match relative(entry.path(), root) {
        Some(rel) => !ignore.is_ignored(&rel, is_dir),
        None => false,
    }
}

/// Root-relative path with `/` separators.
pub(super) fn relative(path: &Path, root: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

fn is_code_file(name: &str, code_extension: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.to_string_lossy() == code_extension)
}

/// Drops every package that has another detected package as an ancestor.
fn fold_nested(all: &BTreeSet<String>) -> Vec<String> {
    all.iter()
        .filter(|pkg| {
            let mut ancestor = pkg.as_str();
            while let Some((parent, _)) = ancestor.rsplit_once('/') {
                if all.contains(parent) {
                    return false;
                }
                ancestor = parent;
            }
            true
        })
        .cloned()
        .collect()
}
