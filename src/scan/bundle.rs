//! Selecting what ships as runtime data.

use super::walker::{keep_entry, relative};
use super::{DetectedDataDir, IgnoreSpec};
use crate::config::{BundleRoots, ProjectLayout};
use std::collections::BTreeSet;
use walkdir::WalkDir;

/// Data directories that ship with the binary.
///
/// Keeps detected directories under an always-bundle root and drops any that
/// lie inside another kept directory, so every file is selected once.
pub fn select_bundled(data_dirs: &[DetectedDataDir], roots: &BundleRoots) -> Vec<String> {
    let matching: BTreeSet<&str> = data_dirs
        .iter()
        .map(|dir| dir.as_str())
        .filter(|dir| roots.matches(dir))
        .collect();

    matching
        .iter()
        .filter(|dir| {
            let mut ancestor = **dir;
            while let Some((parent, _)) = ancestor.rsplit_once('/') {
                if matching.contains(parent) {
                    return false;
                }
                ancestor = parent;
            }
            true
        })
        .map(|dir| dir.to_string())
        .collect()
}

/// Every regular file below `dirs` that survives the exclusion set and the
/// ignore spec, as sorted root-relative paths.
pub fn bundled_files(layout: &ProjectLayout, ignore: &IgnoreSpec, dirs: &[String]) -> Vec<String> {
    let root = layout.root.as_path();
    let mut files = BTreeSet::new();

    for dir in dirs {
        let walker = WalkDir::new(layout.resolve(dir))
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| keep_entry(entry, root, layout, ignore));

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    if let Some(rel) = relative(entry.path(), root) {
                        files.insert(rel);
                    }
                }
                Ok(_) => {}
                Err(e) => log::warn!("Skipping unreadable entry in {dir}: {e}"),
            }
        }
    }

    files.into_iter().collect()
}
