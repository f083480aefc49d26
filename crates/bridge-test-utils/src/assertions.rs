//! Custom assertion helpers for scratch-area hygiene.

use std::path::Path;

/// Lists scratch entries left behind under `scratch_dir`.
///
/// Scratch entries are `input_*.txt` files and `run_*` directories.
#[must_use]
pub fn leftover_scratch_entries(scratch_dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(scratch_dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| {
            (name.starts_with("input_") && name.ends_with(".txt")) || name.starts_with("run_")
        })
        .collect();
    names.sort();
    names
}

/// Asserts that no request left scratch files or working directories behind.
///
/// # Panics
///
/// Panics if any scratch entry remains.
pub fn assert_scratch_clean(scratch_dir: &Path) {
    let leftovers = leftover_scratch_entries(scratch_dir);
    assert!(
        leftovers.is_empty(),
        "Expected empty scratch area at {}, found {leftovers:?}",
        scratch_dir.display()
    );
}
