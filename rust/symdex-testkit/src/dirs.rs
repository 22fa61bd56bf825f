//! Directory and path utilities for test resources.
//!
//! Sample files live under `$repo_root/test/samples`. The build script records
//! that location and the names of the Doxygen search samples found there.

use std::path::PathBuf;

/// The test samples directory, resolved at compile time by the build script.
pub const TESTKIT_SAMPLES_DIR_STR: &str = env!("TESTKIT_SAMPLES_DIR");

include!(concat!(env!("OUT_DIR"), "/search_samples.rs"));

/// Returns the path to the test samples directory (`$repo_root/test/samples`).
pub fn get_test_samples_dir() -> anyhow::Result<PathBuf> {
    let samples_dir = PathBuf::from(TESTKIT_SAMPLES_DIR_STR);
    if !samples_dir.is_dir() {
        anyhow::bail!("{} not found", samples_dir.display());
    }
    Ok(samples_dir)
}

/// Returns the directory of sample Doxygen search files
/// (`$repo_root/test/samples/search`).
pub fn get_search_samples_dir() -> anyhow::Result<PathBuf> {
    let path = get_test_samples_dir()?.join("search");
    if !path.is_dir() {
        anyhow::bail!("{} not found", path.display());
    }
    Ok(path)
}

/// Returns the path of one sample search file, e.g. `functions_c.js`.
pub fn get_search_sample_path(name: &str) -> anyhow::Result<PathBuf> {
    let path = get_search_samples_dir()?.join(name);
    if !path.is_file() {
        anyhow::bail!("{} not found", path.display());
    }
    Ok(path)
}

/// Paths of every Doxygen search sample, in name order.
pub fn get_search_sample_paths() -> anyhow::Result<Vec<PathBuf>> {
    SEARCH_SAMPLE_NAMES
        .iter()
        .map(|name| get_search_sample_path(name))
        .collect()
}
