//! Common utilities for symdex-cmd

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use symdex_index::{FragmentFormat, IndexConfig, SymbolIndex, load, read_fragment_files};

/// Checks if a file exists and is readable
pub fn validate_file_exists(path: &str) -> Result<()> {
    let file_path = Path::new(path);
    if !file_path.exists() {
        anyhow::bail!("File does not exist: {}", path);
    }
    if !file_path.is_file() {
        anyhow::bail!("Path is not a file: {}", path);
    }
    Ok(())
}

/// Reads the index configuration, or returns the default one when no path is given.
pub fn load_config(path: Option<&str>) -> Result<IndexConfig> {
    let Some(path) = path else {
        return Ok(IndexConfig::default());
    };
    validate_file_exists(path).context("Invalid config file")?;
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path))?;
    IndexConfig::from_json_str(&text).with_context(|| format!("Invalid config file: {}", path))
}

/// Expands the `-f` arguments into fragment file paths.
///
/// Files are kept as given; a directory contributes its `*.js` and `*.json` files
/// sorted by file name.
pub fn expand_fragment_paths(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        let path = Path::new(input);
        if path.is_dir() {
            let mut files = fs::read_dir(path)
                .with_context(|| format!("Failed to read directory: {}", input))?
                .map(|entry| entry.map(|e| e.path()))
                .collect::<std::io::Result<Vec<_>>>()
                .with_context(|| format!("Failed to read directory: {}", input))?;
            files.retain(|p| p.is_file() && FragmentFormat::detect(p).is_some());
            files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
            if files.is_empty() {
                log::warn!("no fragment files in {}", input);
            }
            paths.extend(files);
        } else {
            validate_file_exists(input)
                .with_context(|| format!("Invalid fragment file: {}", input))?;
            paths.push(path.to_path_buf());
        }
    }
    Ok(paths)
}

/// Reads and loads all fragments named by the `-f` arguments, in order.
pub fn load_index(config: IndexConfig, inputs: &[String]) -> Result<SymbolIndex> {
    let paths = expand_fragment_paths(inputs)?;
    if paths.is_empty() {
        anyhow::bail!("No fragment files found");
    }
    for path in &paths {
        log::info!("loading fragment: {}", path.display());
    }
    let fragments = read_fragment_files(&paths).context("Failed to read fragments")?;
    let index = load(config, fragments).context("Failed to load index")?;
    log::info!(
        "loaded {} keys, {} entries from {} fragments",
        index.key_count(),
        index.entry_count(),
        index.fragment_count()
    );
    Ok(index)
}
