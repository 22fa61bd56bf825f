use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Records where the repository's sample files live and which Doxygen search
/// samples exist, so tests can find them without walking the filesystem.
fn main() -> io::Result<()> {
    let manifest_dir = PathBuf::from(env::var_os("CARGO_MANIFEST_DIR").unwrap_or_default());
    let samples_dir = manifest_dir.join("..").join("..").join("test").join("samples");
    let search_dir = samples_dir.join("search");

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={}", search_dir.display());
    println!("cargo:rustc-env=TESTKIT_SAMPLES_DIR={}", samples_dir.display());

    let names = search_sample_names(&search_dir)?;
    let listing = format!("pub const SEARCH_SAMPLE_NAMES: &[&str] = &{names:?};\n");
    let out_dir = PathBuf::from(env::var_os("OUT_DIR").unwrap_or_default());
    fs::write(out_dir.join("search_samples.rs"), listing)
}

fn search_sample_names(dir: &Path) -> io::Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "js") {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}
