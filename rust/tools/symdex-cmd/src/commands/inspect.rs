//! Inspect command implementation

use anyhow::Result;
use std::fmt::Write;
use symdex_index::{IndexConfig, SymbolIndex};

use crate::utils;

pub fn run(config: IndexConfig, verbose: u8, files: Vec<String>) -> Result<()> {
    let index = utils::load_index(config, &files)?;
    print!("{}", describe(&index, verbose));
    Ok(())
}

fn describe(index: &SymbolIndex, verbose: u8) -> String {
    let mut out = String::new();
    let config = index.config();
    let _ = writeln!(out, "Fragments: {}", index.fragment_count());
    let _ = writeln!(out, "Keys:      {}", index.key_count());
    let _ = writeln!(out, "Entries:   {}", index.entry_count());
    let _ = writeln!(out, "Collation: {}", config.collation);
    if let Some(limit) = config.default_limit {
        let _ = writeln!(out, "Default limit: {}", limit);
    }

    if verbose == 0 {
        return out;
    }
    let _ = writeln!(out);
    for bucket in index.buckets() {
        let _ = writeln!(out, "{} ({})", bucket.display_key(), bucket.len());
        if verbose > 1 {
            for indexed in bucket.entries() {
                let entry = &indexed.entry;
                let _ = writeln!(
                    out,
                    "    [{}:{}] {} {} -> {}",
                    indexed.origin.fragment,
                    indexed.origin.ordinal,
                    entry.container_name,
                    entry.display_name,
                    entry.anchor
                );
            }
        }
    }
    out
}
