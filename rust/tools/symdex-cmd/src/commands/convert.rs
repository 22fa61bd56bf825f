//! Convert command implementation

use anyhow::{Context, Result};
use std::fs;
use symdex_index::{Fragment, IndexConfig};

use crate::utils;

pub fn run(config: IndexConfig, files: Vec<String>, output_path: Option<String>) -> Result<()> {
    let index = utils::load_index(config, &files)?;
    let json = Fragment::from_index(&index).to_json_string();

    match output_path {
        Some(output_file) => {
            fs::write(&output_file, &json)
                .with_context(|| format!("Failed to write fragment to file: {}", output_file))?;
            log::info!("fragment written to: {}", output_file);
        }
        None => {
            println!("{}", json);
        }
    }
    Ok(())
}
