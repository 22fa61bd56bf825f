//! Data generation utilities for testing.
//!
//! Generates synthetic symbol fragments in the JSON fragment format. Generation is
//! seeded, so a failing test can be reproduced from its seed.

use std::path::PathBuf;

use serde_json::{Value, json};

const VERBS: &[&str] = &[
    "close", "open", "copy", "create", "remove", "rename", "read", "write", "resolve", "get",
    "set", "is", "has",
];

const NOUNS: &[&str] = &[
    "", "File", "Directory", "Path", "Name", "Entry", "Volume", "Link", "Size", "To", "All",
];

const CONTAINERS: &[&str] = &[
    "limes::files",
    "limes::files::CFile",
    "limes::files::Directory",
    "limes::files::DynamicLibrary",
    "limes::files::FilesystemEntry",
    "limes::files::SymLink",
    "limes::files::Volume",
];

/// Shape of a generated fragment.
#[derive(Debug, Clone, Copy)]
pub struct FragmentSpec {
    pub records: usize,
    /// Maximum entries per record; each record gets between 1 and this many.
    pub max_entries: usize,
    /// Probability of decorating a raw key with a parameter list or a case change.
    pub decoration_rate: f64,
}

impl Default for FragmentSpec {
    fn default() -> Self {
        Self {
            records: 32,
            max_entries: 3,
            decoration_rate: 0.25,
        }
    }
}

/// Generates one fragment as a JSON value `[[rawKey, [entry, ...]], ...]`.
///
/// Anchors are unique within the fragment and prefixed with `tag`, so fragments
/// generated with distinct tags never collide.
pub fn generate_fragment(seed: u64, tag: &str, spec: FragmentSpec) -> Value {
    assert_ne!(spec.max_entries, 0);
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut anchor_no = 0usize;
    let records = (0..spec.records)
        .map(|_| {
            let name = format!(
                "{}{}",
                VERBS[rng.usize(..VERBS.len())],
                NOUNS[rng.usize(..NOUNS.len())]
            );
            let raw_key = if rng.f64() < spec.decoration_rate {
                decorate(&mut rng, &name)
            } else {
                name.clone()
            };
            let entries: Vec<Value> = (0..rng.usize(1..=spec.max_entries))
                .map(|_| {
                    anchor_no += 1;
                    let container = CONTAINERS[rng.usize(..CONTAINERS.len())];
                    json!({
                        "displayName": format!("{name}()"),
                        "anchor": format!("{tag}.html#a{anchor_no}"),
                        "containerName": container,
                    })
                })
                .collect();
            json!([raw_key, entries])
        })
        .collect();
    Value::Array(records)
}

fn decorate(rng: &mut fastrand::Rng, name: &str) -> String {
    match rng.u8(..3) {
        0 => format!("{name}()"),
        1 => format!("{name}(const std::string &amp;path)"),
        _ => name.to_uppercase(),
    }
}

/// Writes `count` generated fragments as `fragment_NN.json` files into a new
/// temporary directory.
pub fn write_fragment_files(
    seed: u64,
    count: usize,
    spec: FragmentSpec,
) -> anyhow::Result<(tempfile::TempDir, Vec<PathBuf>)> {
    let dir = tempfile::tempdir()?;
    let mut paths = Vec::with_capacity(count);
    for i in 0..count {
        let fragment = generate_fragment(seed.wrapping_add(i as u64), &format!("f{i}"), spec);
        let path = dir.path().join(format!("fragment_{i:02}.json"));
        std::fs::write(&path, serde_json::to_string_pretty(&fragment)?)?;
        paths.push(path);
    }
    Ok((dir, paths))
}
