//! Query command implementation

use anyhow::{Context, Result};
use serde::Serialize;
use symdex_index::{IndexConfig, SearchQuery, SearchResult, SymbolIndex, execute_search};

use crate::utils;

#[derive(Debug, Serialize)]
struct QueryOutput {
    query: String,
    results: Vec<SearchResult>,
}

pub fn run(
    config: IndexConfig,
    files: Vec<String>,
    limit: Option<usize>,
    json: bool,
    texts: Vec<String>,
) -> Result<()> {
    let index = utils::load_index(config, &files)?;
    let outputs = run_queries(&index, &texts, limit)?;

    if json {
        let text =
            serde_json::to_string_pretty(&outputs).context("Failed to serialize results to JSON")?;
        println!("{}", text);
    } else {
        for output in &outputs {
            print!("{}", format_results(output));
        }
    }
    Ok(())
}

fn run_queries(
    index: &SymbolIndex,
    texts: &[String],
    limit: Option<usize>,
) -> Result<Vec<QueryOutput>> {
    texts
        .iter()
        .map(|text| {
            let query = SearchQuery {
                text: text.clone(),
                limit,
            };
            let results = execute_search(index, &query)
                .with_context(|| format!("Query failed: {:?}", text))?
                .iter()
                .map(|hit| hit.to_result())
                .collect();
            Ok(QueryOutput {
                query: text.clone(),
                results,
            })
        })
        .collect()
}

fn format_results(output: &QueryOutput) -> String {
    let mut text = format!("Query: {} ({} results)\n", output.query, output.results.len());
    for result in &output.results {
        let entry = &result.entry;
        let qualified = if entry.container_name.is_empty() {
            entry.display_name.clone()
        } else {
            format!("{}::{}", entry.container_name, entry.display_name)
        };
        text.push_str(&format!(
            "  {:<9} {:<24} {}  -> {}\n",
            result.tier, result.key, qualified, entry.anchor
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use symdex_index::{Entry, Fragment, load};

    fn index() -> SymbolIndex {
        let fragment = Fragment::new()
            .with_record(
                "close",
                vec![
                    Entry::new("close()", "CFile.html#a1", "limes::files::CFile"),
                    Entry::new("close()", "DynamicLibrary.html#b2", "limes::files::DynamicLibrary"),
                ],
            )
            .with_record("closeAll", vec![Entry::new("closeAll", "Dir.html#c3", "")]);
        load(IndexConfig::default(), vec![fragment]).unwrap()
    }

    #[test]
    fn test_run_queries() {
        let index = index();
        let texts = ["close".to_string(), "zzz".to_string()];
        let outputs = run_queries(&index, &texts, Some(2)).unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].results.len(), 2);
        assert!(outputs[1].results.is_empty());

        let err = run_queries(&index, &["".to_string()], None).unwrap_err();
        assert!(err.to_string().starts_with("Query failed"));
    }

    #[test]
    fn test_format_results() {
        let index = index();
        let outputs = run_queries(&index, &["clo".to_string()], None).unwrap();
        let text = format_results(&outputs[0]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Query: clo (3 results)");
        assert!(lines[1].contains("limes::files::CFile::close()  -> CFile.html#a1"));
        assert!(lines[3].trim_start().starts_with("prefix"));
        assert!(lines[3].ends_with("closeAll  -> Dir.html#c3"));
    }

    #[test]
    fn test_json_output_shape() {
        let index = index();
        let outputs = run_queries(&index, &["closeall".to_string()], None).unwrap();
        let json = serde_json::to_value(&outputs).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "query": "closeall",
                "results": [{
                    "displayName": "closeAll",
                    "anchor": "Dir.html#c3",
                    "key": "closeAll",
                    "tier": "exact"
                }]
            }])
        );
    }
}
