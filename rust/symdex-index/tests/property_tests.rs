use proptest::prelude::*;
use symdex_index::{Entry, Fragment, IndexConfig, MatchTier, SymbolIndex, load};

const NAMES: &[&str] = &[
    "close", "closeAll", "open", "openFile", "copyTo", "copyFrom", "contains", "create",
    "createTempFile", "forceClose", "reopen", "operator<<", "operator==", "straße", "ǆx",
    "ıd", "Ǆsa", "σοφος", "İstanbul",
];

const CONTAINERS: &[&str] = &["ns::A", "ns::B", "ns::C"];

/// Fragments of `(name index, decoration, container index)` triples; anchors are
/// derived from the position so they never collide.
fn fragments_strategy() -> impl Strategy<Value = Vec<Vec<(usize, u8, usize)>>> {
    prop::collection::vec(
        prop::collection::vec(
            (0..NAMES.len(), 0u8..3, 0..CONTAINERS.len()),
            0..12,
        ),
        1..4,
    )
}

fn build_fragments(spec: &[Vec<(usize, u8, usize)>]) -> Vec<Fragment> {
    spec.iter()
        .enumerate()
        .map(|(f, records)| {
            records
                .iter()
                .enumerate()
                .fold(Fragment::new(), |fragment, (r, &(name, decoration, container))| {
                    let name = NAMES[name];
                    let raw_key = match decoration {
                        0 => name.to_string(),
                        1 => format!("{name}()"),
                        _ => name.to_uppercase(),
                    };
                    fragment.with_record(
                        raw_key,
                        vec![Entry::new(name, format!("f{f}.html#r{r}"), CONTAINERS[container])],
                    )
                })
        })
        .collect()
}

fn load_spec(spec: &[Vec<(usize, u8, usize)>]) -> SymbolIndex {
    load(IndexConfig::default(), build_fragments(spec)).unwrap()
}

proptest! {
    #[test]
    fn load_is_deterministic(spec in fragments_strategy()) {
        let a = load_spec(&spec);
        let b = load_spec(&spec);
        let a: Vec<_> = a.buckets().cloned().collect();
        let b: Vec<_> = b.buckets().cloned().collect();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn anchors_are_unique_per_key(spec in fragments_strategy()) {
        let index = load_spec(&spec);
        for bucket in index.buckets() {
            let mut anchors: Vec<&str> =
                bucket.entries().iter().map(|e| e.entry.anchor.as_str()).collect();
            let total = anchors.len();
            anchors.sort();
            anchors.dedup();
            prop_assert_eq!(anchors.len(), total);
        }
    }

    #[test]
    fn truncation_law(spec in fragments_strategy(), query in "[a-zA-Z]{1,5}", n in 0usize..20) {
        let index = load_spec(&spec);
        let all = index.search(&query, None).unwrap();
        let limited = index.search(&query, Some(n)).unwrap();
        let expected = &all[..n.min(all.len())];
        prop_assert_eq!(limited.as_slice(), expected);
    }

    #[test]
    fn case_insensitive(
        spec in fragments_strategy(),
        query in "[a-zA-Z<=ßẞǅǄǆıİσςΣéÉ]{1,10}",
    ) {
        let index = load_spec(&spec);
        let hits = index.search(&query, None).unwrap();
        prop_assert_eq!(&hits, &index.search(&query.to_uppercase(), None).unwrap());
        prop_assert_eq!(&hits, &index.search(&query.to_lowercase(), None).unwrap());
    }

    #[test]
    fn tiers_are_exclusive_and_complete(spec in fragments_strategy(), query in "[a-z]{1,4}") {
        let index = load_spec(&spec);
        let hits = index.search(&query, None).unwrap();

        let tiers: Vec<MatchTier> = hits.iter().map(|h| h.tier).collect();
        let mut sorted = tiers.clone();
        sorted.sort();
        prop_assert_eq!(&tiers, &sorted);

        let expected: usize = index
            .buckets()
            .filter(|b| b.match_key().contains(query.as_str()))
            .map(|b| b.len())
            .sum();
        prop_assert_eq!(hits.len(), expected);

        for hit in &hits {
            let key = index.lookup(hit.key).unwrap().match_key();
            let tier = if key == query {
                MatchTier::Exact
            } else if key.starts_with(query.as_str()) {
                MatchTier::Prefix
            } else {
                MatchTier::Substring
            };
            prop_assert_eq!(hit.tier, tier);
        }
    }
}
