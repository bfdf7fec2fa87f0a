use docsearch_core::{DocId, Engine, Error, RawIndex, SearchConfig, Snapshot};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};

fn snapshot(value: Value) -> Snapshot {
    Snapshot::load(RawIndex::from_value(value).unwrap()).unwrap()
}

fn engine_with(value: Value) -> Engine {
    let engine = Engine::default();
    engine.load_index(snapshot(value)).unwrap();
    engine
}

fn ids(engine: &Engine, q: &str) -> Vec<DocId> {
    engine.search(q).unwrap().iter().map(|r| r.document.id).collect()
}

fn livestock() -> Value {
    json!({
        "docnames": ["poultry", "swine"],
        "titles": ["Poultry analysis", "Swine analysis"],
        "terms": {"feed": [0, 1]},
        "titleterms": {"poultry": [0], "swine": [1]}
    })
}

#[test]
fn end_to_end_example() {
    let engine = engine_with(livestock());
    let weights = engine.config().weights;
    let results = engine.search("poultry feed").unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].document.id, 0);
    assert_eq!(results[0].document.name, "poultry");
    assert_eq!(results[0].score, weights.title + weights.body);
}

#[test]
fn absent_terms_are_empty_not_errors() {
    let s = snapshot(livestock());
    assert!(s.lookup_term("cattle").is_empty());
    assert!(s.lookup_title_term("cattle").is_empty());
    let engine = engine_with(livestock());
    assert!(engine.search("cattle").unwrap().is_empty());
}

#[test]
fn multi_term_queries_use_and_semantics() {
    let engine = engine_with(json!({
        "docnames": ["d0", "d1", "d2", "d3"],
        "titles": ["D0", "D1", "D2", "D3"],
        "terms": {"a": [1, 2], "b": [2, 3]},
        "titleterms": {}
    }));
    assert_eq!(ids(&engine, "A B"), vec![2]);
    assert_eq!(ids(&engine, "A"), vec![1, 2]);
}

#[test]
fn title_match_outranks_body_match() {
    let engine = engine_with(json!({
        "docnames": ["body", "title"],
        "titles": ["Aaa", "Zzz"],
        "terms": {"feed": [0]},
        "titleterms": {"feed": [1]}
    }));
    let results = engine.search("feed").unwrap();
    assert_eq!(results[0].document.id, 1);
    assert!(results[0].score > results[1].score);
}

#[test]
fn object_match_outranks_title_match() {
    let engine = engine_with(json!({
        "docnames": ["api", "guide"],
        "titles": ["API", "Guide"],
        "terms": {},
        "titleterms": {"simulate": [1]},
        "objects": {"ahle": {"simulate": [0, 0, 1, "ahle.simulate"]}},
        "objtypes": {"0": "py:function"}
    }));
    let results = engine.search("simulate").unwrap();
    assert_eq!(results[0].document.id, 0);
    assert_eq!(results[0].objects[0].name, "ahle.simulate");
    assert_eq!(results[0].objects[0].category, "py:function");
    assert!(results[0].objects.len() == 1 && results[1].objects.is_empty());
}

#[test]
fn ties_break_by_title_then_id() {
    let engine = engine_with(json!({
        "docnames": ["d0", "d1", "d2", "d3"],
        "titles": ["Beta", "Alpha", "Alpha", "Gamma"],
        "terms": {"feed": [0, 1, 2, 3]},
        "titleterms": {}
    }));
    let first = ids(&engine, "feed");
    assert_eq!(first, vec![1, 2, 0, 3]);
    for _ in 0..20 {
        assert_eq!(engine.search("feed").unwrap(), engine.search("feed").unwrap());
        assert_eq!(ids(&engine, "feed"), first);
    }
}

#[test]
fn prefix_fallback_reaches_longer_keys() {
    let engine = engine_with(json!({
        "docnames": ["d0", "d1", "d2"],
        "titles": ["D0", "D1", "D2"],
        "terms": {"feeding": [1], "feedlot": [2]},
        "titleterms": {}
    }));
    assert_eq!(ids(&engine, "feed"), vec![1, 2]);
    assert_eq!(ids(&engine, "feedi"), vec![1]);
}

#[test]
fn single_letter_terms_expand_by_default() {
    let engine = engine_with(livestock());
    assert_eq!(ids(&engine, "feed p"), vec![0]);
    assert_eq!(ids(&engine, "p"), vec![0]);
    assert_eq!(ids(&engine, "s feed"), vec![1]);
}

#[test]
fn exact_match_suppresses_prefix_fallback() {
    let engine = engine_with(json!({
        "docnames": ["d0", "d1"],
        "titles": ["D0", "D1"],
        "terms": {"feed": [0], "feeding": [1]},
        "titleterms": {}
    }));
    assert_eq!(ids(&engine, "feed"), vec![0]);
    assert_eq!(ids(&engine, "fee"), vec![0, 1]);
}

#[test]
fn repeated_terms_do_not_boost() {
    let engine = engine_with(livestock());
    let once = engine.search("poultry feed").unwrap();
    let twice = engine.search("poultry feed feed POULTRY").unwrap();
    assert_eq!(once, twice);
}

#[test]
fn excluded_terms_filter_results() {
    let engine = engine_with(livestock());
    assert_eq!(ids(&engine, "feed -swine"), vec![0]);
    assert!(ids(&engine, "feed -feed").is_empty());
}

#[test]
fn search_before_load_is_an_error() {
    let engine = Engine::default();
    assert!(matches!(engine.search("feed"), Err(Error::IndexNotLoaded)));
}

#[test]
fn failed_reload_keeps_previous_snapshot() {
    let engine = engine_with(livestock());
    let bad = RawIndex::from_value(json!({
        "docnames": ["only"], "titles": ["Only"],
        "terms": {"feed": [0, 5]}, "titleterms": {}
    }))
    .unwrap();
    assert!(matches!(engine.load_raw(bad), Err(Error::MalformedIndex(_))));
    assert_eq!(engine.snapshot().unwrap().num_docs(), 2);
    assert_eq!(ids(&engine, "feed"), vec![0, 1]);
}

fn generation(tag: &str, n: usize) -> Value {
    let names: Vec<String> = (0..n).map(|i| format!("{tag}-{i}")).collect();
    let docs: Vec<usize> = (0..n).collect();
    json!({
        "docnames": names.clone(),
        "titles": names,
        "terms": {"shared": docs},
        "titleterms": {}
    })
}

#[test]
fn reload_is_atomic_under_concurrent_search() {
    let engine = Engine::default();
    let old = snapshot(generation("old", 3));
    let new = snapshot(generation("new", 7));
    engine.load_index(old.clone()).unwrap();
    let done = AtomicBool::new(false);

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                while !done.load(Ordering::Relaxed) {
                    let results = engine.search("shared").unwrap();
                    let tag = results[0].document.title.split('-').next().unwrap().to_string();
                    let expected = if tag == "old" { 3 } else { 7 };
                    assert_eq!(results.len(), expected);
                    assert!(results.iter().all(|r| r.document.title.starts_with(&tag)));
                }
            });
        }
        scope.spawn(|| {
            for i in 0..200 {
                let next = if i % 2 == 0 { new.clone() } else { old.clone() };
                engine.load_index(next).unwrap();
            }
            done.store(true, Ordering::Relaxed);
        });
    });
}

#[test]
fn sphinx_fixture_ranks_title_matches_first() {
    let engine = Engine::new(SearchConfig::sphinx()).unwrap();
    let text = include_str!("fixtures/searchindex.js");
    engine.load_raw(docsearch_core::searchindex::parse(text).unwrap()).unwrap();

    let results = engine.search("Poultry analysis").unwrap();
    let ranked: Vec<DocId> = results.iter().map(|r| r.document.id).collect();
    assert_eq!(ranked, vec![8, 25, 20]);
    assert_eq!(results[0].document.title, "Poultry analysis details");
    assert_eq!(results[0].score, 10.0);

    let swine = ids(&engine, "swine -cost");
    assert_eq!(swine[0], 11);
    assert!(!swine.iter().any(|id| [6, 14, 17].contains(id)));
}
