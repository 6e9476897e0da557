extern crate parm;
extern crate proptest;
extern crate tempfile;

use parm::storage::{
    StageStore, DISCRETIZED, HEADER_TABLE, ITEMSET_SORTED, RULES, RULES_BY_CONCLUSION,
};
use parm::{Error, Parameters, RunSummary};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::{NamedTempFile, TempDir};

fn dataset(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

fn mine(input: &Path, output: &Path, min_support: f64, min_confidence: Option<f64>) -> RunSummary {
    let mut params = Parameters::new(input, output, min_support);
    params.min_confidence = min_confidence;
    parm::run(&params).unwrap()
}

// Every stage file under `root`, keyed by its path relative to `root`.
fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut files = BTreeMap::new();
    for stage in fs::read_dir(root).unwrap() {
        let stage = stage.unwrap().path();
        for part in fs::read_dir(&stage).unwrap() {
            let part = part.unwrap().path();
            let name = part.strip_prefix(root).unwrap().to_string_lossy().into_owned();
            files.insert(name, fs::read(&part).unwrap());
        }
    }
    files
}

const BASKETS: &[&str] = &["a b c", "a b", "a c", "b c", "a b c"];

#[test]
fn test_end_to_end() {
    let input = dataset(BASKETS);
    let output = TempDir::new().unwrap();
    let summary = mine(input.path(), output.path(), 0.6, Some(0.5));
    assert_eq!(
        summary,
        RunSummary {
            num_transactions: 5,
            min_support: 3,
            frequent_items: 3,
            closed_patterns: 6,
            itemsets: 6,
            rules: Some(6),
        }
    );

    let store = StageStore::new(output.path());
    assert_eq!(
        store.read_lines(HEADER_TABLE).unwrap(),
        vec!["a\t4", "b\t4", "c\t4"]
    );
    assert_eq!(
        store.read_lines(ITEMSET_SORTED).unwrap(),
        vec![
            "1\ta, 4 - 80.000%",
            "2\tb, 4 - 80.000%",
            "3\tc, 4 - 80.000%",
            "4\ta b, 3 - 60.000%",
            "5\ta c, 3 - 60.000%",
            "6\tb c, 3 - 60.000%",
        ]
    );
    let rules = store.read_lines(RULES).unwrap();
    assert_eq!(rules.len(), 6);
    // confidence(a => b) = support({a, b}) / support({a}) = 3 / 4
    assert!(rules.contains(&"a => b\t(0.600000, 0.750000, 0.937500)".to_owned()));

    let by_conclusion = store.read_lines(RULES_BY_CONCLUSION).unwrap();
    assert_eq!(by_conclusion.len(), 6);
    assert!(by_conclusion
        .iter()
        .any(|line| line.starts_with("b\ta => b\t(60.000%, 75%, 0.93")));
}

#[test]
fn test_closed_triple_at_lower_support() {
    let input = dataset(BASKETS);
    let output = TempDir::new().unwrap();
    let summary = mine(input.path(), output.path(), 0.4, Some(0.6));
    assert_eq!(summary.min_support, 2);
    assert_eq!(summary.closed_patterns, 7);
    assert_eq!(summary.itemsets, 7);
    // Pair rules at 75% and triple rules at 67%.
    assert_eq!(summary.rules, Some(9));

    let store = StageStore::new(output.path());
    let ranked = store.read_lines(ITEMSET_SORTED).unwrap();
    assert_eq!(ranked.last().unwrap(), "7\ta b c, 2 - 40.000%");
}

#[test]
fn test_single_transaction_full_support() {
    let input = dataset(&["x y z"]);
    let output = TempDir::new().unwrap();
    let summary = mine(input.path(), output.path(), 1.0, None);
    assert_eq!(summary.min_support, 1);
    assert_eq!(summary.frequent_items, 3);
    assert_eq!(summary.itemsets, 7);
    assert_eq!(summary.rules, None);
}

#[test]
fn test_rerun_is_byte_identical() {
    let input = dataset(&[
        "milk bread eggs",
        "bread butter",
        "milk bread butter",
        "",
        "eggs milk",
        "bread eggs milk butter",
        "butter",
    ]);
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let summary = mine(input.path(), first.path(), 0.3, Some(0.1));
    assert_eq!(summary, mine(input.path(), second.path(), 0.3, Some(0.1)));
    let before = snapshot(first.path());
    assert_eq!(before, snapshot(second.path()));

    // Re-running over an existing output directory reproduces it too.
    mine(input.path(), first.path(), 0.3, Some(0.1));
    assert_eq!(before, snapshot(first.path()));
}

#[test]
fn test_run_without_rules_removes_stale_rules() {
    let input = dataset(BASKETS);
    let output = TempDir::new().unwrap();
    mine(input.path(), output.path(), 0.6, Some(0.5));
    let store = StageStore::new(output.path());
    assert!(store.stage_dir(RULES).exists());

    mine(input.path(), output.path(), 0.6, None);
    assert!(!store.stage_dir(RULES).exists());
    assert!(!store.stage_dir(RULES_BY_CONCLUSION).exists());
}

#[test]
fn test_discretization() {
    let input = dataset(&["tcp 17", "udp 15", "tcp 42"]);
    let output = TempDir::new().unwrap();
    let mut params = Parameters::new(input.path(), output.path(), 0.6);
    params.enable_discretization = true;
    let summary = parm::run(&params).unwrap();
    assert_eq!(summary.frequent_items, 2);

    let store = StageStore::new(output.path());
    assert_eq!(
        store.read_lines(DISCRETIZED).unwrap(),
        vec!["0\tc0=tcp c1=[10,20)", "1\tc0=udp c1=[10,20)", "2\tc0=tcp c1=[40,50)"]
    );
    assert_eq!(
        store.read_lines(HEADER_TABLE).unwrap(),
        vec!["c0=tcp\t2", "c1=[10,20)\t2"]
    );
}

#[test]
fn test_bad_configuration_fails_before_any_stage() {
    let input = dataset(BASKETS);
    let output = TempDir::new().unwrap();
    let params = Parameters::new(input.path(), output.path().join("out"), 1.5);
    assert!(matches!(parm::run(&params), Err(Error::Config(_))));
    assert!(!output.path().join("out").exists());
}

fn parse_measures(line: &str) -> (String, f64, f64) {
    let (rule, measures) = line.split_at(line.find('\t').unwrap());
    let measures: Vec<f64> = measures
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(", ")
        .map(|m| m.parse().unwrap())
        .collect();
    (rule.to_owned(), measures[1], measures[2])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn rules_meet_confidence_and_rank_by_lift(
        rows in prop::collection::vec(prop::collection::vec(0u8..7, 1..6), 1..25),
        min_support in 0.1f64..0.6,
        min_confidence in 0.0f64..1.0,
        num_groups in 1usize..5,
    ) {
        let lines: Vec<String> = rows
            .iter()
            .map(|r| r.iter().map(|i| format!("i{}", i)).collect::<Vec<_>>().join(" "))
            .collect();
        let input = dataset(&lines.iter().map(|l| l.as_str()).collect::<Vec<_>>());
        let output = TempDir::new().unwrap();
        let mut params = Parameters::new(input.path(), output.path(), min_support)
            .with_min_confidence(min_confidence);
        params.num_groups = num_groups;
        parm::run(&params).unwrap();

        let store = StageStore::new(output.path());
        for line in store.read_lines(RULES).unwrap() {
            let (_, confidence, _) = parse_measures(&line);
            // Six decimals in the table.
            prop_assert!(confidence >= min_confidence - 1e-6);
        }

        let ranked = store.read_lines(RULES_BY_CONCLUSION).unwrap();
        let mut previous: Option<(String, f64)> = None;
        for line in ranked {
            let (conclusion, rest) = line.split_at(line.find('\t').unwrap());
            let lift: f64 = rest
                .rsplit(", ")
                .next()
                .unwrap()
                .trim_end_matches(')')
                .parse()
                .unwrap();
            if let Some((ref prev_conclusion, prev_lift)) = previous {
                if prev_conclusion == conclusion {
                    prop_assert!(prev_lift >= lift);
                }
            }
            previous = Some((conclusion.to_owned(), lift));
        }
    }
}
