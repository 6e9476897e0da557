//! The driver: runs every stage in order, each consuming the complete output
//! of the one before it. A stage that fails has its output deleted and stops
//! the run.

use crate::config::Parameters;
use crate::discretizer::{ColumnDiscretizer, DiscretizedRow, Discretizer};
use crate::engine::{flatten, LocalEngine};
use crate::error::{Error, Result};
use crate::expand_closed::{ExpandClosed, Itemset};
use crate::generate_rules::{Rule, RuleMining};
use crate::groups::max_per_group;
use crate::header_table::HeaderTable;
use crate::item_counter::ItemCounter;
use crate::pfp_growth::{ClosedPattern, ItemPatterns, ParallelFPGrowth};
use crate::ranking::{rank_itemsets, RankBySupport};
use crate::rule_ranker::RuleRanking;
use crate::storage::{
    StageStore, CLOSED, CLOSED_SORTED, DISCRETIZED, HEADER_TABLE, ITEMSETS, ITEMSET_SORTED,
    ITEM_FREQUENCY, RULES, RULES_BY_CONCLUSION,
};
use crate::transaction_reader::TransactionReader;
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub num_transactions: u64,
    pub min_support: u64,
    pub frequent_items: usize,
    pub closed_patterns: usize,
    pub itemsets: usize,
    // None when rule mining was not requested.
    pub rules: Option<usize>,
}

pub fn run(params: &Parameters) -> Result<RunSummary> {
    run_with(params, &ColumnDiscretizer::new(params.bin_width))
}

pub fn run_with(params: &Parameters, discretizer: &dyn Discretizer) -> Result<RunSummary> {
    params.validate()?;
    let start = Instant::now();
    let splitter = params.splitter()?;
    let engine = LocalEngine::new(params.num_reducers).with_task_attempts(params.task_attempts);
    let store = StageStore::new(&params.output_path);

    info!("Mining data set: {}", params.input_path.display());
    let mut transactions = read_transactions(&params.input_path, &splitter)?;

    if params.enable_discretization {
        transactions = run_stage(&store, DISCRETIZED, || {
            let discretized: Vec<Vec<String>> = transactions
                .par_iter()
                .map(|t| discretizer.discretize(t))
                .collect();
            let rows: Vec<DiscretizedRow> = discretized
                .iter()
                .enumerate()
                .map(|(line, tokens)| DiscretizedRow { line, tokens })
                .collect();
            store.write_table(DISCRETIZED, &rows)?;
            Ok(discretized)
        })?;
    }

    let frequencies = run_stage(&store, ITEM_FREQUENCY, || {
        let partitions = engine.run(&ItemCounter, &transactions)?;
        store.write_partitions(ITEM_FREQUENCY, &partitions)?;
        Ok(flatten(partitions))
    })?;

    let header = run_stage(&store, HEADER_TABLE, || {
        let header = HeaderTable::build(frequencies, params.min_support)?;
        store.write_table(HEADER_TABLE, header.entries())?;
        Ok(header)
    })?;

    let item_patterns: Vec<ItemPatterns> = run_stage(&store, CLOSED, || {
        let per_group = max_per_group(header.len(), params.num_groups);
        info!(
            "Mining {} items in groups of at most {}, keeping {} patterns per item.",
            header.len(),
            per_group,
            params.max_heap_size
        );
        let job = ParallelFPGrowth::new(&header, per_group, params.max_heap_size);
        let partitions = engine.run(&job, &transactions)?;
        store.write_partitions(CLOSED, &partitions)?;
        Ok(flatten(partitions))
    })?;

    let closed_patterns = run_stage(&store, CLOSED_SORTED, || {
        let closed: Vec<ClosedPattern> = item_patterns
            .iter()
            .flat_map(|p| p.patterns.iter().cloned())
            .collect();
        let partitions = engine.run(&RankBySupport::<ClosedPattern>::new("closed_sorting"), &closed)?;
        store.write_partitions(CLOSED_SORTED, &partitions)?;
        Ok(closed.len())
    })?;

    let itemsets: Vec<Itemset> = run_stage(&store, ITEMSETS, || {
        let partitions = engine.run(&ExpandClosed, &item_patterns)?;
        store.write_partitions(ITEMSETS, &partitions)?;
        Ok(flatten(partitions))
    })?;

    run_stage(&store, ITEMSET_SORTED, || {
        let sorted = flatten(engine.run(&RankBySupport::<Itemset>::new("itemset_sorting"), &itemsets)?);
        let ranked = rank_itemsets(sorted, header.num_transactions());
        store.write_table(ITEMSET_SORTED, &ranked)
    })?;

    let rules = match params.min_confidence {
        Some(min_confidence) => {
            let rules: Vec<Rule> = run_stage(&store, RULES, || {
                let job = RuleMining::new(&header, min_confidence);
                let partitions = engine.run(&job, &itemsets)?;
                store.write_partitions(RULES, &partitions)?;
                Ok(flatten(partitions))
            })?;
            run_stage(&store, RULES_BY_CONCLUSION, || {
                let partitions = engine.run(&RuleRanking, &rules)?;
                store.write_partitions(RULES_BY_CONCLUSION, &partitions)
            })?;
            Some(rules.len())
        }
        None => {
            // Rules from an earlier run would no longer match the itemsets.
            store.clear(RULES)?;
            store.clear(RULES_BY_CONCLUSION)?;
            None
        }
    };

    let summary = RunSummary {
        num_transactions: header.num_transactions(),
        min_support: header.min_support(),
        frequent_items: header.len(),
        closed_patterns,
        itemsets: itemsets.len(),
        rules,
    };
    info!("Total runtime: {} ms", start.elapsed().as_millis());
    Ok(summary)
}

fn read_transactions(path: &Path, splitter: &regex::Regex) -> Result<Vec<Vec<String>>> {
    let timer = Instant::now();
    let mut reader = TransactionReader::new(path, splitter)?;
    let transactions = reader.by_ref().collect::<Result<Vec<_>>>()?;
    info!(
        "Read {} transactions in {} ms, skipped {} lines.",
        transactions.len(),
        timer.elapsed().as_millis(),
        reader.skipped()
    );
    Ok(transactions)
}

fn run_stage<T, F>(store: &StageStore, stage: &'static str, run: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let timer = Instant::now();
    info!("Starting stage {}...", stage);
    store.clear(stage).map_err(|err| Error::stage(stage, err))?;
    match run() {
        Ok(output) => {
            info!("Stage {} took {} ms.", stage, timer.elapsed().as_millis());
            Ok(output)
        }
        Err(err) => {
            if let Err(clear_err) = store.clear(stage) {
                warn!("Could not delete output of failed stage {}: {}", stage, clear_err);
            }
            Err(Error::stage(stage, err))
        }
    }
}
