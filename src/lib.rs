//! Parallel frequent itemset and association rule mining.
//!
//! Items are counted and ranked, split into groups, mined for closed
//! patterns per group, expanded into itemsets, ranked, turned into rules
//! with single item conclusions and finally grouped by conclusion and
//! ranked by lift. Each step is a map/reduce `engine::Job`; `pipeline::run`
//! chains them.

extern crate itertools;
extern crate ordered_float;
extern crate rayon;

pub mod config;
pub mod discretizer;
pub mod engine;
pub mod error;
pub mod expand_closed;
pub mod fptree;
pub mod generate_rules;
pub mod groups;
pub mod header_table;
pub mod item_counter;
pub mod pfp_growth;
pub mod pipeline;
pub mod ranking;
pub mod rule_ranker;
pub mod storage;
pub mod top_k;
pub mod transaction_reader;

pub use config::Parameters;
pub use error::{Error, Result};
pub use pipeline::{run, run_with, RunSummary};
