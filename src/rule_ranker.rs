//! Groups rules by conclusion, each group ordered by lift descending.
//!
//! Rules are keyed by `(conclusion, lift)`. Partitioning and grouping look
//! only at the conclusion, while the shuffle sorts on the whole key, so one
//! reduce call receives all rules of a conclusion already sorted by lift.

use crate::engine::{hash_partition, Job};
use crate::error::Result;
use crate::generate_rules::Rule;
use crate::storage::TableRow;
use ordered_float::OrderedFloat;
use std::cmp::{Ordering, Reverse};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleKey {
    pub conclusion: String,
    pub lift: OrderedFloat<f64>,
}

impl RuleKey {
    pub fn of(rule: &Rule) -> RuleKey {
        RuleKey {
            conclusion: rule.conclusion().to_owned(),
            lift: rule.lift_key(),
        }
    }
}

pub fn partition_key(key: &RuleKey) -> &str {
    &key.conclusion
}

pub fn sort_key(key: &RuleKey) -> (&str, Reverse<OrderedFloat<f64>>) {
    (&key.conclusion, Reverse(key.lift))
}

pub fn group_key(key: &RuleKey) -> &str {
    &key.conclusion
}

#[derive(Clone, Debug)]
pub struct RankedRule {
    pub conclusion: String,
    pub rule: Rule,
}

impl TableRow for RankedRule {
    fn key(&self) -> String {
        self.conclusion.clone()
    }

    fn value(&self) -> String {
        format!(
            "{}\t({:.3}%, {:.0}%, {:.3})",
            self.rule,
            self.rule.support() * 100.0,
            self.rule.confidence() * 100.0,
            self.rule.lift()
        )
    }
}

pub struct RuleRanking;

impl Job for RuleRanking {
    type Input = Rule;
    type Key = RuleKey;
    type Value = Rule;
    type Output = RankedRule;

    fn name(&self) -> &'static str {
        "rule_ranking"
    }

    fn map(&self, rule: &Rule, emit: &mut Vec<(RuleKey, Rule)>) -> Result<()> {
        emit.push((RuleKey::of(rule), rule.clone()));
        Ok(())
    }

    fn partition(&self, key: &RuleKey, num_partitions: usize) -> usize {
        hash_partition(partition_key(key), num_partitions)
    }

    fn compare(&self, a: &RuleKey, b: &RuleKey) -> Ordering {
        sort_key(a).cmp(&sort_key(b))
    }

    fn same_group(&self, a: &RuleKey, b: &RuleKey) -> bool {
        group_key(a) == group_key(b)
    }

    // Records arrive sorted by lift; nothing left to do but format.
    fn reduce(&self, key: &RuleKey, rules: Vec<Rule>, output: &mut Vec<RankedRule>) -> Result<()> {
        let conclusion = group_key(key);
        output.extend(rules.into_iter().map(|rule| RankedRule {
            conclusion: conclusion.to_owned(),
            rule,
        }));
        Ok(())
    }
}
