//! Parallel FP-Growth over item groups.
//!
//! The map side sends every transaction to each group owning one of its
//! frequent items, truncated after the last item of that group. The reduce
//! side builds one FP-tree per group and, for each item the group owns, mines
//! the top-k closed patterns whose least frequent item is that item.

use crate::engine::Job;
use crate::error::Result;
use crate::fptree::FPTree;
use crate::groups::{group_of, members_of};
use crate::header_table::HeaderTable;
use crate::storage::TableRow;
use crate::top_k::{Pattern, TopKPatterns};
use itertools::Itertools;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClosedPattern {
    // Header table rank order.
    pub items: Vec<String>,
    pub support: u64,
}

impl TableRow for ClosedPattern {
    fn key(&self) -> String {
        self.items.join(" ")
    }

    fn value(&self) -> String {
        self.support.to_string()
    }
}

/// The closed patterns mined for one starting item, best first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemPatterns {
    pub item: String,
    pub patterns: Vec<ClosedPattern>,
}

impl TableRow for ItemPatterns {
    fn key(&self) -> String {
        self.item.clone()
    }

    fn value(&self) -> String {
        format!(
            "[{}]",
            self.patterns
                .iter()
                .map(|p| format!("({}, {})", p.items.join(" "), p.support))
                .join(", ")
        )
    }
}

// Transaction prefix sent to one group, with its multiplicity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupTransaction {
    pub items: Vec<u32>,
    pub count: u64,
}

pub struct ParallelFPGrowth<'a> {
    header: &'a HeaderTable,
    max_per_group: u32,
    max_heap_size: usize,
}

impl<'a> ParallelFPGrowth<'a> {
    pub fn new(header: &'a HeaderTable, max_per_group: u32, max_heap_size: usize) -> ParallelFPGrowth<'a> {
        ParallelFPGrowth {
            header,
            max_per_group,
            max_heap_size,
        }
    }

    fn mine_item(&self, tree: &FPTree, item: u32) -> Vec<Pattern> {
        let min_support = self.header.min_support();
        let support = tree.item_count(item);
        if support == 0 || support < min_support {
            return vec![];
        }
        let mut top = TopKPatterns::new(self.max_heap_size);
        top.insert(vec![item], support);
        let conditional = tree.conditional_tree(item, min_support);
        grow(&conditional, &[item], min_support, &mut top);
        top.into_sorted_vec()
    }

    fn to_closed_pattern(&self, pattern: Pattern) -> ClosedPattern {
        ClosedPattern {
            items: self.header.to_tokens(&pattern.items),
            support: pattern.support,
        }
    }
}

// Extends `suffix` with every item of its conditional `tree`, least
// frequent first, recursing into each extension's conditional tree.
fn grow(tree: &FPTree, suffix: &[u32], min_support: u64, top: &mut TopKPatterns) {
    for item in tree.items().into_iter().rev() {
        let support = tree.item_count(item);
        if support < min_support || !top.admits(support) {
            continue;
        }
        let pattern: Vec<u32> = suffix
            .iter()
            .cloned()
            .chain(Some(item))
            .sorted()
            .collect();
        top.insert(pattern.clone(), support);
        let conditional = tree.conditional_tree(item, min_support);
        if !conditional.is_empty() {
            grow(&conditional, &pattern, min_support, top);
        }
    }
}

impl<'a> Job for ParallelFPGrowth<'a> {
    type Input = Vec<String>;
    type Key = u32;
    type Value = GroupTransaction;
    type Output = ItemPatterns;

    fn name(&self) -> &'static str {
        "pfp_growth"
    }

    fn map(&self, transaction: &Vec<String>, emit: &mut Vec<(u32, GroupTransaction)>) -> Result<()> {
        let items = self.header.to_id_vec(transaction);
        // Ids ascend, so groups ascend too; walking backwards, the first
        // item seen of each group is the last one in the transaction.
        let mut last_group = None;
        for (j, &item) in items.iter().enumerate().rev() {
            let group = group_of(item, self.max_per_group);
            if last_group != Some(group) {
                last_group = Some(group);
                emit.push((
                    group,
                    GroupTransaction {
                        items: items[..=j].to_vec(),
                        count: 1,
                    },
                ));
            }
        }
        Ok(())
    }

    fn combines(&self) -> bool {
        true
    }

    fn combine(&self, _group: &u32, values: Vec<GroupTransaction>) -> Vec<GroupTransaction> {
        let mut merged: BTreeMap<Vec<u32>, u64> = BTreeMap::new();
        for t in values {
            *merged.entry(t.items).or_insert(0) += t.count;
        }
        merged
            .into_iter()
            .map(|(items, count)| GroupTransaction { items, count })
            .collect()
    }

    fn reduce(&self, group: &u32, values: Vec<GroupTransaction>, output: &mut Vec<ItemPatterns>) -> Result<()> {
        let mut tree = FPTree::new();
        for t in values.iter() {
            tree.insert(&t.items, t.count);
        }
        debug!(
            "Group {} tree has {} nodes over {} transactions.",
            group,
            tree.num_nodes(),
            tree.num_transactions()
        );
        for item in members_of(*group, self.max_per_group, self.header.len() as u32) {
            let patterns = self.mine_item(&tree, item);
            if patterns.is_empty() {
                continue;
            }
            output.push(ItemPatterns {
                item: self.header.str_of(item).to_owned(),
                patterns: patterns
                    .into_iter()
                    .map(|p| self.to_closed_pattern(p))
                    .collect(),
            });
        }
        Ok(())
    }
}
