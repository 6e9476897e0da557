use crate::engine::Job;
use crate::error::Result;
use crate::pfp_growth::ItemPatterns;
use crate::storage::TableRow;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Itemset {
    // Header table rank order.
    pub items: Vec<String>,
    pub support: u64,
}

impl TableRow for Itemset {
    fn key(&self) -> String {
        self.items.join(" ")
    }

    fn value(&self) -> String {
        self.support.to_string()
    }
}

// Every non-empty subset of `items`, each keeping the order of `items`.
pub fn subsets<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    let mut subsets: Vec<Vec<T>> = vec![vec![]];
    for item in items {
        let n = subsets.len();
        for i in 0..n {
            let mut subset = subsets[i].clone();
            subset.push(item.clone());
            subsets.push(subset);
        }
    }
    subsets.remove(0);
    subsets
}

/// Expands closed patterns into all the itemsets they contain. A subset's
/// support is at least that of any closed pattern containing it, so each
/// distinct itemset takes the largest support among the patterns it was
/// expanded from.
pub struct ExpandClosed;

impl Job for ExpandClosed {
    type Input = ItemPatterns;
    type Key = Vec<String>;
    type Value = u64;
    type Output = Itemset;

    fn name(&self) -> &'static str {
        "expand_closed"
    }

    fn map(&self, input: &ItemPatterns, emit: &mut Vec<(Vec<String>, u64)>) -> Result<()> {
        for pattern in input.patterns.iter() {
            for subset in subsets(&pattern.items) {
                emit.push((subset, pattern.support));
            }
        }
        Ok(())
    }

    fn combines(&self) -> bool {
        true
    }

    fn combine(&self, _items: &Vec<String>, values: Vec<u64>) -> Vec<u64> {
        values.into_iter().max().into_iter().collect()
    }

    fn reduce(&self, items: &Vec<String>, values: Vec<u64>, output: &mut Vec<Itemset>) -> Result<()> {
        if let Some(support) = values.into_iter().max() {
            output.push(Itemset {
                items: items.clone(),
                support,
            });
        }
        Ok(())
    }
}
