use crate::engine::Job;
use crate::error::Result;
use crate::expand_closed::Itemset;
use crate::pfp_growth::ClosedPattern;
use crate::storage::TableRow;
use std::cmp::Reverse;
use std::marker::PhantomData;

pub trait Supported {
    fn items(&self) -> &[String];
    fn support(&self) -> u64;
}

impl Supported for ClosedPattern {
    fn items(&self) -> &[String] {
        &self.items
    }

    fn support(&self) -> u64 {
        self.support
    }
}

impl Supported for Itemset {
    fn items(&self) -> &[String] {
        &self.items
    }

    fn support(&self) -> u64 {
        self.support
    }
}

// Support descending, then items ascending, so the order is total.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SupportRank {
    support: Reverse<u64>,
    items: Vec<String>,
}

/// Totally orders records by support, descending. Everything goes through a
/// single partition, so its output is one globally sorted run.
pub struct RankBySupport<T> {
    name: &'static str,
    _records: PhantomData<fn() -> T>,
}

impl<T> RankBySupport<T> {
    pub fn new(name: &'static str) -> RankBySupport<T> {
        RankBySupport {
            name,
            _records: PhantomData,
        }
    }
}

impl<T: Supported + Clone + Send + Sync> Job for RankBySupport<T> {
    type Input = T;
    type Key = SupportRank;
    type Value = T;
    type Output = T;

    fn name(&self) -> &'static str {
        self.name
    }

    fn num_partitions(&self, _default: usize) -> usize {
        1
    }

    fn map(&self, record: &T, emit: &mut Vec<(SupportRank, T)>) -> Result<()> {
        let rank = SupportRank {
            support: Reverse(record.support()),
            items: record.items().to_vec(),
        };
        emit.push((rank, record.clone()));
        Ok(())
    }

    fn reduce(&self, _rank: &SupportRank, values: Vec<T>, output: &mut Vec<T>) -> Result<()> {
        output.extend(values);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RankedItemset {
    pub rank: usize,
    pub items: Vec<String>,
    pub support: u64,
    pub percent: f64,
}

impl TableRow for RankedItemset {
    fn key(&self) -> String {
        self.rank.to_string()
    }

    fn value(&self) -> String {
        format!("{}, {} - {:.3}%", self.items.join(" "), self.support, self.percent)
    }
}

/// Numbers itemsets already sorted by support, starting at 1.
pub fn rank_itemsets(sorted: Vec<Itemset>, num_transactions: u64) -> Vec<RankedItemset> {
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, itemset)| RankedItemset {
            rank: i + 1,
            percent: itemset.support as f64 / num_transactions as f64 * 100.0,
            items: itemset.items,
            support: itemset.support,
        })
        .collect()
}
