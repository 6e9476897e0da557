use crate::engine::Job;
use crate::error::Result;
use crate::storage::TableRow;
use itertools::Itertools;

pub const DATASET_KEY: &str = "dataset";

/// Key of the counting stage. The transaction counter has its own variant
/// so no data token can collide with it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CountKey {
    Dataset,
    Token(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemFrequency {
    pub key: CountKey,
    pub count: u64,
}

impl TableRow for ItemFrequency {
    fn key(&self) -> String {
        match self.key {
            CountKey::Dataset => DATASET_KEY.to_owned(),
            CountKey::Token(ref token) => token.clone(),
        }
    }

    fn value(&self) -> String {
        self.count.to_string()
    }
}

// Counts, for every token, the number of transactions containing it, and
// the number of transactions overall.
pub struct ItemCounter;

impl Job for ItemCounter {
    type Input = Vec<String>;
    type Key = CountKey;
    type Value = u64;
    type Output = ItemFrequency;

    fn name(&self) -> &'static str {
        "item_counter"
    }

    fn map(&self, transaction: &Vec<String>, emit: &mut Vec<(CountKey, u64)>) -> Result<()> {
        if transaction.is_empty() {
            return Ok(());
        }
        for token in transaction.iter().unique() {
            emit.push((CountKey::Token(token.clone()), 1));
        }
        emit.push((CountKey::Dataset, 1));
        Ok(())
    }

    fn combines(&self) -> bool {
        true
    }

    fn combine(&self, _key: &CountKey, values: Vec<u64>) -> Vec<u64> {
        vec![values.iter().sum()]
    }

    fn reduce(&self, key: &CountKey, values: Vec<u64>, output: &mut Vec<ItemFrequency>) -> Result<()> {
        output.push(ItemFrequency {
            key: key.clone(),
            count: values.iter().sum(),
        });
        Ok(())
    }
}
