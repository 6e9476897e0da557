use crate::config::absolute_support;
use crate::error::{Error, Result};
use crate::item_counter::{CountKey, ItemFrequency};
use crate::storage::TableRow;
use std::collections::HashMap;
use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrequencyEntry {
    pub token: String,
    pub count: u64,
}

impl TableRow for FrequencyEntry {
    fn key(&self) -> String {
        self.token.clone()
    }

    fn value(&self) -> String {
        self.count.to_string()
    }
}

/// The frequent items of the dataset ranked by count descending, ties broken
/// by token. An item's rank is its dense id: id 0 is the most frequent item,
/// so sorting ids ascending sorts items by decreasing frequency.
///
/// Built once by the driver after counting, then shared read-only with
/// every later stage.
#[derive(Debug)]
pub struct HeaderTable {
    entries: Vec<FrequencyEntry>,
    ids: HashMap<String, u32>,
    num_transactions: u64,
    min_support: u64,
}

impl HeaderTable {
    pub fn build(frequencies: Vec<ItemFrequency>, relative_min_support: f64) -> Result<HeaderTable> {
        let num_transactions = frequencies
            .iter()
            .find(|f| f.key == CountKey::Dataset)
            .map(|f| f.count)
            .ok_or_else(|| {
                Error::data_consistency(
                    "item frequencies have no dataset entry; cannot determine the number of transactions",
                )
            })?;
        let min_support = absolute_support(relative_min_support, num_transactions);

        let mut entries: Vec<FrequencyEntry> = frequencies
            .into_iter()
            .filter(|f| f.count >= min_support)
            .filter_map(|f| match f.key {
                CountKey::Token(token) => Some(FrequencyEntry {
                    token,
                    count: f.count,
                }),
                CountKey::Dataset => None,
            })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.token.cmp(&b.token)));

        let ids = entries
            .iter()
            .enumerate()
            .map(|(id, entry)| (entry.token.clone(), id as u32))
            .collect();

        info!("# Transactions: {}", num_transactions);
        info!("Support: {}%", relative_min_support * 100.0);
        info!("Support count: {}", min_support);
        info!("{} items are frequent.", entries.len());

        Ok(HeaderTable {
            entries,
            ids,
            num_transactions,
            min_support,
        })
    }

    pub fn entries(&self) -> &[FrequencyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn num_transactions(&self) -> u64 {
        self.num_transactions
    }

    pub fn min_support(&self) -> u64 {
        self.min_support
    }

    pub fn id_of(&self, token: &str) -> Option<u32> {
        self.ids.get(token).cloned()
    }

    pub fn str_of(&self, id: u32) -> &str {
        &self.entries[id as usize].token
    }

    pub fn count_of_id(&self, id: u32) -> u64 {
        self.entries[id as usize].count
    }

    /// Global transaction count of a frequent token.
    pub fn count_of(&self, token: &str) -> Result<u64> {
        match self.id_of(token) {
            Some(id) => Ok(self.count_of_id(id)),
            None => Err(Error::data_consistency(format!(
                "token '{}' is not in the header table",
                token
            ))),
        }
    }

    pub fn support_of(&self, count: u64) -> f64 {
        count as f64 / self.num_transactions as f64
    }

    /// Maps a transaction onto the ids of its frequent items, deduplicated,
    /// in decreasing frequency order.
    pub fn to_id_vec(&self, transaction: &[String]) -> Vec<u32> {
        let mut ids: Vec<u32> = transaction.iter().filter_map(|t| self.id_of(t)).collect();
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn to_tokens(&self, ids: &[u32]) -> Vec<String> {
        ids.iter().map(|&id| self.str_of(id).to_owned()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frequencies(dataset: Option<u64>, counts: &[(&str, u64)]) -> Vec<ItemFrequency> {
        let mut frequencies: Vec<ItemFrequency> = counts
            .iter()
            .map(|&(token, count)| ItemFrequency {
                key: CountKey::Token(token.to_owned()),
                count,
            })
            .collect();
        if let Some(count) = dataset {
            frequencies.push(ItemFrequency {
                key: CountKey::Dataset,
                count,
            });
        }
        frequencies
    }

    #[test]
    fn test_ranking() {
        let table = HeaderTable::build(
            frequencies(Some(10), &[("c", 4), ("a", 4), ("x", 2), ("b", 7), ("d", 3)]),
            0.3,
        )
        .unwrap();
        assert_eq!(table.num_transactions(), 10);
        assert_eq!(table.min_support(), 3);
        let tokens: Vec<&str> = table.entries().iter().map(|e| e.token.as_str()).collect();
        assert_eq!(tokens, vec!["b", "a", "c", "d"]);
        assert_eq!(table.id_of("a"), Some(1));
        assert_eq!(table.id_of("x"), None);
        assert_eq!(table.count_of("c").unwrap(), 4);
        assert!(matches!(table.count_of("x"), Err(Error::DataConsistency(_))));

        let transaction: Vec<String> = ["d", "x", "b", "a", "b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(table.to_id_vec(&transaction), vec![0, 1, 3]);
        assert_eq!(table.to_tokens(&[0, 1, 3]), vec!["b", "a", "d"]);
    }

    #[test]
    fn test_missing_dataset_entry() {
        let result = HeaderTable::build(frequencies(None, &[("a", 1)]), 0.5);
        assert!(matches!(result, Err(Error::DataConsistency(_))));
    }

    #[test]
    fn test_single_transaction_full_support() {
        let table = HeaderTable::build(frequencies(Some(1), &[("a", 1), ("b", 1)]), 1.0).unwrap();
        assert_eq!(table.min_support(), 1);
        assert_eq!(table.len(), 2);
    }
}
