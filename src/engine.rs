//! In-process batch execution engine.
//!
//! A `Job` describes one stage as map/combine/reduce functions plus the
//! shuffle configuration (partitioning, sort order and grouping). The
//! `LocalEngine` runs map tasks over input splits and reduce tasks over
//! partitions in parallel on the rayon thread pool. Stages never share
//! mutable state; everything a task needs is borrowed read-only from the job.

use crate::error::Result;
use itertools::Itertools;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Instant;
use tracing::{debug, info, warn};

const SPLIT_SIZE_DEFAULT: usize = 4096;

pub trait Job: Sync {
    type Input: Sync;
    type Key: Ord + Hash + Clone + Send;
    type Value: Clone + Send;
    type Output: Send;

    fn name(&self) -> &'static str;

    fn map(&self, input: &Self::Input, emit: &mut Vec<(Self::Key, Self::Value)>) -> Result<()>;

    fn reduce(
        &self,
        key: &Self::Key,
        values: Vec<Self::Value>,
        output: &mut Vec<Self::Output>,
    ) -> Result<()>;

    /// Whether `combine` should run over each map task's output before the
    /// shuffle. Only valid for commutative, associative aggregations.
    fn combines(&self) -> bool {
        false
    }

    fn combine(&self, _key: &Self::Key, values: Vec<Self::Value>) -> Vec<Self::Value> {
        values
    }

    fn num_partitions(&self, default: usize) -> usize {
        default
    }

    fn partition(&self, key: &Self::Key, num_partitions: usize) -> usize {
        hash_partition(key, num_partitions)
    }

    // Order of records inside a partition.
    fn compare(&self, a: &Self::Key, b: &Self::Key) -> Ordering {
        a.cmp(b)
    }

    // Delimits one reduce invocation from the next among sorted records.
    fn same_group(&self, a: &Self::Key, b: &Self::Key) -> bool {
        a == b
    }
}

/// Hash partitioning with a fixed-key hasher, so that re-running a stage
/// assigns every key to the same partition.
pub fn hash_partition<K: Hash + ?Sized>(key: &K, num_partitions: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % num_partitions as u64) as usize
}

pub fn flatten<T>(partitions: Vec<Vec<T>>) -> Vec<T> {
    partitions.into_iter().flatten().collect()
}

pub struct LocalEngine {
    num_reducers: usize,
    split_size: usize,
    task_attempts: usize,
}

impl LocalEngine {
    pub fn new(num_reducers: usize) -> LocalEngine {
        LocalEngine {
            num_reducers: num_reducers.max(1),
            split_size: SPLIT_SIZE_DEFAULT,
            task_attempts: 1,
        }
    }

    pub fn with_task_attempts(mut self, task_attempts: usize) -> LocalEngine {
        self.task_attempts = task_attempts.max(1);
        self
    }

    pub fn with_split_size(mut self, split_size: usize) -> LocalEngine {
        self.split_size = split_size.max(1);
        self
    }

    /// Runs `job` over `inputs`, returning the reduce output of each
    /// partition in partition order.
    pub fn run<J: Job>(&self, job: &J, inputs: &[J::Input]) -> Result<Vec<Vec<J::Output>>> {
        let timer = Instant::now();
        let num_partitions = job.num_partitions(self.num_reducers).max(1);

        let map_outputs = inputs
            .par_chunks(self.split_size)
            .enumerate()
            .map(|(task, split)| {
                self.with_retries(job.name(), "map", task, || {
                    map_task(job, split, num_partitions)
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let num_map_tasks = map_outputs.len();

        // Shuffle: gather each partition's records in map task order.
        let mut partitions: Vec<Vec<(J::Key, J::Value)>> =
            (0..num_partitions).map(|_| Vec::new()).collect();
        for task_output in map_outputs {
            for (partition, records) in task_output.into_iter().enumerate() {
                partitions[partition].extend(records);
            }
        }
        let num_records: usize = partitions.iter().map(|p| p.len()).sum();

        let output = partitions
            .into_par_iter()
            .enumerate()
            .map(|(partition, records)| self.reduce_task(job, partition, records))
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Job {} ran {} map tasks and {} reduce tasks over {} shuffled records in {} ms.",
            job.name(),
            num_map_tasks,
            num_partitions,
            num_records,
            timer.elapsed().as_millis()
        );
        Ok(output)
    }

    fn reduce_task<J: Job>(
        &self,
        job: &J,
        partition: usize,
        mut records: Vec<(J::Key, J::Value)>,
    ) -> Result<Vec<J::Output>> {
        // Stable, so records with equal sort keys keep their shuffle order.
        records.sort_by(|a, b| job.compare(&a.0, &b.0));
        let mut attempt = 1;
        loop {
            // The last attempt may consume the sorted records.
            let input = if attempt < self.task_attempts {
                records.clone()
            } else {
                std::mem::take(&mut records)
            };
            match reduce_groups(job, input) {
                Ok(output) => {
                    debug!(
                        "Job {} reduce task {} emitted {} records.",
                        job.name(),
                        partition,
                        output.len()
                    );
                    return Ok(output);
                }
                Err(err) if attempt < self.task_attempts => {
                    warn!(
                        "Job {} reduce task {} attempt {} failed, retrying: {}",
                        job.name(),
                        partition,
                        attempt,
                        err
                    );
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn with_retries<T, F>(&self, job: &str, phase: &str, task: usize, run: F) -> Result<T>
    where
        F: Fn() -> Result<T>,
    {
        let mut attempt = 1;
        loop {
            match run() {
                Ok(output) => return Ok(output),
                Err(err) if attempt < self.task_attempts => {
                    warn!(
                        "Job {} {} task {} attempt {} failed, retrying: {}",
                        job, phase, task, attempt, err
                    );
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn map_task<J: Job>(
    job: &J,
    split: &[J::Input],
    num_partitions: usize,
) -> Result<Vec<Vec<(J::Key, J::Value)>>> {
    let mut emitted = Vec::new();
    for input in split {
        job.map(input, &mut emitted)?;
    }
    if job.combines() {
        emitted = combine_records(job, emitted);
    }
    let mut partitions: Vec<Vec<(J::Key, J::Value)>> =
        (0..num_partitions).map(|_| Vec::new()).collect();
    for (key, value) in emitted {
        let partition = job.partition(&key, num_partitions);
        partitions[partition].push((key, value));
    }
    Ok(partitions)
}

fn combine_records<J: Job>(job: &J, mut records: Vec<(J::Key, J::Value)>) -> Vec<(J::Key, J::Value)> {
    records.sort_by(|a, b| a.0.cmp(&b.0));
    let mut combined = Vec::with_capacity(records.len());
    let mut records = records.into_iter().peekable();
    while let Some((key, value)) = records.next() {
        let mut values = vec![value];
        values.extend(records.peeking_take_while(|(k, _)| *k == key).map(|(_, v)| v));
        for value in job.combine(&key, values) {
            combined.push((key.clone(), value));
        }
    }
    combined
}

fn reduce_groups<J: Job>(job: &J, records: Vec<(J::Key, J::Value)>) -> Result<Vec<J::Output>> {
    let mut output = Vec::new();
    let mut records = records.into_iter().peekable();
    while let Some((key, value)) = records.next() {
        let mut values = vec![value];
        values.extend(
            records
                .peeking_take_while(|(k, _)| job.same_group(&key, k))
                .map(|(_, v)| v),
        );
        job.reduce(&key, values, &mut output)?;
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    struct WordCount;

    impl Job for WordCount {
        type Input = String;
        type Key = String;
        type Value = u64;
        type Output = (String, u64);

        fn name(&self) -> &'static str {
            "word_count"
        }

        fn map(&self, line: &String, emit: &mut Vec<(String, u64)>) -> Result<()> {
            for word in line.split_whitespace() {
                emit.push((word.to_owned(), 1));
            }
            Ok(())
        }

        fn combines(&self) -> bool {
            true
        }

        fn combine(&self, _key: &String, values: Vec<u64>) -> Vec<u64> {
            vec![values.iter().sum()]
        }

        fn reduce(&self, key: &String, values: Vec<u64>, output: &mut Vec<(String, u64)>) -> Result<()> {
            output.push((key.clone(), values.iter().sum()));
            Ok(())
        }
    }

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_word_count() {
        let input = lines(&["a b a", "c a", "b", ""]);
        for split_size in 1..5 {
            let engine = LocalEngine::new(3).with_split_size(split_size);
            let mut counts = flatten(engine.run(&WordCount, &input).unwrap());
            counts.sort();
            assert_eq!(
                counts,
                vec![("a".to_owned(), 3), ("b".to_owned(), 2), ("c".to_owned(), 1)]
            );
        }
    }

    #[test]
    fn test_empty_input() {
        let engine = LocalEngine::new(2);
        let output = engine.run(&WordCount, &[]).unwrap();
        assert_eq!(output.len(), 2);
        assert!(output.iter().all(|p| p.is_empty()));
    }

    // Groups on the first letter only, orders by the whole word descending.
    struct ByInitial;

    impl Job for ByInitial {
        type Input = String;
        type Key = String;
        type Value = String;
        type Output = Vec<String>;

        fn name(&self) -> &'static str {
            "by_initial"
        }

        fn map(&self, word: &String, emit: &mut Vec<(String, String)>) -> Result<()> {
            emit.push((word.clone(), word.clone()));
            Ok(())
        }

        fn partition(&self, key: &String, num_partitions: usize) -> usize {
            hash_partition(&key[..1], num_partitions)
        }

        fn compare(&self, a: &String, b: &String) -> Ordering {
            a[..1].cmp(&b[..1]).then_with(|| b.cmp(a))
        }

        fn same_group(&self, a: &String, b: &String) -> bool {
            a[..1] == b[..1]
        }

        fn reduce(&self, _key: &String, values: Vec<String>, output: &mut Vec<Vec<String>>) -> Result<()> {
            output.push(values);
            Ok(())
        }
    }

    #[test]
    fn test_group_on_coarse_key_sort_on_fine_key() {
        let input = lines(&["ab", "ba", "aa", "bc", "ac", "bb"]);
        let engine = LocalEngine::new(4).with_split_size(2);
        let mut groups = flatten(engine.run(&ByInitial, &input).unwrap());
        groups.sort();
        assert_eq!(
            groups,
            vec![lines(&["ac", "ab", "aa"]), lines(&["bc", "bb", "ba"])]
        );
    }

    struct Flaky {
        failures: AtomicUsize,
    }

    impl Job for Flaky {
        type Input = u32;
        type Key = u32;
        type Value = u32;
        type Output = u32;

        fn name(&self) -> &'static str {
            "flaky"
        }

        fn map(&self, input: &u32, emit: &mut Vec<(u32, u32)>) -> Result<()> {
            emit.push((*input, *input));
            Ok(())
        }

        fn num_partitions(&self, _default: usize) -> usize {
            1
        }

        fn reduce(&self, _key: &u32, values: Vec<u32>, output: &mut Vec<u32>) -> Result<()> {
            output.extend(values);
            if self.failures.load(AtomicOrdering::SeqCst) > 0 {
                self.failures.fetch_sub(1, AtomicOrdering::SeqCst);
                return Err(Error::data_consistency("transient"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_failed_attempt_is_discarded() {
        let job = Flaky {
            failures: AtomicUsize::new(1),
        };
        let engine = LocalEngine::new(1).with_task_attempts(2);
        let output = flatten(engine.run(&job, &[3, 1, 2]).unwrap());
        assert_eq!(output, vec![1, 2, 3]);
    }

    #[test]
    fn test_exhausted_attempts_fail() {
        let job = Flaky {
            failures: AtomicUsize::new(2),
        };
        let engine = LocalEngine::new(1).with_task_attempts(2);
        assert!(engine.run(&job, &[1]).is_err());
    }
}
