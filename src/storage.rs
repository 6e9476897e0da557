//! Persistence of stage outputs as tab separated text tables.

use crate::error::Result;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

pub const DISCRETIZED: &str = "discretized";
pub const ITEM_FREQUENCY: &str = "item_frequency";
pub const HEADER_TABLE: &str = "header_table";
pub const CLOSED: &str = "closed";
pub const CLOSED_SORTED: &str = "closed_sorted";
pub const ITEMSETS: &str = "itemsets";
pub const ITEMSET_SORTED: &str = "itemset_sorted";
pub const RULES: &str = "rules";
pub const RULES_BY_CONCLUSION: &str = "rules_aggregated";

/// A record that can be written as one `key\tvalue` line of a stage table.
pub trait TableRow {
    fn key(&self) -> String;
    fn value(&self) -> String;
}

pub struct StageStore {
    root: PathBuf,
}

impl StageStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> StageStore {
        StageStore { root: root.into() }
    }

    pub fn stage_dir(&self, stage: &str) -> PathBuf {
        self.root.join(stage)
    }

    pub fn part_path(&self, stage: &str, partition: usize) -> PathBuf {
        self.stage_dir(stage).join(format!("part-r-{:05}", partition))
    }

    /// Removes everything a previous or failed run left for `stage`.
    pub fn clear(&self, stage: &str) -> Result<()> {
        let dir = self.stage_dir(stage);
        if dir.exists() {
            debug!("Deleting stage output {}", dir.display());
            fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Writes one part file per partition. Each part is written to a
    /// temporary file in the stage directory and renamed into place.
    pub fn write_partitions<R: TableRow>(&self, stage: &str, partitions: &[Vec<R>]) -> Result<()> {
        let dir = self.stage_dir(stage);
        fs::create_dir_all(&dir)?;
        for (partition, rows) in partitions.iter().enumerate() {
            write_part(&dir, &self.part_path(stage, partition), rows)?;
        }
        Ok(())
    }

    pub fn write_table<R: TableRow>(&self, stage: &str, rows: &[R]) -> Result<()> {
        let dir = self.stage_dir(stage);
        fs::create_dir_all(&dir)?;
        write_part(&dir, &self.part_path(stage, 0), rows)
    }

    /// Reads back every line of a stage's table, parts in order.
    pub fn read_lines(&self, stage: &str) -> Result<Vec<String>> {
        let mut parts: Vec<PathBuf> = fs::read_dir(self.stage_dir(stage))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .map_or(false, |name| name.starts_with("part-"))
            })
            .collect();
        parts.sort();
        let mut lines = vec![];
        for part in parts {
            lines.extend(fs::read_to_string(part)?.lines().map(|l| l.to_owned()));
        }
        Ok(lines)
    }
}

fn write_part<R: TableRow>(dir: &Path, path: &Path, rows: &[R]) -> Result<()> {
    let file = NamedTempFile::new_in(dir)?;
    {
        let mut output = BufWriter::new(file.as_file());
        for row in rows {
            writeln!(output, "{}\t{}", row.key(), row.value())?;
        }
        output.flush()?;
    }
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}
