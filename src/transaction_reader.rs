use crate::error::Result;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

// Reads a dataset one transaction per line, tokens separated by `splitter`.
// Blank lines and lines that aren't valid UTF-8 are skipped.
pub struct TransactionReader<'a> {
    reader: BufReader<File>,
    splitter: &'a Regex,
    buffer: Vec<u8>,
    line_number: usize,
    skipped: usize,
}

impl<'a> TransactionReader<'a> {
    pub fn new(path: &Path, splitter: &'a Regex) -> Result<TransactionReader<'a>> {
        let file = File::open(path)?;
        Ok(TransactionReader {
            reader: BufReader::new(file),
            splitter,
            buffer: Vec::new(),
            line_number: 0,
            skipped: 0,
        })
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

pub fn split_transaction(line: &str, splitter: &Regex) -> Vec<String> {
    splitter
        .split(line.trim_end_matches(&['\r', '\n'][..]))
        .map(|token| token.trim())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_owned())
        .collect()
}

impl<'a> Iterator for TransactionReader<'a> {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Result<Vec<String>>> {
        loop {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => return Some(Err(err.into())),
            }
            self.line_number += 1;
            let line = match std::str::from_utf8(&self.buffer) {
                Ok(line) => line,
                Err(_) => {
                    debug!("Skipping line {}: not valid UTF-8", self.line_number);
                    self.skipped += 1;
                    continue;
                }
            };
            let transaction = split_transaction(line, self.splitter);
            if transaction.is_empty() {
                self.skipped += 1;
                continue;
            }
            return Some(Ok(transaction));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_transaction_reader() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"a b  c\n\n   \nd\r\n\xff\xfe\ne a\n").unwrap();
        let splitter = Regex::new("[ ]").unwrap();
        let mut reader = TransactionReader::new(file.path(), &splitter).unwrap();
        let transactions: Vec<Vec<String>> = reader.by_ref().map(|t| t.unwrap()).collect();
        assert_eq!(
            transactions,
            vec![vec!["a", "b", "c"], vec!["d"], vec!["e", "a"]]
        );
        assert_eq!(reader.skipped(), 3);
    }

    #[test]
    fn test_split_pattern() {
        let splitter = Regex::new("[ ,\t]*[,|\t][ ,\t]*").unwrap();
        assert_eq!(
            split_transaction("x=1, y=2\tz=3 |w", &splitter),
            vec!["x=1", "y=2", "z=3", "w"]
        );
    }
}
