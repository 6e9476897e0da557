use crate::error::{Error, Result};
use regex::Regex;
use std::path::PathBuf;

pub const NUM_GROUPS_DEFAULT: usize = 1000;
pub const MAX_HEAP_SIZE_DEFAULT: usize = 50;
pub const NUM_REDUCERS_DEFAULT: usize = 4;
pub const TASK_ATTEMPTS_DEFAULT: usize = 1;
pub const BIN_WIDTH_DEFAULT: f64 = 10.0;
pub const SPLIT_PATTERN_DEFAULT: &str = "[ ]";

// Products like 0.6 * 5 must not round up past the exact threshold.
const SUPPORT_EPSILON: f64 = 1e-9;

/// Parameters of one mining run. Built once by the caller and shared
/// read-only with every stage.
#[derive(Clone, Debug)]
pub struct Parameters {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub min_support: f64,
    pub min_confidence: Option<f64>,
    pub num_groups: usize,
    pub max_heap_size: usize,
    pub enable_discretization: bool,
    pub split_pattern: String,
    pub num_reducers: usize,
    pub task_attempts: usize,
    pub bin_width: f64,
}

impl Parameters {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(
        input_path: P,
        output_path: Q,
        min_support: f64,
    ) -> Parameters {
        Parameters {
            input_path: input_path.into(),
            output_path: output_path.into(),
            min_support,
            min_confidence: None,
            num_groups: NUM_GROUPS_DEFAULT,
            max_heap_size: MAX_HEAP_SIZE_DEFAULT,
            enable_discretization: false,
            split_pattern: SPLIT_PATTERN_DEFAULT.to_owned(),
            num_reducers: NUM_REDUCERS_DEFAULT,
            task_attempts: TASK_ATTEMPTS_DEFAULT,
            bin_width: BIN_WIDTH_DEFAULT,
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Parameters {
        self.min_confidence = Some(min_confidence);
        self
    }

    pub fn rules_enabled(&self) -> bool {
        self.min_confidence.is_some()
    }

    pub fn splitter(&self) -> Result<Regex> {
        Ok(Regex::new(&self.split_pattern)?)
    }

    /// Checks every parameter up front so that a bad run fails before any
    /// stage has written output.
    pub fn validate(&self) -> Result<()> {
        if !in_unit_range(self.min_support) {
            return Err(Error::config(format!(
                "minimum support must be in range [0,1], got {}",
                self.min_support
            )));
        }
        if let Some(min_confidence) = self.min_confidence {
            if !in_unit_range(min_confidence) {
                return Err(Error::config(format!(
                    "minimum confidence must be in range [0,1], got {}",
                    min_confidence
                )));
            }
        }
        if self.num_groups == 0 {
            return Err(Error::config("number of groups must be at least 1"));
        }
        if self.max_heap_size == 0 {
            return Err(Error::config("max heap size must be at least 1"));
        }
        if self.num_reducers == 0 {
            return Err(Error::config("number of reducers must be at least 1"));
        }
        if self.task_attempts == 0 {
            return Err(Error::config("task attempts must be at least 1"));
        }
        if !(self.bin_width > 0.0) || !self.bin_width.is_finite() {
            return Err(Error::config(format!(
                "bin width must be a positive number, got {}",
                self.bin_width
            )));
        }
        self.splitter()
            .map_err(|err| Error::config(format!("{}", err)))?;
        if !self.input_path.is_file() {
            return Err(Error::config(format!(
                "input file {} doesn't exist or is not a file",
                self.input_path.display()
            )));
        }
        Ok(())
    }
}

fn in_unit_range(x: f64) -> bool {
    x >= 0.0 && x <= 1.0
}

/// Converts a relative support threshold into a transaction count.
pub fn absolute_support(min_support: f64, num_transactions: u64) -> u64 {
    let exact = min_support * num_transactions as f64;
    (exact - SUPPORT_EPSILON).ceil().max(0.0) as u64
}
