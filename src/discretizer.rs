use crate::storage::TableRow;

/// Converts one raw transaction into categorical tokens before counting.
pub trait Discretizer: Sync {
    fn discretize(&self, transaction: &[String]) -> Vec<String>;
}

/// Tags every token with its column position, and replaces numeric values
/// by the fixed-width bin containing them, e.g. `c2=[10,20)`.
pub struct ColumnDiscretizer {
    bin_width: f64,
}

impl ColumnDiscretizer {
    pub fn new(bin_width: f64) -> ColumnDiscretizer {
        ColumnDiscretizer { bin_width }
    }

    fn bin_of(&self, value: f64) -> String {
        let lo = (value / self.bin_width).floor() * self.bin_width;
        let hi = lo + self.bin_width;
        format!("[{},{})", lo, hi)
    }
}

impl Discretizer for ColumnDiscretizer {
    fn discretize(&self, transaction: &[String]) -> Vec<String> {
        transaction
            .iter()
            .enumerate()
            .map(|(column, token)| match token.parse::<f64>() {
                Ok(value) if value.is_finite() => format!("c{}={}", column, self.bin_of(value)),
                _ => format!("c{}={}", column, token),
            })
            .collect()
    }
}

// A discretized transaction, persisted as `line number\ttokens`.
pub struct DiscretizedRow<'a> {
    pub line: usize,
    pub tokens: &'a [String],
}

impl<'a> TableRow for DiscretizedRow<'a> {
    fn key(&self) -> String {
        self.line.to_string()
    }

    fn value(&self) -> String {
        self.tokens.join(" ")
    }
}
