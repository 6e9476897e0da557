use crate::engine::Job;
use crate::error::{Error, Result};
use crate::expand_closed::Itemset;
use crate::header_table::HeaderTable;
use crate::storage::TableRow;
use ordered_float::OrderedFloat;
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::warn;

#[derive(Clone, Debug, Eq)]
pub struct Rule {
    premises: Vec<String>,
    conclusion: String,
    support: OrderedFloat<f64>,
    confidence: OrderedFloat<f64>,
    lift: OrderedFloat<f64>,
}

impl PartialEq for Rule {
    fn eq(&self, other: &Rule) -> bool {
        self.premises == other.premises && self.conclusion == other.conclusion
    }
}

impl Hash for Rule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.premises.hash(state);
        self.conclusion.hash(state);
    }
}

impl Rule {
    // Creates a new Rule from (premises, conclusion) if the rule would be
    // above the min_confidence threshold. Counts are transaction counts.
    pub fn make(
        premises: Vec<String>,
        conclusion: String,
        itemset_count: u64,
        premises_count: u64,
        header: &HeaderTable,
        min_confidence: f64,
    ) -> Result<Option<Rule>> {
        if premises_count == 0 {
            return Err(Error::data_consistency(format!(
                "premises '{}' has zero support",
                premises.join(" ")
            )));
        }
        let support = header.support_of(itemset_count);
        let confidence = itemset_count as f64 / premises_count as f64;
        let conclusion_support = header.support_of(header.count_of(&conclusion)?);
        if confidence < min_confidence {
            return Ok(None);
        }
        let lift = confidence / conclusion_support;
        Ok(Some(Rule::from_measures(premises, conclusion, support, confidence, lift)))
    }

    pub fn from_measures(
        premises: Vec<String>,
        conclusion: String,
        support: f64,
        confidence: f64,
        lift: f64,
    ) -> Rule {
        Rule {
            premises,
            conclusion,
            support: OrderedFloat(support),
            confidence: OrderedFloat(confidence),
            lift: OrderedFloat(lift),
        }
    }

    pub fn premises(&self) -> &[String] {
        &self.premises
    }

    pub fn conclusion(&self) -> &str {
        &self.conclusion
    }

    pub fn support(&self) -> f64 {
        self.support.into_inner()
    }

    pub fn confidence(&self) -> f64 {
        self.confidence.into_inner()
    }

    pub fn lift(&self) -> f64 {
        self.lift.into_inner()
    }

    pub fn lift_key(&self) -> OrderedFloat<f64> {
        self.lift
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} => {}", self.premises.join(" "), self.conclusion)
    }
}

impl TableRow for Rule {
    fn key(&self) -> String {
        self.to_string()
    }

    fn value(&self) -> String {
        format!(
            "({:.6}, {:.6}, {:.6})",
            self.support(),
            self.confidence(),
            self.lift()
        )
    }
}

pub fn split_out_item(items: &[String], item: &str) -> (Vec<String>, String) {
    let premises: Vec<String> = items.iter().filter(|&x| x != item).cloned().collect();
    (premises, item.to_owned())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PremisesRecord {
    // Support count of the premises itemset itself.
    Own(u64),
    // An itemset extending the premises by one item.
    Extension { itemset: Vec<String>, support: u64 },
}

/// Generates rules with a single item conclusion. Every itemset is sent to
/// itself and to each premises obtained by dropping one of its items, so the
/// reduce for a premises sees its own support alongside all its one-item
/// extensions.
pub struct RuleMining<'a> {
    header: &'a HeaderTable,
    min_confidence: f64,
}

impl<'a> RuleMining<'a> {
    pub fn new(header: &'a HeaderTable, min_confidence: f64) -> RuleMining<'a> {
        RuleMining {
            header,
            min_confidence,
        }
    }
}

impl<'a> Job for RuleMining<'a> {
    type Input = Itemset;
    type Key = Vec<String>;
    type Value = PremisesRecord;
    type Output = Rule;

    fn name(&self) -> &'static str {
        "rule_mining"
    }

    fn map(&self, itemset: &Itemset, emit: &mut Vec<(Vec<String>, PremisesRecord)>) -> Result<()> {
        if itemset.items.is_empty() {
            return Ok(());
        }
        emit.push((itemset.items.clone(), PremisesRecord::Own(itemset.support)));
        if itemset.items.len() > 1 {
            for item in itemset.items.iter() {
                let (premises, _) = split_out_item(&itemset.items, item);
                emit.push((
                    premises,
                    PremisesRecord::Extension {
                        itemset: itemset.items.clone(),
                        support: itemset.support,
                    },
                ));
            }
        }
        Ok(())
    }

    fn reduce(&self, premises: &Vec<String>, values: Vec<PremisesRecord>, output: &mut Vec<Rule>) -> Result<()> {
        let mut premises_count = None;
        let mut extensions = vec![];
        for value in values {
            match value {
                PremisesRecord::Own(count) => premises_count = Some(count),
                PremisesRecord::Extension { itemset, support } => extensions.push((itemset, support)),
            }
        }
        if extensions.is_empty() {
            return Ok(());
        }
        let premises_count = premises_count.ok_or_else(|| {
            Error::data_consistency(format!(
                "premises '{}' has no support record of its own",
                premises.join(" ")
            ))
        })?;

        for (itemset, support) in extensions {
            let conclusion: Vec<&String> = itemset.iter().filter(|&i| !premises.contains(i)).collect();
            if conclusion.len() != 1 || itemset.len() != premises.len() + 1 {
                warn!(
                    "Skipping itemset '{}': not a one item extension of '{}'",
                    itemset.join(" "),
                    premises.join(" ")
                );
                continue;
            }
            if let Some(rule) = Rule::make(
                premises.clone(),
                conclusion[0].clone(),
                support,
                premises_count,
                self.header,
                self.min_confidence,
            )? {
                output.push(rule);
            }
        }
        Ok(())
    }
}
