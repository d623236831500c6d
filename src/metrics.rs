use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::ConflictExample;

/// Count maps over record attributes, keyed by serialized value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Distributions {
    /// Records per conflict family.
    pub family: BTreeMap<String, usize>,
    /// Records per operator.
    pub operator: BTreeMap<String, usize>,
    /// Records per severity (stringified so manifests stay uniform).
    pub severity: BTreeMap<String, usize>,
    /// Records per split.
    pub split: BTreeMap<String, usize>,
}

/// Count occurrences of a derived key across records.
pub fn value_distribution<F>(examples: &[ConflictExample], key: F) -> BTreeMap<String, usize>
where
    F: Fn(&ConflictExample) -> String,
{
    let mut counts = BTreeMap::new();
    for example in examples {
        *counts.entry(key(example)).or_insert(0) += 1;
    }
    counts
}

/// Family, operator, severity, and split distributions of `examples`.
pub fn suite_distributions(examples: &[ConflictExample]) -> Distributions {
    Distributions {
        family: value_distribution(examples, |example| example.family.as_str().to_string()),
        operator: value_distribution(examples, |example| example.operator.as_str().to_string()),
        severity: value_distribution(examples, |example| example.severity.to_string()),
        split: value_distribution(examples, |example| example.split.as_str().to_string()),
    }
}
