//! Stratified pilot sampling over atomic base groups.
//!
//! A base and every variant derived from it move together: sampling selects
//! base ids, never individual records, so a pilot subset preserves the
//! clean/corrupted contrasts the suite is built around. Strata are keyed by
//! the representative record's `family` and `split`, and allocation follows
//! the largest-remainder method so stratum proportions survive rounding.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::sampling::{PILOT_STRATEGY, STRATUM_SEPARATOR};
use crate::hash::stable_hash_str;
use crate::metrics::{Distributions, suite_distributions};
use crate::rng::DeterministicRng;
use crate::schema::{ConflictExample, Operator};
use crate::types::{BaseId, StratumKey};

/// Summary of a pilot draw: what was requested, what was selected, and how
/// the selection distributes over strata and record attributes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PilotManifest {
    /// Sampling strategy identifier.
    pub strategy: String,
    /// Seed the per-stratum shuffles were derived from.
    pub seed: u64,
    /// Requested number of base groups.
    pub base_sample_size: usize,
    /// Base groups actually selected.
    pub selected_base_count: usize,
    /// Records carried by the selected groups.
    pub selected_example_count: usize,
    /// Stratum sizes over the full input, keyed by `family::split`.
    pub strata_counts_full: BTreeMap<StratumKey, usize>,
    /// Base groups drawn from each stratum.
    pub strata_counts_selected: BTreeMap<StratumKey, usize>,
    /// Family, operator, severity, and split counts over the selection.
    pub distributions: Distributions,
}

impl PilotManifest {
    fn empty(base_sample_size: usize, seed: u64) -> Self {
        Self {
            strategy: PILOT_STRATEGY.to_string(),
            seed,
            base_sample_size,
            selected_base_count: 0,
            selected_example_count: 0,
            strata_counts_full: BTreeMap::new(),
            strata_counts_selected: BTreeMap::new(),
            distributions: Distributions::default(),
        }
    }
}

/// Index of the record that names a group's stratum: the first clean-operator
/// record when present, otherwise the record with the smallest `example_id`.
fn representative_index(examples: &[ConflictExample], indices: &[usize]) -> Option<usize> {
    indices
        .iter()
        .copied()
        .find(|&index| examples[index].operator == Operator::Clean)
        .or_else(|| {
            indices
                .iter()
                .copied()
                .min_by(|a, b| examples[*a].example_id.cmp(&examples[*b].example_id))
        })
}

/// Largest-remainder allocation of `total` draws across strata of the given
/// sizes. Floors the proportional shares, then spends the leftover on the
/// largest fractional remainders, capped at each stratum's size; any deficit
/// the caps leave behind is backfilled from the largest strata.
fn allocate_counts(sizes: &[usize], total: usize) -> Vec<usize> {
    let universe: usize = sizes.iter().sum();
    if universe == 0 || total == 0 {
        return vec![0; sizes.len()];
    }
    let target = total.min(universe);

    let mut counts = Vec::with_capacity(sizes.len());
    let mut fractions = Vec::with_capacity(sizes.len());
    for &size in sizes {
        let share = target as f64 * size as f64 / universe as f64;
        counts.push(share.floor() as usize);
        fractions.push(share - share.floor());
    }
    let mut assigned: usize = counts.iter().sum();

    let mut by_fraction: Vec<usize> = (0..sizes.len()).collect();
    by_fraction.sort_by(|a, b| fractions[*b].total_cmp(&fractions[*a]));
    for &index in &by_fraction {
        if assigned >= target {
            break;
        }
        if counts[index] < sizes[index] {
            counts[index] += 1;
            assigned += 1;
        }
    }

    let mut by_size: Vec<usize> = (0..sizes.len()).collect();
    by_size.sort_by(|a, b| sizes[*b].cmp(&sizes[*a]));
    while assigned < target {
        let mut progressed = false;
        for &index in &by_size {
            if assigned >= target {
                break;
            }
            if counts[index] < sizes[index] {
                counts[index] += 1;
                assigned += 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    counts
}

/// Draw a stratified pilot subset of roughly `base_sample_size` base groups.
///
/// Groups are atomic: every record sharing a selected `base_id` is returned,
/// sorted by `example_id`. Per-stratum member lists are sorted and shuffled
/// with a stratum-keyed sub-seed, so the draw for one stratum never depends
/// on another stratum's contents. A `base_sample_size` of zero yields an
/// empty selection and a zeroed manifest.
pub fn sample_pilot_by_base(
    examples: &[ConflictExample],
    base_sample_size: usize,
    seed: u64,
) -> (Vec<ConflictExample>, PilotManifest) {
    if base_sample_size == 0 {
        return (Vec::new(), PilotManifest::empty(base_sample_size, seed));
    }

    let mut groups: IndexMap<BaseId, Vec<usize>> = IndexMap::new();
    for (index, example) in examples.iter().enumerate() {
        groups.entry(example.base_id.clone()).or_default().push(index);
    }

    let mut strata: BTreeMap<StratumKey, Vec<BaseId>> = BTreeMap::new();
    for (base_id, indices) in &groups {
        if let Some(representative) = representative_index(examples, indices) {
            let record = &examples[representative];
            let key = format!(
                "{}{}{}",
                record.family.as_str(),
                STRATUM_SEPARATOR,
                record.split.as_str()
            );
            strata.entry(key).or_default().push(base_id.clone());
        }
    }

    let keys: Vec<StratumKey> = strata.keys().cloned().collect();
    let sizes: Vec<usize> = keys.iter().map(|key| strata[key].len()).collect();
    let counts = allocate_counts(&sizes, base_sample_size);

    let mut selected_bases: BTreeSet<BaseId> = BTreeSet::new();
    let mut strata_counts_selected = BTreeMap::new();
    for (position, key) in keys.iter().enumerate() {
        let mut members = strata[key].clone();
        members.sort();
        let mut rng = DeterministicRng::new(stable_hash_str(seed, key));
        members.shuffle(&mut rng);
        let taken = counts[position].min(members.len());
        for base_id in members.into_iter().take(taken) {
            selected_bases.insert(base_id);
        }
        strata_counts_selected.insert(key.clone(), taken);
    }

    let mut selected: Vec<ConflictExample> = examples
        .iter()
        .filter(|example| selected_bases.contains(&example.base_id))
        .cloned()
        .collect();
    selected.sort_by(|a, b| a.example_id.cmp(&b.example_id));

    debug!(
        requested = base_sample_size,
        bases = selected_bases.len(),
        records = selected.len(),
        "sampled pilot subset"
    );

    let manifest = PilotManifest {
        strategy: PILOT_STRATEGY.to_string(),
        seed,
        base_sample_size,
        selected_base_count: selected_bases.len(),
        selected_example_count: selected.len(),
        strata_counts_full: keys
            .iter()
            .zip(&sizes)
            .map(|(key, size)| (key.clone(), *size))
            .collect(),
        strata_counts_selected,
        distributions: suite_distributions(&selected),
    };

    (selected, manifest)
}
