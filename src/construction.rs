//! Suite construction: clean normalization, variant generation, leakage-free
//! split assignment, and manifest assembly.
//!
//! Construction is fully deterministic from `SuiteConfig::seed`. The
//! generation loop consumes one RNG stream for donor draws; the split
//! shuffle and per-base text edits run on independent streams sub-seeded by
//! hashing stable string keys, so no concern perturbs another's draws.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use tracing::debug;

use crate::config::{SplitRatios, SuiteConfig};
use crate::constants::suite::{
    CLEAN_VARIANT, ID_SEPARATOR, RECIPE_SEPARATOR, SPLIT_SHUFFLE_KEY, TEMPLATE_ID_LEN,
    TEXT_EDIT_SEED_KEY,
};
use crate::errors::SuiteError;
use crate::hash::stable_hash_str;
use crate::integrity::validate_split_integrity;
use crate::labeling::derive_oracle_action;
use crate::metrics::{Distributions, suite_distributions};
use crate::rng::DeterministicRng;
use crate::schema::{AnswerType, ConflictExample, CorruptModality, Family, Operator, Split};
use crate::transforms::{caption_swap, jaccard_from_sets, mark_both, text_edit, vision_corrupt};
use crate::types::{SourceImageId, TemplateId};
use crate::utils::{alnum_tokens, noun_tokens};

/// Content-addressed summary of a constructed suite.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuiteManifest {
    /// SHA-256 hash over sorted example ids, keyed by split value.
    pub hashes: BTreeMap<String, String>,
    /// Record counts keyed by split value.
    pub counts: BTreeMap<String, usize>,
    /// Total records in the suite.
    pub total_examples: usize,
    /// Echo of the configuration that produced the suite.
    pub config: SuiteConfig,
    /// Family, operator, severity, and split count maps.
    pub distributions: Distributions,
    /// Canonical sorted-key JSON of every other manifest field.
    pub manifest_json: String,
}

/// Source-image id implied by an image path: the part before any recipe
/// separator, so externally tagged paths still map back to one image.
pub fn infer_source_image_id(image_path: &str) -> SourceImageId {
    image_path
        .split(RECIPE_SEPARATOR)
        .next()
        .unwrap_or(image_path)
        .to_string()
}

/// Question-template fingerprint: SHA-1 over the lowercased alphanumeric
/// token sequence, truncated to twelve hex characters.
pub fn infer_template_id(question: &str) -> TemplateId {
    let normalized = alnum_tokens(question).join(" ");
    let digest = Sha1::digest(normalized.as_bytes());
    hex::encode(digest)[..TEMPLATE_ID_LEN].to_string()
}

/// Coerce a base record to the canonical clean baseline.
///
/// Ids, operator, corruption state, flags, and split are reset; source and
/// template ids are inferred when absent; content fields pass through.
pub fn normalize_clean(base: &ConflictExample) -> ConflictExample {
    let source_image_id = match &base.source_image_id {
        Some(id) if !id.is_empty() => Some(id.clone()),
        _ => Some(infer_source_image_id(&base.image_path)),
    };
    let template_id = match &base.template_id {
        Some(id) if !id.is_empty() => Some(id.clone()),
        _ => Some(infer_template_id(&base.question)),
    };

    ConflictExample {
        example_id: ConflictExample::compose_id(&base.base_id, CLEAN_VARIANT),
        variant_id: CLEAN_VARIANT.to_string(),
        operator: Operator::Clean,
        corrupt_modality: CorruptModality::None,
        severity: 0,
        split: Split::Train,
        oracle_action: derive_oracle_action(CorruptModality::None, false),
        source_image_id,
        template_id,
        heldout_family_flag: false,
        heldout_severity_flag: false,
        hard_swap_flag: false,
        ..base.clone()
    }
}

fn effective_source_key(example: &ConflictExample) -> SourceImageId {
    match &example.source_image_id {
        Some(id) if !id.is_empty() => id.clone(),
        _ => infer_source_image_id(&example.image_path),
    }
}

/// Shuffle the sorted distinct source ids with a sub-seeded RNG and slice
/// them into ID splits by ratio (train and val floor, remainder to test_id).
fn assign_source_splits(
    examples: &[ConflictExample],
    ratios: SplitRatios,
    seed: u64,
) -> HashMap<SourceImageId, Split> {
    let mut source_ids: Vec<SourceImageId> = examples
        .iter()
        .map(effective_source_key)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut rng = DeterministicRng::new(stable_hash_str(seed, SPLIT_SHUFFLE_KEY));
    source_ids.shuffle(&mut rng);

    let total = source_ids.len();
    let train_count = (total as f64 * ratios.train) as usize;
    let val_count = (total as f64 * ratios.val) as usize;

    let mut assignment = HashMap::new();
    for (index, source_id) in source_ids.into_iter().enumerate() {
        let split = if index < train_count {
            Split::Train
        } else if index < train_count + val_count {
            Split::Val
        } else {
            Split::TestId
        };
        assignment.insert(source_id, split);
    }
    assignment
}

/// Pick a same-topic donor for a hard swap: same `(family, answer_type)`
/// bucket, different base and source image, caption Jaccard inside the
/// configured band (inclusive). Uniform seeded draw among survivors.
fn hard_swap_candidate<'a>(
    base_index: usize,
    bases: &'a [ConflictExample],
    bucket: &[usize],
    token_sets: &[HashSet<String>],
    jaccard_min: f64,
    jaccard_max: f64,
    rng: &mut DeterministicRng,
) -> Option<&'a ConflictExample> {
    let base = &bases[base_index];
    let mut candidates = Vec::new();
    for &donor_index in bucket {
        let donor = &bases[donor_index];
        if donor.base_id == base.base_id {
            continue;
        }
        if donor.source_image_id == base.source_image_id {
            continue;
        }
        let score = jaccard_from_sets(&token_sets[base_index], &token_sets[donor_index]);
        if score < jaccard_min || score > jaccard_max {
            continue;
        }
        candidates.push(donor_index);
    }
    candidates
        .choose(rng)
        .map(|donor_index| &bases[*donor_index])
}

/// Build the full conflict suite from clean base examples.
///
/// Returns the records sorted by `example_id` together with the manifest.
/// Construction fails atomically: any integrity violation surfaces as an
/// error and nothing is returned.
pub fn build_conflict_suite(
    bases: &[ConflictExample],
    config: &SuiteConfig,
) -> Result<(Vec<ConflictExample>, SuiteManifest), SuiteError> {
    let config = config.clone().validated()?;

    let normalized: Vec<ConflictExample> = bases.iter().map(normalize_clean).collect();

    let mut donors_by_bucket: HashMap<(Family, AnswerType), Vec<usize>> = HashMap::new();
    for (index, base) in normalized.iter().enumerate() {
        donors_by_bucket
            .entry((base.family, base.answer_type))
            .or_default()
            .push(index);
    }
    let token_sets: Vec<HashSet<String>> = normalized
        .iter()
        .map(|base| noun_tokens(&base.text_input))
        .collect();
    let severities: Vec<u32> = config
        .vision_severities
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut rng = DeterministicRng::new(config.seed);
    let mut generated: Vec<ConflictExample> = Vec::new();

    for (index, base) in normalized.iter().enumerate() {
        generated.push(base.clone());

        let easy_pool: Vec<usize> = (0..normalized.len())
            .filter(|candidate| normalized[*candidate].base_id != base.base_id)
            .collect();
        if let Some(&easy_index) = easy_pool.choose(&mut rng) {
            let easy_donor = &normalized[easy_index];
            generated.push(caption_swap(
                base,
                &easy_donor.text_input,
                Operator::SwapEasy,
                false,
                config.seed,
            ));

            let bucket = donors_by_bucket
                .get(&(base.family, base.answer_type))
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            match hard_swap_candidate(
                index,
                &normalized,
                bucket,
                &token_sets,
                config.hard_swap_jaccard_min,
                config.hard_swap_jaccard_max,
                &mut rng,
            ) {
                Some(hard_donor) => generated.push(caption_swap(
                    base,
                    &hard_donor.text_input,
                    Operator::SwapHard,
                    true,
                    config.seed,
                )),
                // No same-topic donor in band: reuse the easy donor without
                // the hard-swap flag.
                None => generated.push(caption_swap(
                    base,
                    &easy_donor.text_input,
                    Operator::SwapHard,
                    false,
                    config.seed,
                )),
            }
        }

        let edit_seed = stable_hash_str(
            config.seed,
            &format!("{}{}{}", base.base_id, ID_SEPARATOR, TEXT_EDIT_SEED_KEY),
        );
        generated.push(text_edit(base, &config.color_vocab, edit_seed));

        for &severity in &severities {
            generated.push(vision_corrupt(
                base,
                &config.vision_corruption_type,
                severity,
            ));
        }

        if config.include_both_variants {
            let both_severity = severities.iter().copied().max().unwrap_or(1);
            let edited = text_edit(base, &config.color_vocab, edit_seed);
            generated.push(mark_both(&edited, both_severity));
        }
    }

    let split_by_source = assign_source_splits(&generated, config.split_ratios, config.seed);

    let mut assigned = Vec::with_capacity(generated.len());
    for example in generated {
        let id_split = split_by_source
            .get(&effective_source_key(&example))
            .copied()
            .unwrap_or(Split::Train);

        // OOD overrides, in priority order: family, then severity, then
        // hard swap.
        let (split, family_flag, severity_flag) = if Some(example.family) == config.held_out_family
        {
            (Split::TestOodFamily, true, false)
        } else if example.corrupt_modality != CorruptModality::None
            && example.severity >= config.held_out_severity
        {
            (Split::TestOodSeverity, false, true)
        } else if config.enable_ood_hard_swap
            && example.operator == Operator::SwapHard
            && example.hard_swap_flag
        {
            (Split::TestOodHardSwap, false, false)
        } else {
            (id_split, false, false)
        };

        assigned.push(ConflictExample {
            split,
            heldout_family_flag: family_flag,
            heldout_severity_flag: severity_flag,
            ..example
        });
    }

    assigned.sort_by(|a, b| a.example_id.cmp(&b.example_id));

    let report = validate_split_integrity(
        &assigned,
        config.held_out_family,
        config.held_out_severity,
        config.enforce_template_disjointness,
    )?;

    debug!(
        bases = normalized.len(),
        total = assigned.len(),
        "constructed conflict suite"
    );

    let mut manifest = SuiteManifest {
        hashes: report.hashes,
        counts: report.counts,
        total_examples: report.total_examples,
        config: config.clone(),
        distributions: suite_distributions(&assigned),
        manifest_json: String::new(),
    };
    manifest.manifest_json = canonical_manifest_json(&manifest)?;

    Ok((assigned, manifest))
}

/// Sorted-key JSON of the manifest minus the `manifest_json` field itself.
fn canonical_manifest_json(manifest: &SuiteManifest) -> Result<String, SuiteError> {
    let mut value = serde_json::to_value(manifest)?;
    if let Some(fields) = value.as_object_mut() {
        fields.remove("manifest_json");
    }
    Ok(serde_json::to_string(&value)?)
}
