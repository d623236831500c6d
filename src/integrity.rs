//! Atomic suite validation and content-addressed hashing.
//!
//! Validation walks the suite once, checking per-record invariants, then
//! verifies that no source image (and optionally no question template) leaks
//! across the in-distribution splits. The first violation aborts with an
//! error naming the offending record or key.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::integrity::ID_SPLITS;
use crate::constants::suite::RECIPE_SEPARATOR;
use crate::errors::SuiteError;
use crate::schema::{ConflictExample, CorruptModality, Family, Split};
use crate::types::{ExampleId, SourceImageId, TemplateId};

/// Validator output: per-split content hashes and counts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntegrityReport {
    /// SHA-256 hash over sorted example ids, keyed by split value.
    pub hashes: BTreeMap<String, String>,
    /// Record counts keyed by split value.
    pub counts: BTreeMap<String, usize>,
    /// Total records validated.
    pub total_examples: usize,
}

/// SHA-256 hex digest of the sorted ids joined by newlines.
///
/// Sorting first makes the hash a function of the id set, not of record
/// order.
pub fn compute_manifest_hash(ids: &[ExampleId]) -> String {
    let mut sorted: Vec<&str> = ids.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    let digest = Sha256::digest(sorted.join("\n").as_bytes());
    hex::encode(digest)
}

fn source_key(example: &ConflictExample) -> SourceImageId {
    match &example.source_image_id {
        Some(id) if !id.is_empty() => id.clone(),
        _ => example
            .image_path
            .split(RECIPE_SEPARATOR)
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

fn smallest_shared(left: &HashSet<String>, right: &HashSet<String>) -> Option<String> {
    left.intersection(right).min().cloned()
}

/// Validate a finished suite and produce its integrity report.
///
/// `held_out_family = None` skips OOD-family membership checks (suites built
/// without a family carve-out still validate). `held_out_severity` is the
/// threshold the OOD-severity split must honor.
pub fn validate_split_integrity(
    examples: &[ConflictExample],
    held_out_family: Option<Family>,
    held_out_severity: u32,
    enforce_template_disjointness: bool,
) -> Result<IntegrityReport, SuiteError> {
    let mut seen_ids: HashSet<&str> = HashSet::new();
    let mut split_ids: BTreeMap<String, Vec<ExampleId>> = BTreeMap::new();
    let mut split_images: HashMap<Split, HashSet<SourceImageId>> = HashMap::new();
    let mut split_templates: HashMap<Split, HashSet<TemplateId>> = HashMap::new();

    for example in examples {
        if !seen_ids.insert(example.example_id.as_str()) {
            return Err(SuiteError::Integrity(format!(
                "duplicate example_id: {}",
                example.example_id
            )));
        }

        if example.corrupt_modality == CorruptModality::None && example.severity != 0 {
            return Err(SuiteError::Integrity(format!(
                "severity must be 0 when corrupt_modality is none: {}",
                example.example_id
            )));
        }
        if example.corrupt_modality != CorruptModality::None && example.severity == 0 {
            return Err(SuiteError::Integrity(format!(
                "corrupted example must have severity >= 1: {}",
                example.example_id
            )));
        }

        split_ids
            .entry(example.split.as_str().to_string())
            .or_default()
            .push(example.example_id.clone());
        split_images
            .entry(example.split)
            .or_default()
            .insert(source_key(example));
        if let Some(template_id) = &example.template_id
            && !template_id.is_empty()
        {
            split_templates
                .entry(example.split)
                .or_default()
                .insert(template_id.clone());
        }

        if ID_SPLITS.contains(&example.split) {
            if example.heldout_family_flag {
                return Err(SuiteError::Integrity(format!(
                    "heldout_family_flag set inside an ID split: {}",
                    example.example_id
                )));
            }
            if example.heldout_severity_flag {
                return Err(SuiteError::Integrity(format!(
                    "heldout_severity_flag set inside an ID split: {}",
                    example.example_id
                )));
            }
        }

        if example.split == Split::TestOodFamily
            && let Some(family) = held_out_family
        {
            if example.family != family {
                return Err(SuiteError::Integrity(format!(
                    "OOD-family split contains non-heldout family example: {}",
                    example.example_id
                )));
            }
            if !example.heldout_family_flag {
                return Err(SuiteError::Integrity(format!(
                    "OOD-family example missing heldout_family_flag: {}",
                    example.example_id
                )));
            }
        }

        if example.split == Split::TestOodSeverity {
            if example.corrupt_modality == CorruptModality::None
                || example.severity < held_out_severity
            {
                return Err(SuiteError::Integrity(format!(
                    "OOD-severity split requires corrupted severity >= {held_out_severity}: {}",
                    example.example_id
                )));
            }
            if !example.heldout_severity_flag {
                return Err(SuiteError::Integrity(format!(
                    "OOD-severity example missing heldout_severity_flag: {}",
                    example.example_id
                )));
            }
        }
    }

    for (index, left) in ID_SPLITS.iter().enumerate() {
        for right in &ID_SPLITS[index + 1..] {
            if let (Some(left_images), Some(right_images)) =
                (split_images.get(left), split_images.get(right))
                && let Some(shared) = smallest_shared(left_images, right_images)
            {
                return Err(SuiteError::Integrity(format!(
                    "image-source leakage between {} and {}: {shared}",
                    left.as_str(),
                    right.as_str()
                )));
            }
            if enforce_template_disjointness
                && let (Some(left_templates), Some(right_templates)) =
                    (split_templates.get(left), split_templates.get(right))
                && let Some(shared) = smallest_shared(left_templates, right_templates)
            {
                return Err(SuiteError::Integrity(format!(
                    "template leakage between {} and {}: {shared}",
                    left.as_str(),
                    right.as_str()
                )));
            }
        }
    }

    let mut hashes = BTreeMap::new();
    let mut counts = BTreeMap::new();
    for (split, ids) in &split_ids {
        hashes.insert(split.clone(), compute_manifest_hash(ids));
        counts.insert(split.clone(), ids.len());
    }

    Ok(IntegrityReport {
        hashes,
        counts,
        total_examples: examples.len(),
    })
}
