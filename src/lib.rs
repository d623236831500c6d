#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Suite configuration types.
pub mod config;
/// Centralized constants used across transforms, construction, and integrity.
pub mod constants;
/// Suite construction and the build entry point.
pub mod construction;
mod hash;
/// Split integrity validation and manifest hashing.
pub mod integrity;
/// JSONL record and JSON manifest persistence.
pub mod io;
/// Oracle action and reliability target derivation.
pub mod labeling;
/// Distribution count helpers.
pub mod metrics;
mod rng;
/// Stratified pilot sampling over base groups.
pub mod sampling;
/// Record schema and enumerations.
pub mod schema;
/// Corruption operators applied to clean base examples.
pub mod transforms;
/// Shared type aliases.
pub mod types;
/// Caption tokenization helpers.
pub mod utils;
/// Deterministic vision corruption geometry.
pub mod vision;

mod errors;

pub use config::{SplitRatios, SuiteConfig};
pub use construction::{
    SuiteManifest, build_conflict_suite, infer_source_image_id, infer_template_id, normalize_clean,
};
pub use errors::SuiteError;
pub use integrity::{IntegrityReport, compute_manifest_hash, validate_split_integrity};
pub use io::{read_examples, read_manifest, write_examples, write_manifest};
pub use labeling::{
    MAX_SEVERITY_DEFAULT, ReliabilityTarget, derive_oracle_action, derive_reliability_target,
};
pub use metrics::Distributions;
pub use sampling::{PilotManifest, sample_pilot_by_base};
pub use schema::{
    Action, AnswerType, ConflictExample, CorruptModality, EvidenceModality, Family, Operator,
    Split,
};
pub use transforms::{caption_swap, mark_both, noun_jaccard, text_edit, vision_corrupt};
pub use types::{BaseId, ExampleId, SourceImageId, StratumKey, TemplateId, VariantId};
pub use vision::{occlusion_box, seed_from_key, severity_area_fraction};
