//! Oracle-action labeling and reliability-target derivation.

use serde::{Deserialize, Serialize};

use crate::constants::labeling::{MIN_PENALTY, RELIABILITY_FLOOR, ROUND_SCALE};
use crate::schema::{Action, CorruptModality, EvidenceModality};

pub use crate::constants::labeling::MAX_SEVERITY_DEFAULT;

/// Per-modality reliability targets, each in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityTarget {
    /// Target reliability of the vision modality.
    pub r_v: f64,
    /// Target reliability of the text modality.
    pub r_t: f64,
}

/// Oracle action implied by the corruption state.
///
/// Ambiguous records and both-modality corruption warrant abstention; a
/// single corrupted modality points at the other one; clean records require
/// agreement.
pub fn derive_oracle_action(corrupt_modality: CorruptModality, is_ambiguous: bool) -> Action {
    if is_ambiguous || corrupt_modality == CorruptModality::Both {
        return Action::Abstain;
    }
    match corrupt_modality {
        CorruptModality::Text => Action::TrustVision,
        CorruptModality::Vision => Action::TrustText,
        _ => Action::RequireAgreement,
    }
}

/// Reliability targets for a record given its evidence and corruption state.
///
/// Base targets depend on the evidence modality; each corrupted side is then
/// scaled down by `max(0.2, severity / max_severity)`, floored at 0.05, and
/// rounded to four decimal places.
pub fn derive_reliability_target(
    evidence_modality: EvidenceModality,
    corrupt_modality: CorruptModality,
    severity: u32,
    max_severity: u32,
) -> ReliabilityTarget {
    let (mut r_v, mut r_t) = match evidence_modality {
        EvidenceModality::VisionRequired => (1.0, 0.0),
        EvidenceModality::TextRequired => (0.0, 1.0),
        EvidenceModality::Both => (1.0, 1.0),
        EvidenceModality::Either => (0.5, 0.5),
    };

    let severity = severity.min(max_severity);
    let penalty = if max_severity > 0 {
        (severity as f64 / max_severity as f64).max(MIN_PENALTY)
    } else {
        0.0
    };

    if matches!(
        corrupt_modality,
        CorruptModality::Vision | CorruptModality::Both
    ) {
        r_v = (r_v * (1.0 - penalty)).max(RELIABILITY_FLOOR);
    }
    if matches!(
        corrupt_modality,
        CorruptModality::Text | CorruptModality::Both
    ) {
        r_t = (r_t * (1.0 - penalty)).max(RELIABILITY_FLOOR);
    }

    ReliabilityTarget {
        r_v: round4(r_v),
        r_t: round4(r_t),
    }
}

fn round4(value: f64) -> f64 {
    (value * ROUND_SCALE).round() / ROUND_SCALE
}
