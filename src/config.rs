use serde::{Deserialize, Serialize};

use crate::constants::suite::{
    DEFAULT_COLOR_VOCAB, DEFAULT_HELD_OUT_SEVERITY, DEFAULT_JACCARD_MAX, DEFAULT_JACCARD_MIN,
    DEFAULT_SEED, DEFAULT_VISION_CORRUPTION, DEFAULT_VISION_SEVERITIES,
};
use crate::errors::SuiteError;
use crate::schema::Family;

/// Fractions of source images assigned to the in-distribution splits.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    /// Fraction assigned to train.
    pub train: f64,
    /// Fraction assigned to val.
    pub val: f64,
    /// Fraction assigned to test_id.
    pub test_id: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.7,
            val: 0.15,
            test_id: 0.15,
        }
    }
}

impl SplitRatios {
    /// Validate that ratios are non-negative and sum to `1.0` (within epsilon).
    pub fn normalized(self) -> Result<Self, SuiteError> {
        if self.train < 0.0 || self.val < 0.0 || self.test_id < 0.0 {
            return Err(SuiteError::Configuration(
                "split ratios must be non-negative".to_string(),
            ));
        }
        let sum = self.train + self.val + self.test_id;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(SuiteError::Configuration(
                "split ratios must sum to 1.0".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Top-level suite construction configuration.
///
/// Serialized wholesale into the manifest so a suite's provenance is always
/// recoverable from its manifest alone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Seed that controls every deterministic draw during construction.
    pub seed: u64,
    /// Family routed to the OOD-family split; `None` disables the carve-out.
    pub held_out_family: Option<Family>,
    /// Corrupted records at or above this severity go to the OOD-severity split.
    pub held_out_severity: u32,
    /// Source-image ratios for the in-distribution splits.
    pub split_ratios: SplitRatios,
    /// Corruption type recorded in vision rendering recipes.
    pub vision_corruption_type: String,
    /// Severities generated per base example (deduplicated, ascending).
    pub vision_severities: Vec<u32>,
    /// Color vocabulary used by attribute edits.
    pub color_vocab: Vec<String>,
    /// Lower bound of the hard-swap caption similarity band (inclusive).
    pub hard_swap_jaccard_min: f64,
    /// Upper bound of the hard-swap caption similarity band (inclusive).
    pub hard_swap_jaccard_max: f64,
    /// Also emit a combined text-plus-vision variant per base.
    pub include_both_variants: bool,
    /// Route flagged hard swaps to their own OOD split.
    pub enable_ood_hard_swap: bool,
    /// Extend leakage checks to question templates.
    pub enforce_template_disjointness: bool,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            held_out_family: Some(Family::AttributeColor),
            held_out_severity: DEFAULT_HELD_OUT_SEVERITY,
            split_ratios: SplitRatios::default(),
            vision_corruption_type: DEFAULT_VISION_CORRUPTION.to_string(),
            vision_severities: DEFAULT_VISION_SEVERITIES.to_vec(),
            color_vocab: DEFAULT_COLOR_VOCAB
                .iter()
                .map(|color| color.to_string())
                .collect(),
            hard_swap_jaccard_min: DEFAULT_JACCARD_MIN,
            hard_swap_jaccard_max: DEFAULT_JACCARD_MAX,
            include_both_variants: false,
            enable_ood_hard_swap: false,
            enforce_template_disjointness: false,
        }
    }
}

impl SuiteConfig {
    /// Validate cross-field constraints before construction.
    pub fn validated(self) -> Result<Self, SuiteError> {
        self.split_ratios.normalized()?;
        if !(0.0..=1.0).contains(&self.hard_swap_jaccard_min)
            || !(0.0..=1.0).contains(&self.hard_swap_jaccard_max)
        {
            return Err(SuiteError::Configuration(
                "hard-swap jaccard bounds must lie in [0, 1]".to_string(),
            ));
        }
        if self.hard_swap_jaccard_min > self.hard_swap_jaccard_max {
            return Err(SuiteError::Configuration(
                "hard-swap jaccard band is inverted".to_string(),
            ));
        }
        if self.vision_severities.iter().any(|severity| *severity == 0) {
            return Err(SuiteError::Configuration(
                "vision severities must be at least 1".to_string(),
            ));
        }
        if self.include_both_variants && self.vision_severities.is_empty() {
            return Err(SuiteError::Configuration(
                "both-variants require at least one vision severity".to_string(),
            ));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_validation() {
        assert!(SuiteConfig::default().validated().is_ok());
    }

    #[test]
    fn ratios_must_sum_to_one() {
        let ratios = SplitRatios {
            train: 0.9,
            val: 0.2,
            test_id: 0.2,
        };
        assert!(ratios.normalized().is_err());
        assert!(SplitRatios::default().normalized().is_ok());
    }

    #[test]
    fn negative_ratios_are_rejected() {
        let ratios = SplitRatios {
            train: 1.2,
            val: -0.1,
            test_id: -0.1,
        };
        assert!(ratios.normalized().is_err());
    }

    #[test]
    fn inverted_jaccard_band_is_rejected() {
        let config = SuiteConfig {
            hard_swap_jaccard_min: 0.8,
            hard_swap_jaccard_max: 0.3,
            ..SuiteConfig::default()
        };
        assert!(config.validated().is_err());
    }

    #[test]
    fn zero_vision_severity_is_rejected() {
        let config = SuiteConfig {
            vision_severities: vec![0, 1],
            ..SuiteConfig::default()
        };
        assert!(config.validated().is_err());
    }

    #[test]
    fn both_variants_need_a_vision_severity() {
        let config = SuiteConfig {
            include_both_variants: true,
            vision_severities: Vec::new(),
            ..SuiteConfig::default()
        };
        assert!(config.validated().is_err());

        let config = SuiteConfig {
            include_both_variants: false,
            vision_severities: Vec::new(),
            ..SuiteConfig::default()
        };
        assert!(config.validated().is_ok());
    }
}
