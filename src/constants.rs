use crate::schema::Split;

/// Constants used by oracle labeling and reliability-target derivation.
pub mod labeling {
    /// Default maximum severity used to normalize reliability penalties.
    pub const MAX_SEVERITY_DEFAULT: u32 = 3;
    /// Floor applied to degraded reliability components.
    pub const RELIABILITY_FLOOR: f64 = 0.05;
    /// Minimum penalty applied to any corrupted modality.
    pub const MIN_PENALTY: f64 = 0.2;
    /// Scale used to round reliability components to four decimal places.
    pub const ROUND_SCALE: f64 = 10_000.0;
}

/// Constants used by caption tokenization and deterministic text edits.
pub mod text {
    /// Function words excluded from noun-like token sets.
    pub const STOPWORDS: [&str; 16] = [
        "a", "an", "the", "is", "are", "on", "in", "at", "of", "to", "for", "there", "this",
        "that", "these", "those",
    ];
    /// Spelled-out numbers recognized by count edits, in lookup priority order.
    pub const NUMBER_WORDS: [(&str, u32); 11] = [
        ("zero", 0),
        ("one", 1),
        ("two", 2),
        ("three", 3),
        ("four", 4),
        ("five", 5),
        ("six", 6),
        ("seven", 7),
        ("eight", 8),
        ("nine", 9),
        ("ten", 10),
    ];
    /// Auxiliary verbs that accept an inserted negation.
    pub const AUXILIARIES: [&str; 10] = [
        "is", "are", "was", "were", "has", "have", "do", "does", "did", "can",
    ];
    /// Negation word toggled by existence edits.
    pub const NEGATION_WORD: &str = "not";
    /// Sentence appended when a count caption contains no recognizable number.
    pub const COUNT_FALLBACK_SENTENCE: &str = "There are 3 objects.";
    /// Color appended when the edit vocabulary is empty.
    pub const FALLBACK_COLOR: &str = "red";
    /// Digit tokens below this limit are incremented; at or above, decremented.
    pub const DIGIT_BUMP_LIMIT: u128 = 99;
    /// Number words below this limit are incremented; at or above, decremented.
    pub const WORD_BUMP_LIMIT: u32 = 10;
    /// Word used when an incremented number has no spelled-out form.
    pub const NUMBER_WORD_FALLBACK: &str = "one";
}

/// Constants used by suite construction defaults and id layout.
pub mod suite {
    /// Default construction seed.
    pub const DEFAULT_SEED: u64 = 7;
    /// Default severity threshold routing corrupted records to the OOD split.
    pub const DEFAULT_HELD_OUT_SEVERITY: u32 = 3;
    /// Default vision corruption type recorded in rendering recipes.
    pub const DEFAULT_VISION_CORRUPTION: &str = "occlusion";
    /// Default vision severities generated per base example.
    pub const DEFAULT_VISION_SEVERITIES: [u32; 3] = [1, 2, 3];
    /// Default color vocabulary for attribute edits.
    pub const DEFAULT_COLOR_VOCAB: [&str; 8] = [
        "red", "blue", "green", "yellow", "black", "white", "brown", "gray",
    ];
    /// Default lower bound of the hard-swap caption similarity band.
    pub const DEFAULT_JACCARD_MIN: f64 = 0.2;
    /// Default upper bound of the hard-swap caption similarity band.
    pub const DEFAULT_JACCARD_MAX: f64 = 0.7;
    /// Separator between base id and variant id in `example_id`.
    pub const ID_SEPARATOR: &str = "::";
    /// Separator between path, corruption type, and severity in recipes.
    pub const RECIPE_SEPARATOR: char = '|';
    /// Variant id of the clean baseline record.
    pub const CLEAN_VARIANT: &str = "clean";
    /// Variant id of the combined text-plus-vision record.
    pub const BOTH_VARIANT: &str = "both";
    /// Prefix of vision-corruption variant ids (`vision_corrupt_s{N}`).
    pub const VISION_VARIANT_PREFIX: &str = "vision_corrupt_s";
    /// Number of hex characters kept from the template fingerprint.
    pub const TEMPLATE_ID_LEN: usize = 12;
    /// Current record schema version.
    pub const RECORD_VERSION: &str = "v1";
    /// Sub-seed key for the source-image split shuffle.
    pub const SPLIT_SHUFFLE_KEY: &str = "source_split";
    /// Sub-seed key suffix for per-base text-edit color draws.
    pub const TEXT_EDIT_SEED_KEY: &str = "text_edit";
}

/// Metadata keys written by variant operators.
pub mod metadata {
    /// Seed echoed into swap-variant provenance.
    pub const SWAP_SEED: &str = "swap_seed";
    /// Operator echoed into swap-variant provenance.
    pub const SWAP_OPERATOR: &str = "swap_operator";
    /// Answer-type bucket echoed into swap-variant provenance.
    pub const ANSWER_TYPE_BUCKET: &str = "answer_type_bucket";
    /// Family that drove a text edit.
    pub const EDIT_FAMILY: &str = "edit_family";
    /// Rendering recipe attached to vision-corrupt variants.
    pub const VISION_RECIPE: &str = "vision_recipe";
    /// Marker set on combined text-plus-vision variants.
    pub const BOTH_VARIANT: &str = "both_variant";
}

/// Constants used by the deterministic vision-corruption geometry.
pub mod vision {
    /// Occluded area fraction at severity 1.
    pub const AREA_FRACTION_S1: f64 = 0.15;
    /// Occluded area fraction at severity 2.
    pub const AREA_FRACTION_S2: f64 = 0.30;
    /// Occluded area fraction at severity 3 and above.
    pub const AREA_FRACTION_S3: f64 = 0.45;
    /// Upper clamp on the occluded area fraction.
    pub const MAX_AREA_FRACTION: f64 = 0.95;
    /// Lower clamp on the occluded area fraction.
    pub const MIN_AREA_FRACTION: f64 = 1e-6;
    /// Hex characters of the recipe digest folded into the placement seed.
    pub const SEED_HEX_CHARS: usize = 8;
}

/// Constants used by integrity validation and pilot sampling.
pub mod integrity {
    use super::Split;

    /// In-distribution splits subject to leakage and flag checks.
    pub const ID_SPLITS: [Split; 3] = [Split::Train, Split::Val, Split::TestId];
}

/// Constants used by pilot-sampling manifests.
pub mod sampling {
    /// Strategy name recorded in pilot manifests.
    pub const PILOT_STRATEGY: &str = "stratified_base";
    /// Separator between family and split in stratum keys.
    pub const STRATUM_SEPARATOR: &str = "::";
}
