//! Variant operators deriving corrupted records from clean bases.
//!
//! Every operator is copy-with-override: the base record is cloned, the
//! overridden fields are swapped in, and the base itself is never mutated.
//! All randomness flows in through an explicit seed.

use std::collections::HashSet;

use rand::seq::IndexedRandom;

use crate::constants::metadata::{
    ANSWER_TYPE_BUCKET, BOTH_VARIANT, EDIT_FAMILY, SWAP_OPERATOR, SWAP_SEED, VISION_RECIPE,
};
use crate::constants::suite::{RECIPE_SEPARATOR, VISION_VARIANT_PREFIX};
use crate::constants::text::{
    AUXILIARIES, COUNT_FALLBACK_SENTENCE, DIGIT_BUMP_LIMIT, FALLBACK_COLOR, NEGATION_WORD,
    NUMBER_WORDS, NUMBER_WORD_FALLBACK, WORD_BUMP_LIMIT,
};
use crate::labeling::derive_oracle_action;
use crate::rng::DeterministicRng;
use crate::schema::{ConflictExample, CorruptModality, Family, Operator};
use crate::utils::{noun_tokens, replace_range, word_runs};

/// Jaccard similarity of the noun-like token sets of two captions.
///
/// Two empty sets count as identical (1.0); otherwise the ratio of
/// intersection to union.
pub fn noun_jaccard(a: &str, b: &str) -> f64 {
    jaccard_from_sets(&noun_tokens(a), &noun_tokens(b))
}

pub(crate) fn jaccard_from_sets(left: &HashSet<String>, right: &HashSet<String>) -> f64 {
    if left.is_empty() && right.is_empty() {
        return 1.0;
    }
    let intersection = left.intersection(right).count();
    let union = left.union(right).count();
    intersection as f64 / union.max(1) as f64
}

/// Replace the caption with a donor caption, producing a swap variant.
///
/// The variant suffix is `swap_hard` for [`Operator::SwapHard`] and
/// `swap_easy` otherwise; `hard_swap_flag` records whether a genuine
/// same-topic donor was found. `seed` is provenance only and is echoed into
/// the metadata.
pub fn caption_swap(
    base: &ConflictExample,
    donor_text: &str,
    operator: Operator,
    hard_swap_flag: bool,
    seed: u64,
) -> ConflictExample {
    let suffix = if operator == Operator::SwapHard {
        Operator::SwapHard.as_str()
    } else {
        Operator::SwapEasy.as_str()
    };

    let mut metadata = base.metadata.clone();
    metadata.insert(SWAP_SEED.to_string(), serde_json::json!(seed));
    metadata.insert(SWAP_OPERATOR.to_string(), serde_json::json!(operator.as_str()));
    metadata.insert(
        ANSWER_TYPE_BUCKET.to_string(),
        serde_json::json!(base.answer_type.as_str()),
    );

    ConflictExample {
        example_id: ConflictExample::compose_id(&base.base_id, suffix),
        variant_id: suffix.to_string(),
        text_input: donor_text.to_string(),
        operator,
        corrupt_modality: CorruptModality::Text,
        severity: 1,
        oracle_action: derive_oracle_action(CorruptModality::Text, false),
        hard_swap_flag,
        metadata,
        ..base.clone()
    }
}

/// Apply the family-specific minimal caption edit, producing a text_edit
/// variant.
///
/// Count captions get their first number bumped, existence captions get
/// their negation flipped, color captions get one color substituted from
/// `color_vocab` (seeded). Captions of family `none` pass through unchanged.
pub fn text_edit(base: &ConflictExample, color_vocab: &[String], seed: u64) -> ConflictExample {
    let edited = match base.family {
        Family::Count => edit_count(&base.text_input),
        Family::Existence => flip_negation(&base.text_input),
        Family::AttributeColor => edit_color(&base.text_input, color_vocab, seed),
        Family::None => base.text_input.clone(),
    };

    let mut metadata = base.metadata.clone();
    metadata.insert(
        EDIT_FAMILY.to_string(),
        serde_json::json!(base.family.as_str()),
    );

    ConflictExample {
        example_id: ConflictExample::compose_id(&base.base_id, Operator::TextEdit.as_str()),
        variant_id: Operator::TextEdit.as_str().to_string(),
        text_input: edited,
        operator: Operator::TextEdit,
        corrupt_modality: CorruptModality::Text,
        severity: 1,
        oracle_action: derive_oracle_action(CorruptModality::Text, false),
        metadata,
        ..base.clone()
    }
}

/// Tag the record with a corruption rendering recipe, producing a
/// vision_corrupt variant.
///
/// `image_path` stays untouched; the recipe lands in the `vision_recipe`
/// metadata entry as a `"{path}|{type}|s{severity}"` payload that keys
/// deterministic rendering downstream.
pub fn vision_corrupt(
    base: &ConflictExample,
    corruption_type: &str,
    severity: u32,
) -> ConflictExample {
    let variant_id = format!("{VISION_VARIANT_PREFIX}{severity}");
    let payload = format!(
        "{}{}{}{}s{}",
        base.image_path, RECIPE_SEPARATOR, corruption_type, RECIPE_SEPARATOR, severity
    );

    let mut metadata = base.metadata.clone();
    metadata.insert(
        VISION_RECIPE.to_string(),
        serde_json::json!({
            "type": corruption_type,
            "severity": severity,
            "payload": payload,
        }),
    );

    ConflictExample {
        example_id: ConflictExample::compose_id(&base.base_id, &variant_id),
        variant_id,
        operator: Operator::VisionCorrupt,
        corrupt_modality: CorruptModality::Vision,
        severity,
        oracle_action: derive_oracle_action(CorruptModality::Vision, false),
        metadata,
        ..base.clone()
    }
}

/// Mark a text-edit variant as both-modality corrupted.
///
/// Used when the suite pairs a caption edit with a vision corruption on the
/// same record; the oracle for such records is abstention.
pub fn mark_both(edited: &ConflictExample, severity: u32) -> ConflictExample {
    let mut metadata = edited.metadata.clone();
    metadata.insert(BOTH_VARIANT.to_string(), serde_json::json!(true));

    ConflictExample {
        example_id: ConflictExample::compose_id(
            &edited.base_id,
            crate::constants::suite::BOTH_VARIANT,
        ),
        variant_id: crate::constants::suite::BOTH_VARIANT.to_string(),
        operator: Operator::Both,
        corrupt_modality: CorruptModality::Both,
        severity,
        oracle_action: derive_oracle_action(CorruptModality::Both, true),
        metadata,
        ..edited.clone()
    }
}

fn edit_count(text: &str) -> String {
    let runs = word_runs(text);

    for run in &runs {
        if !run.lowered.is_empty() && run.lowered.chars().all(|ch| ch.is_ascii_digit()) {
            if let Ok(value) = run.lowered.parse::<u128>() {
                let bumped = if value < DIGIT_BUMP_LIMIT {
                    value + 1
                } else {
                    value - 1
                };
                return replace_range(text, run.start, run.end, &bumped.to_string());
            }
        }
    }

    for (word, value) in NUMBER_WORDS {
        if let Some(run) = runs.iter().find(|run| run.lowered == word) {
            let bumped = if value < WORD_BUMP_LIMIT {
                value + 1
            } else {
                value - 1
            };
            let replacement = NUMBER_WORDS
                .iter()
                .find(|(_, candidate)| *candidate == bumped)
                .map(|(name, _)| *name)
                .unwrap_or(NUMBER_WORD_FALLBACK);
            return replace_range(text, run.start, run.end, replacement);
        }
    }

    format!("{} {}", text.trim_end_matches('.'), COUNT_FALLBACK_SENTENCE)
}

fn flip_negation(text: &str) -> String {
    let runs = word_runs(text);

    if let Some(run) = runs.iter().find(|run| run.lowered == NEGATION_WORD) {
        let removed = replace_range(text, run.start, run.end, "");
        return removed.replace("  ", " ").trim().to_string();
    }

    if let Some(run) = runs
        .iter()
        .find(|run| AUXILIARIES.contains(&run.lowered.as_str()))
    {
        let mut inserted = String::with_capacity(text.len() + 4);
        inserted.push_str(&text[..run.end]);
        inserted.push_str(" not");
        inserted.push_str(&text[run.end..]);
        return inserted;
    }

    format!("not {text}")
}

fn edit_color(text: &str, vocab: &[String], seed: u64) -> String {
    let mut rng = DeterministicRng::new(seed);
    let runs = word_runs(text);

    for color in vocab {
        if let Some(run) = runs.iter().find(|run| color.eq_ignore_ascii_case(&run.lowered)) {
            let alternatives: Vec<&String> = vocab
                .iter()
                .filter(|candidate| *candidate != color)
                .collect();
            let Some(replacement) = alternatives.choose(&mut rng) else {
                return text.to_string();
            };
            return replace_range(text, run.start, run.end, replacement);
        }
    }

    let appended = vocab
        .choose(&mut rng)
        .map(String::as_str)
        .unwrap_or(FALLBACK_COLOR);
    format!("{} {}.", text.trim_end_matches('.'), appended)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Action, AnswerType, EvidenceModality, Split};
    use indexmap::IndexMap;

    fn base_example(family: Family, text: &str) -> ConflictExample {
        ConflictExample {
            example_id: "b1::clean".to_string(),
            base_id: "b1".to_string(),
            variant_id: "clean".to_string(),
            image_path: "images/b1.jpg".to_string(),
            text_input: text.to_string(),
            question: "What is shown?".to_string(),
            gold_answer: "car".to_string(),
            split: Split::Train,
            family,
            operator: Operator::Clean,
            corrupt_modality: CorruptModality::None,
            severity: 0,
            answer_type: family.default_answer_type(),
            oracle_action: Action::RequireAgreement,
            source_image_id: Some("images/b1.jpg".to_string()),
            template_id: Some("tmpl".to_string()),
            evidence_modality: EvidenceModality::Either,
            heldout_family_flag: false,
            heldout_severity_flag: false,
            hard_swap_flag: false,
            metadata: IndexMap::new(),
            record_version: "v1".to_string(),
        }
    }

    fn vocab(colors: &[&str]) -> Vec<String> {
        colors.iter().map(|color| color.to_string()).collect()
    }

    #[test]
    fn jaccard_of_two_empty_captions_is_one() {
        assert_eq!(noun_jaccard("", ""), 1.0);
        assert_eq!(noun_jaccard("the a an", "is are"), 1.0);
    }

    #[test]
    fn jaccard_of_disjoint_captions_is_zero() {
        assert_eq!(noun_jaccard("red car", "blue bicycle"), 0.0);
    }

    #[test]
    fn jaccard_counts_shared_nouns() {
        let score = noun_jaccard("a red car parked", "a red bicycle parked");
        // shared {red, parked}, union {red, parked, car, bicycle}
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn caption_swap_replaces_text_and_relabels() {
        let base = base_example(Family::AttributeColor, "A red car.");
        let swapped = caption_swap(&base, "Two dogs on grass.", Operator::SwapEasy, false, 7);

        assert_eq!(swapped.example_id, "b1::swap_easy");
        assert_eq!(swapped.variant_id, "swap_easy");
        assert_eq!(swapped.text_input, "Two dogs on grass.");
        assert_eq!(swapped.corrupt_modality, CorruptModality::Text);
        assert_eq!(swapped.severity, 1);
        assert_eq!(swapped.oracle_action, Action::TrustVision);
        assert_eq!(swapped.metadata["swap_seed"], serde_json::json!(7));
        assert_eq!(swapped.metadata["swap_operator"], "swap_easy");
        assert_eq!(swapped.metadata["answer_type_bucket"], "color");
        // the base stays untouched
        assert_eq!(base.text_input, "A red car.");
        assert_eq!(base.severity, 0);
    }

    #[test]
    fn hard_swap_carries_flag_and_suffix() {
        let base = base_example(Family::Count, "Two dogs.");
        let swapped = caption_swap(&base, "Three cats.", Operator::SwapHard, true, 7);
        assert_eq!(swapped.example_id, "b1::swap_hard");
        assert!(swapped.hard_swap_flag);
        assert_eq!(swapped.operator, Operator::SwapHard);
    }

    #[test]
    fn count_edit_bumps_first_digit_token() {
        let base = base_example(Family::Count, "There are 2 dogs and 5 cats.");
        let edited = text_edit(&base, &[], 7);
        assert_eq!(edited.text_input, "There are 3 dogs and 5 cats.");
        assert_eq!(edited.metadata["edit_family"], "count");
    }

    #[test]
    fn count_edit_decrements_at_digit_limit() {
        let base = base_example(Family::Count, "Exactly 99 birds.");
        let edited = text_edit(&base, &[], 7);
        assert_eq!(edited.text_input, "Exactly 98 birds.");
    }

    #[test]
    fn count_edit_handles_numbers_beyond_u32() {
        let base = base_example(Family::Count, "About 4294967296 stars visible.");
        let edited = text_edit(&base, &[], 7);
        assert_eq!(edited.text_input, "About 4294967295 stars visible.");
    }

    #[test]
    fn count_edit_bumps_number_words() {
        let base = base_example(Family::Count, "Two dogs sit on grass.");
        let edited = text_edit(&base, &[], 7);
        assert_eq!(edited.text_input, "three dogs sit on grass.");
    }

    #[test]
    fn count_edit_appends_fallback_sentence() {
        let base = base_example(Family::Count, "Dogs everywhere.");
        let edited = text_edit(&base, &[], 7);
        assert_eq!(edited.text_input, "Dogs everywhere There are 3 objects.");
    }

    #[test]
    fn existence_edit_removes_negation_first() {
        let base = base_example(Family::Existence, "There is not a dog here.");
        let edited = text_edit(&base, &[], 7);
        assert_eq!(edited.text_input, "There is a dog here.");
    }

    #[test]
    fn existence_edit_inserts_negation_after_auxiliary() {
        let base = base_example(Family::Existence, "A bicycle is next to a tree.");
        let edited = text_edit(&base, &[], 7);
        assert_eq!(edited.text_input, "A bicycle is not next to a tree.");
    }

    #[test]
    fn existence_edit_prefixes_without_auxiliary() {
        let base = base_example(Family::Existence, "One lone bicycle.");
        let edited = text_edit(&base, &[], 7);
        assert_eq!(edited.text_input, "not One lone bicycle.");
    }

    #[test]
    fn existence_edit_ignores_not_inside_words() {
        let base = base_example(Family::Existence, "A knot that cannot slip is shown.");
        let edited = text_edit(&base, &[], 7);
        assert_eq!(edited.text_input, "A knot that cannot slip is not shown.");
    }

    #[test]
    fn color_edit_replaces_with_a_different_color() {
        let base = base_example(Family::AttributeColor, "A red car is parked.");
        let vocab = vocab(&["red", "blue", "green"]);
        let edited = text_edit(&base, &vocab, 7);
        assert_ne!(edited.text_input, base.text_input);
        assert!(!edited.text_input.contains("red"));
        assert!(edited.text_input.contains("car is parked."));
    }

    #[test]
    fn color_edit_matches_vocabulary_case_insensitively() {
        let base = base_example(Family::AttributeColor, "A red car is parked.");
        let vocab = vocab(&["Red", "Blue"]);
        let edited = text_edit(&base, &vocab, 7);
        assert_eq!(edited.text_input, "A Blue car is parked.");
    }

    #[test]
    fn color_edit_is_deterministic_per_seed() {
        let base = base_example(Family::AttributeColor, "A red car is parked.");
        let vocab = vocab(&["red", "blue", "green", "yellow"]);
        let first = text_edit(&base, &vocab, 11);
        let second = text_edit(&base, &vocab, 11);
        assert_eq!(first.text_input, second.text_input);
    }

    #[test]
    fn color_edit_appends_when_no_color_present() {
        let base = base_example(Family::AttributeColor, "A car is parked.");
        let vocab = vocab(&["blue"]);
        let edited = text_edit(&base, &vocab, 7);
        assert_eq!(edited.text_input, "A car is parked blue.");
    }

    #[test]
    fn color_edit_without_alternatives_keeps_caption() {
        let base = base_example(Family::AttributeColor, "A red car.");
        let vocab = vocab(&["red"]);
        let edited = text_edit(&base, &vocab, 7);
        assert_eq!(edited.text_input, "A red car.");
    }

    #[test]
    fn none_family_edit_keeps_caption_but_corrupts() {
        let base = base_example(Family::None, "Anything at all.");
        let edited = text_edit(&base, &[], 7);
        assert_eq!(edited.text_input, "Anything at all.");
        assert_eq!(edited.corrupt_modality, CorruptModality::Text);
        assert_eq!(edited.severity, 1);
    }

    #[test]
    fn vision_corrupt_builds_recipe_payload() {
        let base = base_example(Family::Existence, "A bicycle.");
        let corrupted = vision_corrupt(&base, "occlusion", 2);

        assert_eq!(corrupted.example_id, "b1::vision_corrupt_s2");
        assert_eq!(corrupted.corrupt_modality, CorruptModality::Vision);
        assert_eq!(corrupted.severity, 2);
        assert_eq!(corrupted.oracle_action, Action::TrustText);
        let recipe = &corrupted.metadata["vision_recipe"];
        assert_eq!(recipe["type"], "occlusion");
        assert_eq!(recipe["severity"], 2);
        assert_eq!(recipe["payload"], "images/b1.jpg|occlusion|s2");
        // image path and caption untouched
        assert_eq!(corrupted.image_path, "images/b1.jpg");
        assert_eq!(corrupted.text_input, base.text_input);
    }

    #[test]
    fn mark_both_overrides_edit_into_abstention() {
        let base = base_example(Family::Count, "Two dogs.");
        let edited = text_edit(&base, &[], 7);
        let both = mark_both(&edited, 3);

        assert_eq!(both.example_id, "b1::both");
        assert_eq!(both.operator, Operator::Both);
        assert_eq!(both.corrupt_modality, CorruptModality::Both);
        assert_eq!(both.severity, 3);
        assert_eq!(both.oracle_action, Action::Abstain);
        assert_eq!(both.metadata["both_variant"], true);
        assert_eq!(both.metadata["edit_family"], "count");
        assert_eq!(both.text_input, edited.text_input);
    }

    #[test]
    fn answer_type_bucket_follows_base_answer_type() {
        let mut base = base_example(Family::Count, "Two dogs.");
        base.answer_type = AnswerType::Integer;
        let swapped = caption_swap(&base, "A cat.", Operator::SwapEasy, false, 3);
        assert_eq!(swapped.metadata["answer_type_bucket"], "integer");
    }
}
