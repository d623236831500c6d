use std::collections::HashMap;

use indexmap::IndexMap;

use conflict_suite::{
    Action, ConflictExample, CorruptModality, EvidenceModality, Family, Operator, Split,
    sample_pilot_by_base,
};

fn record(base_id: &str, variant_id: &str, family: Family, split: Split) -> ConflictExample {
    ConflictExample {
        example_id: format!("{base_id}::{variant_id}"),
        base_id: base_id.to_string(),
        variant_id: variant_id.to_string(),
        image_path: format!("images/{base_id}.jpg"),
        text_input: "A caption.".to_string(),
        question: format!("Question about {base_id}?"),
        gold_answer: "1".to_string(),
        split,
        family,
        operator: Operator::Clean,
        corrupt_modality: CorruptModality::None,
        severity: 0,
        answer_type: family.default_answer_type(),
        oracle_action: Action::RequireAgreement,
        source_image_id: Some(format!("images/{base_id}.jpg")),
        template_id: Some(format!("tmpl_{base_id}")),
        evidence_modality: EvidenceModality::VisionRequired,
        heldout_family_flag: false,
        heldout_severity_flag: false,
        hard_swap_flag: false,
        metadata: IndexMap::new(),
        record_version: "v1".to_string(),
    }
}

fn suite_with_variants(base_count: usize) -> Vec<ConflictExample> {
    let mut records = Vec::new();
    for index in 0..base_count {
        let base_id = format!("base{index:02}");
        records.push(record(&base_id, "clean", Family::Count, Split::Train));
        records.push(record(&base_id, "text_edit", Family::Count, Split::Train));
        records.push(record(
            &base_id,
            "vision_corrupt_s1",
            Family::Count,
            Split::Train,
        ));
    }
    records
}

#[test]
fn selected_base_groups_are_atomic() {
    let records = suite_with_variants(6);
    let (selected, manifest) = sample_pilot_by_base(&records, 3, 17);

    assert_eq!(manifest.selected_base_count, 3);
    assert_eq!(manifest.selected_example_count, 9);
    assert_eq!(selected.len(), 9);

    let mut per_base: HashMap<&str, usize> = HashMap::new();
    for example in &selected {
        *per_base.entry(example.base_id.as_str()).or_default() += 1;
    }
    assert_eq!(per_base.len(), 3);
    assert!(per_base.values().all(|count| *count == 3));
}

#[test]
fn selection_is_reproducible_for_a_seed() {
    let records = suite_with_variants(10);
    let (first, first_manifest) = sample_pilot_by_base(&records, 4, 41);
    let (second, second_manifest) = sample_pilot_by_base(&records, 4, 41);

    assert_eq!(first, second);
    assert_eq!(first_manifest, second_manifest);
}

#[test]
fn oversized_requests_return_every_group_sorted() {
    let records = suite_with_variants(6);
    let (selected, manifest) = sample_pilot_by_base(&records, 99, 17);

    assert_eq!(manifest.selected_base_count, 6);
    assert_eq!(selected.len(), records.len());
    for pair in selected.windows(2) {
        assert!(pair[0].example_id < pair[1].example_id);
    }
}

#[test]
fn allocation_is_proportional_across_strata() {
    let mut records = Vec::new();
    for index in 0..8 {
        records.push(record(
            &format!("count{index}"),
            "clean",
            Family::Count,
            Split::Train,
        ));
    }
    for index in 0..2 {
        records.push(record(
            &format!("exist{index}"),
            "clean",
            Family::Existence,
            Split::Train,
        ));
    }

    let (_, manifest) = sample_pilot_by_base(&records, 5, 23);

    assert_eq!(manifest.strata_counts_full.get("count::train"), Some(&8));
    assert_eq!(manifest.strata_counts_full.get("existence::train"), Some(&2));
    assert_eq!(manifest.strata_counts_selected.get("count::train"), Some(&4));
    assert_eq!(
        manifest.strata_counts_selected.get("existence::train"),
        Some(&1)
    );
    assert_eq!(manifest.selected_base_count, 5);
}

#[test]
fn zero_sized_requests_select_nothing() {
    let records = suite_with_variants(4);
    let (selected, manifest) = sample_pilot_by_base(&records, 0, 17);

    assert!(selected.is_empty());
    assert_eq!(manifest.strategy, "stratified_base");
    assert_eq!(manifest.base_sample_size, 0);
    assert_eq!(manifest.selected_base_count, 0);
    assert_eq!(manifest.selected_example_count, 0);
    assert!(manifest.strata_counts_selected.is_empty());
}

#[test]
fn stratum_keys_come_from_the_clean_representative() {
    // base with a clean record: stratified by the clean record's split
    let mut high = record(
        "with_clean",
        "vision_corrupt_s3",
        Family::Count,
        Split::TestOodSeverity,
    );
    high.operator = Operator::VisionCorrupt;
    high.corrupt_modality = CorruptModality::Vision;
    high.severity = 3;
    // base without a clean record: smallest example_id stands in
    let mut edited = record("without", "text_edit", Family::Count, Split::Val);
    edited.operator = Operator::TextEdit;
    edited.corrupt_modality = CorruptModality::Text;
    edited.severity = 1;
    let records = vec![
        record("with_clean", "clean", Family::Count, Split::Train),
        high,
        edited,
    ];

    let (_, manifest) = sample_pilot_by_base(&records, 99, 5);

    assert_eq!(manifest.strata_counts_full.get("count::train"), Some(&1));
    assert_eq!(manifest.strata_counts_full.get("count::val"), Some(&1));
    assert!(manifest.strata_counts_full.get("count::test_ood_severity").is_none());
}

#[test]
fn representative_follows_the_clean_operator_not_the_variant_name() {
    // a variant merely named "clean" does not pick the stratum
    let mut mislabeled = record("tricky", "clean", Family::Count, Split::Val);
    mislabeled.operator = Operator::TextEdit;
    mislabeled.corrupt_modality = CorruptModality::Text;
    mislabeled.severity = 1;
    let records = vec![
        mislabeled,
        record("tricky", "baseline", Family::Count, Split::Train),
    ];

    let (_, manifest) = sample_pilot_by_base(&records, 99, 5);

    assert_eq!(manifest.strata_counts_full.get("count::train"), Some(&1));
    assert!(manifest.strata_counts_full.get("count::val").is_none());
}

#[test]
fn pilot_distributions_summarize_the_selection() {
    let records = suite_with_variants(4);
    let (selected, manifest) = sample_pilot_by_base(&records, 2, 17);

    assert_eq!(
        manifest.distributions.split.get("train"),
        Some(&selected.len())
    );
    assert_eq!(
        manifest.distributions.family.get("count"),
        Some(&selected.len())
    );
}
