/// Unique record identifier (stable across runs).
/// Example: `b1::swap_hard`
pub type ExampleId = String;
/// Identifier for the base example a record was derived from.
/// Examples: `b1`, `coco_000000397133`
pub type BaseId = String;
/// Variant suffix naming the operator output.
/// Examples: `clean`, `swap_easy`, `vision_corrupt_s2`
pub type VariantId = String;
/// Provenance key for the underlying image, used for leakage checks.
/// Examples: `images/train/000000397133.jpg`, `train::1`
pub type SourceImageId = String;
/// Question-template fingerprint (first 12 hex chars of a SHA-1).
/// Example: `a3f1c09b2d44`
pub type TemplateId = String;
/// Stratum key used in pilot-sampling manifests.
/// Examples: `count::train`, `attribute_color::test_ood_family`
pub type StratumKey = String;
