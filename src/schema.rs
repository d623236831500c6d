use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

use crate::constants::suite::{ID_SEPARATOR, RECORD_VERSION};

pub use crate::types::{BaseId, ExampleId, SourceImageId, TemplateId, VariantId};

/// Dataset partitions, in-distribution and OOD.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    /// Training split.
    Train,
    /// Validation split.
    Val,
    /// In-distribution test split.
    TestId,
    /// OOD test split holding out one conflict family.
    TestOodFamily,
    /// OOD test split holding out high corruption severities.
    TestOodSeverity,
    /// OOD test split holding out genuine hard swaps.
    TestOodHardSwap,
}

impl Split {
    /// Canonical serialized value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::TestId => "test_id",
            Split::TestOodFamily => "test_ood_family",
            Split::TestOodSeverity => "test_ood_severity",
            Split::TestOodHardSwap => "test_ood_hard_swap",
        }
    }

    /// Parse a canonical or legacy split value (case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "train" => Some(Split::Train),
            "val" => Some(Split::Val),
            "test" | "test_id" => Some(Split::TestId),
            "test_ood_family" => Some(Split::TestOodFamily),
            "test_ood_severity" => Some(Split::TestOodSeverity),
            "test_ood_hard_swap" => Some(Split::TestOodHardSwap),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Split {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Split::parse(&raw).ok_or_else(|| de::Error::custom(format!("unknown split value: {raw}")))
    }
}

/// Conflict family a record belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    /// No family assigned.
    None,
    /// Object existence questions.
    Existence,
    /// Object count questions.
    Count,
    /// Color attribute questions.
    AttributeColor,
}

impl Family {
    /// Canonical serialized value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::None => "none",
            Family::Existence => "existence",
            Family::Count => "count",
            Family::AttributeColor => "attribute_color",
        }
    }

    /// Parse a canonical or legacy family value (case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "none" => Some(Family::None),
            "existence" | "object" | "relation" => Some(Family::Existence),
            "count" => Some(Family::Count),
            "attribute_color" | "attribute" => Some(Family::AttributeColor),
            _ => None,
        }
    }

    /// Answer-type bucket implied by the family when a record omits one.
    pub fn default_answer_type(&self) -> AnswerType {
        match self {
            Family::Existence => AnswerType::Boolean,
            Family::Count => AnswerType::Integer,
            Family::AttributeColor => AnswerType::Color,
            Family::None => AnswerType::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for Family {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Family::parse(&raw).ok_or_else(|| de::Error::custom(format!("unknown family value: {raw}")))
    }
}

/// Operator that produced a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Unmodified baseline.
    Clean,
    /// Caption swapped with an arbitrary donor.
    SwapEasy,
    /// Caption swapped with a same-topic donor.
    SwapHard,
    /// Caption minimally edited within its family.
    TextEdit,
    /// Image tagged with a corruption rendering recipe.
    VisionCorrupt,
    /// Text and vision corrupted together.
    Both,
}

impl Operator {
    /// Canonical serialized value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Clean => "clean",
            Operator::SwapEasy => "swap_easy",
            Operator::SwapHard => "swap_hard",
            Operator::TextEdit => "text_edit",
            Operator::VisionCorrupt => "vision_corrupt",
            Operator::Both => "both",
        }
    }

    /// Parse a canonical or legacy operator value (case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "clean" => Some(Operator::Clean),
            "swap_easy" | "caption_swap" => Some(Operator::SwapEasy),
            "swap_hard" | "caption_swap_same_topic" => Some(Operator::SwapHard),
            "text_edit" | "text_edit_count" | "text_edit_relation" | "text_edit_attribute" => {
                Some(Operator::TextEdit)
            }
            "vision_corrupt" | "corrupt" | "vision_blur" | "vision_occlusion"
            | "vision_distractor" => Some(Operator::VisionCorrupt),
            "both" => Some(Operator::Both),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Operator::parse(&raw)
            .ok_or_else(|| de::Error::custom(format!("unknown operator value: {raw}")))
    }
}

/// Which modality carries the injected corruption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptModality {
    /// No corruption.
    None,
    /// Image corrupted.
    Vision,
    /// Caption corrupted.
    Text,
    /// Both modalities corrupted.
    Both,
}

impl CorruptModality {
    /// Canonical serialized value.
    pub fn as_str(&self) -> &'static str {
        match self {
            CorruptModality::None => "none",
            CorruptModality::Vision => "vision",
            CorruptModality::Text => "text",
            CorruptModality::Both => "both",
        }
    }

    /// Parse a corrupt-modality value (case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "none" => Some(CorruptModality::None),
            "vision" => Some(CorruptModality::Vision),
            "text" => Some(CorruptModality::Text),
            "both" => Some(CorruptModality::Both),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for CorruptModality {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        CorruptModality::parse(&raw)
            .ok_or_else(|| de::Error::custom(format!("unknown corrupt_modality value: {raw}")))
    }
}

/// Which modality carries the evidence needed to answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceModality {
    /// Only the image answers the question.
    VisionRequired,
    /// Only the caption answers the question.
    TextRequired,
    /// Both modalities are needed.
    Both,
    /// Either modality suffices.
    Either,
}

impl EvidenceModality {
    /// Canonical serialized value.
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceModality::VisionRequired => "vision_required",
            EvidenceModality::TextRequired => "text_required",
            EvidenceModality::Both => "both",
            EvidenceModality::Either => "either",
        }
    }

    /// Parse an evidence-modality value (case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "vision_required" => Some(EvidenceModality::VisionRequired),
            "text_required" => Some(EvidenceModality::TextRequired),
            "both" => Some(EvidenceModality::Both),
            "either" => Some(EvidenceModality::Either),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for EvidenceModality {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        EvidenceModality::parse(&raw)
            .ok_or_else(|| de::Error::custom(format!("unknown evidence_modality value: {raw}")))
    }
}

/// Expected answer format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerType {
    /// Yes/no answer.
    Boolean,
    /// Numeric count answer.
    Integer,
    /// Color-name answer.
    Color,
    /// Unclassified answer format.
    Unknown,
}

impl AnswerType {
    /// Canonical serialized value.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerType::Boolean => "boolean",
            AnswerType::Integer => "integer",
            AnswerType::Color => "color",
            AnswerType::Unknown => "unknown",
        }
    }

    /// Parse an answer-type value (case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "boolean" => Some(AnswerType::Boolean),
            "integer" => Some(AnswerType::Integer),
            "color" => Some(AnswerType::Color),
            "unknown" => Some(AnswerType::Unknown),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for AnswerType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        AnswerType::parse(&raw)
            .ok_or_else(|| de::Error::custom(format!("unknown answer_type value: {raw}")))
    }
}

/// Oracle action a calibrated model should take on a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Answer from the image, ignore the caption.
    TrustVision,
    /// Answer from the caption, ignore the image.
    TrustText,
    /// Answer only when the modalities agree.
    RequireAgreement,
    /// Decline to answer.
    Abstain,
}

impl Action {
    /// Canonical serialized value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::TrustVision => "trust_vision",
            Action::TrustText => "trust_text",
            Action::RequireAgreement => "require_agreement",
            Action::Abstain => "abstain",
        }
    }

    /// Parse an oracle-action value (case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "trust_vision" => Some(Action::TrustVision),
            "trust_text" => Some(Action::TrustText),
            "require_agreement" => Some(Action::RequireAgreement),
            "abstain" => Some(Action::Abstain),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Action::parse(&raw)
            .ok_or_else(|| de::Error::custom(format!("unknown oracle_action value: {raw}")))
    }
}

/// Canonical record of the conflict suite.
///
/// Records are immutable once constructed; operators derive variants through
/// copy-with-override rather than mutating the base.
#[derive(Clone, Debug, PartialEq)]
pub struct ConflictExample {
    /// Stable record identifier, `{base_id}::{variant_id}`.
    pub example_id: ExampleId,
    /// Base example this record was derived from.
    pub base_id: BaseId,
    /// Variant suffix naming the operator output.
    pub variant_id: VariantId,
    /// Image reference; corruption operators leave it untouched.
    pub image_path: String,
    /// Caption presented alongside the image.
    pub text_input: String,
    /// Question text.
    pub question: String,
    /// Ground-truth answer.
    pub gold_answer: String,
    /// Assigned split bucket.
    pub split: Split,
    /// Conflict family.
    pub family: Family,
    /// Operator that produced the record.
    pub operator: Operator,
    /// Which modality carries the corruption.
    pub corrupt_modality: CorruptModality,
    /// Corruption severity; 0 exactly when the record is clean.
    pub severity: u32,
    /// Expected answer format.
    pub answer_type: AnswerType,
    /// Oracle action derived from the corruption state.
    pub oracle_action: Action,
    /// Provenance key for the underlying image, used for leakage checks.
    pub source_image_id: Option<SourceImageId>,
    /// Question-template fingerprint.
    pub template_id: Option<TemplateId>,
    /// Which modality carries the evidence needed to answer.
    pub evidence_modality: EvidenceModality,
    /// True only for records routed to the OOD-family split.
    pub heldout_family_flag: bool,
    /// True only for records routed to the OOD-severity split.
    pub heldout_severity_flag: bool,
    /// True when a genuine same-topic donor produced a hard swap.
    pub hard_swap_flag: bool,
    /// Free-form provenance written by operators.
    pub metadata: IndexMap<String, serde_json::Value>,
    /// Record schema version.
    pub record_version: String,
}

impl ConflictExample {
    /// Compose the canonical `{base_id}::{variant_id}` record id.
    pub fn compose_id(base_id: &str, variant_id: &str) -> ExampleId {
        format!("{base_id}{ID_SEPARATOR}{variant_id}")
    }
}

impl Serialize for ConflictExample {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut record = serializer.serialize_struct("ConflictExample", 25)?;
        record.serialize_field("example_id", &self.example_id)?;
        record.serialize_field("base_id", &self.base_id)?;
        record.serialize_field("variant_id", &self.variant_id)?;
        record.serialize_field("image_path", &self.image_path)?;
        record.serialize_field("text_input", &self.text_input)?;
        record.serialize_field("question", &self.question)?;
        record.serialize_field("gold_answer", &self.gold_answer)?;
        record.serialize_field("split", &self.split)?;
        record.serialize_field("family", &self.family)?;
        record.serialize_field("operator", &self.operator)?;
        record.serialize_field("corrupt_modality", &self.corrupt_modality)?;
        record.serialize_field("severity", &self.severity)?;
        record.serialize_field("answer_type", &self.answer_type)?;
        record.serialize_field("oracle_action", &self.oracle_action)?;
        record.serialize_field("source_image_id", &self.source_image_id)?;
        record.serialize_field("template_id", &self.template_id)?;
        record.serialize_field("evidence_modality", &self.evidence_modality)?;
        record.serialize_field("heldout_family_flag", &self.heldout_family_flag)?;
        record.serialize_field("heldout_severity_flag", &self.heldout_severity_flag)?;
        record.serialize_field("hard_swap_flag", &self.hard_swap_flag)?;
        record.serialize_field("metadata", &self.metadata)?;
        record.serialize_field("record_version", &self.record_version)?;
        // Legacy alias keys kept for older readers.
        record.serialize_field("conflict_type", self.family.as_str())?;
        record.serialize_field("corrupted_modality", self.corrupt_modality.as_str())?;
        record.serialize_field("corruption_family", self.operator.as_str())?;
        record.end()
    }
}

/// Raw view of a serialized record: every field optional except content,
/// with legacy alias keys carried separately so canonical keys win.
#[derive(Deserialize)]
struct RawRecord {
    example_id: Option<String>,
    base_id: Option<String>,
    variant_id: Option<String>,
    image_path: String,
    text_input: String,
    question: String,
    gold_answer: String,
    split: Option<String>,
    family: Option<String>,
    conflict_type: Option<String>,
    operator: Option<String>,
    corruption_family: Option<String>,
    corrupt_modality: Option<String>,
    corrupted_modality: Option<String>,
    severity: Option<u32>,
    answer_type: Option<String>,
    oracle_action: Option<String>,
    source_image_id: Option<String>,
    template_id: Option<String>,
    evidence_modality: Option<String>,
    heldout_family_flag: Option<bool>,
    heldout_severity_flag: Option<bool>,
    hard_swap_flag: Option<bool>,
    metadata: Option<IndexMap<String, serde_json::Value>>,
    record_version: Option<String>,
}

fn parse_enum<T, E>(
    raw: Option<String>,
    parse: fn(&str) -> Option<T>,
    default: T,
    field: &'static str,
) -> Result<T, E>
where
    E: de::Error,
{
    match raw {
        None => Ok(default),
        Some(value) => {
            parse(&value).ok_or_else(|| E::custom(format!("unknown {field} value: {value}")))
        }
    }
}

fn head_segment(id: &str) -> &str {
    id.split(ID_SEPARATOR).next().unwrap_or(id)
}

fn tail_segment(id: &str) -> &str {
    id.rsplit(ID_SEPARATOR).next().unwrap_or(id)
}

impl<'de> Deserialize<'de> for ConflictExample {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawRecord::deserialize(deserializer)?;

        let id_hint = raw
            .example_id
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        let base_id = raw
            .base_id
            .unwrap_or_else(|| head_segment(&id_hint).to_string());
        let variant_id = raw
            .variant_id
            .unwrap_or_else(|| tail_segment(&id_hint).to_string());
        let example_id = raw
            .example_id
            .unwrap_or_else(|| ConflictExample::compose_id(&base_id, &variant_id));

        let split = parse_enum(raw.split, Split::parse, Split::Train, "split")?;
        let family = parse_enum(
            raw.family.or(raw.conflict_type),
            Family::parse,
            Family::None,
            "family",
        )?;
        let operator = parse_enum(
            raw.operator.or(raw.corruption_family),
            Operator::parse,
            Operator::Clean,
            "operator",
        )?;
        let corrupt_modality = parse_enum(
            raw.corrupt_modality.or(raw.corrupted_modality),
            CorruptModality::parse,
            CorruptModality::None,
            "corrupt_modality",
        )?;
        let answer_type = match raw.answer_type {
            Some(value) if !value.trim().is_empty() => parse_enum(
                Some(value),
                AnswerType::parse,
                AnswerType::Unknown,
                "answer_type",
            )?,
            _ => family.default_answer_type(),
        };
        let oracle_action = parse_enum(
            raw.oracle_action,
            Action::parse,
            Action::RequireAgreement,
            "oracle_action",
        )?;
        let evidence_modality = parse_enum(
            raw.evidence_modality,
            EvidenceModality::parse,
            EvidenceModality::Either,
            "evidence_modality",
        )?;

        Ok(ConflictExample {
            example_id,
            base_id,
            variant_id,
            image_path: raw.image_path,
            text_input: raw.text_input,
            question: raw.question,
            gold_answer: raw.gold_answer,
            split,
            family,
            operator,
            corrupt_modality,
            severity: raw.severity.unwrap_or(0),
            answer_type,
            oracle_action,
            source_image_id: raw.source_image_id,
            template_id: raw.template_id,
            evidence_modality,
            heldout_family_flag: raw.heldout_family_flag.unwrap_or(false),
            heldout_severity_flag: raw.heldout_severity_flag.unwrap_or(false),
            hard_swap_flag: raw.hard_swap_flag.unwrap_or(false),
            metadata: raw.metadata.unwrap_or_default(),
            record_version: raw.record_version.unwrap_or_else(|| RECORD_VERSION.to_string()),
        })
    }
}
