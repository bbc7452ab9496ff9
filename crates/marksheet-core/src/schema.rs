//! Data model of an extraction result.
//!
//! Every extracted datum is a [`ConfidenceField`]: the value read from the
//! marksheet plus the model's certainty in `[0.0, 1.0]`. The structs here are
//! the single definition of the output shape; the prompt template shown to
//! the model is generated from them (see [`crate::prompt`]).
//!
//! Optional fields are [`OptionalField`]s: a key the model omitted stays
//! absent on serialization and a key it set to `null` is written back as
//! `null`, so a well-formed response survives a deserialize/serialize round
//! trip unchanged.

use serde::{Deserialize, Deserializer, Serialize};

/// An optional field of the data model.
///
/// `None` when the key was absent, `Some(None)` when it was an explicit
/// `null`, `Some(Some(_))` when it held a field.
pub type OptionalField = Option<Option<ConfidenceField>>;

/// Deserialize a present key, `null` included, as `Some(_)`.
///
/// Used with `#[serde(default)]`, which covers the absent case.
fn present<'de, D>(deserializer: D) -> Result<OptionalField, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<ConfidenceField>::deserialize(deserializer).map(Some)
}

/// An extracted value with the model's confidence in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawConfidenceField")]
pub struct ConfidenceField {
    /// Extracted text, `None` when the document held no evidence.
    pub value: Option<String>,
    /// Certainty in `[0.0, 1.0]`, inclusive at both ends.
    pub confidence: f64,
}

impl ConfidenceField {
    pub const MIN_CONFIDENCE: f64 = 0.0;
    pub const MAX_CONFIDENCE: f64 = 1.0;

    /// Create a field, checking the confidence bound.
    pub fn new(value: Option<String>, confidence: f64) -> Result<Self, String> {
        if !confidence.is_finite()
            || !(Self::MIN_CONFIDENCE..=Self::MAX_CONFIDENCE).contains(&confidence)
        {
            return Err(format!(
                "confidence {} is outside [{}, {}]",
                confidence,
                Self::MIN_CONFIDENCE,
                Self::MAX_CONFIDENCE
            ));
        }
        Ok(Self { value, confidence })
    }

    /// Field with a value.
    pub fn found(value: impl Into<String>, confidence: f64) -> Result<Self, String> {
        Self::new(Some(value.into()), confidence)
    }

    /// Field for which nothing was found.
    pub fn missing() -> Self {
        Self {
            value: None,
            confidence: 0.0,
        }
    }

    /// True when the value is null but the model still claims some certainty.
    pub fn is_null_with_confidence(&self) -> bool {
        self.value.is_none() && self.confidence > 0.0
    }
}

/// Scalar accepted in the `value` slot. Numbers and booleans are kept as text.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

impl From<RawValue> for String {
    fn from(raw: RawValue) -> Self {
        match raw {
            RawValue::Text(s) => s,
            RawValue::Number(n) => n.to_string(),
            RawValue::Flag(b) => b.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct RawConfidenceField {
    #[serde(default)]
    value: Option<RawValue>,
    confidence: f64,
}

impl TryFrom<RawConfidenceField> for ConfidenceField {
    type Error = String;

    fn try_from(raw: RawConfidenceField) -> Result<Self, Self::Error> {
        ConfidenceField::new(raw.value.map(String::from), raw.confidence)
    }
}

/// Identity and exam details of the candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateDetails {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub name: OptionalField,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub fathers_name: OptionalField,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub roll_no: OptionalField,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub registration_no: OptionalField,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub date_of_birth: OptionalField,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub exam_year: OptionalField,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub board_university: OptionalField,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub institution: OptionalField,
}

/// One row of the marks table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectMark {
    pub subject: ConfidenceField,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub max_marks: OptionalField,
    pub obtained_marks: ConfidenceField,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub grade: OptionalField,
}

/// Validated extraction result for one marksheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResponse {
    pub candidate_details: CandidateDetails,
    /// Subject rows in document order.
    pub marks: Vec<SubjectMark>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub overall_result: OptionalField,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub issue_date: OptionalField,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub issue_place: OptionalField,
}

fn push_opt<'a>(
    out: &mut Vec<(String, &'a ConfidenceField)>,
    path: impl Into<String>,
    field: &'a OptionalField,
) {
    if let Some(Some(field)) = field {
        out.push((path.into(), field));
    }
}

impl CandidateDetails {
    fn collect<'a>(&'a self, out: &mut Vec<(String, &'a ConfidenceField)>) {
        // Exhaustive so that a new field cannot be skipped silently.
        let CandidateDetails {
            name,
            fathers_name,
            roll_no,
            registration_no,
            date_of_birth,
            exam_year,
            board_university,
            institution,
        } = self;

        push_opt(out, "candidate_details.name", name);
        push_opt(out, "candidate_details.fathers_name", fathers_name);
        push_opt(out, "candidate_details.roll_no", roll_no);
        push_opt(out, "candidate_details.registration_no", registration_no);
        push_opt(out, "candidate_details.date_of_birth", date_of_birth);
        push_opt(out, "candidate_details.exam_year", exam_year);
        push_opt(out, "candidate_details.board_university", board_university);
        push_opt(out, "candidate_details.institution", institution);
    }
}

impl SubjectMark {
    fn collect<'a>(&'a self, index: usize, out: &mut Vec<(String, &'a ConfidenceField)>) {
        let SubjectMark {
            subject,
            max_marks,
            obtained_marks,
            grade,
        } = self;

        out.push((format!("marks[{}].subject", index), subject));
        push_opt(out, format!("marks[{}].max_marks", index), max_marks);
        out.push((format!("marks[{}].obtained_marks", index), obtained_marks));
        push_opt(out, format!("marks[{}].grade", index), grade);
    }
}

impl ExtractionResponse {
    /// Every field holding a value object, with its dotted path, in document order.
    pub fn fields(&self) -> Vec<(String, &ConfidenceField)> {
        let ExtractionResponse {
            candidate_details,
            marks,
            overall_result,
            issue_date,
            issue_place,
        } = self;

        let mut out = Vec::new();
        candidate_details.collect(&mut out);
        for (index, mark) in marks.iter().enumerate() {
            mark.collect(index, &mut out);
        }
        push_opt(&mut out, "overall_result", overall_result);
        push_opt(&mut out, "issue_date", issue_date);
        push_opt(&mut out, "issue_place", issue_place);
        out
    }

    /// Number of fields present in the response.
    pub fn field_count(&self) -> usize {
        self.fields().len()
    }

    /// Mean confidence over present fields, `None` when there are none.
    pub fn mean_confidence(&self) -> Option<f64> {
        let fields = self.fields();
        if fields.is_empty() {
            return None;
        }
        let total: f64 = fields.iter().map(|(_, f)| f.confidence).sum();
        Some(total / fields.len() as f64)
    }
}
