//! Prompt construction for marksheet extraction.
//!
//! The JSON shape shown to the model is not hand-written: a fully populated
//! [`ExtractionResponse`] carrying type hints is serialized through serde and
//! every `confidence` is replaced with the hint `"float"`. Renaming a field in
//! [`crate::schema`] renames it in the prompt too.

use serde_json::Value;

use crate::schema::{
    CandidateDetails, ConfidenceField, ExtractionResponse, OptionalField, SubjectMark,
};

const TEXT_HINT: &str = "string | null";
const REQUIRED_TEXT_HINT: &str = "string";
const DATE_HINT: &str = "DD/MM/YYYY | null";
const RESULT_HINT: &str = "PASS/FAIL/DIVISION | null";
const CONFIDENCE_HINT: &str = "float";

const INSTRUCTIONS: &str = "\
You are an expert AI system for extracting information from academic marksheets.
Your task is to analyze the provided OCR text and convert it into a structured JSON object.

**Instructions:**
1.  Carefully parse the OCR text. It may contain errors or formatting issues.
2.  Extract the information for all fields defined in the JSON schema below.
3.  For each field, provide a `value` and a `confidence` score (from 0.0 to 1.0).
4.  The confidence score should reflect your certainty. 1.0 means absolute certainty, 0.0 means no information found.
5.  If a field's value is not found in the text, its `value` must be `null` and its `confidence` must be `0.0`.
6.  The final output MUST be a single, valid JSON object and nothing else. Do not add any extra text, explanations, or markdown formatting like ```json.";

fn hint(text: &str) -> OptionalField {
    Some(Some(required_hint(text)))
}

fn required_hint(text: &str) -> ConfidenceField {
    ConfidenceField {
        value: Some(text.to_string()),
        confidence: 0.0,
    }
}

/// A response whose every field is present and holds a type hint.
fn template_instance() -> ExtractionResponse {
    ExtractionResponse {
        candidate_details: CandidateDetails {
            name: hint(TEXT_HINT),
            fathers_name: hint(TEXT_HINT),
            roll_no: hint(TEXT_HINT),
            registration_no: hint(TEXT_HINT),
            date_of_birth: hint(DATE_HINT),
            exam_year: hint(TEXT_HINT),
            board_university: hint(TEXT_HINT),
            institution: hint(TEXT_HINT),
        },
        marks: vec![SubjectMark {
            subject: required_hint(REQUIRED_TEXT_HINT),
            max_marks: hint(TEXT_HINT),
            obtained_marks: required_hint(REQUIRED_TEXT_HINT),
            grade: hint(TEXT_HINT),
        }],
        overall_result: hint(RESULT_HINT),
        issue_date: hint(DATE_HINT),
        issue_place: hint(TEXT_HINT),
    }
}

fn replace_confidence_hints(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if key == "confidence" {
                    *child = Value::String(CONFIDENCE_HINT.to_string());
                } else {
                    replace_confidence_hints(child);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(replace_confidence_hints),
        _ => {}
    }
}

/// The JSON template the model is asked to fill, as a value.
pub fn schema_template() -> Value {
    // Serializing plain structs of strings and finite floats cannot fail.
    let mut value = serde_json::to_value(template_instance()).unwrap_or(Value::Null);
    replace_confidence_hints(&mut value);
    value
}

/// Render the extraction prompt for the given OCR text.
pub fn build_prompt(ocr_text: &str) -> String {
    let template = serde_json::to_string_pretty(&schema_template()).unwrap_or_default();
    format!(
        "{INSTRUCTIONS}\n\n**OCR Text to Analyze:**\n---\n{ocr_text}\n---\n\n**Required JSON Output Schema:**\n{template}\n"
    )
}
