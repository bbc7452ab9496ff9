//! Strict validation of parsed model output against the data model.
//!
//! Validation is all or nothing: one malformed subject row fails the whole
//! document. There is no substitution of defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{MarksheetError, MarksheetResult};
use crate::schema::ExtractionResponse;

/// Policy knobs applied after structural validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Reject fields whose value is null but whose confidence is above zero.
    /// When false such fields are accepted and logged.
    pub reject_null_with_confidence: bool,
}

/// Validate a parsed JSON value and build the typed response.
pub fn validate(value: Value, policy: &ValidationPolicy) -> MarksheetResult<ExtractionResponse> {
    if !value.is_object() {
        return Err(MarksheetError::schema(format!(
            "expected a JSON object at the root, found {}",
            json_type_name(&value)
        )));
    }

    let response: ExtractionResponse =
        serde_json::from_value(value).map_err(|e| MarksheetError::schema(e.to_string()))?;

    let offenders: Vec<String> = response
        .fields()
        .into_iter()
        .filter(|(_, field)| field.is_null_with_confidence())
        .map(|(path, _)| path)
        .collect();

    if !offenders.is_empty() {
        if policy.reject_null_with_confidence {
            return Err(MarksheetError::policy(format!(
                "null value reported with non-zero confidence at {}",
                offenders.join(", ")
            )));
        }
        warn!(
            fields = %offenders.join(", "),
            "Accepting null values reported with non-zero confidence"
        );
    }

    Ok(response)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    fn lenient() -> ValidationPolicy {
        ValidationPolicy::default()
    }

    fn with_mark_confidence(confidence: f64) -> Value {
        json!({
            "candidate_details": {},
            "marks": [{
                "subject": {"value": "Mathematics", "confidence": 0.9},
                "obtained_marks": {"value": "88", "confidence": confidence}
            }]
        })
    }

    #[test]
    fn test_missing_marks_fails() {
        let value = json!({"candidate_details": {"name": {"value": "A", "confidence": 0.5}}});
        let err = validate(value, &lenient()).unwrap_err();
        assert!(matches!(err, MarksheetError::SchemaValidation { .. }));
        assert!(err.to_string().contains("marks"));
    }

    #[test]
    fn test_missing_candidate_details_fails() {
        let err = validate(json!({"marks": []}), &lenient()).unwrap_err();
        assert!(err.to_string().contains("candidate_details"));
    }

    #[test]
    fn test_confidence_above_one_fails() {
        let err = validate(with_mark_confidence(1.5), &lenient()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValSchemaMismatch);
        assert!(err.to_string().contains("1.5"));
    }

    #[test]
    fn test_confidence_bounds_pass() {
        assert!(validate(with_mark_confidence(0.0), &lenient()).is_ok());
        assert!(validate(with_mark_confidence(1.0), &lenient()).is_ok());
    }

    #[test]
    fn test_mark_missing_required_subject_fails() {
        let value = json!({
            "candidate_details": {},
            "marks": [{"obtained_marks": {"value": "88", "confidence": 0.9}}]
        });
        let err = validate(value, &lenient()).unwrap_err();
        assert!(err.to_string().contains("subject"));
    }

    #[test]
    fn test_marks_must_be_array() {
        let value = json!({"candidate_details": {}, "marks": {"subject": "Maths"}});
        assert!(validate(value, &lenient()).is_err());
    }

    #[test]
    fn test_non_object_root_fails() {
        let err = validate(json!([1, 2, 3]), &lenient()).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let value = json!({"candidate_details": {}, "marks": [], "remarks": "n/a"});
        assert!(validate(value, &lenient()).is_ok());
    }

    #[test]
    fn test_null_with_confidence_lenient_by_default() {
        let value = json!({
            "candidate_details": {"name": {"value": null, "confidence": 0.4}},
            "marks": []
        });
        let response = validate(value, &lenient()).unwrap();
        assert!(response
            .candidate_details
            .name
            .flatten()
            .is_some_and(|name| name.is_null_with_confidence()));
    }

    #[test]
    fn test_null_with_confidence_rejected_when_strict() {
        let value = json!({
            "candidate_details": {"name": {"value": null, "confidence": 0.4}},
            "marks": []
        });
        let policy = ValidationPolicy {
            reject_null_with_confidence: true,
        };
        let err = validate(value, &policy).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValConfidencePolicy);
        assert!(err.to_string().contains("candidate_details.name"));
    }
}
