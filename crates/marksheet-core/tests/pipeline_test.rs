//! End-to-end tests of the extraction pipeline with a stubbed model.
//!
//! PDF inputs go through the real pdf extractor; only the model is stubbed.

use std::sync::Arc;
use std::time::Duration;

use marksheet_core::testing::{minimal_pdf, StubExtractor, StubLlm};
use marksheet_core::{
    ErrorCode, ExtractionResponse, Llm, MarksheetError, MarksheetPipeline, MediaType,
    PipelineSettings, ValidationPolicy,
};
use marksheet_extractors::ExtractionPipeline;
use serde_json::{json, Value};
use tokio_test::assert_ok;

const JANE_DOE_REPLY: &str = r#"```json
{
  "candidate_details": {
    "name": {"value": "Jane Doe", "confidence": 0.95},
    "roll_no": {"value": "42", "confidence": 0.9}
  },
  "marks": [
    {
      "subject": {"value": "Mathematics", "confidence": 0.92},
      "max_marks": {"value": "100", "confidence": 0.9},
      "obtained_marks": {"value": "88", "confidence": 0.91}
    }
  ],
  "overall_result": {"value": "PASS", "confidence": 0.85}
}
```"#;

fn pdf_pipeline(llm: Arc<StubLlm>) -> MarksheetPipeline {
    pdf_pipeline_with(llm, PipelineSettings::default())
}

fn pdf_pipeline_with(llm: Arc<StubLlm>, settings: PipelineSettings) -> MarksheetPipeline {
    MarksheetPipeline::new(
        ExtractionPipeline::with_defaults(),
        Some(llm as Arc<dyn Llm>),
        settings,
    )
}

fn stub_pipeline(llm: Arc<StubLlm>, policy: ValidationPolicy) -> MarksheetPipeline {
    MarksheetPipeline::new(
        ExtractionPipeline::new().add_extractor(Arc::new(StubExtractor::new("Name: Jane Doe"))),
        Some(llm as Arc<dyn Llm>),
        PipelineSettings {
            validation: policy,
            ..Default::default()
        },
    )
}

fn reply_with_obtained_confidence(confidence: f64) -> String {
    json!({
        "candidate_details": {"name": {"value": "Jane Doe", "confidence": 0.9}},
        "marks": [{
            "subject": {"value": "Physics", "confidence": 0.9},
            "obtained_marks": {"value": "71", "confidence": confidence}
        }]
    })
    .to_string()
}

#[tokio::test]
async fn test_pdf_end_to_end() {
    let llm = Arc::new(StubLlm::reply(JANE_DOE_REPLY));
    let pipeline = pdf_pipeline(llm.clone());
    let pdf = minimal_pdf(&["Name: Jane Doe", "Roll No: 42"]);

    let result = pipeline.process_document(&pdf, MediaType::Pdf).await.unwrap();

    let name = result.candidate_details.name.as_ref().and_then(Option::as_ref).unwrap();
    assert_eq!(name.value.as_deref(), Some("Jane Doe"));
    assert_eq!(name.confidence, 0.95);
    assert_eq!(result.marks.len(), 1);
    assert_eq!(result.marks[0].obtained_marks.value.as_deref(), Some("88"));
    assert!(result.candidate_details.fathers_name.is_none());

    assert_eq!(llm.call_count(), 1);
    let prompt = llm.last_prompt().unwrap();
    assert!(prompt.contains("Jane Doe"));
    assert!(prompt.contains("Roll No: 42"));
    assert!(prompt.contains("**Required JSON Output Schema:**"));
}

#[tokio::test]
async fn test_blank_pdf_is_empty_document_without_model_call() {
    let llm = Arc::new(StubLlm::reply(JANE_DOE_REPLY));
    let pipeline = pdf_pipeline(llm.clone());

    let err = pipeline
        .process_document(&minimal_pdf(&[]), MediaType::Pdf)
        .await
        .unwrap_err();

    assert!(matches!(err, MarksheetError::EmptyDocument));
    assert!(err.is_client_error());
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_corrupt_pdf_is_extraction_failure_without_model_call() {
    let llm = Arc::new(StubLlm::reply(JANE_DOE_REPLY));
    let pipeline = pdf_pipeline(llm.clone());
    let pdf = minimal_pdf(&["Name: Jane Doe"]);

    let err = pipeline
        .process_document(&pdf[..pdf.len() / 3], MediaType::Pdf)
        .await
        .unwrap_err();

    assert!(
        matches!(err, MarksheetError::ExtractionFailure { .. }),
        "got {err:?}"
    );
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_non_pdf_bytes_declared_as_pdf_fail_extraction() {
    let llm = Arc::new(StubLlm::reply(JANE_DOE_REPLY));
    let pipeline = pdf_pipeline(llm.clone());

    let err = pipeline
        .process_document(b"this is not a pdf", MediaType::Pdf)
        .await
        .unwrap_err();

    assert!(matches!(err, MarksheetError::ExtractionFailure { .. }));
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_missing_model_is_unavailable() {
    let pipeline = MarksheetPipeline::new(
        ExtractionPipeline::new().add_extractor(Arc::new(StubExtractor::new("Name: Jane Doe"))),
        None,
        PipelineSettings::default(),
    );

    let err = pipeline
        .process_document(b"%PDF-", MediaType::Pdf)
        .await
        .unwrap_err();
    assert!(matches!(err, MarksheetError::ModelUnavailable(_)));
    assert_eq!(err.code(), ErrorCode::LlmUnavailable);
}

#[tokio::test]
async fn test_model_failure_is_invocation_error() {
    let llm = Arc::new(StubLlm::fail(ErrorCode::LlmAuthFailed, "API key not valid"));
    let pipeline = stub_pipeline(llm, ValidationPolicy::default());

    let err = pipeline
        .process_document(b"%PDF-", MediaType::Pdf)
        .await
        .unwrap_err();
    assert!(matches!(err, MarksheetError::ModelInvocation { .. }));
    assert_eq!(err.code(), ErrorCode::LlmAuthFailed);
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn test_model_timeout() {
    let llm = Arc::new(StubLlm::hang());
    let pipeline = MarksheetPipeline::new(
        ExtractionPipeline::new().add_extractor(Arc::new(StubExtractor::new("Name: Jane Doe"))),
        Some(llm.clone() as Arc<dyn Llm>),
        PipelineSettings {
            model_timeout: Duration::from_millis(50),
            ..Default::default()
        },
    );

    let err = pipeline
        .process_document(b"%PDF-", MediaType::Pdf)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::LlmTimeout);
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn test_prose_wrapped_reply_is_recovered() {
    let reply = format!(
        "Sure! Here is the extracted data:\n{}\nLet me know if you need anything else.",
        reply_with_obtained_confidence(0.8)
    );
    let pipeline = stub_pipeline(Arc::new(StubLlm::reply(reply)), ValidationPolicy::default());

    let result = pipeline
        .process_document(b"%PDF-", MediaType::Pdf)
        .await
        .unwrap();
    assert_eq!(result.marks[0].subject.value.as_deref(), Some("Physics"));
}

#[tokio::test]
async fn test_unparseable_reply_is_malformed_output() {
    for reply in ["I could not read this marksheet.", "", "```json\n{\"marks\": [\n```"] {
        let pipeline = stub_pipeline(Arc::new(StubLlm::reply(reply)), ValidationPolicy::default());
        let err = pipeline
            .process_document(b"%PDF-", MediaType::Pdf)
            .await
            .unwrap_err();
        assert!(
            matches!(err, MarksheetError::MalformedModelOutput { .. }),
            "reply {reply:?} gave {err:?}"
        );
    }
}

#[tokio::test]
async fn test_missing_marks_fails_validation() {
    let reply = json!({
        "candidate_details": {"name": {"value": "Jane Doe", "confidence": 0.9}}
    })
    .to_string();
    let pipeline = stub_pipeline(Arc::new(StubLlm::reply(reply)), ValidationPolicy::default());

    let err = pipeline
        .process_document(b"%PDF-", MediaType::Pdf)
        .await
        .unwrap_err();
    assert!(matches!(err, MarksheetError::SchemaValidation { .. }));
    assert!(err.to_string().contains("marks"), "{err}");
}

#[tokio::test]
async fn test_confidence_bounds() {
    for (confidence, ok) in [(0.0, true), (1.0, true), (1.5, false), (-0.1, false)] {
        let pipeline = stub_pipeline(
            Arc::new(StubLlm::reply(reply_with_obtained_confidence(confidence))),
            ValidationPolicy::default(),
        );
        let result = pipeline.process_document(b"%PDF-", MediaType::Pdf).await;
        match result {
            Ok(response) => {
                assert!(ok, "confidence {confidence} was accepted");
                assert_eq!(response.marks[0].obtained_marks.confidence, confidence);
            }
            Err(err) => {
                assert!(!ok, "confidence {confidence} was rejected: {err}");
                assert!(matches!(err, MarksheetError::SchemaValidation { .. }));
            }
        }
    }
}

#[tokio::test]
async fn test_null_with_confidence_policy() {
    let reply = json!({
        "candidate_details": {"roll_no": {"value": null, "confidence": 0.4}},
        "marks": []
    })
    .to_string();

    let lenient = stub_pipeline(Arc::new(StubLlm::reply(reply.clone())), ValidationPolicy::default());
    let result = lenient.process_document(b"%PDF-", MediaType::Pdf).await.unwrap();
    assert!(result.candidate_details.roll_no.flatten().unwrap().value.is_none());

    let strict = stub_pipeline(
        Arc::new(StubLlm::reply(reply)),
        ValidationPolicy {
            reject_null_with_confidence: true,
        },
    );
    let err = strict
        .process_document(b"%PDF-", MediaType::Pdf)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValConfidencePolicy);
    assert!(err.to_string().contains("candidate_details.roll_no"));
}

#[tokio::test]
async fn test_result_round_trips() {
    let reply = JANE_DOE_REPLY
        .trim_start_matches("```json")
        .trim_end_matches("```")
        .to_string();
    let pipeline = stub_pipeline(Arc::new(StubLlm::reply(reply.clone())), ValidationPolicy::default());

    let result = pipeline
        .process_document(b"%PDF-", MediaType::Pdf)
        .await
        .unwrap();

    let serialized = serde_json::to_value(&result).unwrap();
    let original: Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(serialized, original);

    let reparsed: ExtractionResponse = serde_json::from_value(serialized).unwrap();
    assert_eq!(reparsed, result);
}

#[tokio::test]
async fn test_explicit_nulls_survive_round_trip() {
    let reply = json!({
        "candidate_details": {
            "name": {"value": "Jane Doe", "confidence": 0.9},
            "fathers_name": null
        },
        "marks": [],
        "overall_result": null
    });
    let pipeline = stub_pipeline(
        Arc::new(StubLlm::reply(reply.to_string())),
        ValidationPolicy::default(),
    );

    let result = pipeline
        .process_document(b"%PDF-", MediaType::Pdf)
        .await
        .unwrap();
    assert_eq!(result.candidate_details.fathers_name, Some(None));
    assert_eq!(result.issue_date, None);

    assert_eq!(serde_json::to_value(&result).unwrap(), reply);
}

#[tokio::test]
async fn test_array_wrapped_reply_fails_validation() {
    let reply = format!("[{}]", reply_with_obtained_confidence(0.8));
    let llm = Arc::new(StubLlm::reply(reply));
    let pipeline = stub_pipeline(llm.clone(), ValidationPolicy::default());

    let err = pipeline
        .process_document(b"%PDF-", MediaType::Pdf)
        .await
        .unwrap_err();
    assert!(matches!(err, MarksheetError::SchemaValidation { .. }), "{err:?}");
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn test_brace_in_preamble_is_skipped() {
    let reply = format!(
        "Fields use {{value, confidence}} pairs:\n{}",
        reply_with_obtained_confidence(0.8)
    );
    let pipeline = stub_pipeline(Arc::new(StubLlm::reply(reply)), ValidationPolicy::default());

    let result = pipeline
        .process_document(b"%PDF-", MediaType::Pdf)
        .await
        .unwrap();
    assert_eq!(result.marks[0].obtained_marks.value.as_deref(), Some("71"));
}

#[tokio::test]
async fn test_concurrent_requests_share_one_pipeline() {
    let llm = Arc::new(StubLlm::reply(reply_with_obtained_confidence(0.7)));
    let pipeline = Arc::new(stub_pipeline(llm.clone(), ValidationPolicy::default()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.process_document(b"%PDF-", MediaType::Pdf).await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
    assert_eq!(llm.call_count(), 8);
}

#[tokio::test]
async fn test_process_upload_parses_content_type() {
    let pipeline = stub_pipeline(
        Arc::new(StubLlm::reply(reply_with_obtained_confidence(0.5))),
        ValidationPolicy::default(),
    );

    assert_ok!(
        pipeline
            .process_upload(b"\x89PNG", "image/png; charset=binary")
            .await
    );

    let err = pipeline
        .process_upload(b"GIF89a", "image/gif")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MediaUnsupported);
}

#[tokio::test]
async fn test_pdf_with_empty_marks_table() {
    let reply = r#"{"candidate_details":{"name":{"value":"Jane Doe","confidence":0.9},"roll_no":{"value":"42","confidence":0.95}},"marks":[]}"#;
    let llm = Arc::new(StubLlm::reply(reply).with_json_mode());
    let pipeline = pdf_pipeline(llm.clone());

    let result = pipeline
        .process_document(&minimal_pdf(&["Name: Jane Doe", "Roll No: 42"]), MediaType::Pdf)
        .await
        .unwrap();

    assert_eq!(
        result.candidate_details.name.flatten().unwrap().value.as_deref(),
        Some("Jane Doe")
    );
    assert!(result.marks.is_empty());
    assert_eq!(llm.call_count(), 1);
}
