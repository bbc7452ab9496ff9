//! Test doubles for the model and extraction seams.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use marksheet_extractors::{ExtractResult, ExtractedContent, Extractor, Modality};

use crate::error::{ErrorCode, MarksheetError, MarksheetResult};
use crate::traits::{GenerationOptions, Llm, LlmResponse};
use crate::types::Message;

enum Behavior {
    Reply(String),
    Fail(ErrorCode, String),
    Hang,
}

/// Scripted [`Llm`] that records every prompt it receives.
pub struct StubLlm {
    behavior: Behavior,
    json_mode: bool,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl StubLlm {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            json_mode: false,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always reply with `content`.
    pub fn reply(content: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Reply(content.into()))
    }

    /// Always fail with a model invocation error.
    pub fn fail(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Fail(code, message.into()))
    }

    /// Never reply.
    pub fn hang() -> Self {
        Self::with_behavior(Behavior::Hang)
    }

    /// Advertise native JSON mode.
    pub fn with_json_mode(mut self) -> Self {
        self.json_mode = true;
        self
    }

    /// Number of `generate` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt received, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// The most recent prompt.
    pub fn last_prompt(&self) -> Option<String> {
        self.prompts().pop()
    }
}

#[async_trait]
impl Llm for StubLlm {
    async fn generate(
        &self,
        messages: &[Message],
        _options: Option<GenerationOptions>,
    ) -> MarksheetResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.extend(messages.iter().map(|m| m.content.clone()));
        }

        match &self.behavior {
            Behavior::Reply(content) => Ok(LlmResponse::text(content.clone())),
            Behavior::Fail(code, message) => Err(MarksheetError::llm_with_code(message.clone(), *code)),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(LlmResponse::default())
            }
        }
    }

    fn model_name(&self) -> &str {
        "stub"
    }

    fn supports_json_mode(&self) -> bool {
        self.json_mode
    }
}

/// [`Extractor`] that returns fixed text for every accepted media type.
pub struct StubExtractor {
    text: String,
    calls: AtomicUsize,
}

impl StubExtractor {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `extract` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for StubExtractor {
    async fn extract(&self, _content: &[u8]) -> ExtractResult<ExtractedContent> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ExtractedContent::new(self.text.clone(), Modality::Pdf))
    }

    fn supported_types(&self) -> &[&str] {
        &["application/pdf", "image/png", "image/jpeg"]
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Build a one-page PDF whose text layer holds `lines`.
///
/// An empty slice yields a valid PDF with a blank page.
pub fn minimal_pdf(lines: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("TL", vec![14.into()]),
        Operation::new("Td", vec![72.into(), 720.into()]),
    ];
    for line in lines {
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));

    let encoded = Content { operations }
        .encode()
        .expect("encode page content");
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("serialize test pdf");
    buf
}
