use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::domain::forecast::ExtractionField;
use crate::domain::provider::FieldExtractor;
use crate::domain::{LlmProvider, LlmRequest};

/// Upper bound on page text sent to the model
const MAX_TEXT_CHARS: usize = 12_000;

static NUMBER: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"-?\d+(?:,\d{3})*(?:\.\d+)?").ok());

/// Extracts numeric fields by prompting a chat model for a JSON object
#[derive(Debug)]
pub struct LlmFieldExtractor {
    llm: Arc<dyn LlmProvider>,
    model: String,
}

impl LlmFieldExtractor {
    pub fn new(llm: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    fn build_request(&self, raw_text: &str, context: &str, fields: &[ExtractionField]) -> LlmRequest {
        let field_lines: Vec<String> = fields
            .iter()
            .map(|f| format!("- \"{}\": {}", f.name, f.description))
            .collect();

        let system = format!(
            "You extract numeric facts from web pages about electricity and weather.\n\
             Reply with one JSON object and nothing else. Use exactly these keys:\n{}\n\
             Every value must be a plain number, or null when the text does not state it.",
            field_lines.join("\n")
        );

        let text: String = raw_text.chars().take(MAX_TEXT_CHARS).collect();

        LlmRequest::builder()
            .system(system)
            .user(format!("Context: {}\n\nText:\n{}", context, text))
            .temperature(0.0)
            .json_output(true)
            .build()
    }
}

#[async_trait]
impl FieldExtractor for LlmFieldExtractor {
    async fn extract(
        &self,
        raw_text: &str,
        context: &str,
        fields: &[ExtractionField],
    ) -> Option<HashMap<String, f64>> {
        let request = self.build_request(raw_text, context, fields);

        let response = match self.llm.chat(&self.model, request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    provider = self.llm.provider_name(),
                    context,
                    error = %e,
                    "Field extraction request failed"
                );
                return None;
            }
        };

        let values = parse_fields(response.content(), fields);
        if values.is_none() {
            warn!(context, "Model reply contained no usable fields");
        } else {
            debug!(context, fields = ?values, "Fields extracted");
        }

        values
    }
}

/// Parse the model reply into the requested fields. Tolerates code fences,
/// surrounding prose, numeric strings and unit suffixes.
pub fn parse_fields(reply: &str, fields: &[ExtractionField]) -> Option<HashMap<String, f64>> {
    let object = json_object(reply)?;

    let values: HashMap<String, f64> = fields
        .iter()
        .filter_map(|field| {
            let value = object.get(field.name).and_then(number)?;
            value.is_finite().then(|| (field.name.to_string(), value))
        })
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

fn json_object(reply: &str) -> Option<serde_json::Map<String, serde_json::Value>> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(&reply[start..=end]) {
        Ok(serde_json::Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => {
            let pattern = NUMBER.as_ref()?;
            let found = pattern.find(s)?;
            found.as_str().replace(',', "").parse().ok()
        }
        _ => None,
    }
}
