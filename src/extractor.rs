//! Extraction pipeline: page images → vision model → normalized record.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::normalize::normalize;
use crate::schema::ExtractionResult;
use crate::vision::{VisionError, VisionModel};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Request must include a non-empty 'images' array")]
    NoImages,
    #[error(transparent)]
    Vision(#[from] VisionError),
    #[error("invalid JSON from vision model ({source}): {snippet}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
        snippet: String,
    },
}

/// Extraction pipeline orchestrator.
#[derive(Clone)]
pub struct Extractor {
    model: Arc<dyn VisionModel>,
    system_prompt: String,
}

impl Extractor {
    pub fn new(model: Arc<dyn VisionModel>, system_prompt: impl Into<String>) -> Self {
        Self {
            model,
            system_prompt: system_prompt.into(),
        }
    }

    /// Extract one document from its page images (data URLs or remote URLs).
    pub async fn extract(&self, images: &[String]) -> Result<ExtractionResult, ExtractError> {
        if images.is_empty() {
            return Err(ExtractError::NoImages);
        }
        info!(
            "Starting extraction: {} page image(s), model={}",
            images.len(),
            self.model.name()
        );

        let content = self.model.complete(&self.system_prompt, images).await?;
        debug!("Raw model response length: {} chars", content.len());

        let parsed = parse_model_json(&content)?;
        let result = normalize(&parsed, &content);

        info!(
            "Extraction complete: docType={}, case={}, debtor={}",
            result.document.doc_type, result.case_info.case_number, result.parties.debtor.name
        );
        Ok(result)
    }
}

/// Parse the model's reply, tolerating a surrounding markdown code fence.
pub fn parse_model_json(response: &str) -> Result<Value, ExtractError> {
    let json_str = if response.contains("```json") {
        response
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .unwrap_or(response)
            .trim()
    } else if response.contains("```") {
        response.split("```").nth(1).unwrap_or(response).trim()
    } else {
        response.trim()
    };

    serde_json::from_str(json_str).map_err(|source| ExtractError::InvalidJson {
        source,
        snippet: json_str.chars().take(200).collect(),
    })
}
