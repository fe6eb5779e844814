//! OCR result types
//!
//! What an OCR provider returns for a document, and the stored record of that
//! run. The provider trait itself lives in the server; these are the shared
//! data shapes.

use crate::util::now_millis;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Successful provider output for one document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OcrOutcome {
    /// Extracted fields as free-form JSON
    pub fields: serde_json::Value,
    /// Provider confidence, 0 to 1
    pub confidence: Decimal,
    /// Whether the extracted fields match the application data
    pub is_matched: bool,
    /// Field names that disagreed with the application
    pub mismatched_fields: Vec<String>,
    /// Provider engine name
    pub engine: String,
}

/// Stored outcome of one OCR run against one document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OcrRecord {
    /// Surrogate id from the storage counter
    pub id: u64,
    /// Document the run processed
    pub document_id: u64,
    /// Whether the provider produced a usable result
    pub success: bool,
    /// Provider confidence, 0 to 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Decimal>,
    /// Extracted fields as free-form JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_fields: Option<serde_json::Value>,
    /// Match verdict against the application data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_matched: Option<bool>,
    /// Field names that disagreed with the application
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mismatched_fields: Vec<String>,
    /// Human-readable summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Provider engine name
    pub engine: String,
    /// Provider error when the run failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// When the run finished (Unix millis)
    pub processed_at: i64,
}

impl OcrRecord {
    /// Record a successful run
    pub fn from_outcome(id: u64, document_id: u64, outcome: OcrOutcome) -> Self {
        let message = if outcome.is_matched {
            "extracted fields match the application".to_string()
        } else {
            format!("mismatched fields: {}", outcome.mismatched_fields.join(", "))
        };
        Self {
            id,
            document_id,
            success: true,
            confidence: Some(outcome.confidence),
            extracted_fields: Some(outcome.fields),
            is_matched: Some(outcome.is_matched),
            mismatched_fields: outcome.mismatched_fields,
            message: Some(message),
            engine: outcome.engine,
            error_message: None,
            processed_at: now_millis(),
        }
    }

    /// Record a failed run
    pub fn from_failure(id: u64, document_id: u64, engine: String, error: String) -> Self {
        Self {
            id,
            document_id,
            success: false,
            confidence: None,
            extracted_fields: None,
            is_matched: None,
            mismatched_fields: Vec::new(),
            message: None,
            engine,
            error_message: Some(error),
            processed_at: now_millis(),
        }
    }
}
