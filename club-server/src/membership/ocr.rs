//! Document OCR seam
//!
//! OCR is an optional enrichment: after a document upload commits, the manager
//! asks the configured provider to extract fields and compare them against the
//! application. Outcomes are stored as [`OcrRecord`]s and never block the
//! lifecycle. The default provider is [`NoopOcr`], which reports itself
//! unavailable; deployments with a real engine swap it in at startup.

use async_trait::async_trait;
use shared::membership::{ApplicationDocument, DocumentType, MembershipApplication, OcrOutcome};
use thiserror::Error;

/// Provider-side OCR failures
///
/// These end up inside a failed [`OcrRecord`], not as command errors.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR provider is not available")]
    Unavailable,

    #[error("OCR provider failed: {0}")]
    Provider(String),
}

/// An OCR engine that can read uploaded documents
///
/// `extract` runs outside any storage transaction; implementations are free
/// to call remote services.
#[async_trait]
pub trait DocumentOcr: Send + Sync {
    /// Short engine identifier stored with every record
    fn engine_name(&self) -> &'static str;

    /// Whether the engine can be called at all
    fn is_available(&self) -> bool;

    /// Whether the engine understands this document type
    fn supports(&self, document_type: DocumentType) -> bool;

    /// Read the document and compare the extracted fields with the application
    async fn extract(
        &self,
        document: &ApplicationDocument,
        application: &MembershipApplication,
    ) -> Result<OcrOutcome, OcrError>;
}

/// Default provider: no engine configured
///
/// Uploads proceed without enrichment and explicit reprocessing requests are
/// rejected as unavailable.
#[derive(Debug, Clone, Default)]
pub struct NoopOcr;

#[async_trait]
impl DocumentOcr for NoopOcr {
    fn engine_name(&self) -> &'static str {
        "noop"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn supports(&self, _document_type: DocumentType) -> bool {
        false
    }

    async fn extract(
        &self,
        _document: &ApplicationDocument,
        _application: &MembershipApplication,
    ) -> Result<OcrOutcome, OcrError> {
        Err(OcrError::Unavailable)
    }
}
