//! Membership application aggregate and its document records
//!
//! The application owns the enrollment state machine. Every mutation goes
//! through a method that checks the current status first; out-of-order calls
//! fail with [`DomainError::InvalidTransition`] naming the state and the
//! attempted action.

use super::error::{DomainError, DomainResult};
use super::types::{
    ApplicantSnapshot, ApplicationStatus, DocumentType, FileReference, OwnershipCategory,
    VehicleSnapshot, VerificationStatus,
};
use crate::util::now_millis;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Membership application - the enrollment aggregate root
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MembershipApplication {
    /// Surrogate id from the storage counter
    pub id: u64,
    /// Applicant user id
    pub user_id: u64,
    /// Human-facing number, APP-YYYYMMDD-NNNNN, allocated per day
    pub application_number: String,
    /// Declared vehicle ownership category
    pub category: OwnershipCategory,
    /// Applicant identity at submission time
    pub applicant: ApplicantSnapshot,
    /// Vehicle identity at submission time
    pub vehicle: VehicleSnapshot,
    /// Current state-machine position
    pub status: ApplicationStatus,
    /// Admin who last reviewed the documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<u64>,
    /// When the last review decision was made (Unix millis)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<i64>,
    /// Reason for the last rejection or cancellation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    /// Expected enrollment fee, set when the fee notice is issued
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_amount: Option<Decimal>,
    /// Membership year the enrollment fee buys
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_target_year: Option<i32>,
    /// When membership was granted (Unix millis)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    /// Assigned member number, permanent once allocated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_number: Option<u32>,
    /// Creation timestamp (Unix millis)
    pub created_at: i64,
    /// Last mutation timestamp (Unix millis)
    pub updated_at: i64,
}

impl MembershipApplication {
    /// Create a fresh application in DocumentPending
    pub fn new(
        id: u64,
        user_id: u64,
        application_number: String,
        category: OwnershipCategory,
        applicant: ApplicantSnapshot,
        vehicle: VehicleSnapshot,
    ) -> Self {
        let now = now_millis();
        Self {
            id,
            user_id,
            application_number,
            category,
            applicant,
            vehicle,
            status: ApplicationStatus::DocumentPending,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            payment_amount: None,
            payment_target_year: None,
            completed_at: None,
            member_number: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Rejection is allowed in every status except Completed.
    ///
    /// Even a PaymentConfirmed application can still be turned down; only a
    /// granted membership is beyond the reviewers' reach.
    pub fn rejectable(&self) -> bool {
        self.status != ApplicationStatus::Completed
    }

    /// Document set reached the required count: DocumentPending or
    /// DocumentRejected → DocumentSubmitted. Resubmission clears the old
    /// rejection reason.
    pub fn submit_documents(&mut self) -> DomainResult<()> {
        match self.status {
            ApplicationStatus::DocumentPending | ApplicationStatus::DocumentRejected => {
                self.status = ApplicationStatus::DocumentSubmitted;
                self.rejection_reason = None;
                self.updated_at = now_millis();
                Ok(())
            }
            status => Err(DomainError::InvalidTransition {
                status,
                action: "submit documents for",
            }),
        }
    }

    /// An admin picked up the document set: DocumentSubmitted → UnderReview
    pub fn start_review(&mut self, admin_id: u64) -> DomainResult<()> {
        match self.status {
            ApplicationStatus::DocumentSubmitted => {
                self.status = ApplicationStatus::UnderReview;
                self.reviewed_by = Some(admin_id);
                self.reviewed_at = Some(now_millis());
                self.updated_at = now_millis();
                Ok(())
            }
            status => Err(DomainError::InvalidTransition {
                status,
                action: "start review of",
            }),
        }
    }

    /// Document set accepted: any pre-approval document state → DocumentApproved
    pub fn approve_documents(&mut self, admin_id: u64) -> DomainResult<()> {
        match self.status {
            ApplicationStatus::DocumentPending
            | ApplicationStatus::DocumentSubmitted
            | ApplicationStatus::UnderReview => {
                self.status = ApplicationStatus::DocumentApproved;
                self.reviewed_by = Some(admin_id);
                self.reviewed_at = Some(now_millis());
                self.rejection_reason = None;
                self.updated_at = now_millis();
                Ok(())
            }
            status => Err(DomainError::InvalidTransition {
                status,
                action: "approve",
            }),
        }
    }

    /// Document set refused with a reason. Valid from every status except
    /// Completed, see [`rejectable`](Self::rejectable).
    pub fn reject_documents(&mut self, reason: String, admin_id: u64) -> DomainResult<()> {
        if !self.rejectable() {
            return Err(DomainError::ApplicationAlreadyCompleted);
        }
        self.status = ApplicationStatus::DocumentRejected;
        self.rejection_reason = Some(reason);
        self.reviewed_by = Some(admin_id);
        self.reviewed_at = Some(now_millis());
        self.updated_at = now_millis();
        Ok(())
    }

    /// Fee notice issued: DocumentApproved → PaymentPending
    pub fn mark_payment_pending(&mut self, amount: Decimal, target_year: i32) -> DomainResult<()> {
        match self.status {
            ApplicationStatus::DocumentApproved => {
                self.status = ApplicationStatus::PaymentPending;
                self.payment_amount = Some(amount);
                self.payment_target_year = Some(target_year);
                self.updated_at = now_millis();
                Ok(())
            }
            status => Err(DomainError::InvalidTransition {
                status,
                action: "issue fee notice for",
            }),
        }
    }

    /// Enrollment deposit confirmed: PaymentPending → PaymentConfirmed
    pub fn confirm_payment(&mut self) -> DomainResult<()> {
        match self.status {
            ApplicationStatus::PaymentPending => {
                self.status = ApplicationStatus::PaymentConfirmed;
                self.updated_at = now_millis();
                Ok(())
            }
            status => Err(DomainError::InvalidTransition {
                status,
                action: "confirm payment of",
            }),
        }
    }

    /// Membership granted: PaymentConfirmed → Completed
    pub fn complete(&mut self, member_number: u32) -> DomainResult<()> {
        match self.status {
            ApplicationStatus::PaymentConfirmed => {
                self.status = ApplicationStatus::Completed;
                self.member_number = Some(member_number);
                self.completed_at = Some(now_millis());
                self.updated_at = now_millis();
                Ok(())
            }
            status => Err(DomainError::InvalidTransition {
                status,
                action: "complete",
            }),
        }
    }

    /// Withdraw the application: any non-terminal state → Cancelled
    pub fn cancel(&mut self, reason: Option<String>) -> DomainResult<()> {
        if self.is_terminal() {
            return Err(DomainError::TerminalApplication {
                status: self.status,
            });
        }
        self.status = ApplicationStatus::Cancelled;
        if reason.is_some() {
            self.rejection_reason = reason;
        }
        self.updated_at = now_millis();
        Ok(())
    }
}

/// One uploaded document attached to an application
///
/// Storage keys documents by (application_id, document_type), which is what
/// enforces the at-most-one-per-type invariant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplicationDocument {
    /// Surrogate id from the storage counter
    pub id: u64,
    /// Owning application
    pub application_id: u64,
    /// Document kind
    pub document_type: DocumentType,
    /// Uploaded file metadata
    pub file: FileReference,
    /// Staff verification state
    pub verification: VerificationStatus,
    /// Admin who verified or rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<u64>,
    /// When the verification decision was made (Unix millis)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<i64>,
    /// Reason the document was refused
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    /// OCR record produced for this file, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_record_id: Option<u64>,
    /// Upload timestamp (Unix millis)
    pub uploaded_at: i64,
}

impl ApplicationDocument {
    /// Create a freshly uploaded, unverified document
    pub fn new(id: u64, application_id: u64, document_type: DocumentType, file: FileReference) -> Self {
        Self {
            id,
            application_id,
            document_type,
            file,
            verification: VerificationStatus::Pending,
            verified_by: None,
            verified_at: None,
            rejection_reason: None,
            ocr_record_id: None,
            uploaded_at: now_millis(),
        }
    }

    pub fn is_verified(&self) -> bool {
        self.verification == VerificationStatus::Verified
    }

    pub fn is_rejected(&self) -> bool {
        self.verification == VerificationStatus::Rejected
    }

    /// Mark the document verified. A rejected document may be verified on a
    /// second look; a verified one may not be verified twice.
    pub fn verify(&mut self, admin_id: u64) -> DomainResult<()> {
        if self.is_verified() {
            return Err(DomainError::DocumentAlreadyVerified(self.id));
        }
        self.verification = VerificationStatus::Verified;
        self.verified_by = Some(admin_id);
        self.verified_at = Some(now_millis());
        self.rejection_reason = None;
        Ok(())
    }

    /// Refuse the document with a reason
    pub fn reject(&mut self, reason: String, admin_id: u64) {
        self.verification = VerificationStatus::Rejected;
        self.verified_by = Some(admin_id);
        self.verified_at = Some(now_millis());
        self.rejection_reason = Some(reason);
    }

    /// Replace the file after a rejection. Verification resets to pending and
    /// any stale OCR linkage is dropped.
    pub fn replace_file(&mut self, file: FileReference) {
        self.file = file;
        self.verification = VerificationStatus::Pending;
        self.verified_by = None;
        self.verified_at = None;
        self.rejection_reason = None;
        self.ocr_record_id = None;
        self.uploaded_at = now_millis();
    }

    /// Link the OCR record produced for this file
    pub fn attach_ocr(&mut self, ocr_record_id: u64) {
        self.ocr_record_id = Some(ocr_record_id);
    }
}
