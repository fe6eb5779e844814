//! Shared types for the membership lifecycle engine

use serde::{Deserialize, Serialize};

// ============================================================================
// Application Lifecycle
// ============================================================================

/// Application status - the enrollment state machine
///
/// Forward path: DocumentPending → DocumentSubmitted → UnderReview →
/// DocumentApproved → PaymentPending → PaymentConfirmed → Completed.
/// DocumentRejected loops back to DocumentSubmitted on resubmission.
/// Cancelled is reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    /// Application created, documents not yet handed in
    #[default]
    DocumentPending,
    /// Applicant submitted the document set
    DocumentSubmitted,
    /// An administrator is reviewing the documents
    UnderReview,
    /// Document set approved, waiting for fee notice
    DocumentApproved,
    /// Document set rejected, applicant may resubmit
    DocumentRejected,
    /// Enrollment fee notice issued, waiting for deposit
    PaymentPending,
    /// Enrollment fee deposit confirmed
    PaymentConfirmed,
    /// Membership granted (terminal)
    Completed,
    /// Withdrawn by applicant or staff (terminal)
    Cancelled,
}

impl ApplicationStatus {
    /// Terminal states accept no further transitions
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Vehicle ownership category declared on the application
///
/// The category decides which document set the completeness gate demands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnershipCategory {
    /// Vehicle owned by the applicant personally
    Personal,
    /// Vehicle owned by the applicant's company
    Corporate,
    /// Personally leased vehicle
    Lease,
    /// Personally rented vehicle (long-term rental)
    Rental,
    /// Leased through the applicant's company
    CorporateLease,
    /// Rented through the applicant's company
    CorporateRental,
}

// ============================================================================
// Documents
// ============================================================================

/// Document types accepted during enrollment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    /// Vehicle registration certificate
    VehicleRegistration,
    /// Government-issued ID card
    IdCard,
    /// Business license (corporate categories)
    BusinessLicense,
    /// Employment certificate (corporate categories)
    EmploymentCertificate,
    /// Lease contract
    LeaseContract,
    /// Rental contract
    RentalContract,
}

impl DocumentType {
    /// Every known document type, in storage key order
    pub const ALL: [DocumentType; 6] = [
        Self::VehicleRegistration,
        Self::IdCard,
        Self::BusinessLicense,
        Self::EmploymentCertificate,
        Self::LeaseContract,
        Self::RentalContract,
    ];

    /// Stable string form, used as storage key segment
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::VehicleRegistration => "VEHICLE_REGISTRATION",
            Self::IdCard => "ID_CARD",
            Self::BusinessLicense => "BUSINESS_LICENSE",
            Self::EmploymentCertificate => "EMPLOYMENT_CERTIFICATE",
            Self::LeaseContract => "LEASE_CONTRACT",
            Self::RentalContract => "RENTAL_CONTRACT",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-document verification state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    /// Uploaded, not yet checked by staff
    #[default]
    Pending,
    /// Checked and accepted
    Verified,
    /// Checked and refused, must be re-uploaded or re-verified
    Rejected,
}

/// Uploaded file metadata carried by a document record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileReference {
    /// Storage URL of the uploaded file
    pub url: String,
    /// Original file name as uploaded
    pub original_name: String,
    /// File size in bytes
    pub size: u64,
    /// MIME content type
    pub content_type: String,
}

// ============================================================================
// Payments
// ============================================================================

/// Payment record state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Deposit reported, not yet confirmed against the bank
    #[default]
    Pending,
    /// Deposit confirmed (manually or via bank feed)
    Confirmed,
    /// Record cancelled before or after confirmation
    Cancelled,
    /// Confirmed deposit returned to the member
    Refunded,
}

/// Fee type a payment settles
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeType {
    /// One-time enrollment fee tied to an application
    Enrollment,
    /// Annual membership fee tied to a target year
    Annual,
}

impl FeeType {
    /// Stable string form, used as storage key segment
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Enrollment => "ENROLLMENT",
            Self::Annual => "ANNUAL",
        }
    }
}

// ============================================================================
// Membership Periods
// ============================================================================

/// Membership period state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodStatus {
    /// Covering membership for its year
    #[default]
    Active,
    /// Lapsed without renewal
    Expired,
    /// Revoked by staff
    Cancelled,
}

// ============================================================================
// Vehicles
// ============================================================================

/// Registered vehicle state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    /// Owned and registered with the club
    #[default]
    Active,
    /// Sold, past the post-sale grace window
    Sold,
    /// Sold within the last six months, membership privileges retained
    GracePeriod,
}

// ============================================================================
// Applicant / Vehicle Snapshots
// ============================================================================

/// Applicant identity captured at submission time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplicantSnapshot {
    /// Legal name
    pub real_name: String,
    /// Contact phone number
    pub phone_number: String,
    /// Contact email
    pub email: String,
}

/// Vehicle identity captured at submission time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VehicleSnapshot {
    /// License plate number
    pub plate_number: String,
    /// Vehicle identification number, unique per application and per roster
    pub vin: String,
    /// Manufacturer model name
    pub model_name: String,
}
