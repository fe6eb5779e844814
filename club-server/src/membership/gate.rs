//! Document completeness gate
//!
//! Approval is count-based: an application needs a minimum number of distinct
//! document types for its ownership category, and every uploaded document must
//! be individually verified. Which types are present does not matter, only how
//! many distinct ones.

use shared::membership::{ApplicationDocument, DocumentType, OwnershipCategory};
use std::collections::HashSet;

/// Minimum number of distinct document types for a category
pub fn required_count(category: OwnershipCategory) -> usize {
    match category {
        OwnershipCategory::Personal => 2,
        OwnershipCategory::Corporate | OwnershipCategory::Lease | OwnershipCategory::Rental => 3,
        OwnershipCategory::CorporateLease | OwnershipCategory::CorporateRental => 4,
    }
}

/// Number of distinct document types among the uploads
fn distinct_types(documents: &[ApplicationDocument]) -> usize {
    documents
        .iter()
        .map(|d| d.document_type)
        .collect::<HashSet<DocumentType>>()
        .len()
}

/// Whether enough distinct types have been uploaded, verified or not
///
/// This is the submission threshold: reaching it moves the application out of
/// the upload phase, before any staff review happened.
pub fn all_required_submitted(category: OwnershipCategory, documents: &[ApplicationDocument]) -> bool {
    distinct_types(documents) >= required_count(category)
}

/// Whether the gate is fully open: enough distinct types AND every uploaded
/// document verified
///
/// A single pending or rejected upload keeps the gate closed no matter how
/// many other documents passed.
pub fn is_satisfied(category: OwnershipCategory, documents: &[ApplicationDocument]) -> bool {
    all_required_submitted(category, documents) && documents.iter().all(|d| d.is_verified())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::membership::FileReference;

    fn doc(id: u64, document_type: DocumentType, verified: bool) -> ApplicationDocument {
        let mut document = ApplicationDocument::new(
            id,
            1,
            document_type,
            FileReference {
                url: format!("s3://docs/{id}.pdf"),
                original_name: format!("{id}.pdf"),
                size: 2048,
                content_type: "application/pdf".to_string(),
            },
        );
        if verified {
            document.verify(7).unwrap();
        }
        document
    }

    #[test]
    fn test_required_count_per_category() {
        assert_eq!(required_count(OwnershipCategory::Personal), 2);
        assert_eq!(required_count(OwnershipCategory::Corporate), 3);
        assert_eq!(required_count(OwnershipCategory::Lease), 3);
        assert_eq!(required_count(OwnershipCategory::Rental), 3);
        assert_eq!(required_count(OwnershipCategory::CorporateLease), 4);
        assert_eq!(required_count(OwnershipCategory::CorporateRental), 4);
    }

    #[test]
    fn test_submission_counts_distinct_types_only() {
        let documents = vec![
            doc(1, DocumentType::VehicleRegistration, false),
            doc(2, DocumentType::IdCard, false),
        ];
        assert!(all_required_submitted(OwnershipCategory::Personal, &documents));
        assert!(!all_required_submitted(OwnershipCategory::Corporate, &documents));
    }

    #[test]
    fn test_gate_needs_every_upload_verified() {
        let documents = vec![
            doc(1, DocumentType::VehicleRegistration, true),
            doc(2, DocumentType::IdCard, false),
        ];
        assert!(all_required_submitted(OwnershipCategory::Personal, &documents));
        assert!(!is_satisfied(OwnershipCategory::Personal, &documents));

        let documents = vec![
            doc(1, DocumentType::VehicleRegistration, true),
            doc(2, DocumentType::IdCard, true),
        ];
        assert!(is_satisfied(OwnershipCategory::Personal, &documents));
    }

    #[test]
    fn test_extra_verified_documents_do_not_open_short_gate() {
        // Three verified documents of which one is a spare type still leave a
        // corporate-lease application one type short
        let documents = vec![
            doc(1, DocumentType::VehicleRegistration, true),
            doc(2, DocumentType::BusinessLicense, true),
            doc(3, DocumentType::LeaseContract, true),
        ];
        assert!(!is_satisfied(OwnershipCategory::CorporateLease, &documents));

        let documents = vec![
            doc(1, DocumentType::VehicleRegistration, true),
            doc(2, DocumentType::BusinessLicense, true),
            doc(3, DocumentType::LeaseContract, true),
            doc(4, DocumentType::EmploymentCertificate, true),
        ];
        assert!(is_satisfied(OwnershipCategory::CorporateLease, &documents));
    }

    #[test]
    fn test_rejected_document_blocks_gate() {
        let mut rejected = doc(2, DocumentType::IdCard, false);
        rejected.reject("blurred scan".to_string(), 7);

        let documents = vec![doc(1, DocumentType::VehicleRegistration, true), rejected];
        // Still counts toward submission, but closes the gate
        assert!(all_required_submitted(OwnershipCategory::Personal, &documents));
        assert!(!is_satisfied(OwnershipCategory::Personal, &documents));
    }

    #[test]
    fn test_empty_upload_set() {
        assert!(!all_required_submitted(OwnershipCategory::Personal, &[]));
        assert!(!is_satisfied(OwnershipCategory::Personal, &[]));
    }
}
