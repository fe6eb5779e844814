use super::*;
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::membership::{
    ApplicantSnapshot, FeeType, FileReference, OcrOutcome, OwnershipCategory, VehicleSnapshot,
};

use crate::membership::ocr::OcrError;

fn create_test_manager() -> MembershipManager {
    let storage = MembershipStorage::open_in_memory().unwrap();
    MembershipManager::with_storage(storage)
}

fn submit_cmd(user_id: u64) -> MembershipCommand {
    MembershipCommand::new(CommandPayload::SubmitApplication {
        user_id,
        category: OwnershipCategory::Personal,
        applicant: ApplicantSnapshot {
            real_name: "Kim Minjun".to_string(),
            phone_number: "010-1234-5678".to_string(),
            email: "minjun@example.com".to_string(),
        },
        vehicle: VehicleSnapshot {
            plate_number: "12가3456".to_string(),
            vin: format!("WP0ZZZ99ZTS{user_id:06}"),
            model_name: "911 Carrera".to_string(),
        },
    })
}

fn test_file(name: &str) -> FileReference {
    FileReference {
        url: format!("https://files.example.com/{name}"),
        original_name: name.to_string(),
        size: 52_428,
        content_type: "application/pdf".to_string(),
    }
}

async fn upload_document(
    manager: &MembershipManager,
    application_id: u64,
    document_type: DocumentType,
) -> CommandResponse {
    manager
        .execute_command(MembershipCommand::new(CommandPayload::UploadDocument {
            application_id,
            document_type,
            file: test_file("scan.pdf"),
        }))
        .await
}

async fn verify_document(
    manager: &MembershipManager,
    application_id: u64,
    document_type: DocumentType,
) -> CommandResponse {
    manager
        .execute_command(
            MembershipCommand::new(CommandPayload::VerifyDocument {
                application_id,
                document_type,
            })
            .by_operator(7, "Admin Lee"),
        )
        .await
}

// ========================================================================
// Helper: drive one member from application to full membership
// ========================================================================

/// Returns (application_id, confirmed enrollment payment id)
async fn enroll_member(manager: &MembershipManager, user_id: u64) -> (u64, u64) {
    let resp = manager.execute_command(submit_cmd(user_id)).await;
    assert!(resp.success, "submit failed: {:?}", resp.error);
    let application_id = resp.entity_id.unwrap();

    for document_type in [DocumentType::VehicleRegistration, DocumentType::IdCard] {
        let resp = upload_document(manager, application_id, document_type).await;
        assert!(resp.success, "upload failed: {:?}", resp.error);
    }

    let resp = manager
        .execute_command(
            MembershipCommand::new(CommandPayload::StartReview { application_id })
                .by_operator(7, "Admin Lee"),
        )
        .await;
    assert!(resp.success, "start review failed: {:?}", resp.error);

    for document_type in [DocumentType::VehicleRegistration, DocumentType::IdCard] {
        let resp = verify_document(manager, application_id, document_type).await;
        assert!(resp.success, "verify failed: {:?}", resp.error);
    }

    let resp = manager
        .execute_command(
            MembershipCommand::new(CommandPayload::MarkPaymentPending {
                application_id,
                amount: None,
                target_year: None,
            })
            .by_operator(7, "Admin Lee"),
        )
        .await;
    assert!(resp.success, "fee notice failed: {:?}", resp.error);

    let resp = manager
        .execute_command(MembershipCommand::new(CommandPayload::RegisterPayment {
            user_id,
            application_id: Some(application_id),
            fee_type: FeeType::Enrollment,
            target_year: None,
            amount: Decimal::new(200_000, 0),
            depositor_name: "Kim Minjun".to_string(),
            deposit_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        }))
        .await;
    assert!(resp.success, "register payment failed: {:?}", resp.error);
    let payment_id = resp.entity_id.unwrap();

    let resp = manager
        .execute_command(
            MembershipCommand::new(CommandPayload::ConfirmPaymentManual { payment_id })
                .by_operator(7, "Admin Lee"),
        )
        .await;
    assert!(resp.success, "confirm payment failed: {:?}", resp.error);

    let resp = manager
        .execute_command(MembershipCommand::new(CommandPayload::FinalizeEnrollment {
            application_id,
        }))
        .await;
    assert!(resp.success, "finalize failed: {:?}", resp.error);

    (application_id, payment_id)
}

/// Register and confirm an annual fee deposit for the given year
async fn confirm_annual_payment(
    manager: &MembershipManager,
    user_id: u64,
    year: i32,
    deposit_date: NaiveDate,
) -> u64 {
    let resp = manager
        .execute_command(MembershipCommand::new(CommandPayload::RegisterPayment {
            user_id,
            application_id: None,
            fee_type: FeeType::Annual,
            target_year: Some(year),
            amount: Decimal::new(200_000, 0),
            depositor_name: "Kim Minjun".to_string(),
            deposit_date,
        }))
        .await;
    assert!(resp.success, "register annual failed: {:?}", resp.error);
    let payment_id = resp.entity_id.unwrap();

    let resp = manager
        .execute_command(
            MembershipCommand::new(CommandPayload::ConfirmPaymentManual { payment_id })
                .by_operator(7, "Admin Lee"),
        )
        .await;
    assert!(resp.success, "confirm annual failed: {:?}", resp.error);
    payment_id
}

// ========================================================================
// Helper: scripted OCR engine
// ========================================================================

/// Extracts a fixed field set; only reads vehicle registrations
struct ScriptedOcr {
    matched: bool,
    fail: bool,
}

impl ScriptedOcr {
    fn matching() -> Self {
        Self {
            matched: true,
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            matched: false,
            fail: true,
        }
    }
}

#[async_trait]
impl DocumentOcr for ScriptedOcr {
    fn engine_name(&self) -> &'static str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn supports(&self, document_type: DocumentType) -> bool {
        document_type == DocumentType::VehicleRegistration
    }

    async fn extract(
        &self,
        _document: &ApplicationDocument,
        application: &MembershipApplication,
    ) -> Result<OcrOutcome, OcrError> {
        if self.fail {
            return Err(OcrError::Provider("scanner offline".to_string()));
        }
        let mismatched_fields = if self.matched {
            vec![]
        } else {
            vec!["plate_number".to_string()]
        };
        Ok(OcrOutcome {
            fields: serde_json::json!({
                "plate_number": application.vehicle.plate_number,
                "vin": application.vehicle.vin,
            }),
            confidence: Decimal::new(97, 2),
            is_matched: self.matched,
            mismatched_fields,
            engine: "scripted".to_string(),
        })
    }
}

/// Wait for one event of the given type on a subscription
async fn wait_for_event(
    rx: &mut broadcast::Receiver<MembershipEvent>,
    event_type: MembershipEventType,
) -> MembershipEvent {
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        loop {
            let event = rx.recv().await.expect("event channel closed");
            if event.event_type == event_type {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

mod test_core;
