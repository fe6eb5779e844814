use super::*;
use shared::error::ErrorCode;
use shared::membership::ApplicationStatus;

#[tokio::test]
async fn test_submit_application() {
    let manager = create_test_manager();

    let response = manager.execute_command(submit_cmd(100)).await;

    assert!(response.success);
    let application_id = response.entity_id.unwrap();

    let application = manager.get_application(application_id).unwrap().unwrap();
    assert_eq!(application.user_id, 100);
    assert_eq!(application.status, ApplicationStatus::DocumentPending);
    assert!(application.application_number.starts_with("APP-"));

    let active = manager.get_active_application(100).unwrap().unwrap();
    assert_eq!(active.id, application_id);
}

#[tokio::test]
async fn test_idempotency() {
    let manager = create_test_manager();
    let cmd = submit_cmd(100);

    let response1 = manager.execute_command(cmd.clone()).await;
    assert!(response1.success);
    assert!(response1.entity_id.is_some());

    // Execute same command again
    let response2 = manager.execute_command(cmd).await;
    assert!(response2.success);
    assert_eq!(response2.entity_id, None); // Duplicate returns no entity

    // Should still only have one application
    let applications = manager.get_all_applications().unwrap();
    assert_eq!(applications.len(), 1);

    let stats = manager.get_stats().unwrap();
    assert_eq!(stats.event_count, 1);
    assert_eq!(stats.processed_command_count, 1);
}

#[tokio::test]
async fn test_failed_command_leaves_no_trace() {
    let manager = create_test_manager();

    let response = manager
        .execute_command(
            MembershipCommand::new(CommandPayload::ApproveApplication { application_id: 42 })
                .by_operator(7, "Admin Lee"),
        )
        .await;

    assert!(!response.success);
    let error = response.error.unwrap();
    assert_eq!(error.code, ErrorCode::ApplicationNotFound);

    // Nothing committed, not even the idempotency marker
    let stats = manager.get_stats().unwrap();
    assert_eq!(stats.event_count, 0);
    assert_eq!(stats.processed_command_count, 0);
    assert_eq!(manager.get_current_sequence().unwrap(), 0);
}

#[tokio::test]
async fn test_sequence_advances_per_event() {
    let manager = create_test_manager();

    let resp = manager.execute_command(submit_cmd(100)).await;
    let application_id = resp.entity_id.unwrap();
    assert_eq!(manager.get_current_sequence().unwrap(), 1);

    // First upload produces one event
    upload_document(&manager, application_id, DocumentType::VehicleRegistration).await;
    assert_eq!(manager.get_current_sequence().unwrap(), 2);

    // Second upload reaches the submission threshold, still one event
    upload_document(&manager, application_id, DocumentType::IdCard).await;
    assert_eq!(manager.get_current_sequence().unwrap(), 3);

    // Second verification closes the gate and auto-approves: two events
    verify_document(&manager, application_id, DocumentType::VehicleRegistration).await;
    verify_document(&manager, application_id, DocumentType::IdCard).await;
    assert_eq!(manager.get_current_sequence().unwrap(), 6);

    let events = manager.get_events_since(0).unwrap();
    assert_eq!(events.len(), 6);
    let sequences: Vec<u64> = events.iter().map(|e| e.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(
        events.last().unwrap().event_type,
        MembershipEventType::ApplicationApproved
    );
}

#[tokio::test]
async fn test_events_carry_operator() {
    let manager = create_test_manager();
    let resp = manager.execute_command(submit_cmd(100)).await;
    let application_id = resp.entity_id.unwrap();

    upload_document(&manager, application_id, DocumentType::VehicleRegistration).await;
    verify_document(&manager, application_id, DocumentType::VehicleRegistration).await;

    let events = manager.get_events_since(1).unwrap();
    let verified = events
        .iter()
        .find(|e| e.event_type == MembershipEventType::DocumentVerified)
        .unwrap();
    assert_eq!(verified.operator_id, Some(7));
    assert_eq!(verified.operator_name.as_deref(), Some("Admin Lee"));

    // Member-initiated upload has none
    let uploaded = events
        .iter()
        .find(|e| e.event_type == MembershipEventType::DocumentUploaded)
        .unwrap();
    assert_eq!(uploaded.operator_id, None);
}

#[tokio::test]
async fn test_subscribe_receives_committed_events() {
    let manager = create_test_manager();
    let mut rx = manager.subscribe();

    let resp = manager.execute_command(submit_cmd(100)).await;
    let application_id = resp.entity_id.unwrap();

    let event = rx.recv().await.unwrap();
    assert_eq!(event.event_type, MembershipEventType::ApplicationSubmitted);
    assert_eq!(event.payload.entity_id(), Some(application_id));
}

#[tokio::test]
async fn test_failed_command_broadcasts_nothing() {
    let manager = create_test_manager();
    let mut rx = manager.subscribe();

    let response = manager
        .execute_command(MembershipCommand::new(CommandPayload::StartReview {
            application_id: 42,
        }))
        .await;
    assert!(!response.success);

    // A following successful command is the first thing on the channel
    manager.execute_command(submit_cmd(100)).await;
    let event = rx.recv().await.unwrap();
    assert_eq!(event.event_type, MembershipEventType::ApplicationSubmitted);
}

#[tokio::test]
async fn test_storage_survives_manager_clone() {
    let manager = create_test_manager();
    let resp = manager.execute_command(submit_cmd(100)).await;
    let application_id = resp.entity_id.unwrap();

    let cloned = manager.clone();
    let application = cloned.get_application(application_id).unwrap();
    assert!(application.is_some());

    // Subscribers of the original see events committed through the clone
    let mut rx = manager.subscribe();
    cloned.execute_command(submit_cmd(101)).await;
    let event = rx.recv().await.unwrap();
    assert_eq!(event.event_type, MembershipEventType::ApplicationSubmitted);
}

#[tokio::test]
async fn test_response_entity_for_multi_event_command() {
    let manager = create_test_manager();
    let (application_id, _) = enroll_member(&manager, 100).await;

    // Finalize emitted ApplicationCompleted first, so the response named the
    // application
    let events = manager.get_events_since(0).unwrap();
    let completed = events
        .iter()
        .find(|e| e.event_type == MembershipEventType::ApplicationCompleted)
        .unwrap();
    assert_eq!(completed.payload.entity_id(), Some(application_id));
}
