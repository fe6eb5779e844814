//! Lifecycle orchestrator
//!
//! Subscribes to the manager's event broadcast and issues the follow-up
//! commands that connect the payment ledger to the membership lifecycle:
//!
//! - confirmed enrollment fee -> FinalizeEnrollment
//! - confirmed annual fee -> RenewMembership
//!
//! Follow-up command ids derive from the triggering event id, so a
//! redelivered event lands on the manager's idempotency guard instead of
//! acting twice. Failures are logged and never retried; the state they
//! report is inspectable through the manager's queries.

use super::manager::MembershipManager;
use shared::membership::{CommandPayload, EventPayload, FeeType, MembershipCommand, MembershipEvent};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Drives lifecycle follow-ups off the event stream
pub struct LifecycleOrchestrator {
    manager: MembershipManager,
    shutdown: CancellationToken,
}

impl LifecycleOrchestrator {
    pub fn new(manager: MembershipManager, shutdown: CancellationToken) -> Self {
        Self { manager, shutdown }
    }

    /// Run the orchestrator loop
    ///
    /// Subscribes before entering the loop; events committed earlier are
    /// not replayed. A lagged subscription only skips follow-ups whose
    /// triggering events were overwritten in the channel.
    pub async fn run(self) {
        tracing::info!("Lifecycle orchestrator started");
        let mut rx = self.manager.subscribe();

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Lifecycle orchestrator shutting down");
                    break;
                }

                result = rx.recv() => {
                    match result {
                        Ok(event) => self.handle_event(event).await,
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!("Lifecycle orchestrator lagged {n} events");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::info!("Event channel closed, lifecycle orchestrator stopping");
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("Lifecycle orchestrator stopped");
    }

    /// Issue the follow-up command for one event, if it warrants one
    async fn handle_event(&self, event: MembershipEvent) {
        let EventPayload::PaymentConfirmed {
            payment_id,
            user_id,
            fee_type,
            application_id,
            ..
        } = event.payload
        else {
            return;
        };

        let payload = match fee_type {
            FeeType::Enrollment => {
                let Some(application_id) = application_id else {
                    tracing::warn!(
                        payment_id,
                        "Confirmed enrollment payment without an application, skipping"
                    );
                    return;
                };
                CommandPayload::FinalizeEnrollment { application_id }
            }
            FeeType::Annual => CommandPayload::RenewMembership {
                user_id,
                payment_id,
            },
        };

        // Deterministic id: one follow-up per triggering event
        let command = MembershipCommand::with_id(format!("orch-{}", event.event_id), payload);
        let command_id = command.command_id.clone();
        tracing::debug!(command_id = %command_id, payment_id, "Issuing lifecycle follow-up");

        let response = self.manager.execute_command(command).await;
        if !response.success {
            // The aggregate state tells an admin what to do; retrying a
            // domain rejection would only fail again
            tracing::warn!(
                command_id = %command_id,
                error = ?response.error,
                "Lifecycle follow-up rejected"
            );
        }
    }
}
