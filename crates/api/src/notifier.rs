//! Tracing-backed notification gateway.
//!
//! Delivery transport (push, email, SMS) is an external concern; this
//! implementation records each attempted delivery in the structured
//! log. Swapping in a real transport means implementing
//! [`NotificationGateway`] and handing it to [`crate::state::AppState`].

use async_trait::async_trait;

use lifelink_core::dispatch::{
    DeliveryOutcome, NotificationGateway, NotificationPayload, Recipient,
};

/// Gateway that logs every delivery attempt and reports success.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationGateway for LogNotifier {
    async fn notify(
        &self,
        recipients: &[Recipient],
        payload: &NotificationPayload,
    ) -> Vec<DeliveryOutcome> {
        recipients
            .iter()
            .map(|recipient| {
                tracing::info!(
                    request_id = payload.request_id,
                    recipient_kind = recipient.actor.kind.as_str(),
                    recipient_id = recipient.actor.id,
                    address = %recipient.address,
                    "Delivering blood request notification"
                );
                DeliveryOutcome {
                    recipient: recipient.clone(),
                    result: Ok(()),
                }
            })
            .collect()
    }
}
