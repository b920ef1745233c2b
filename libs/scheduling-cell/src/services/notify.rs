// libs/scheduling-cell/src/services/notify.rs
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use shared_config::AppConfig;
use shared_models::appointment::AppointmentStatus;
use shared_models::auth::Role;

use crate::models::{
    Appointment, NotificationAck, NotificationChannel, NotificationKind, SchedulingError,
};

/// Fire-and-forget delivery of reminder and cancellation messages.
///
/// Delivery failures are logged and reported in the acknowledgement but
/// never fail the request: the appointment record is the source of truth,
/// notifications are best-effort.
pub struct NotificationTrigger {
    config: Arc<AppConfig>,
    client: reqwest::Client,
}

impl NotificationTrigger {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Validate that the notification kind matches the appointment's
    /// status, then attempt delivery.
    pub async fn notify(
        &self,
        appointment: &Appointment,
        channel: NotificationChannel,
        kind: NotificationKind,
        role: Role,
    ) -> Result<NotificationAck, SchedulingError> {
        if !role.is_staff() {
            return Err(SchedulingError::Forbidden(
                "Only staff may send notifications".to_string(),
            ));
        }

        match kind {
            NotificationKind::Reminder if appointment.status != AppointmentStatus::Confirmed => {
                return Err(SchedulingError::Validation(
                    "Reminders can only be sent for confirmed appointments".to_string(),
                ));
            }
            NotificationKind::Cancellation
                if appointment.status != AppointmentStatus::Cancelled =>
            {
                return Err(SchedulingError::Validation(
                    "Cancellation notices can only be sent for cancelled appointments".to_string(),
                ));
            }
            _ => {}
        }

        let delivered = self.deliver(appointment, channel, kind).await;

        Ok(NotificationAck {
            appointment_id: appointment.id,
            channel,
            kind,
            delivered,
        })
    }

    async fn deliver(
        &self,
        appointment: &Appointment,
        channel: NotificationChannel,
        kind: NotificationKind,
    ) -> bool {
        if !self.config.is_notification_configured() {
            info!(
                "Notification webhook not configured, logging {} {} for appointment {}",
                channel, kind, appointment.id
            );
            return false;
        }

        let payload = json!({
            "appointment_id": appointment.id,
            "patient_id": appointment.patient_id,
            "doctor_id": appointment.doctor_id,
            "scheduled_at": appointment.scheduled_at,
            "channel": channel,
            "kind": kind,
        });

        match self
            .client
            .post(&self.config.notification_webhook_url)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                info!(
                    "Delivered {} {} for appointment {}",
                    channel, kind, appointment.id
                );
                true
            }
            Ok(response) => {
                warn!(
                    "Notification webhook returned {} for appointment {}",
                    response.status(),
                    appointment.id
                );
                false
            }
            Err(e) => {
                warn!(
                    "Notification delivery failed for appointment {}: {}",
                    appointment.id, e
                );
                false
            }
        }
    }
}
