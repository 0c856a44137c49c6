//! Notification adapter that writes events to the log
//!
//! Stands in for e-mail or an in-app inbox until one is wired up.

use async_trait::async_trait;
use tracing::info;

use core_kernel::{DomainPort, NotificationEvent, NotificationPort, PortError};

#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

impl DomainPort for LoggingNotifier {}

#[async_trait]
impl NotificationPort for LoggingNotifier {
    async fn notify(&self, event: NotificationEvent) -> Result<(), PortError> {
        let recipients: Vec<String> = event.recipients.iter().map(ToString::to_string).collect();
        info!(
            kind = %event.kind,
            subject = %event.subject_id,
            recipients = ?recipients,
            "{}",
            event.message
        );
        Ok(())
    }
}
