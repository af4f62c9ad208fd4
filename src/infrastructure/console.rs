use crate::domain::ports::{Notification, NotificationLevel, Notifier};
use tracing::{error, info};

/// Prints notifications to stderr, keeping stdout for machine-readable output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let tag = match notification.level {
            NotificationLevel::Success => "success",
            NotificationLevel::Info => "info",
            NotificationLevel::Error => "error",
        };
        match notification.level {
            NotificationLevel::Error => {
                error!(title = %notification.title, "{}", notification.message)
            }
            _ => info!(title = %notification.title, "{}", notification.message),
        }
        eprintln!("[{tag}] {}: {}", notification.title, notification.message);
    }
}
