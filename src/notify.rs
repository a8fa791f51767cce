//! Fire-and-forget user-facing notifications.

use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Uploaded { count: usize },
    Downloaded { name: String },
    Deleted,
    Renamed,
    Cleared,
}

impl Notification {
    pub fn title(&self) -> &'static str {
        match self {
            Notification::Uploaded { .. } => "Upload Successful",
            Notification::Downloaded { .. } => "Download Started",
            Notification::Deleted => "Deleted",
            Notification::Renamed => "Renamed",
            Notification::Cleared => "Cleared",
        }
    }

    pub fn description(&self) -> String {
        match self {
            Notification::Uploaded { count } => {
                format!("{} certification(s) uploaded successfully.", count)
            }
            Notification::Downloaded { name } => format!("Downloading {}...", name),
            Notification::Deleted => "Certification removed successfully.".to_string(),
            Notification::Renamed => "Certification renamed successfully.".to_string(),
            Notification::Cleared => "All certifications removed.".to_string(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Emits notifications as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        tracing::info!(
            title = notification.title(),
            "{}",
            notification.description()
        );
    }
}

/// Forwards notifications into an unbounded channel; a closed receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        let _ = self.tx.send(notification);
    }
}
