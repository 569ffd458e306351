//! User-facing notifications raised by the engine.

use tokio::sync::mpsc;

/// A message for the user (toast, status line, stderr...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    /// Start found no eligible block.
    NothingToProcess,
    /// The cursor ran off the end of the document.
    AllDone,
    /// The document service failed; the local document was kept as is.
    ServiceFailed { operation: &'static str, message: String },
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notification::NothingToProcess => write!(f, "Nothing to process"),
            Notification::AllDone => write!(f, "All done!"),
            Notification::ServiceFailed { operation, message } => {
                write!(f, "Could not {operation} document: {message}")
            }
        }
    }
}

/// Receiving side handed to the host.
pub type NotificationReceiver = mpsc::UnboundedReceiver<Notification>;
