//! User intents and the chrome request queue.
//!
//! Intents come from key bindings (see the CLI) or from the chrome: buttons
//! outside the editor that can only *ask* for a start, cancel or untoggle.
//! Chrome requests travel over an unbounded channel and are consumed exactly
//! once by [`crate::Processor::pump`].

use std::str::FromStr;

use strum::EnumString;
use tokio::sync::mpsc;

use crate::error::EngineError;

/// Something the user asked the session to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Intent {
    Start,
    /// Leave the block as is and move on.
    Keep,
    /// Mark the pile and cursor, then move on.
    Highlight,
    /// Fold the pile and cursor into a hidden-container.
    Hide,
    #[strum(serialize = "previous", serialize = "prev", serialize = "back")]
    Previous,
    /// Grow the selection by one block.
    #[strum(serialize = "add_selection", serialize = "addselection", serialize = "add", serialize = "select")]
    AddSelection,
    /// Leave review and undo its hides and highlights.
    Cancel,
    /// Leave review, keeping the document as it is.
    #[strum(serialize = "exit", serialize = "quit")]
    Exit,
    #[strum(serialize = "untoggle_all", serialize = "untoggleall", serialize = "untoggle")]
    UntoggleAll,
    /// Append the Summary after review completes.
    Collect,
    Dismiss,
}

impl Intent {
    /// Parse from string (case-insensitive, with aliases).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s.trim()).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Start => "start",
            Intent::Keep => "keep",
            Intent::Highlight => "highlight",
            Intent::Hide => "hide",
            Intent::Previous => "previous",
            Intent::AddSelection => "add_selection",
            Intent::Cancel => "cancel",
            Intent::Exit => "exit",
            Intent::UntoggleAll => "untoggle_all",
            Intent::Collect => "collect",
            Intent::Dismiss => "dismiss",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the chrome may request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChromeRequest {
    Start,
    Cancel,
    UntoggleAll,
}

impl From<ChromeRequest> for Intent {
    fn from(req: ChromeRequest) -> Self {
        match req {
            ChromeRequest::Start => Intent::Start,
            ChromeRequest::Cancel => Intent::Cancel,
            ChromeRequest::UntoggleAll => Intent::UntoggleAll,
        }
    }
}

/// Cloneable sender side of the request queue.
#[derive(Clone, Debug)]
pub struct RequestHandle {
    tx: mpsc::UnboundedSender<ChromeRequest>,
}

impl RequestHandle {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<ChromeRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, req: ChromeRequest) -> Result<(), EngineError> {
        self.tx.send(req).map_err(|_| EngineError::Shutdown)
    }

    pub fn request_start(&self) -> Result<(), EngineError> {
        self.send(ChromeRequest::Start)
    }

    pub fn request_cancel(&self) -> Result<(), EngineError> {
        self.send(ChromeRequest::Cancel)
    }

    pub fn request_untoggle_all(&self) -> Result<(), EngineError> {
        self.send(ChromeRequest::UntoggleAll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_and_aliases() {
        assert_eq!(Intent::from_str("hide"), Some(Intent::Hide));
        assert_eq!(Intent::from_str("KEEP"), Some(Intent::Keep));
        assert_eq!(Intent::from_str(" add "), Some(Intent::AddSelection));
        assert_eq!(Intent::from_str("untoggle_all"), Some(Intent::UntoggleAll));
        assert_eq!(Intent::from_str("quit"), Some(Intent::Exit));
        assert_eq!(Intent::from_str("explode"), None);
    }

    #[test]
    fn test_as_str_parses_back() {
        let all = [
            Intent::Start,
            Intent::Keep,
            Intent::Highlight,
            Intent::Hide,
            Intent::Previous,
            Intent::AddSelection,
            Intent::Cancel,
            Intent::Exit,
            Intent::UntoggleAll,
            Intent::Collect,
            Intent::Dismiss,
        ];
        for intent in all {
            assert_eq!(Intent::from_str(intent.as_str()), Some(intent));
        }
    }

    #[test]
    fn test_request_after_receiver_dropped() {
        let (handle, rx) = RequestHandle::channel();
        handle.request_start().unwrap();
        drop(rx);
        assert!(matches!(handle.request_cancel(), Err(EngineError::Shutdown)));
    }
}
