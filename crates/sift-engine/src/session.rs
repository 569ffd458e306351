//! The review session state machine.
//!
//! ```text
//!            Start                 cursor runs off the end
//!   Idle ───────────▶ Active ─────────────────────────▶ ReviewComplete
//!    ▲                  │ Keep/Highlight/Hide/Previous/      │
//!    │                  │ AddSelection stay Active           │
//!    └──── Cancel/Exit ─┴──── Cancel/Exit/Collect/Dismiss ───┘
//! ```
//!
//! `UntoggleAll` works in every phase and leaves the phase alone. An intent
//! that does not apply in the current phase is reported as not applied and
//! changes nothing.

use sift_tree::BlockTreeAdapter;
use sift_types::{BlockId, DocumentId};
use tracing::debug;

use crate::hide::{HideOutcome, hide, untoggle_all};
use crate::highlight::{clear_highlights, highlight};
use crate::intent::Intent;
use crate::notify::Notification;
use crate::options::EngineOptions;
use crate::partition::{CollectOutcome, collect};
use crate::traversal::{first_eligible, next_eligible_after, previous_eligible_before};
use crate::Result;

/// Where the session is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Active {
        /// Block under review.
        cursor: BlockId,
        /// Blocks already selected, in document order.
        pile: Vec<BlockId>,
    },
    /// The cursor ran off the end; waiting for Collect or Dismiss.
    ReviewComplete,
}

/// [`SessionState`] without its data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active,
    ReviewComplete,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Active => "active",
            Phase::ReviewComplete => "review_complete",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl SessionState {
    pub fn phase(&self) -> Phase {
        match self {
            SessionState::Idle => Phase::Idle,
            SessionState::Active { .. } => Phase::Active,
            SessionState::ReviewComplete => Phase::ReviewComplete,
        }
    }

    pub fn cursor(&self) -> Option<&BlockId> {
        match self {
            SessionState::Active { cursor, .. } => Some(cursor),
            _ => None,
        }
    }

    pub fn pile(&self) -> &[BlockId] {
        match self {
            SessionState::Active { pile, .. } => pile,
            _ => &[],
        }
    }
}

/// What one intent did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub intent: Intent,
    pub from: Phase,
    pub to: Phase,
    /// False when the intent does not apply in `from` and was ignored.
    pub applied: bool,
    /// The document was mutated.
    pub changed: bool,
    pub notification: Option<Notification>,
    /// Set by a successful Collect.
    pub collected: Option<CollectOutcome>,
}

impl Transition {
    fn new(intent: Intent, from: Phase) -> Self {
        Self {
            intent,
            from,
            to: from,
            applied: true,
            changed: false,
            notification: None,
            collected: None,
        }
    }
}

/// A review session over one document.
#[derive(Clone, Debug)]
pub struct Session {
    document: DocumentId,
    state: SessionState,
    options: EngineOptions,
}

impl Session {
    pub fn new(document: DocumentId, options: EngineOptions) -> Self {
        Self {
            document,
            state: SessionState::Idle,
            options,
        }
    }

    pub fn document(&self) -> DocumentId {
        self.document
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Drop back to Idle without touching the document.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
    }

    /// Point the session at another document, resetting it.
    pub fn rebind(&mut self, document: DocumentId) {
        self.document = document;
        self.reset();
    }

    /// Move to `next`, or to ReviewComplete when there is none.
    fn land(&mut self, next: Option<BlockId>, t: &mut Transition) {
        match next {
            Some(cursor) => {
                self.state = SessionState::Active {
                    cursor,
                    pile: Vec::new(),
                }
            }
            None => {
                self.state = SessionState::ReviewComplete;
                t.notification = Some(Notification::AllDone);
            }
        }
    }

    /// Apply one intent against `tree`.
    ///
    /// On error the session keeps its previous state; whatever the failed
    /// transform already did to the tree stays.
    pub fn apply(&mut self, intent: Intent, tree: &mut impl BlockTreeAdapter) -> Result<Transition> {
        let mut t = Transition::new(intent, self.phase());
        let color = self.options.highlight_color.clone();

        match (intent, self.state.clone()) {
            (Intent::Start, SessionState::Idle) => match first_eligible(tree.roots()) {
                Some(cursor) => {
                    self.state = SessionState::Active {
                        cursor,
                        pile: Vec::new(),
                    }
                }
                None => t.notification = Some(Notification::NothingToProcess),
            },

            (Intent::Keep, SessionState::Active { cursor, .. }) => {
                let next = next_eligible_after(tree.roots(), &cursor);
                self.land(next, &mut t);
            }

            (Intent::Highlight, SessionState::Active { cursor, mut pile }) => {
                pile.push(cursor.clone());
                t.changed = highlight(tree, &pile, &color)? > 0;
                let next = next_eligible_after(tree.roots(), &cursor);
                self.land(next, &mut t);
            }

            (Intent::Hide, SessionState::Active { cursor, mut pile }) => {
                // A cursor deleted under us means end of document, even if
                // the pile still has blocks to hide.
                let cursor_present = tree.contains(&cursor);
                pile.push(cursor);
                let outcome = hide(tree, &pile)?;
                t.changed = matches!(outcome, HideOutcome::Hidden { .. });
                let next = outcome.next_eligible().filter(|_| cursor_present).cloned();
                self.land(next, &mut t);
            }

            (Intent::Previous, SessionState::Active { cursor, .. }) => {
                let cursor = previous_eligible_before(tree.roots(), &cursor).unwrap_or(cursor);
                self.state = SessionState::Active {
                    cursor,
                    pile: Vec::new(),
                };
            }

            (Intent::AddSelection, SessionState::Active { cursor, mut pile }) => {
                if let Some(next) = next_eligible_after(tree.roots(), &cursor) {
                    pile.push(cursor);
                    self.state = SessionState::Active { cursor: next, pile };
                }
            }

            (Intent::Cancel, SessionState::Active { .. } | SessionState::ReviewComplete) => {
                let restored = untoggle_all(tree)?;
                let cleared = clear_highlights(tree, &color)?;
                t.changed = restored > 0 || cleared > 0;
                self.reset();
            }

            (Intent::Exit, SessionState::Active { .. } | SessionState::ReviewComplete) => self.reset(),

            (Intent::UntoggleAll, _) => {
                t.changed = untoggle_all(tree)? > 0;
            }

            (Intent::Collect, SessionState::ReviewComplete) => {
                t.collected = Some(collect(tree, self.document, &self.options)?);
                t.changed = true;
                self.reset();
            }

            (Intent::Dismiss, SessionState::ReviewComplete) => self.reset(),

            _ => t.applied = false,
        }

        t.to = self.phase();
        debug!(
            intent = %intent,
            from = %t.from,
            to = %t.to,
            applied = t.applied,
            changed = t.changed,
            "session transition"
        );
        Ok(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_tree::BlockTree;
    use sift_types::Block;

    fn id(s: &str) -> BlockId {
        BlockId::new(s)
    }

    fn setup(ids: &[&str]) -> (Session, BlockTree) {
        let tree = BlockTree::new(ids.iter().map(|s| Block::paragraph(*s, s)).collect());
        (Session::new(DocumentId::new(), EngineOptions::default()), tree)
    }

    #[test]
    fn test_start_on_empty_document_notifies() {
        let (mut s, mut tree) = setup(&[]);
        let t = s.apply(Intent::Start, &mut tree).unwrap();
        assert_eq!(t.to, Phase::Idle);
        assert_eq!(t.notification, Some(Notification::NothingToProcess));
    }

    #[test]
    fn test_keep_to_end_completes() {
        let (mut s, mut tree) = setup(&["a", "b"]);
        s.apply(Intent::Start, &mut tree).unwrap();
        assert_eq!(s.state().cursor(), Some(&id("a")));
        s.apply(Intent::Keep, &mut tree).unwrap();
        let t = s.apply(Intent::Keep, &mut tree).unwrap();
        assert_eq!(t.to, Phase::ReviewComplete);
        assert_eq!(t.notification, Some(Notification::AllDone));
        assert!(!t.changed);
    }

    #[test]
    fn test_previous_at_first_block_stays() {
        let (mut s, mut tree) = setup(&["a", "b"]);
        s.apply(Intent::Start, &mut tree).unwrap();
        s.apply(Intent::Previous, &mut tree).unwrap();
        assert_eq!(s.state().cursor(), Some(&id("a")));
    }

    #[test]
    fn test_previous_clears_pile() {
        let (mut s, mut tree) = setup(&["a", "b", "c"]);
        s.apply(Intent::Start, &mut tree).unwrap();
        s.apply(Intent::AddSelection, &mut tree).unwrap();
        assert_eq!(s.state().pile(), &[id("a")]);
        s.apply(Intent::Previous, &mut tree).unwrap();
        assert_eq!(s.state().cursor(), Some(&id("a")));
        assert!(s.state().pile().is_empty());
    }

    #[test]
    fn test_add_selection_at_end_is_noop() {
        let (mut s, mut tree) = setup(&["a"]);
        s.apply(Intent::Start, &mut tree).unwrap();
        let t = s.apply(Intent::AddSelection, &mut tree).unwrap();
        assert!(t.applied);
        assert_eq!(s.state().cursor(), Some(&id("a")));
        assert!(s.state().pile().is_empty());
    }

    #[test]
    fn test_review_complete_ignores_navigation() {
        let (mut s, mut tree) = setup(&["a"]);
        s.apply(Intent::Start, &mut tree).unwrap();
        s.apply(Intent::Keep, &mut tree).unwrap();
        for intent in [Intent::Keep, Intent::Hide, Intent::Highlight, Intent::Previous, Intent::Start] {
            let t = s.apply(intent, &mut tree).unwrap();
            assert!(!t.applied, "{intent} should be ignored");
            assert_eq!(t.to, Phase::ReviewComplete);
        }
    }

    #[test]
    fn test_idle_ignores_session_intents() {
        let (mut s, mut tree) = setup(&["a"]);
        for intent in [Intent::Keep, Intent::Cancel, Intent::Exit, Intent::Collect, Intent::Dismiss] {
            assert!(!s.apply(intent, &mut tree).unwrap().applied);
        }
        assert!(s.apply(Intent::UntoggleAll, &mut tree).unwrap().applied);
    }

    #[test]
    fn test_exit_keeps_document() {
        let (mut s, mut tree) = setup(&["a", "b"]);
        s.apply(Intent::Start, &mut tree).unwrap();
        s.apply(Intent::Hide, &mut tree).unwrap();
        let before = tree.blocks().to_vec();
        let t = s.apply(Intent::Exit, &mut tree).unwrap();
        assert_eq!(t.to, Phase::Idle);
        assert!(!t.changed);
        assert_eq!(tree.blocks(), before.as_slice());
    }

    #[test]
    fn test_hide_with_missing_cursor_completes() {
        let (mut s, mut tree) = setup(&["a", "b"]);
        s.apply(Intent::Start, &mut tree).unwrap();
        tree.remove_blocks(&[id("a")]).unwrap();
        let t = s.apply(Intent::Hide, &mut tree).unwrap();
        assert_eq!(t.to, Phase::ReviewComplete);
        assert!(!t.changed);
    }

    #[test]
    fn test_hide_with_missing_cursor_and_pile_completes() {
        let (mut s, mut tree) = setup(&["a", "b", "c"]);
        s.apply(Intent::Start, &mut tree).unwrap();
        s.apply(Intent::AddSelection, &mut tree).unwrap();
        assert_eq!(s.state().pile(), &[id("a")]);
        tree.remove_blocks(&[id("b")]).unwrap();

        let t = s.apply(Intent::Hide, &mut tree).unwrap();
        assert_eq!(t.to, Phase::ReviewComplete);
        assert_eq!(t.notification, Some(Notification::AllDone));
        assert!(t.changed);
        assert!(tree.blocks()[0].is_hidden());
        assert_eq!(tree.blocks()[1].id, id("c"));
    }
}
