//! The intent loop around one open document.
//!
//! ```text
//!   RequestHandle ──mpsc──▶ Processor::pump ─┐
//!   key bindings ─────────▶ Processor::dispatch ──▶ Session::apply ──▶ tree
//!                                                        │
//!                          NotificationReceiver ◀──mpsc──┤
//!                          DocumentService ◀── persist ──┘ (after changes)
//! ```
//!
//! Every intent runs to completion before the next one is looked at. After a
//! mutating intent the document is saved and page-links that vanished get
//! their documents archived. Service failures become notifications; the local
//! document is never rolled back.

use sift_tree::BlockTreeAdapter;
use sift_types::{DocumentId, codec};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::intent::{ChromeRequest, Intent, RequestHandle};
use crate::notify::{Notification, NotificationReceiver};
use crate::options::EngineOptions;
use crate::pages::{self, PageLinkTracker};
use crate::service::{DocumentService, ServiceError};
use crate::session::{Session, SessionState, Transition};
use crate::Result;

/// Drives a [`Session`] over a tree, persisting through a document service.
pub struct Processor<T, S> {
    session: Session,
    tree: T,
    service: S,
    handle: RequestHandle,
    requests: mpsc::UnboundedReceiver<ChromeRequest>,
    notices: mpsc::UnboundedSender<Notification>,
    pages: PageLinkTracker,
}

impl<T: BlockTreeAdapter, S: DocumentService> Processor<T, S> {
    /// Open `document` (already loaded into `tree`).
    pub fn new(document: DocumentId, tree: T, service: S, options: EngineOptions) -> (Self, NotificationReceiver) {
        let (handle, requests) = RequestHandle::channel();
        let (notices, notice_rx) = mpsc::unbounded_channel();
        let pages = PageLinkTracker::new(tree.roots());
        let processor = Self {
            session: Session::new(document, options),
            tree,
            service,
            handle,
            requests,
            notices,
            pages,
        };
        (processor, notice_rx)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// A sender for chrome requests.
    pub fn handle(&self) -> RequestHandle {
        self.handle.clone()
    }

    pub fn document(&self) -> DocumentId {
        self.session.document()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> &SessionState {
        self.session.state()
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    /// Direct access for edits made outside review (typing in the editor).
    pub fn tree_mut(&mut self) -> &mut T {
        &mut self.tree
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    // =========================================================================
    // Intents
    // =========================================================================

    /// Apply one intent, then notify and persist as needed.
    pub fn dispatch(&mut self, intent: Intent) -> Result<Transition> {
        let transition = self.session.apply(intent, &mut self.tree)?;
        if let Some(notice) = &transition.notification {
            self.notify(notice.clone());
        }
        if transition.changed {
            self.persist()?;
        }
        Ok(transition)
    }

    /// Consume every pending chrome request, in order.
    pub fn pump(&mut self) -> Result<Vec<Transition>> {
        let mut out = Vec::new();
        while let Ok(req) = self.requests.try_recv() {
            debug!(?req, "chrome request");
            out.push(self.dispatch(req.into())?);
        }
        Ok(out)
    }

    /// Replace the open document. The session resets silently.
    ///
    /// Returns the previous tree.
    pub fn switch_document(&mut self, document: DocumentId, tree: T) -> T {
        info!(from = %self.document().short(), to = %document.short(), "switching document");
        self.session.rebind(document);
        self.pages = PageLinkTracker::new(tree.roots());
        std::mem::replace(&mut self.tree, tree)
    }

    /// Create a sub-page at the editor cursor and save.
    pub fn create_sub_page(&mut self, title: &str) -> Result<Option<DocumentId>> {
        let parent = self.document();
        let created = match pages::create_sub_page(&mut self.tree, &mut self.service, parent, title) {
            Ok(created) => created,
            Err(crate::EngineError::Service(e)) => {
                self.service_failed("create", &e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        if created.is_some() {
            self.persist()?;
        }
        Ok(created.map(|(_, page)| page))
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Save the tree and archive documents whose page-link disappeared.
    ///
    /// Returns false if any service call failed (already notified).
    pub fn persist(&mut self) -> Result<bool> {
        let content = codec::encode_document(self.tree.roots())?;
        let document = self.document();
        let mut ok = true;

        if let Err(e) = self.service.update(document, &content) {
            self.service_failed("save", &e);
            ok = false;
        }
        for page in self.pages.removed(self.tree.roots()) {
            info!(page = %page.short(), "page-link removed, archiving");
            if let Err(e) = self.service.archive(page) {
                self.service_failed("archive", &e);
                self.pages.retry_later(page);
                ok = false;
            }
        }
        Ok(ok)
    }

    fn service_failed(&self, operation: &'static str, err: &ServiceError) {
        warn!(operation, error = %err, "document service failed");
        self.notify(Notification::ServiceFailed {
            operation,
            message: err.to_string(),
        });
    }

    fn notify(&self, notice: Notification) {
        if self.notices.send(notice).is_err() {
            debug!("notification receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_tree::BlockTree;
    use sift_types::{Block, BlockId};

    use std::cell::Cell;
    use std::rc::Rc;

    use crate::service::InMemoryDocuments;
    use crate::session::Phase;

    /// In-memory service whose writes fail while `down` is set.
    struct Flaky {
        inner: InMemoryDocuments,
        down: Rc<Cell<bool>>,
    }

    impl Flaky {
        fn check(&self) -> std::result::Result<(), ServiceError> {
            if self.down.get() {
                Err(ServiceError::Backend("down".into()))
            } else {
                Ok(())
            }
        }
    }

    impl DocumentService for Flaky {
        fn create(&mut self, title: &str, parent: Option<DocumentId>) -> std::result::Result<DocumentId, ServiceError> {
            self.check()?;
            self.inner.create(title, parent)
        }

        fn update(&mut self, id: DocumentId, content: &str) -> std::result::Result<(), ServiceError> {
            self.check()?;
            self.inner.update(id, content)
        }

        fn archive(&mut self, id: DocumentId) -> std::result::Result<(), ServiceError> {
            self.check()?;
            self.inner.archive(id)
        }

        fn load(&self, id: DocumentId) -> std::result::Result<crate::DocumentRecord, ServiceError> {
            self.inner.load(id)
        }

        fn list(&self) -> std::result::Result<Vec<crate::DocumentRecord>, ServiceError> {
            self.inner.list()
        }
    }

    fn operations(rx: &mut NotificationReceiver) -> Vec<&'static str> {
        let mut out = Vec::new();
        while let Ok(notice) = rx.try_recv() {
            if let Notification::ServiceFailed { operation, .. } = notice {
                out.push(operation);
            }
        }
        out
    }

    fn open(ids: &[&str]) -> (Processor<BlockTree, InMemoryDocuments>, NotificationReceiver) {
        let mut svc = InMemoryDocuments::new();
        let doc = svc.insert("Doc", "");
        let tree = BlockTree::new(ids.iter().map(|s| Block::paragraph(*s, s)).collect());
        Processor::new(doc, tree, svc, EngineOptions::default())
    }

    #[test]
    fn test_requests_consumed_once() {
        let (mut p, _rx) = open(&["a"]);
        let handle = p.handle();
        handle.request_start().unwrap();
        let first = p.pump().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].to, Phase::Active);
        assert!(p.pump().unwrap().is_empty());
    }

    #[test]
    fn test_notification_delivered() {
        let (mut p, mut rx) = open(&[]);
        p.dispatch(Intent::Start).unwrap();
        assert_eq!(rx.try_recv().unwrap(), Notification::NothingToProcess);
    }

    #[test]
    fn test_mutation_is_persisted() {
        let (mut p, _rx) = open(&["a", "b"]);
        p.dispatch(Intent::Start).unwrap();
        p.dispatch(Intent::Hide).unwrap();
        let stored = p.service().load(p.document()).unwrap();
        let saved = BlockTree::from_content(&stored.content).unwrap();
        assert_eq!(saved.blocks(), p.tree().blocks());
    }

    #[test]
    fn test_navigation_does_not_persist() {
        let (mut p, _rx) = open(&["a", "b"]);
        p.dispatch(Intent::Start).unwrap();
        p.dispatch(Intent::Keep).unwrap();
        assert_eq!(p.service().load(p.document()).unwrap().content, "");
    }

    #[test]
    fn test_switch_document_resets_silently() {
        let (mut p, mut rx) = open(&["a"]);
        p.dispatch(Intent::Start).unwrap();
        let other = DocumentId::new();
        let old = p.switch_document(other, BlockTree::new(vec![Block::paragraph("z", "")]));
        assert_eq!(old.blocks()[0].id, BlockId::new("a"));
        assert_eq!(p.state(), &SessionState::Idle);
        assert_eq!(p.document(), other);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_service_failure_is_surfaced_without_rollback() {
        let mut inner = InMemoryDocuments::new();
        let doc = inner.insert("Doc", "");
        let tree = BlockTree::new(vec![Block::paragraph("a", "a"), Block::paragraph("b", "b")]);
        let svc = Flaky {
            inner,
            down: Rc::new(Cell::new(true)),
        };
        let (mut p, mut rx) = Processor::new(doc, tree, svc, EngineOptions::default());

        p.dispatch(Intent::Start).unwrap();
        let t = p.dispatch(Intent::Hide).unwrap();
        assert!(t.changed);
        assert_eq!(operations(&mut rx), vec!["save"]);
        assert!(p.tree().blocks()[0].is_hidden());
        assert_eq!(p.service().load(doc).unwrap().content, "");

        p.tree_mut().set_cursor(Some(BlockId::new("b")));
        assert_eq!(p.create_sub_page("Child").unwrap(), None);
        assert_eq!(operations(&mut rx), vec!["create"]);
        assert!(p.tree().blocks()[1].is_eligible());
    }

    #[test]
    fn test_failed_archive_is_retried_on_next_save() {
        let down = Rc::new(Cell::new(false));
        let mut inner = InMemoryDocuments::new();
        let doc = inner.insert("Doc", "");
        let page = inner.insert("Child", "");
        let tree = BlockTree::new(vec![Block::page_link("l", page), Block::paragraph("a", "a")]);
        let svc = Flaky {
            inner,
            down: down.clone(),
        };
        let (mut p, mut rx) = Processor::new(doc, tree, svc, EngineOptions::default());

        down.set(true);
        p.tree_mut().remove_blocks(&[BlockId::new("l")]).unwrap();
        assert!(!p.persist().unwrap());
        assert_eq!(operations(&mut rx), vec!["save", "archive"]);
        assert!(!p.service().load(page).unwrap().is_archived);

        down.set(false);
        assert!(p.persist().unwrap());
        assert!(p.service().load(page).unwrap().is_archived);
        assert!(operations(&mut rx).is_empty());
    }
}
