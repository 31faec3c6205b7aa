use feed_logging::{feed_debug, feed_info};

use crate::accumulator::Accumulator;
use crate::mutation::{MutationLog, PendingMutation};
use crate::pager::{Arrival, Generation, InFlight, Pager};
use crate::view_model::{CommentsView, FeedViewModel};
use crate::{Comment, Effect, FeedId, FeedItem, Notice, Page};

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const DEFAULT_COMMENT_LIMIT: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommentThread {
    pub feed_id: FeedId,
    pub items: Accumulator<Comment>,
    pub pager: Pager,
}

/// All client-side feed state. Only `update` mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedState {
    feed: Accumulator<FeedItem>,
    pager: Pager,
    comments: Option<CommentThread>,
    pub(crate) mutations: MutationLog,
    generation: Generation,
    reconcile_pending: bool,
    page_limit: u32,
    comment_limit: u32,
    notices: Vec<Notice>,
    dirty: bool,
}

impl Default for FeedState {
    fn default() -> Self {
        Self::with_limits(DEFAULT_PAGE_LIMIT, DEFAULT_COMMENT_LIMIT)
    }
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(page_limit: u32, comment_limit: u32) -> Self {
        Self {
            feed: Accumulator::new(),
            pager: Pager::default(),
            comments: None,
            mutations: MutationLog::default(),
            generation: Generation::default(),
            reconcile_pending: false,
            page_limit: page_limit.max(1),
            comment_limit: comment_limit.max(1),
            notices: Vec::new(),
            dirty: false,
        }
    }

    pub fn view(&self) -> FeedViewModel {
        FeedViewModel {
            items: self.feed.items().to_vec(),
            total: self.feed.total(),
            has_more: self.feed.has_more(),
            is_loading_first_page: self.pager.is_loading_first_page(),
            is_loading_more: self.pager.in_flight().is_some_and(|f| f.page > 1),
            pending_mutations: self.mutations.outstanding().count(),
            comments: self.comments.as_ref().map(|thread| CommentsView {
                feed_id: thread.feed_id.clone(),
                comments: thread.items.items().to_vec(),
                has_more: thread.items.has_more(),
                is_loading: thread.pager.in_flight().is_some(),
            }),
            dirty: self.dirty,
        }
    }

    pub fn items(&self) -> &[FeedItem] {
        self.feed.items()
    }

    pub fn has_more(&self) -> bool {
        self.feed.has_more()
    }

    pub fn is_loading_first_page(&self) -> bool {
        self.pager.is_loading_first_page()
    }

    pub fn total(&self) -> Option<u64> {
        self.feed.total()
    }

    pub fn outstanding_mutations(&self) -> Vec<PendingMutation> {
        self.mutations.outstanding().cloned().collect()
    }

    pub fn settled_mutations(&self) -> Vec<PendingMutation> {
        self.mutations.settled().cloned().collect()
    }

    /// True when a reconciliation read is waiting for outstanding mutations to settle.
    pub fn reconcile_pending(&self) -> bool {
        self.reconcile_pending
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
        self.dirty = true;
    }

    fn bump_generation(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.generation
    }

    pub(crate) fn request_next_page(&mut self) -> Vec<Effect> {
        let candidate = self.generation.next();
        match self.pager.begin_next(candidate) {
            Some(request) => {
                self.generation = candidate;
                self.mark_dirty();
                vec![self.fetch_page_effect(request)]
            }
            None => Vec::new(),
        }
    }

    /// Restarts from page 1, cancelling whatever feed fetch was in flight.
    pub(crate) fn start_reset(&mut self) -> Vec<Effect> {
        let generation = self.bump_generation();
        let (request, superseded) = self.pager.begin_reset(generation);
        self.reconcile_pending = false;
        self.mark_dirty();
        let mut effects = Vec::with_capacity(2);
        if let Some(old) = superseded {
            feed_debug!("Reset {} supersedes in-flight {}", generation, old.generation);
            effects.push(Effect::CancelFetch {
                generation: old.generation,
            });
        }
        effects.push(self.fetch_page_effect(request));
        effects
    }

    /// Asks for an authoritative re-read from the top.
    ///
    /// The snapshot is invalidated immediately. The fetch itself waits until no
    /// create/delete is still awaiting the server, so only one reconciliation runs.
    pub(crate) fn request_reconcile(&mut self) -> Vec<Effect> {
        if self.mutations.has_outstanding() {
            self.reconcile_pending = true;
            let superseded = self.pager.in_flight();
            self.pager.invalidate();
            return match superseded {
                Some(old) => {
                    self.pager.settle(old.generation);
                    vec![Effect::CancelFetch {
                        generation: old.generation,
                    }]
                }
                None => Vec::new(),
            };
        }
        self.start_reset()
    }

    /// Fires a deferred reconciliation once the last outstanding mutation settled.
    pub(crate) fn flush_deferred_reconcile(&mut self) -> Vec<Effect> {
        if self.reconcile_pending && !self.mutations.has_outstanding() {
            feed_info!("Last outstanding mutation settled; reconciling from page 1");
            self.start_reset()
        } else {
            Vec::new()
        }
    }

    pub(crate) fn apply_page(&mut self, generation: Generation, mut page: Page<FeedItem>) {
        match self
            .pager
            .accept(generation, page.page_number, page.has_more)
        {
            Arrival::Stale => {
                feed_debug!(
                    "Dropping stale feed page {} from {}",
                    page.page_number,
                    generation
                );
            }
            Arrival::Current { reset } => {
                // A page read before the server applied a delete must not resurrect it.
                let mutations = &self.mutations;
                page.items.retain(|item| !mutations.is_deleting(&item.id));
                // The server total still counts posts whose delete it has not confirmed.
                let pending = mutations.pending_deletes() as u64;
                page.total = page.total.saturating_sub(pending);
                self.feed.merge_page(page, reset);
                self.mark_dirty();
            }
        }
    }

    /// Returns `true` if the failure belonged to the current feed request.
    pub(crate) fn settle_feed_fetch(&mut self, generation: Generation) -> bool {
        let current = self.pager.settle(generation);
        if current {
            self.mark_dirty();
        }
        current
    }

    pub(crate) fn remove_locally(&mut self, feed_id: &str) {
        self.feed.remove_locally(feed_id);
        self.mark_dirty();
    }

    pub(crate) fn replace_item(&mut self, item: FeedItem) {
        if self.feed.replace(item) {
            self.mark_dirty();
        }
    }

    pub(crate) fn open_thread(&self) -> Option<&FeedId> {
        self.comments.as_ref().map(|thread| &thread.feed_id)
    }

    pub(crate) fn comment_thread_for(&self, feed_id: &str) -> bool {
        self.comments
            .as_ref()
            .is_some_and(|thread| thread.feed_id == feed_id)
    }

    /// Opens (or reopens) the comment thread of a post and loads its first page.
    pub(crate) fn open_comments(&mut self, feed_id: FeedId) -> Vec<Effect> {
        let mut effects = self.close_comments();
        let generation = self.bump_generation();
        let mut thread = CommentThread {
            feed_id,
            items: Accumulator::new(),
            pager: Pager::default(),
        };
        if let Some(request) = thread.pager.begin_next(generation) {
            effects.push(self.fetch_comments_effect(&thread.feed_id, request));
        }
        self.comments = Some(thread);
        self.mark_dirty();
        effects
    }

    pub(crate) fn close_comments(&mut self) -> Vec<Effect> {
        let Some(thread) = self.comments.take() else {
            return Vec::new();
        };
        self.mark_dirty();
        thread
            .pager
            .in_flight()
            .map(|request| Effect::CancelFetch {
                generation: request.generation,
            })
            .into_iter()
            .collect()
    }

    pub(crate) fn request_more_comments(&mut self) -> Vec<Effect> {
        let candidate = self.generation.next();
        let limit = self.comment_limit;
        let Some(thread) = self.comments.as_mut() else {
            return Vec::new();
        };
        match thread.pager.begin_next(candidate) {
            Some(request) => {
                self.generation = candidate;
                let effect = Effect::FetchComments {
                    feed_id: thread.feed_id.clone(),
                    generation: request.generation,
                    page: request.page,
                    limit,
                };
                self.mark_dirty();
                vec![effect]
            }
            None => Vec::new(),
        }
    }

    pub(crate) fn reload_comments(&mut self) -> Vec<Effect> {
        let generation = self.bump_generation();
        let limit = self.comment_limit;
        let Some(thread) = self.comments.as_mut() else {
            return Vec::new();
        };
        let (request, superseded) = thread.pager.begin_reset(generation);
        let mut effects: Vec<Effect> = superseded
            .map(|old| Effect::CancelFetch {
                generation: old.generation,
            })
            .into_iter()
            .collect();
        effects.push(Effect::FetchComments {
            feed_id: thread.feed_id.clone(),
            generation: request.generation,
            page: request.page,
            limit,
        });
        self.mark_dirty();
        effects
    }

    pub(crate) fn apply_comments(&mut self, generation: Generation, page: Page<Comment>) {
        let Some(thread) = self.comments.as_mut() else {
            feed_debug!("Dropping comment page for a closed thread ({})", generation);
            return;
        };
        match thread
            .pager
            .accept(generation, page.page_number, page.has_more)
        {
            Arrival::Stale => {
                feed_debug!("Dropping stale comment page from {}", generation);
            }
            Arrival::Current { reset } => {
                thread.items.merge_page(page, reset);
                self.mark_dirty();
            }
        }
    }

    pub(crate) fn settle_comments_fetch(&mut self, generation: Generation) -> bool {
        let current = self
            .comments
            .as_mut()
            .is_some_and(|thread| thread.pager.settle(generation));
        if current {
            self.mark_dirty();
        }
        current
    }

    fn fetch_page_effect(&self, request: InFlight) -> Effect {
        Effect::FetchPage {
            generation: request.generation,
            page: request.page,
            limit: self.page_limit,
        }
    }

    fn fetch_comments_effect(&self, feed_id: &str, request: InFlight) -> Effect {
        Effect::FetchComments {
            feed_id: feed_id.to_string(),
            generation: request.generation,
            page: request.page,
            limit: self.comment_limit,
        }
    }
}
