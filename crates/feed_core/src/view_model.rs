use crate::{Comment, FeedId, FeedItem};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedViewModel {
    pub items: Vec<FeedItem>,
    pub total: Option<u64>,
    pub has_more: bool,
    pub is_loading_first_page: bool,
    pub is_loading_more: bool,
    pub pending_mutations: usize,
    pub comments: Option<CommentsView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentsView {
    pub feed_id: FeedId,
    pub comments: Vec<Comment>,
    pub has_more: bool,
    pub is_loading: bool,
}
