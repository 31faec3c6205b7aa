use crate::{FeedError, FeedId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    LoadFeed,
    LoadComments,
    CreatePost,
    DeletePost,
    ReportPost,
    PostComment,
    DeleteComment,
}

/// User-visible outcome, drained by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    PostPublished,
    PostDeleted { feed_id: FeedId },
    Reported { feed_id: FeedId },
    CommentPosted { feed_id: FeedId },
    CommentDeleted { feed_id: FeedId },
    Failed { action: Action, error: FeedError },
}

impl Notice {
    pub(crate) fn failed(action: Action, error: FeedError) -> Self {
        Notice::Failed { action, error }
    }
}
