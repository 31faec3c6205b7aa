use crate::{
    Comment, CommentId, Draft, FeedError, FeedId, FeedItem, Generation, MutationId, Page,
    ReportReason,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Presentation reached the end of the list (infinite scroll).
    NextPageRequested,
    /// User asked for a fresh read from the top.
    RefreshRequested,
    /// Engine delivered a feed page.
    PageLoaded {
        generation: Generation,
        page: Page<FeedItem>,
    },
    /// Engine failed to deliver a feed page.
    PageFailed {
        generation: Generation,
        error: FeedError,
    },
    /// A fetch was cancelled before completing. Applies to feed and comment fetches.
    PageCancelled { generation: Generation },
    /// User submitted a new post.
    CreateSubmitted(Draft),
    CreateCompleted {
        mutation_id: MutationId,
        result: Result<FeedItem, FeedError>,
    },
    /// User confirmed deletion of a post.
    DeleteRequested(FeedId),
    DeleteCompleted {
        mutation_id: MutationId,
        result: Result<(), FeedError>,
    },
    ReportRequested {
        feed_id: FeedId,
        reason: ReportReason,
    },
    ReportCompleted {
        feed_id: FeedId,
        result: Result<(), FeedError>,
    },
    /// User expanded the comment thread of a post.
    CommentsOpened(FeedId),
    CommentsClosed,
    MoreCommentsRequested,
    CommentsLoaded {
        generation: Generation,
        page: Page<Comment>,
    },
    CommentsFailed {
        generation: Generation,
        error: FeedError,
    },
    CommentSubmitted {
        feed_id: FeedId,
        content: String,
    },
    CommentCompleted {
        feed_id: FeedId,
        result: Result<Comment, FeedError>,
    },
    /// User asked to delete a comment of the open thread.
    CommentDeleteRequested(CommentId),
    CommentDeleteCompleted {
        feed_id: FeedId,
        comment_id: CommentId,
        result: Result<(), FeedError>,
    },
    /// Fresh copy of a single post, read after its comments changed.
    ItemRefreshed {
        feed_id: FeedId,
        result: Result<FeedItem, FeedError>,
    },
}
