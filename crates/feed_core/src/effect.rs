use crate::{CommentId, Draft, FeedId, Generation, MutationId, ReportReason};

/// Remote work requested by `update`. Completions come back as `Msg`s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchPage {
        generation: Generation,
        page: u32,
        limit: u32,
    },
    FetchComments {
        feed_id: FeedId,
        generation: Generation,
        page: u32,
        limit: u32,
    },
    CancelFetch {
        generation: Generation,
    },
    SubmitCreate {
        mutation_id: MutationId,
        draft: Draft,
    },
    SubmitDelete {
        mutation_id: MutationId,
        feed_id: FeedId,
    },
    SubmitReport {
        feed_id: FeedId,
        reason: ReportReason,
    },
    SubmitComment {
        feed_id: FeedId,
        content: String,
    },
    SubmitCommentDelete {
        feed_id: FeedId,
        comment_id: CommentId,
    },
    FetchItem {
        feed_id: FeedId,
    },
}
