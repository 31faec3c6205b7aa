//! Feed core: pure consistency layer for a paginated, mutable social feed.
mod accumulator;
mod effect;
mod error;
mod msg;
mod mutation;
mod notice;
mod pager;
mod state;
mod types;
mod update;
mod view_model;

pub use accumulator::Accumulator;
pub use effect::Effect;
pub use error::FeedError;
pub use msg::Msg;
pub use mutation::{MutationId, MutationKind, MutationStatus, PendingMutation};
pub use notice::{Action, Notice};
pub use pager::Generation;
pub use state::{FeedState, DEFAULT_COMMENT_LIMIT, DEFAULT_PAGE_LIMIT};
pub use types::{
    validate_image_url, Comment, CommentId, Draft, FeedId, FeedItem, Keyed, Page, ReportReason,
    UserRef, DEFAULT_IMAGE_LAYOUT, DEFAULT_REPORT_REASON,
};
pub use update::update;
pub use view_model::{CommentsView, FeedViewModel};
