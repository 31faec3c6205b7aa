use std::sync::mpsc;

use feed_core::{Effect, FeedError, Msg};
use feed_engine::{
    ApiError, EngineCommand, EngineEvent, EngineHandle, EventSink, FailureKind, ImageUpload,
};
use feed_logging::{feed_debug, feed_warn};

use super::app::Inbox;

/// Turns core effects into engine commands.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            feed_debug!("Effect {:?}", effect);
            self.engine.submit(command_for(effect));
        }
    }

    pub fn upload(&self, upload: ImageUpload) {
        self.engine.submit(EngineCommand::UploadImage(upload));
    }
}

fn command_for(effect: Effect) -> EngineCommand {
    match effect {
        Effect::FetchPage {
            generation,
            page,
            limit,
        } => EngineCommand::FetchPage {
            generation,
            page,
            limit,
        },
        Effect::FetchComments {
            feed_id,
            generation,
            page,
            limit,
        } => EngineCommand::FetchComments {
            feed_id,
            generation,
            page,
            limit,
        },
        Effect::CancelFetch { generation } => EngineCommand::Cancel { generation },
        Effect::SubmitCreate { mutation_id, draft } => {
            EngineCommand::CreatePost { mutation_id, draft }
        }
        Effect::SubmitDelete {
            mutation_id,
            feed_id,
        } => EngineCommand::DeletePost {
            mutation_id,
            feed_id,
        },
        Effect::SubmitReport { feed_id, reason } => EngineCommand::Report { feed_id, reason },
        Effect::SubmitComment { feed_id, content } => {
            EngineCommand::PostComment { feed_id, content }
        }
        Effect::SubmitCommentDelete {
            feed_id,
            comment_id,
        } => EngineCommand::DeleteComment {
            feed_id,
            comment_id,
        },
        Effect::FetchItem { feed_id } => EngineCommand::FetchItem { feed_id },
    }
}

/// Forwards engine events into the app's inbox as core messages.
pub struct AppSink {
    tx: mpsc::Sender<Inbox>,
}

impl AppSink {
    pub fn new(tx: mpsc::Sender<Inbox>) -> Self {
        Self { tx }
    }
}

impl EventSink for AppSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(translate(event));
    }
}

fn translate(event: EngineEvent) -> Inbox {
    let msg = match event {
        EngineEvent::PageFetched { generation, result } => match result {
            Ok(page) => Msg::PageLoaded { generation, page },
            Err(err) => Msg::PageFailed {
                generation,
                error: to_feed_error(err),
            },
        },
        EngineEvent::CommentsFetched { generation, result } => match result {
            Ok(page) => Msg::CommentsLoaded { generation, page },
            Err(err) => Msg::CommentsFailed {
                generation,
                error: to_feed_error(err),
            },
        },
        EngineEvent::Cancelled { generation } => Msg::PageCancelled { generation },
        EngineEvent::PostCreated {
            mutation_id,
            result,
        } => Msg::CreateCompleted {
            mutation_id,
            result: result.map_err(to_feed_error),
        },
        EngineEvent::PostDeleted {
            mutation_id,
            result,
        } => Msg::DeleteCompleted {
            mutation_id,
            result: result.map_err(to_feed_error),
        },
        EngineEvent::Reported { feed_id, result } => Msg::ReportCompleted {
            feed_id,
            result: result.map_err(to_feed_error),
        },
        EngineEvent::CommentPosted { feed_id, result } => Msg::CommentCompleted {
            feed_id,
            result: result.map_err(to_feed_error),
        },
        EngineEvent::CommentDeleted {
            feed_id,
            comment_id,
            result,
        } => Msg::CommentDeleteCompleted {
            feed_id,
            comment_id,
            result: result.map_err(to_feed_error),
        },
        EngineEvent::ItemFetched { feed_id, result } => Msg::ItemRefreshed {
            feed_id,
            result: result.map_err(to_feed_error),
        },
        EngineEvent::ImageUploaded { file_name, result } => {
            return Inbox::ImageUploaded { file_name, result };
        }
    };
    Inbox::Core(msg)
}

/// Maps transport failures onto the core's error taxonomy.
pub fn to_feed_error(err: ApiError) -> FeedError {
    let ApiError { kind, message } = err;
    match kind {
        FailureKind::NotPermitted => FeedError::NotPermitted(message),
        FailureKind::HttpStatus(404) => FeedError::NotFound(message),
        FailureKind::HttpStatus(409) => FeedError::Conflict(message),
        FailureKind::HttpStatus(400 | 422) | FailureKind::Malformed | FailureKind::InvalidUrl => {
            FeedError::Validation(message)
        }
        FailureKind::HttpStatus(status) => {
            feed_warn!("Server rejected request with {}: {}", status, message);
            FeedError::Rejected { status, message }
        }
        FailureKind::Timeout | FailureKind::Network => FeedError::TransientNetwork(message),
    }
}
