use std::collections::HashMap;
use std::future::Future;
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;

use feed_core::{CommentId, Draft, FeedId, Generation, MutationId, ReportReason};
use feed_logging::{feed_debug, feed_info};
use tokio_util::sync::CancellationToken;

use crate::client::{ApiSettings, FeedApi, ReqwestFeedApi};
use crate::{ApiError, EngineEvent, ImageUpload, Session};

/// Work the engine performs on behalf of the core's effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
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
    Cancel {
        generation: Generation,
    },
    CreatePost {
        mutation_id: MutationId,
        draft: Draft,
    },
    DeletePost {
        mutation_id: MutationId,
        feed_id: FeedId,
    },
    Report {
        feed_id: FeedId,
        reason: ReportReason,
    },
    PostComment {
        feed_id: FeedId,
        content: String,
    },
    DeleteComment {
        feed_id: FeedId,
        comment_id: CommentId,
    },
    FetchItem {
        feed_id: FeedId,
    },
    UploadImage(ImageUpload),
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

type Cancellations = Arc<Mutex<HashMap<Generation, CancellationToken>>>;

/// Front end of the background request runtime. Cheap to clone.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(
        settings: ApiSettings,
        session: Session,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, ApiError> {
        let api = ReqwestFeedApi::new(settings, session)?;
        Ok(Self::with_api(Arc::new(api), sink))
    }

    pub fn with_api(api: Arc<dyn FeedApi>, sink: Arc<dyn EventSink>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let cancellations: Cancellations = Arc::new(Mutex::new(HashMap::new()));

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            while let Ok(command) = cmd_rx.recv() {
                dispatch(&runtime, api.clone(), sink.clone(), &cancellations, command);
            }
            feed_info!("Engine command channel closed; shutting down");
        });

        Self { cmd_tx }
    }

    pub fn submit(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }
}

fn dispatch(
    runtime: &tokio::runtime::Runtime,
    api: Arc<dyn FeedApi>,
    sink: Arc<dyn EventSink>,
    cancellations: &Cancellations,
    command: EngineCommand,
) {
    match command {
        EngineCommand::FetchPage {
            generation,
            page,
            limit,
        } => {
            let fetch = async move { api.list_feeds(page, limit).await };
            spawn_cancellable(runtime, cancellations, generation, sink, fetch, move |result| {
                EngineEvent::PageFetched { generation, result }
            });
        }
        EngineCommand::FetchComments {
            feed_id,
            generation,
            page,
            limit,
        } => {
            let fetch = async move { api.list_comments(&feed_id, page, limit).await };
            spawn_cancellable(runtime, cancellations, generation, sink, fetch, move |result| {
                EngineEvent::CommentsFetched { generation, result }
            });
        }
        EngineCommand::Cancel { generation } => {
            let token = cancellations
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&generation);
            match token {
                Some(token) => token.cancel(),
                None => feed_debug!("Cancel for {} arrived after completion", generation),
            }
        }
        EngineCommand::CreatePost { mutation_id, draft } => {
            runtime.spawn(async move {
                let result = api.create_feed(&draft).await;
                sink.emit(EngineEvent::PostCreated {
                    mutation_id,
                    result,
                });
            });
        }
        EngineCommand::DeletePost {
            mutation_id,
            feed_id,
        } => {
            runtime.spawn(async move {
                let result = api.delete_feed(&feed_id).await;
                sink.emit(EngineEvent::PostDeleted {
                    mutation_id,
                    result,
                });
            });
        }
        EngineCommand::Report { feed_id, reason } => {
            runtime.spawn(async move {
                let result = api.report_feed(&feed_id, &reason).await;
                sink.emit(EngineEvent::Reported { feed_id, result });
            });
        }
        EngineCommand::PostComment { feed_id, content } => {
            runtime.spawn(async move {
                let result = api.create_comment(&feed_id, &content).await;
                sink.emit(EngineEvent::CommentPosted { feed_id, result });
            });
        }
        EngineCommand::DeleteComment {
            feed_id,
            comment_id,
        } => {
            runtime.spawn(async move {
                let result = api.delete_comment(&comment_id).await;
                sink.emit(EngineEvent::CommentDeleted {
                    feed_id,
                    comment_id,
                    result,
                });
            });
        }
        EngineCommand::FetchItem { feed_id } => {
            runtime.spawn(async move {
                let result = api.get_feed(&feed_id).await;
                sink.emit(EngineEvent::ItemFetched { feed_id, result });
            });
        }
        EngineCommand::UploadImage(upload) => {
            runtime.spawn(async move {
                let file_name = upload.file_name.clone();
                let result = api.upload_image(upload).await;
                sink.emit(EngineEvent::ImageUploaded { file_name, result });
            });
        }
    }
}

/// Runs a fetch that a later `Cancel` for the same generation can abort.
///
/// A cancelled fetch emits `Cancelled` instead of its result.
fn spawn_cancellable<T, F, M>(
    runtime: &tokio::runtime::Runtime,
    cancellations: &Cancellations,
    generation: Generation,
    sink: Arc<dyn EventSink>,
    fetch: F,
    into_event: M,
) where
    T: Send + 'static,
    F: Future<Output = Result<T, ApiError>> + Send + 'static,
    M: FnOnce(Result<T, ApiError>) -> EngineEvent + Send + 'static,
{
    let token = CancellationToken::new();
    cancellations
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(generation, token.clone());
    let registry = cancellations.clone();

    runtime.spawn(async move {
        let event = tokio::select! {
            _ = token.cancelled() => EngineEvent::Cancelled { generation },
            result = fetch => into_event(result),
        };
        registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&generation);
        sink.emit(event);
    });
}
