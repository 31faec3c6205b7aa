use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use feed_core::{Comment, Draft, FeedItem, Generation, Page, ReportReason, UserRef};
use feed_engine::{
    ApiError, ChannelEventSink, EngineCommand, EngineEvent, EngineHandle, FailureKind, FeedApi,
    ImageUpload,
};

const WAIT: Duration = Duration::from_secs(5);

fn item(id: &str) -> FeedItem {
    let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    FeedItem {
        id: id.to_string(),
        user_id: "u1".to_string(),
        content: String::new(),
        images: Vec::new(),
        image_layout: "grid".to_string(),
        created_at: at,
        updated_at: at,
        user: UserRef {
            id: "u1".to_string(),
            username: "ada".to_string(),
            name: "Ada".to_string(),
            avatar: None,
        },
        comment_count: 0,
        report_count: 0,
        reported_by_me: false,
    }
}

/// Answers page 1 immediately and hangs on every later page.
#[derive(Default)]
struct ScriptedApi {
    deleted: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl FeedApi for ScriptedApi {
    async fn list_feeds(&self, page: u32, limit: u32) -> Result<Page<FeedItem>, ApiError> {
        if page > 1 {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        Ok(Page {
            items: vec![item("1"), item("2")],
            page_number: page,
            has_more: true,
            total: 4,
            limit,
            total_pages: 2,
        })
    }

    async fn get_feed(&self, feed_id: &str) -> Result<FeedItem, ApiError> {
        Ok(item(feed_id))
    }

    async fn create_feed(&self, _draft: &Draft) -> Result<FeedItem, ApiError> {
        Ok(item("created"))
    }

    async fn delete_feed(&self, feed_id: &str) -> Result<(), ApiError> {
        self.deleted.lock().unwrap().push(feed_id.to_string());
        Ok(())
    }

    async fn report_feed(&self, _feed_id: &str, _reason: &ReportReason) -> Result<(), ApiError> {
        Err(ApiError {
            kind: FailureKind::HttpStatus(409),
            message: "already reported".to_string(),
        })
    }

    async fn list_comments(
        &self,
        _feed_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<Page<Comment>, ApiError> {
        Ok(Page {
            items: Vec::new(),
            page_number: page,
            has_more: false,
            total: 0,
            limit,
            total_pages: 0,
        })
    }

    async fn create_comment(&self, _feed_id: &str, _content: &str) -> Result<Comment, ApiError> {
        Err(ApiError {
            kind: FailureKind::Network,
            message: "offline".to_string(),
        })
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<(), ApiError> {
        Err(ApiError {
            kind: FailureKind::HttpStatus(404),
            message: format!("comment {comment_id} not found"),
        })
    }

    async fn upload_image(&self, upload: ImageUpload) -> Result<String, ApiError> {
        Ok(format!("http://cdn.example.com/{}", upload.file_name))
    }
}

fn start() -> (EngineHandle, mpsc::Receiver<EngineEvent>, Arc<ScriptedApi>) {
    let api = Arc::new(ScriptedApi::default());
    let (tx, rx) = mpsc::channel();
    let engine = EngineHandle::with_api(api.clone(), Arc::new(ChannelEventSink::new(tx)));
    (engine, rx, api)
}

#[test]
fn fetch_page_reports_result_with_its_generation() {
    let (engine, rx, _api) = start();
    engine.submit(EngineCommand::FetchPage {
        generation: Generation(7),
        page: 1,
        limit: 10,
    });

    match rx.recv_timeout(WAIT).expect("event") {
        EngineEvent::PageFetched { generation, result } => {
            assert_eq!(generation, Generation(7));
            assert_eq!(result.unwrap().items.len(), 2);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn cancelled_fetch_emits_cancelled_instead_of_result() {
    let (engine, rx, _api) = start();
    engine.submit(EngineCommand::FetchPage {
        generation: Generation(3),
        page: 2,
        limit: 10,
    });
    engine.submit(EngineCommand::Cancel {
        generation: Generation(3),
    });

    assert_eq!(
        rx.recv_timeout(WAIT).expect("event"),
        EngineEvent::Cancelled {
            generation: Generation(3)
        }
    );
}

#[test]
fn cancel_for_unknown_generation_is_harmless() {
    let (engine, rx, _api) = start();
    engine.submit(EngineCommand::Cancel {
        generation: Generation(99),
    });
    engine.submit(EngineCommand::FetchItem {
        feed_id: "p1".to_string(),
    });

    match rx.recv_timeout(WAIT).expect("event") {
        EngineEvent::ItemFetched { feed_id, result } => {
            assert_eq!(feed_id, "p1");
            assert!(result.is_ok());
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn mutations_report_back_with_their_ids() {
    let (engine, rx, api) = start();
    engine.submit(EngineCommand::DeletePost {
        mutation_id: 5,
        feed_id: "p9".to_string(),
    });
    assert_eq!(
        rx.recv_timeout(WAIT).expect("event"),
        EngineEvent::PostDeleted {
            mutation_id: 5,
            result: Ok(())
        }
    );
    assert_eq!(*api.deleted.lock().unwrap(), vec!["p9".to_string()]);

    engine.submit(EngineCommand::Report {
        feed_id: "p9".to_string(),
        reason: ReportReason::default(),
    });
    match rx.recv_timeout(WAIT).expect("event") {
        EngineEvent::Reported { feed_id, result } => {
            assert_eq!(feed_id, "p9");
            assert_eq!(result.unwrap_err().kind, FailureKind::HttpStatus(409));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn uploads_report_the_durable_url() {
    let (engine, rx, _api) = start();
    engine.submit(EngineCommand::UploadImage(ImageUpload {
        bytes: vec![1, 2, 3],
        file_name: "a.png".to_string(),
        crop: None,
    }));
    assert_eq!(
        rx.recv_timeout(WAIT).expect("event"),
        EngineEvent::ImageUploaded {
            file_name: "a.png".to_string(),
            result: Ok("http://cdn.example.com/a.png".to_string()),
        }
    );
}

#[test]
fn comment_delete_reports_the_parent_post() {
    let (engine, rx, _api) = start();
    engine.submit(EngineCommand::DeleteComment {
        feed_id: "p1".to_string(),
        comment_id: "c4".to_string(),
    });
    match rx.recv_timeout(WAIT).expect("event") {
        EngineEvent::CommentDeleted {
            feed_id,
            comment_id,
            result,
        } => {
            assert_eq!(feed_id, "p1");
            assert_eq!(comment_id, "c4");
            assert_eq!(result.unwrap_err().kind, FailureKind::HttpStatus(404));
        }
        other => panic!("unexpected event {other:?}"),
    }
}
