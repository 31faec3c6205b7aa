use chrono::{DateTime, Utc};

use crate::FeedError;

pub type FeedId = String;
pub type CommentId = String;

pub const DEFAULT_IMAGE_LAYOUT: &str = "grid";
pub const DEFAULT_REPORT_REASON: &str = "Other";

/// Anything the accumulator can hold: items are identified by a server-assigned key.
pub trait Keyed {
    fn key(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub id: String,
    pub username: String,
    pub name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub id: FeedId,
    pub user_id: String,
    pub content: String,
    pub images: Vec<String>,
    pub image_layout: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: UserRef,
    pub comment_count: u32,
    pub report_count: u32,
    pub reported_by_me: bool,
}

impl Keyed for FeedItem {
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    pub feed_id: FeedId,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub user: UserRef,
}

impl Keyed for Comment {
    fn key(&self) -> &str {
        &self.id
    }
}

/// One server page. `page_number` is 1-based; page 1 is the authoritative top snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub has_more: bool,
    pub total: u64,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn is_first(&self) -> bool {
        self.page_number == 1
    }
}

/// A post the user wants to publish. Images are URLs that were already uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub content: String,
    pub images: Vec<String>,
    pub image_layout: String,
}

impl Draft {
    pub fn new(content: impl Into<String>, images: Vec<String>) -> Self {
        Self {
            content: content.into(),
            images,
            image_layout: DEFAULT_IMAGE_LAYOUT.to_string(),
        }
    }

    /// Rejects drafts the server would refuse before anything leaves the client.
    pub fn validate(&self) -> Result<(), FeedError> {
        if self.content.trim().is_empty() && self.images.is_empty() {
            return Err(FeedError::Validation(
                "a post needs text or at least one image".to_string(),
            ));
        }
        for image in &self.images {
            validate_image_url(image)?;
        }
        Ok(())
    }
}

pub fn validate_image_url(raw: &str) -> Result<(), FeedError> {
    let parsed = url::Url::parse(raw)
        .map_err(|err| FeedError::Validation(format!("image url {raw:?}: {err}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(FeedError::Validation(format!(
            "image url {raw:?} has unsupported scheme {other}"
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportReason(String);

impl ReportReason {
    pub fn new(reason: Option<&str>) -> Self {
        match reason.map(str::trim) {
            Some(text) if !text.is_empty() => Self(text.to_string()),
            _ => Self(DEFAULT_REPORT_REASON.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ReportReason {
    fn default() -> Self {
        Self::new(None)
    }
}
