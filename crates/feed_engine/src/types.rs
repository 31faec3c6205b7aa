use std::fmt;

use feed_core::{Comment, CommentId, FeedId, FeedItem, Generation, MutationId, Page};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    PageFetched {
        generation: Generation,
        result: Result<Page<FeedItem>, ApiError>,
    },
    CommentsFetched {
        generation: Generation,
        result: Result<Page<Comment>, ApiError>,
    },
    /// A fetch was cancelled before the server answered.
    Cancelled { generation: Generation },
    PostCreated {
        mutation_id: MutationId,
        result: Result<FeedItem, ApiError>,
    },
    PostDeleted {
        mutation_id: MutationId,
        result: Result<(), ApiError>,
    },
    Reported {
        feed_id: FeedId,
        result: Result<(), ApiError>,
    },
    CommentPosted {
        feed_id: FeedId,
        result: Result<Comment, ApiError>,
    },
    CommentDeleted {
        feed_id: FeedId,
        comment_id: CommentId,
        result: Result<(), ApiError>,
    },
    ItemFetched {
        feed_id: FeedId,
        result: Result<FeedItem, ApiError>,
    },
    ImageUploaded {
        file_name: String,
        result: Result<String, ApiError>,
    },
}

/// Server-side crop applied by `/upload/crop`, in source image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub crop: Option<CropRect>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Malformed, message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    /// No bearer credential, or the server refused it.
    NotPermitted,
    HttpStatus(u16),
    Timeout,
    Network,
    /// The payload did not match the expected shape.
    Malformed,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::NotPermitted => write!(f, "not permitted"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Malformed => write!(f, "malformed payload"),
        }
    }
}
