//! Feed engine: REST I/O and effect execution.
mod client;
mod engine;
mod session;
mod types;
mod wire;

pub use client::{ApiSettings, FeedApi, ReqwestFeedApi, DEFAULT_API_BASE_URL, DEFAULT_BACKEND_URL};
pub use engine::{ChannelEventSink, EngineCommand, EngineHandle, EventSink};
pub use session::Session;
pub use types::{ApiError, CropRect, EngineEvent, FailureKind, ImageUpload};
