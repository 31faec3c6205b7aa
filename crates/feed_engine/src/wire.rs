//! JSON shapes of the feed REST API and their validated conversion into core types.
//!
//! Anything that does not fit the domain model (empty ids, bad timestamps,
//! non-URL images) rejects the whole payload as `Malformed`.

use chrono::{DateTime, Utc};
use feed_core::{validate_image_url, Comment, Draft, FeedItem, Page, UserRef, DEFAULT_IMAGE_LAYOUT};
use serde::{Deserialize, Serialize};

use crate::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserDto {
    id: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    avatar: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CountDto {
    #[serde(default)]
    comments: u32,
    #[serde(default)]
    reports: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FeedDto {
    id: String,
    user_id: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    image_layout: Option<String>,
    created_at: String,
    #[serde(default)]
    updated_at: Option<String>,
    user: UserDto,
    #[serde(rename = "_count", default)]
    count: CountDto,
    #[serde(default)]
    is_reported_by_current_user: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommentDto {
    id: String,
    feed_id: String,
    user_id: String,
    content: String,
    created_at: String,
    user: UserDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MetaDto {
    total: u64,
    page: u32,
    limit: u32,
    total_pages: u32,
    has_more: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageDto<T> {
    data: Vec<T>,
    meta: MetaDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateFeedBody<'a> {
    content: &'a str,
    images: &'a [String],
    image_layout: &'a str,
}

impl<'a> From<&'a Draft> for CreateFeedBody<'a> {
    fn from(draft: &'a Draft) -> Self {
        Self {
            content: &draft.content,
            images: &draft.images,
            image_layout: &draft.image_layout,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ReportBody<'a> {
    pub reason: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommentBody<'a> {
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadDto {
    pub url: String,
}

/// Error body of a non-success response. `message` may be a string or a list.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDto {
    #[serde(default)]
    message: Option<serde_json::Value>,
}

impl ErrorDto {
    pub fn into_message(self) -> Option<String> {
        match self.message? {
            serde_json::Value::String(text) => Some(text),
            serde_json::Value::Array(parts) => Some(
                parts
                    .iter()
                    .map(|part| match part {
                        serde_json::Value::String(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            other => Some(other.to_string()),
        }
    }
}

fn required(field: &str, value: String) -> Result<String, ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::malformed(format!("{field} is empty")))
    } else {
        Ok(value)
    }
}

fn timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|err| ApiError::malformed(format!("{field} {raw:?}: {err}")))
}

impl TryFrom<UserDto> for UserRef {
    type Error = ApiError;

    fn try_from(dto: UserDto) -> Result<Self, Self::Error> {
        Ok(UserRef {
            id: required("user.id", dto.id)?,
            username: dto.username,
            name: dto.name,
            avatar: dto.avatar.filter(|avatar| !avatar.is_empty()),
        })
    }
}

impl TryFrom<FeedDto> for FeedItem {
    type Error = ApiError;

    fn try_from(dto: FeedDto) -> Result<Self, Self::Error> {
        let id = required("feed.id", dto.id)?;
        for image in &dto.images {
            validate_image_url(image)
                .map_err(|err| ApiError::malformed(format!("feed {id}: {err}")))?;
        }
        let created_at = timestamp("feed.createdAt", &dto.created_at)?;
        let updated_at = match dto.updated_at.as_deref() {
            Some(raw) => timestamp("feed.updatedAt", raw)?,
            None => created_at,
        };
        Ok(FeedItem {
            id,
            user_id: required("feed.userId", dto.user_id)?,
            content: dto.content,
            images: dto.images,
            image_layout: dto
                .image_layout
                .filter(|layout| !layout.is_empty())
                .unwrap_or_else(|| DEFAULT_IMAGE_LAYOUT.to_string()),
            created_at,
            updated_at,
            user: dto.user.try_into()?,
            comment_count: dto.count.comments,
            report_count: dto.count.reports,
            reported_by_me: dto.is_reported_by_current_user.unwrap_or(false),
        })
    }
}

impl TryFrom<CommentDto> for Comment {
    type Error = ApiError;

    fn try_from(dto: CommentDto) -> Result<Self, Self::Error> {
        Ok(Comment {
            id: required("comment.id", dto.id)?,
            feed_id: required("comment.feedId", dto.feed_id)?,
            user_id: required("comment.userId", dto.user_id)?,
            content: dto.content,
            created_at: timestamp("comment.createdAt", &dto.created_at)?,
            user: dto.user.try_into()?,
        })
    }
}

impl<D> PageDto<D> {
    pub fn into_page<T>(self) -> Result<Page<T>, ApiError>
    where
        T: TryFrom<D, Error = ApiError>,
    {
        if self.meta.page == 0 {
            return Err(ApiError::malformed("meta.page must be 1-based"));
        }
        let items = self
            .data
            .into_iter()
            .map(T::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            page_number: self.meta.page,
            has_more: self.meta.has_more,
            total: self.meta.total,
            limit: self.meta.limit,
            total_pages: self.meta.total_pages,
        })
    }
}
