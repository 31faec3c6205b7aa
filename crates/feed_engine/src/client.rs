use std::time::Duration;

use feed_core::{Comment, Draft, FeedItem, Page, ReportReason};
use feed_logging::{feed_debug, feed_trace};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::wire::{
    CommentBody, CommentDto, CreateFeedBody, ErrorDto, FeedDto, PageDto, ReportBody, UploadDto,
};
use crate::{ApiError, FailureKind, ImageUpload, Session};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001/api/v1";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Root of the REST API, e.g. `http://host/api/v1`.
    pub base_url: String,
    /// Origin used to resolve relative upload URLs.
    pub backend_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Remote feed source plus the report, comment and upload services.
#[async_trait::async_trait]
pub trait FeedApi: Send + Sync {
    async fn list_feeds(&self, page: u32, limit: u32) -> Result<Page<FeedItem>, ApiError>;

    async fn get_feed(&self, feed_id: &str) -> Result<FeedItem, ApiError>;

    async fn create_feed(&self, draft: &Draft) -> Result<FeedItem, ApiError>;

    async fn delete_feed(&self, feed_id: &str) -> Result<(), ApiError>;

    async fn report_feed(&self, feed_id: &str, reason: &ReportReason) -> Result<(), ApiError>;

    async fn list_comments(
        &self,
        feed_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<Page<Comment>, ApiError>;

    async fn create_comment(&self, feed_id: &str, content: &str) -> Result<Comment, ApiError>;

    async fn delete_comment(&self, comment_id: &str) -> Result<(), ApiError>;

    /// Uploads an image and returns its absolute, durable URL.
    async fn upload_image(&self, upload: ImageUpload) -> Result<String, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFeedApi {
    client: reqwest::Client,
    base_url: Url,
    backend_url: Url,
    session: Session,
}

impl ReqwestFeedApi {
    pub fn new(settings: ApiSettings, session: Session) -> Result<Self, ApiError> {
        let base_url = parse_base(&settings.base_url)?;
        let backend_url = parse_base(&settings.backend_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            client,
            base_url,
            backend_url,
            session,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Attaches the bearer credential. Fails before sending when there is none.
    fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, ApiError> {
        let token = self.session.token()?;
        feed_trace!("{} {}", method, url);
        Ok(self.client.request(method, url).bearer_auth(token))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .bytes()
            .await
            .ok()
            .and_then(|body| serde_json::from_slice::<ErrorDto>(&body).ok())
            .and_then(ErrorDto::into_message)
            .unwrap_or_else(|| status.to_string());
        feed_debug!("Request failed with {}: {}", status, message);
        Err(status_error(status, message))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body).map_err(|err| ApiError::malformed(err.to_string()))
    }

    fn resolve_upload_url(&self, raw: &str) -> Result<String, ApiError> {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Ok(raw.to_string());
        }
        self.backend_url
            .join(raw)
            .map(String::from)
            .map_err(|err| ApiError::malformed(format!("upload url {raw:?}: {err}")))
    }
}

#[async_trait::async_trait]
impl FeedApi for ReqwestFeedApi {
    async fn list_feeds(&self, page: u32, limit: u32) -> Result<Page<FeedItem>, ApiError> {
        let mut url = self.endpoint(&["feeds"]);
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());
        let response = self.send(self.request(Method::GET, url)?).await?;
        Self::decode::<PageDto<FeedDto>>(response).await?.into_page()
    }

    async fn get_feed(&self, feed_id: &str) -> Result<FeedItem, ApiError> {
        let url = self.endpoint(&["feeds", feed_id]);
        let response = self.send(self.request(Method::GET, url)?).await?;
        Self::decode::<FeedDto>(response).await?.try_into()
    }

    async fn create_feed(&self, draft: &Draft) -> Result<FeedItem, ApiError> {
        let url = self.endpoint(&["feeds"]);
        let builder = self
            .request(Method::POST, url)?
            .json(&CreateFeedBody::from(draft));
        let response = self.send(builder).await?;
        Self::decode::<FeedDto>(response).await?.try_into()
    }

    async fn delete_feed(&self, feed_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["feeds", feed_id]);
        self.send(self.request(Method::DELETE, url)?).await?;
        Ok(())
    }

    async fn report_feed(&self, feed_id: &str, reason: &ReportReason) -> Result<(), ApiError> {
        let url = self.endpoint(&["reports", "feed", feed_id]);
        let builder = self.request(Method::POST, url)?.json(&ReportBody {
            reason: reason.as_str(),
        });
        self.send(builder).await?;
        Ok(())
    }

    async fn list_comments(
        &self,
        feed_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<Page<Comment>, ApiError> {
        let mut url = self.endpoint(&["comments", "feed", feed_id]);
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());
        let response = self.send(self.request(Method::GET, url)?).await?;
        Self::decode::<PageDto<CommentDto>>(response)
            .await?
            .into_page()
    }

    async fn create_comment(&self, feed_id: &str, content: &str) -> Result<Comment, ApiError> {
        let url = self.endpoint(&["comments", "feed", feed_id]);
        let builder = self
            .request(Method::POST, url)?
            .json(&CommentBody { content });
        let response = self.send(builder).await?;
        Self::decode::<CommentDto>(response).await?.try_into()
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["comments", comment_id]);
        self.send(self.request(Method::DELETE, url)?).await?;
        Ok(())
    }

    async fn upload_image(&self, upload: ImageUpload) -> Result<String, ApiError> {
        use reqwest::multipart::{Form, Part};

        let part = Part::bytes(upload.bytes).file_name(upload.file_name);
        let mut form = Form::new().part("image", part);
        let url = match upload.crop {
            Some(crop) => {
                form = form
                    .text("x", crop.x.to_string())
                    .text("y", crop.y.to_string())
                    .text("width", crop.width.to_string())
                    .text("height", crop.height.to_string());
                self.endpoint(&["upload", "crop"])
            }
            None => self.endpoint(&["upload", "image"]),
        };
        let response = self
            .send(self.request(Method::POST, url)?.multipart(form))
            .await?;
        let uploaded = Self::decode::<UploadDto>(response).await?;
        self.resolve_upload_url(&uploaded.url)
    }
}

fn parse_base(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw).map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ApiError::new(
            FailureKind::InvalidUrl,
            format!("{raw} cannot be used as a base url"),
        ));
    }
    Ok(url)
}

fn status_error(status: StatusCode, message: String) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ApiError::new(FailureKind::NotPermitted, message)
        }
        _ => ApiError::new(FailureKind::HttpStatus(status.as_u16()), message),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::malformed(err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
