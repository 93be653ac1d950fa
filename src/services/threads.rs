//! Threads Graph API client and the publisher built on top of it

use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;
use tokio::time::{Duration, sleep};

use crate::constants::{
    IMAGE_PROCESSING_WAIT_SECS, THREADS_API_BASE, THREADS_REFRESH_URL, VIDEO_PROCESSING_WAIT_SECS,
};
use crate::cycle::Publisher;
use crate::services::media::{MediaKind, MediaResolver, ResolvedMedia, has_media};
use crate::services::session::Session;

#[derive(Clone)]
pub struct ThreadsClient {
    http: Client,
    base_url: String,
}

impl ThreadsClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
            base_url: THREADS_API_BASE.to_string(),
        }
    }

    /// Step 1 of the publish protocol: create a content container.
    ///
    /// Returns the container id to pass to `publish_container`. The
    /// container is not visible on Threads until published.
    pub async fn create_container(
        &self,
        session: &Session,
        text: &str,
        media: Option<&ResolvedMedia>,
        reply_to: Option<&str>,
    ) -> Result<String, ThreadsError> {
        let url = format!("{}/{}/threads", self.base_url, session.user_id);

        let mut params: Vec<(&str, String)> = vec![
            ("text", text.to_string()),
            ("access_token", session.access_token.clone()),
        ];

        match media {
            Some(media) => {
                params.push(("media_type", media.kind.as_str().to_string()));
                let url_param = match media.kind {
                    MediaKind::Video => "video_url",
                    MediaKind::Image => "image_url",
                };
                params.push((url_param, media.url.clone()));
            }
            None => params.push(("media_type", "TEXT".to_string())),
        }

        if let Some(parent_id) = reply_to {
            params.push(("reply_to_id", parent_id.to_string()));
        }

        let resp = self.http.post(&url).form(&params).send().await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(ThreadsError::Api(text));
        }

        let container: ContainerResponse = resp.json().await?;
        Ok(container.id)
    }

    /// Step 2 of the publish protocol: make a container visible.
    /// Returns the final post id.
    pub async fn publish_container(
        &self,
        session: &Session,
        container_id: &str,
    ) -> Result<String, ThreadsError> {
        let url = format!("{}/{}/threads_publish", self.base_url, session.user_id);

        let params = [
            ("creation_id", container_id),
            ("access_token", &session.access_token),
        ];

        let resp = self.http.post(&url).form(&params).send().await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(ThreadsError::Api(text));
        }

        let post: ContainerResponse = resp.json().await?;
        Ok(post.id)
    }

    /// Exchange the current long-lived token for a fresh one.
    pub async fn refresh_access_token(
        &self,
        access_token: &str,
    ) -> Result<RefreshedToken, ThreadsError> {
        let params = [
            ("grant_type", "th_refresh_token"),
            ("access_token", access_token),
        ];

        let resp = self
            .http
            .get(THREADS_REFRESH_URL)
            .query(&params)
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(ThreadsError::Api(text));
        }

        let token: RefreshedToken = resp.json().await?;
        Ok(token)
    }
}

#[derive(Debug, Deserialize)]
struct ContainerResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshedToken {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug)]
pub enum ThreadsError {
    Http(reqwest::Error),
    Api(String),
}

impl From<reqwest::Error> for ThreadsError {
    fn from(e: reqwest::Error) -> Self {
        ThreadsError::Http(e)
    }
}

impl std::fmt::Display for ThreadsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThreadsError::Http(e) => write!(f, "HTTP error: {}", e),
            ThreadsError::Api(s) => write!(f, "Threads API error: {}", s),
        }
    }
}

impl std::error::Error for ThreadsError {}

/// Publishes one post end to end: resolve media, create the container,
/// wait out remote processing, publish.
pub struct ThreadsPublisher {
    client: ThreadsClient,
    resolver: MediaResolver,
    session: Session,
}

impl ThreadsPublisher {
    pub fn new(client: ThreadsClient, resolver: MediaResolver, session: Session) -> Self {
        Self {
            client,
            resolver,
            session,
        }
    }

    /// Resolve the row's media, degrading to text-only on any media
    /// problem. A bad media path never fails the post.
    async fn resolve_media(&self, media_path: Option<&str>) -> Option<ResolvedMedia> {
        if !has_media(media_path) {
            return None;
        }
        let path = media_path?;
        match self.resolver.resolve(path).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!("media upload failed for {}: {}; posting text-only", path, e);
                None
            }
        }
    }
}

impl Publisher for ThreadsPublisher {
    async fn publish(
        &self,
        text: &str,
        media_path: Option<&str>,
        reply_to: Option<&str>,
    ) -> Result<String, ThreadsError> {
        let media = self.resolve_media(media_path).await;

        let container_id = self
            .client
            .create_container(&self.session, text, media.as_ref(), reply_to)
            .await?;
        info!("created container {}", container_id);

        // Remote media processing is asynchronous; publishing too early
        // returns a transient error from the API.
        let wait_secs = match media.as_ref().map(|m| m.kind) {
            Some(MediaKind::Video) => VIDEO_PROCESSING_WAIT_SECS,
            Some(MediaKind::Image) => IMAGE_PROCESSING_WAIT_SECS,
            None => 0,
        };
        if wait_secs > 0 {
            info!("waiting {}s for media processing", wait_secs);
            sleep(Duration::from_secs(wait_secs)).await;
        }

        self.client
            .publish_container(&self.session, &container_id)
            .await
    }
}
