//! Client side of the external story platform.
//!
//! The core sees the platform as two operations, post and delete, behind
//! [`StoryPublisher`]. Session handling and login retries live behind the gateway,
//! not here. A timeout is reported like any other failed request.

use crate::errors::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info};

/// Remote service posting and deleting story images.
#[async_trait]
pub trait StoryPublisher: Send + Sync {
    /// Uploads the image at `image_path` as a story and returns its media id.
    async fn post(&self, image_path: &Path, username: &str, password: &str) -> Result<String>;

    /// Deletes the story with `media_id`.
    async fn delete(&self, media_id: &str, username: &str, password: &str) -> Result<()>;
}

/// Publisher used when no gateway is configured; every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledStoryPublisher;

#[async_trait]
impl StoryPublisher for DisabledStoryPublisher {
    async fn post(&self, image_path: &Path, _username: &str, _password: &str) -> Result<String> {
        debug!("Story posting disabled, not posting {}", image_path.display());
        Err(Error::StoryPublisher {
            message: "story posting is not configured".to_string(),
        })
    }

    async fn delete(&self, media_id: &str, _username: &str, _password: &str) -> Result<()> {
        debug!("Story posting disabled, not deleting {}", media_id);
        Err(Error::StoryPublisher {
            message: "story posting is not configured".to_string(),
        })
    }
}

#[derive(Deserialize)]
struct PostResponse {
    media_id: String,
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

/// [`StoryPublisher`] talking to a story gateway over HTTP.
///
/// `POST {base}/stories` (multipart: `username`, `password`, `image`) answers
/// `{"media_id": "..."}`; `DELETE {base}/stories/{media_id}` takes the credentials as JSON.
#[derive(Debug, Clone)]
pub struct HttpStoryPublisher {
    client: reqwest::Client,
    base_url: String,
}

fn publisher_error(context: &str, e: &reqwest::Error) -> Error {
    let message = if e.is_timeout() {
        format!("{context}: request timed out")
    } else {
        format!("{context}: {e}")
    };
    Error::StoryPublisher { message }
}

impl HttpStoryPublisher {
    /// Builds a publisher for the gateway at `base_url`.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config {
                message: format!("Failed to build story gateway client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl StoryPublisher for HttpStoryPublisher {
    async fn post(&self, image_path: &Path, username: &str, password: &str) -> Result<String> {
        let data = tokio::fs::read(image_path).await.map_err(|e| {
            error!("Image not found: {}", image_path.display());
            Error::Storage {
                message: format!("Failed to read slide '{}': {e}", image_path.display()),
            }
        })?;
        let file_name = image_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("slide")
            .to_string();

        let form = reqwest::multipart::Form::new()
            .text("username", username.to_string())
            .text("password", password.to_string())
            .part(
                "image",
                reqwest::multipart::Part::bytes(data).file_name(file_name),
            );

        let response = self
            .client
            .post(format!("{}/stories", self.base_url))
            .multipart(form)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| publisher_error("Failed to post story", &e))?;

        let body: PostResponse = response
            .json()
            .await
            .map_err(|e| publisher_error("Malformed story gateway response", &e))?;
        info!(
            "Story {} with ID: {}, posted successfully",
            image_path.display(),
            body.media_id
        );
        Ok(body.media_id)
    }

    async fn delete(&self, media_id: &str, username: &str, password: &str) -> Result<()> {
        self.client
            .delete(format!("{}/stories/{media_id}", self.base_url))
            .json(&Credentials { username, password })
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| publisher_error("Failed to delete story", &e))?;
        info!("Story with ID {} deleted successfully", media_id);
        Ok(())
    }
}
