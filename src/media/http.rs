//! HTTP client for a remote media-understanding service.

use super::{MediaAnalysis, MediaService};
use crate::config::MediaSettings;
use crate::error::{Result, ScrubError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    video_id: &'a str,
}

/// Media service reached over HTTP at `<base_url>/generate-transcript`.
pub struct HttpMediaService {
    client: Client,
    endpoint: url::Url,
    api_key: Option<String>,
}

impl HttpMediaService {
    /// Create a client from media settings.
    pub fn new(settings: &MediaSettings) -> Result<Self> {
        let mut base = url::Url::parse(&settings.base_url).map_err(|e| {
            ScrubError::Config(format!("Invalid media.base_url {:?}: {}", settings.base_url, e))
        })?;
        // Treat the base as a directory so join() appends instead of replacing
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join("generate-transcript")
            .map_err(|e| ScrubError::Config(format!("Invalid media endpoint: {}", e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ScrubError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key: settings.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    /// The URL analysis requests are sent to.
    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }
}

/// Parse a media service response body.
fn parse_response(body: &str) -> Result<MediaAnalysis> {
    serde_json::from_str(body)
        .map_err(|e| ScrubError::Ingestion(format!("Malformed media service response: {}", e)))
}

#[async_trait]
impl MediaService for HttpMediaService {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn analyze(&self, video_id: &str) -> Result<MediaAnalysis> {
        info!("Requesting analysis of video {}", video_id);

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .json(&AnalyzeRequest { video_id });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ScrubError::Ingestion(format!("Media service request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ScrubError::Ingestion(format!("Failed to read media service response: {}", e)))?;

        if !status.is_success() {
            return Err(ScrubError::Ingestion(format!(
                "Media service responded with {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let analysis = parse_response(&body)?;
        debug!("Media service returned {} chunks", analysis.chunks.len());
        Ok(analysis)
    }
}
