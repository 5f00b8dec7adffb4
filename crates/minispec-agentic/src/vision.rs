//! Perception boundary
//!
//! The detector is an external collaborator: it takes a camera frame and
//! returns detected objects with normalized bounding boxes, and can be
//! restricted to a custom class list for open-vocabulary targets. The
//! engine treats every detection result as a read-only snapshot.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Normalized bounding box, all coordinates in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn center(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    pub fn size(&self) -> (f64, f64) {
        (self.x2 - self.x1, self.y2 - self.y1)
    }
}

/// One detected object. Field names follow the detector's JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub name: String,
    pub confidence: f64,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

/// Source of camera frames (robot I/O, not owned by the engine).
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Latest camera frame as encoded JPEG bytes.
    async fn latest_frame(&self) -> Result<Vec<u8>>;
}

/// The object detection service.
#[async_trait]
pub trait VisionService: Send + Sync {
    /// Run detection on one frame.
    async fn detect(&self, image_jpeg: &[u8]) -> Result<Vec<DetectedObject>>;

    /// Restrict detection to a custom class list; empty list resets to the
    /// default vocabulary.
    async fn set_classes(&self, names: &[String]) -> Result<()>;
}

/// HTTP client for a detection service.
pub struct HttpVisionClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpVisionClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Deserialize)]
struct DetectResponse {
    result: Vec<DetectedObject>,
}

#[async_trait]
impl VisionService for HttpVisionClient {
    async fn detect(&self, image_jpeg: &[u8]) -> Result<Vec<DetectedObject>> {
        let response = self
            .client
            .post(format!("{}/detect", self.base_url))
            .header("Content-Type", "application/octet-stream")
            .body(image_jpeg.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("detection service error {}: {}", status, body));
        }

        let detected: DetectResponse = response.json().await?;
        tracing::debug!(objects = detected.result.len(), "detection complete");
        Ok(detected.result)
    }

    async fn set_classes(&self, names: &[String]) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/set-classes", self.base_url))
            .json(&serde_json::json!({ "class_names": names }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(anyhow!("set-classes failed with status {}", status));
        }
        Ok(())
    }
}

/// HTTP client fetching the latest camera frame from the robot bridge.
pub struct HttpFrameSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFrameSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl FrameSource for HttpFrameSource {
    async fn latest_frame(&self) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(format!("{}/frame", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("frame fetch failed with status {}", response.status()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}
