use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// MIME type of compressed chat photos.
pub const JPEG_MIME: &str = "image/jpeg";

/// Image bytes plus their MIME type.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: Bytes,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn jpeg(data: impl Into<Bytes>) -> Self {
        Self::new(JPEG_MIME, data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// Keeps image bytes out of logs.
impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Content-safety strictness requested from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SafetyPolicy {
    /// Disable every category filter the backend allows disabling.
    #[default]
    Permissive,
    /// Leave the backend defaults in place.
    BackendDefault,
}

/// One round trip to the image backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub images: Vec<ImagePayload>,
    pub safety: SafetyPolicy,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, images: Vec<ImagePayload>) -> Self {
        Self {
            prompt: prompt.into(),
            images,
            safety: SafetyPolicy::Permissive,
        }
    }
}

/// Why a generation produced no image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationFailure {
    /// The call succeeded but no image part came back (usually a safety rejection).
    #[error("backend returned no image")]
    NoImageReturned,

    /// Transport, auth or quota failure.
    #[error("backend error: {0}")]
    BackendError(String),

    /// The backend refuses to serve the caller's locale.
    #[error("backend is unavailable in this region")]
    RegionRestricted,

    /// The configured model does not exist.
    #[error("model not found")]
    ModelNotFound,
}

/// Outcome of a generation: the produced image or the failure reason.
pub type GenerationResult = Result<ImagePayload, GenerationFailure>;

/// The image-producing backend.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Run one generation. Never panics on backend errors; every failure is a
    /// [`GenerationFailure`].
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_image_bytes() {
        let payload = ImagePayload::jpeg(vec![1u8, 2, 3]);
        let rendered = format!("{payload:?}");
        assert!(rendered.contains("len: 3"));
        assert!(!rendered.contains("[1, 2, 3]"));
    }

    #[test]
    fn new_request_defaults_to_permissive() {
        let request = GenerationRequest::new("prompt", vec![]);
        assert_eq!(request.safety, SafetyPolicy::Permissive);
    }

    #[test]
    fn failure_messages_do_not_echo_inputs() {
        assert_eq!(
            GenerationFailure::RegionRestricted.to_string(),
            "backend is unavailable in this region"
        );
    }
}
