//! Gemini image generation backend for Photostudio
//!
//! Implements [`photostudio_proto::ImageGenerator`] on top of the Gemini
//! `generateContent` REST endpoint. Images travel as base64 `inlineData`
//! parts; the first image part of the answer is the result.
//!
//! ```no_run
//! use photostudio_gemini::GeminiClient;
//! use photostudio_proto::{GenerationRequest, ImageGenerator, ImagePayload};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GeminiClient::from_env()?;
//!     let face = ImagePayload::jpeg(std::fs::read("face.jpg")?);
//!     let request = GenerationRequest::new("Turn this into an oil painting", vec![face]);
//!
//!     match client.generate(&request).await {
//!         Ok(image) => std::fs::write("out.png", &image.data)?,
//!         Err(failure) => eprintln!("generation failed: {failure}"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod types;

pub use api::{GeminiClient, SYSTEM_INSTRUCTION};
pub use config::GeminiConfig;
pub use error::{GeminiError, Result};
