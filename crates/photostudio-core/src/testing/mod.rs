//! Test doubles for the conversation engine.
//!
//! Provides deterministic stand-ins for the two external collaborators:
//! - [`RecordingTransport`]: records every outbound call and serves
//!   registered attachments
//! - [`ScriptedGenerator`]: returns pre-scripted generation results

mod generator;
mod transport;

pub use generator::ScriptedGenerator;
pub use transport::{Outbound, RecordingTransport};
