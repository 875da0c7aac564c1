//! Cast v2 device control
//!
//! Network implementation of [`crate::playback::CastConnector`]: TLS to the
//! device's control port, protobuf framing, JSON control messages, and a
//! short-lived HTTP server the device pulls the clip from.

mod client;
mod media_server;
pub mod message;

pub use client::{CastClient, CastConnection, DEFAULT_MEDIA_RECEIVER, MediaStatus};
pub use media_server::MediaServer;
