//! Cast v2 wire format
//!
//! Every frame is a 4-byte big-endian length followed by a protobuf
//! `CastMessage`. Control traffic uses UTF-8 JSON payloads.

use prost::Message;
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{Error, Result};

/// Largest frame a device sends or accepts
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Our endpoint id
pub const SENDER_ID: &str = "sender-0";

/// The device's platform endpoint id
pub const RECEIVER_ID: &str = "receiver-0";

/// Virtual connection namespace
pub const NS_CONNECTION: &str = "urn:x-cast:com.google.cast.tp.connection";

/// Keep-alive namespace
pub const NS_HEARTBEAT: &str = "urn:x-cast:com.google.cast.tp.heartbeat";

/// Receiver platform namespace (apps, volume)
pub const NS_RECEIVER: &str = "urn:x-cast:com.google.cast.receiver";

/// Media control namespace
pub const NS_MEDIA: &str = "urn:x-cast:com.google.cast.media";

/// Protocol version field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ProtocolVersion {
    /// The only version in use
    Castv210 = 0,
}

/// Payload encoding field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum PayloadType {
    /// `payload_utf8` is set
    Utf8 = 0,
    /// `payload_binary` is set
    Binary = 1,
}

/// One Cast v2 message
#[derive(Clone, PartialEq, prost::Message)]
pub struct CastMessage {
    #[prost(enumeration = "ProtocolVersion", required, tag = "1")]
    pub protocol_version: i32,
    #[prost(string, required, tag = "2")]
    pub source_id: String,
    #[prost(string, required, tag = "3")]
    pub destination_id: String,
    #[prost(string, required, tag = "4")]
    pub namespace: String,
    #[prost(enumeration = "PayloadType", required, tag = "5")]
    pub payload_type: i32,
    #[prost(string, optional, tag = "6")]
    pub payload_utf8: Option<String>,
    #[prost(bytes = "vec", optional, tag = "7")]
    pub payload_binary: Option<Vec<u8>>,
}

impl CastMessage {
    /// A JSON message from us to `destination`
    #[must_use]
    pub fn json(destination: &str, namespace: &str, payload: &serde_json::Value) -> Self {
        Self {
            protocol_version: ProtocolVersion::Castv210 as i32,
            source_id: SENDER_ID.to_string(),
            destination_id: destination.to_string(),
            namespace: namespace.to_string(),
            payload_type: PayloadType::Utf8 as i32,
            payload_utf8: Some(payload.to_string()),
            payload_binary: None,
        }
    }

    /// Parse the UTF-8 payload as JSON
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] for binary or malformed payloads
    pub fn payload(&self) -> Result<Payload> {
        let text = self
            .payload_utf8
            .as_deref()
            .ok_or_else(|| Error::Protocol(format!("binary payload on {}", self.namespace)))?;
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| Error::Protocol(format!("invalid json on {}: {e}", self.namespace)))?;
        let header = Header::deserialize(&value)
            .map_err(|e| Error::Protocol(format!("untyped payload on {}: {e}", self.namespace)))?;

        Ok(Payload {
            kind: header.kind,
            request_id: header.request_id,
            body: value,
        })
    }
}

#[derive(Deserialize)]
struct Header {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "requestId", default)]
    request_id: Option<u64>,
}

/// A decoded JSON payload
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    /// The `type` field, e.g. `RECEIVER_STATUS`
    pub kind: String,
    /// The `requestId` field; absent or 0 for unsolicited messages
    pub request_id: Option<u64>,
    /// The full payload
    pub body: serde_json::Value,
}

impl Payload {
    /// Request id this payload answers, if any
    #[must_use]
    pub fn reply_to(&self) -> Option<u64> {
        self.request_id.filter(|id| *id != 0)
    }
}

/// Write one length-prefixed frame
///
/// # Errors
///
/// Returns [`Error::Protocol`] for oversized messages, [`Error::Io`] on write failure
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, message: &CastMessage) -> Result<()> {
    let body = message.encode_to_vec();
    let len = u32::try_from(body.len())
        .ok()
        .filter(|len| *len as usize <= MAX_FRAME_LEN)
        .ok_or_else(|| Error::Protocol(format!("frame of {} bytes is too large", body.len())))?;

    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame
///
/// # Errors
///
/// Returns [`Error::Io`] on read failure or EOF, [`Error::Protocol`] for
/// oversized or undecodable frames
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<CastMessage> {
    let mut len = [0u8; 4];
    reader.read_exact(&mut len).await?;
    let len = u32::from_be_bytes(len) as usize;

    if len > MAX_FRAME_LEN {
        return Err(Error::Protocol(format!("frame of {len} bytes is too large")));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;

    CastMessage::decode(body.as_slice())
        .map_err(|e| Error::Protocol(format!("undecodable frame: {e}")))
}
