//! Cast v2 control client
//!
//! One [`CastConnection`] per TLS connection. A reader task dispatches
//! replies to waiting requests by `requestId` and publishes media status;
//! a writer task owns the socket's write half and sends heartbeats.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpSocket, TcpStream};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::media_server::MediaServer;
use super::message::{
    CastMessage, NS_CONNECTION, NS_HEARTBEAT, NS_MEDIA, NS_RECEIVER, Payload, RECEIVER_ID,
    read_frame, write_frame,
};
use crate::playback::{CastConnector, CastSession, DeviceTarget, MediaLoad};
use crate::{Error, PlaybackError, Result};

/// App id of the Default Media Receiver
pub const DEFAULT_MEDIA_RECEIVER: &str = "CC1AD845";

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Requests awaiting a reply; `None` once the connection is gone
type Pending = Arc<Mutex<Option<HashMap<u64, oneshot::Sender<Payload>>>>>;

fn lock(pending: &Pending) -> MutexGuard<'_, Option<HashMap<u64, oneshot::Sender<Payload>>>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

fn connection_closed() -> Error {
    Error::Connection("device closed the connection".to_string())
}

enum Outgoing {
    Frame(CastMessage),
    Shutdown,
}

/// Connects to cast devices over the network
#[derive(Debug, Clone)]
pub struct CastClient {
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl Default for CastClient {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl CastClient {
    /// Create a client with default timeouts
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Time allowed for each request/reply exchange
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Time allowed for TCP connect plus TLS handshake
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[async_trait]
impl CastConnector for CastClient {
    async fn connect(&self, target: &DeviceTarget) -> Result<Box<dyn CastSession>> {
        let stream = tokio::time::timeout(self.connect_timeout, async {
            let tcp = open_tcp(target).await?;
            let local_ip = tcp.local_addr()?.ip();
            let tls = tls_connect(&target.addr, tcp).await?;
            Ok::<_, Error>((tls, local_ip))
        })
        .await
        .map_err(|_| {
            Error::Connection(format!(
                "timed out connecting to {}:{}",
                target.addr, target.port
            ))
        })?;
        let (tls, local_ip) = stream?;

        tracing::debug!(addr = %target.addr, port = target.port, %local_ip, "device connected");
        let connection = CastConnection::start(tls, local_ip, self.request_timeout);
        Ok(Box::new(connection))
    }
}

async fn open_tcp(target: &DeviceTarget) -> Result<TcpStream> {
    let candidates: Vec<SocketAddr> = tokio::net::lookup_host((target.addr.as_str(), target.port))
        .await
        .map_err(|e| Error::Connection(format!("cannot resolve {}: {e}", target.addr)))?
        .collect();

    let remote = match target.local_addr {
        Some(local) => candidates.iter().find(|a| a.is_ipv4() == local.is_ipv4()),
        None => candidates.first(),
    }
    .copied()
    .ok_or_else(|| Error::Connection(format!("no usable address for {}", target.addr)))?;

    let socket = if remote.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };

    if let Some(local) = target.local_addr {
        socket
            .bind(SocketAddr::new(local, 0))
            .map_err(|e| Error::Connection(format!("cannot bind to {local}: {e}")))?;
    }

    socket
        .connect(remote)
        .await
        .map_err(|e| Error::Connection(format!("cannot reach {remote}: {e}")))
}

async fn tls_connect(
    domain: &str,
    tcp: TcpStream,
) -> Result<tokio_native_tls::TlsStream<TcpStream>> {
    // Devices present self-signed certificates
    let connector = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()
        .map_err(|e| Error::Connection(format!("tls setup failed: {e}")))?;

    tokio_native_tls::TlsConnector::from(connector)
        .connect(domain, tcp)
        .await
        .map_err(|e| Error::Connection(format!("tls handshake with {domain} failed: {e}")))
}

/// Last media status reported by the device
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaStatus {
    /// Media session the status belongs to
    pub media_session_id: i64,
    /// `IDLE`, `BUFFERING`, `PLAYING` or `PAUSED`
    pub player_state: String,
    /// Why the player went idle (`FINISHED`, `CANCELLED`, `INTERRUPTED`, `ERROR`)
    #[serde(default)]
    pub idle_reason: Option<String>,
}

impl MediaStatus {
    /// Whether the item has stopped playing for good
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.player_state == "IDLE" && self.idle_reason.is_some()
    }

    fn from_body(body: &Value) -> Option<Self> {
        body.get("status")?
            .as_array()?
            .first()
            .and_then(|status| Self::deserialize(status).ok())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReceiverStatus {
    applications: Vec<Application>,
    volume: Option<Volume>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Application {
    app_id: String,
    session_id: String,
    transport_id: String,
}

#[derive(Debug, Deserialize)]
struct Volume {
    level: Option<f32>,
}

impl ReceiverStatus {
    fn from_reply(reply: &Payload) -> Result<Self> {
        if reply.kind != "RECEIVER_STATUS" {
            return Err(Error::Protocol(format!(
                "expected RECEIVER_STATUS, got {}",
                reply.kind
            )));
        }
        Self::deserialize(&reply.body["status"])
            .map_err(|e| Error::Protocol(format!("malformed receiver status: {e}")))
    }

    fn media_receiver(&self) -> Option<Application> {
        self.applications
            .iter()
            .find(|app| app.app_id == DEFAULT_MEDIA_RECEIVER)
            .cloned()
    }
}

/// An open control connection to one device
pub struct CastConnection {
    outgoing: mpsc::UnboundedSender<Outgoing>,
    pending: Pending,
    media_status: watch::Receiver<Option<MediaStatus>>,
    next_request_id: u64,
    request_timeout: Duration,
    local_ip: IpAddr,
    app: Option<Application>,
    media_session_id: Option<i64>,
    media_server: Option<MediaServer>,
    detach: bool,
    force_detach: bool,
    reader: JoinHandle<()>,
}

impl CastConnection {
    /// Run the protocol over an established stream
    ///
    /// `local_ip` is where the media server listens; the device must be
    /// able to reach it.
    pub fn start<S>(stream: S, local_ip: IpAddr, request_timeout: Duration) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(None);
        let pending: Pending = Arc::new(Mutex::new(Some(HashMap::new())));

        tokio::spawn(write_loop(write_half, outgoing_rx));
        let reader = tokio::spawn(read_loop(
            read_half,
            Arc::clone(&pending),
            status_tx,
            outgoing_tx.clone(),
        ));

        let connection = Self {
            outgoing: outgoing_tx,
            pending,
            media_status: status_rx,
            next_request_id: 0,
            request_timeout,
            local_ip,
            app: None,
            media_session_id: None,
            media_server: None,
            detach: false,
            force_detach: false,
            reader,
        };

        // The receiver ignores everything until a virtual connection is open
        let _ = connection.send(RECEIVER_ID, NS_CONNECTION, &json!({ "type": "CONNECT" }));
        connection
    }

    fn send(&self, destination: &str, namespace: &str, body: &Value) -> Result<()> {
        self.outgoing
            .send(Outgoing::Frame(CastMessage::json(destination, namespace, body)))
            .map_err(|_| Error::Connection("device connection closed".to_string()))
    }

    async fn request(&mut self, destination: &str, namespace: &str, mut body: Value) -> Result<Payload> {
        self.next_request_id += 1;
        let id = self.next_request_id;
        body["requestId"] = json!(id);

        let (tx, rx) = oneshot::channel();
        lock(&self.pending)
            .as_mut()
            .ok_or_else(connection_closed)?
            .insert(id, tx);
        self.send(destination, namespace, &body)?;

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(connection_closed()),
            Err(_) => {
                if let Some(waiting) = lock(&self.pending).as_mut() {
                    waiting.remove(&id);
                }
                Err(Error::Connection(format!(
                    "no reply to {} within {:?}",
                    body["type"], self.request_timeout
                )))
            }
        }
    }

    async fn receiver_status(&mut self) -> Result<ReceiverStatus> {
        let reply = self
            .request(RECEIVER_ID, NS_RECEIVER, json!({ "type": "GET_STATUS" }))
            .await?;
        ReceiverStatus::from_reply(&reply)
    }

    async fn ensure_media_receiver(&mut self) -> Result<Application> {
        if let Some(app) = &self.app {
            return Ok(app.clone());
        }

        let app = match self.receiver_status().await?.media_receiver() {
            Some(app) => app,
            None => {
                tracing::debug!(app_id = DEFAULT_MEDIA_RECEIVER, "launching media receiver");
                let reply = self
                    .request(
                        RECEIVER_ID,
                        NS_RECEIVER,
                        json!({ "type": "LAUNCH", "appId": DEFAULT_MEDIA_RECEIVER }),
                    )
                    .await?;

                if reply.kind == "LAUNCH_ERROR" {
                    return Err(PlaybackError::LoadFailed(format!(
                        "media receiver failed to launch: {}",
                        reply.body["reason"]
                    ))
                    .into());
                }

                ReceiverStatus::from_reply(&reply)?
                    .media_receiver()
                    .ok_or_else(|| Error::Protocol("media receiver did not start".to_string()))?
            }
        };

        self.send(&app.transport_id, NS_CONNECTION, &json!({ "type": "CONNECT" }))?;
        self.app = Some(app.clone());
        Ok(app)
    }
}

#[async_trait]
impl CastSession for CastConnection {
    async fn volume(&mut self) -> Result<f32> {
        self.receiver_status()
            .await?
            .volume
            .and_then(|v| v.level)
            .ok_or_else(|| Error::Protocol("receiver status has no volume level".to_string()))
    }

    async fn set_volume(&mut self, level: f32) -> Result<()> {
        let reply = self
            .request(
                RECEIVER_ID,
                NS_RECEIVER,
                json!({ "type": "SET_VOLUME", "volume": { "level": level } }),
            )
            .await?;
        ReceiverStatus::from_reply(&reply).map(|_| ())
    }

    async fn load_media(&mut self, media: &MediaLoad) -> Result<()> {
        if media.transcode {
            return Err(PlaybackError::LoadFailed("transcoding is not supported".to_string()).into());
        }
        self.detach = media.detach;
        self.force_detach = media.force_detach;

        let app = self.ensure_media_receiver().await?;
        let server = MediaServer::start(self.local_ip, &media.path).await?;

        let body = json!({
            "type": "LOAD",
            "sessionId": app.session_id,
            "autoplay": true,
            "currentTime": 0,
            "media": {
                "contentId": server.url(),
                "contentType": media.content_type,
                "streamType": "BUFFERED",
            },
        });
        self.media_server = Some(server);

        let reply = self.request(&app.transport_id, NS_MEDIA, body).await?;
        if reply.kind != "MEDIA_STATUS" {
            let reason = reply.body.get("reason").map_or_else(String::new, ToString::to_string);
            return Err(PlaybackError::LoadFailed(format!("{} {reason}", reply.kind).trim_end().to_string()).into());
        }

        let status = MediaStatus::from_body(&reply.body)
            .ok_or_else(|| Error::Protocol("LOAD reply carries no media status".to_string()))?;
        tracing::debug!(
            media_session_id = status.media_session_id,
            state = %status.player_state,
            "media loaded"
        );
        self.media_session_id = Some(status.media_session_id);
        Ok(())
    }

    async fn stop_media(&mut self) -> Result<()> {
        let (Some(app), Some(media_session_id)) = (self.app.clone(), self.media_session_id) else {
            return Ok(());
        };

        self.request(
            &app.transport_id,
            NS_MEDIA,
            json!({ "type": "STOP", "mediaSessionId": media_session_id }),
        )
        .await
        .map(|_| ())
    }

    async fn wait_media_finished(&mut self) -> Result<()> {
        let media_session_id = self
            .media_session_id
            .ok_or_else(|| Error::Protocol("no media loaded".to_string()))?;

        self.media_status
            .wait_for(|status| {
                status
                    .as_ref()
                    .is_some_and(|s| s.media_session_id == media_session_id && s.is_finished())
            })
            .await
            .map(|_| ())
            .map_err(|_| {
                Error::Connection("device closed the connection before playback finished".to_string())
            })
    }
}

impl Drop for CastConnection {
    fn drop(&mut self) {
        if !self.force_detach {
            if let Some(app) = &self.app {
                if !self.detach {
                    let _ = self.send(
                        RECEIVER_ID,
                        NS_RECEIVER,
                        &json!({
                            "type": "STOP",
                            "sessionId": app.session_id,
                            "requestId": self.next_request_id + 1,
                        }),
                    );
                }
                let _ = self.send(&app.transport_id, NS_CONNECTION, &json!({ "type": "CLOSE" }));
            }
            let _ = self.send(RECEIVER_ID, NS_CONNECTION, &json!({ "type": "CLOSE" }));
        }

        let _ = self.outgoing.send(Outgoing::Shutdown);
        self.reader.abort();
        self.media_server.take();
    }
}

async fn write_loop<W>(mut writer: W, mut outgoing: mpsc::UnboundedReceiver<Outgoing>)
where
    W: AsyncWrite + Unpin,
{
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await;

    loop {
        let message = tokio::select! {
            next = outgoing.recv() => match next {
                Some(Outgoing::Frame(message)) => message,
                Some(Outgoing::Shutdown) | None => break,
            },
            _ = heartbeat.tick() => {
                CastMessage::json(RECEIVER_ID, NS_HEARTBEAT, &json!({ "type": "PING" }))
            }
        };

        if let Err(e) = write_frame(&mut writer, &message).await {
            tracing::warn!(error = %e, "device write failed");
            break;
        }
    }

    let _ = writer.shutdown().await;
}

async fn read_loop<R>(
    mut reader: R,
    pending: Pending,
    media_status: watch::Sender<Option<MediaStatus>>,
    outgoing: mpsc::UnboundedSender<Outgoing>,
) where
    R: AsyncRead + Unpin,
{
    loop {
        let message = match read_frame(&mut reader).await {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(error = %e, "device connection ended");
                break;
            }
        };

        let payload = match message.payload() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring device message");
                continue;
            }
        };

        match (message.namespace.as_str(), payload.kind.as_str()) {
            (NS_HEARTBEAT, "PING") => {
                let pong = CastMessage::json(&message.source_id, NS_HEARTBEAT, &json!({ "type": "PONG" }));
                let _ = outgoing.send(Outgoing::Frame(pong));
                continue;
            }
            (NS_HEARTBEAT, _) => continue,
            (NS_CONNECTION, "CLOSE") => {
                tracing::debug!(source = %message.source_id, "device closed the virtual connection");
                break;
            }
            (NS_MEDIA, "MEDIA_STATUS") => {
                if let Some(status) = MediaStatus::from_body(&payload.body) {
                    tracing::trace!(?status, "media status");
                    media_status.send_replace(Some(status));
                }
            }
            _ => {}
        }

        if let Some(id) = payload.reply_to()
            && let Some(waiter) = lock(&pending).as_mut().and_then(|waiting| waiting.remove(&id))
        {
            let _ = waiter.send(payload);
        }
    }

    // Fails every outstanding request and any later one
    lock(&pending).take();
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use tokio::io::{DuplexStream, ReadHalf, WriteHalf};

    use super::*;

    /// What the fake device saw, in order
    type Seen = Arc<Mutex<Vec<(String, String)>>>;

    struct FakeDevice {
        volume: f32,
        load_reply: &'static str,
        finish: bool,
    }

    impl FakeDevice {
        fn spawn(self, stream: DuplexStream) -> Seen {
            let seen = Seen::default();
            let log = Arc::clone(&seen);
            tokio::spawn(async move {
                let (mut reader, mut writer) = tokio::io::split(stream);
                self.serve(&mut reader, &mut writer, &log).await;
            });
            seen
        }

        async fn serve(
            mut self,
            reader: &mut ReadHalf<DuplexStream>,
            writer: &mut WriteHalf<DuplexStream>,
            seen: &Seen,
        ) {
            let mut launched = false;
            while let Ok(message) = read_frame(reader).await {
                let payload = message.payload().unwrap();
                seen.lock()
                    .unwrap()
                    .push((message.namespace.clone(), payload.kind.clone()));
                let id = payload.request_id.unwrap_or(0);

                let replies = match payload.kind.as_str() {
                    "GET_STATUS" | "LAUNCH" | "SET_VOLUME" => {
                        if payload.kind == "LAUNCH" {
                            launched = true;
                        }
                        if let Some(level) = payload.body["volume"]["level"].as_f64() {
                            self.volume = level as f32;
                        }
                        let apps = if launched {
                            json!([{ "appId": DEFAULT_MEDIA_RECEIVER, "sessionId": "s-1", "transportId": "t-1" }])
                        } else {
                            json!([])
                        };
                        vec![(RECEIVER_ID, NS_RECEIVER, json!({
                            "type": "RECEIVER_STATUS",
                            "requestId": id,
                            "status": { "applications": apps, "volume": { "level": self.volume, "muted": false } },
                        }))]
                    }
                    "LOAD" => {
                        let url = payload.body["media"]["contentId"].as_str().unwrap().to_string();
                        let body = reqwest::get(&url).await.unwrap().bytes().await.unwrap();
                        assert_eq!(body.as_ref(), b"RIFFclip");

                        if self.load_reply == "MEDIA_STATUS" {
                            let mut out = vec![("t-1", NS_MEDIA, json!({
                                "type": "MEDIA_STATUS",
                                "requestId": id,
                                "status": [{ "mediaSessionId": 4, "playerState": "BUFFERING" }],
                            }))];
                            if self.finish {
                                out.push(("t-1", NS_MEDIA, json!({
                                    "type": "MEDIA_STATUS",
                                    "requestId": 0,
                                    "status": [{ "mediaSessionId": 4, "playerState": "IDLE", "idleReason": "FINISHED" }],
                                })));
                            }
                            out
                        } else {
                            vec![("t-1", NS_MEDIA, json!({ "type": self.load_reply, "requestId": id }))]
                        }
                    }
                    "STOP" if message.namespace == NS_MEDIA => vec![("t-1", NS_MEDIA, json!({
                        "type": "MEDIA_STATUS",
                        "requestId": id,
                        "status": [{ "mediaSessionId": 4, "playerState": "IDLE", "idleReason": "CANCELLED" }],
                    }))],
                    _ => Vec::new(),
                };

                for (source, namespace, body) in replies {
                    let mut reply = CastMessage::json("sender-0", namespace, &body);
                    reply.source_id = source.to_string();
                    write_frame(writer, &reply).await.unwrap();
                }
            }
        }
    }

    fn connect(device: FakeDevice) -> (CastConnection, Seen) {
        let (client_end, device_end) = tokio::io::duplex(64 * 1024);
        let seen = device.spawn(device_end);
        let connection = CastConnection::start(
            client_end,
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            Duration::from_secs(5),
        );
        (connection, seen)
    }

    fn clip() -> (tempfile::TempDir, MediaLoad) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("GoogleHomeSound0.wav");
        std::fs::write(&path, b"RIFFclip").unwrap();
        let media = MediaLoad::wav(&path, false, false);
        (dir, media)
    }

    fn kinds(seen: &Seen) -> Vec<String> {
        seen.lock().unwrap().iter().map(|(_, kind)| kind.clone()).collect()
    }

    #[tokio::test]
    async fn plays_a_clip_to_completion_and_closes() {
        let (mut connection, seen) = connect(FakeDevice {
            volume: 0.3,
            load_reply: "MEDIA_STATUS",
            finish: true,
        });
        let (_dir, media) = clip();

        assert!((connection.volume().await.unwrap() - 0.3).abs() < f32::EPSILON);
        connection.set_volume(0.5).await.unwrap();
        assert!((connection.volume().await.unwrap() - 0.5).abs() < f32::EPSILON);

        connection.load_media(&media).await.unwrap();
        connection.wait_media_finished().await.unwrap();
        drop(connection);

        // Let the writer flush the teardown frames
        tokio::time::sleep(Duration::from_millis(50)).await;

        let kinds = kinds(&seen);
        assert_eq!(kinds.first().map(String::as_str), Some("CONNECT"));
        assert!(kinds.contains(&"LAUNCH".to_string()));
        assert!(kinds.contains(&"LOAD".to_string()));
        assert!(kinds.ends_with(&["STOP".to_string(), "CLOSE".to_string(), "CLOSE".to_string()]));
    }

    #[tokio::test]
    async fn rejected_load_is_a_load_failure() {
        let (mut connection, _seen) = connect(FakeDevice {
            volume: 0.3,
            load_reply: "LOAD_FAILED",
            finish: false,
        });
        let (_dir, media) = clip();

        let err = connection.load_media(&media).await.unwrap_err();
        assert!(matches!(err, Error::Playback(PlaybackError::LoadFailed(ref msg)) if msg.contains("LOAD_FAILED")));
    }

    #[tokio::test]
    async fn stop_media_ends_the_wait() {
        let (mut connection, _seen) = connect(FakeDevice {
            volume: 0.3,
            load_reply: "MEDIA_STATUS",
            finish: false,
        });
        let (_dir, media) = clip();

        connection.load_media(&media).await.unwrap();
        connection.stop_media().await.unwrap();
        connection.wait_media_finished().await.unwrap();
    }

    #[tokio::test]
    async fn force_detach_sends_no_teardown() {
        let (mut connection, seen) = connect(FakeDevice {
            volume: 0.3,
            load_reply: "MEDIA_STATUS",
            finish: true,
        });
        let (_dir, clip) = clip();
        let media = MediaLoad {
            force_detach: true,
            ..clip
        };

        connection.load_media(&media).await.unwrap();
        connection.wait_media_finished().await.unwrap();
        drop(connection);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!kinds(&seen).contains(&"CLOSE".to_string()));
    }

    #[tokio::test]
    async fn device_hangup_fails_pending_requests() {
        let (client_end, device_end) = tokio::io::duplex(1024);
        drop(device_end);
        let mut connection = CastConnection::start(
            client_end,
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            Duration::from_secs(5),
        );

        let err = connection.volume().await.unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }

    #[test]
    fn idle_without_reason_is_not_finished() {
        let status = MediaStatus {
            media_session_id: 1,
            player_state: "IDLE".to_string(),
            idle_reason: None,
        };
        assert!(!status.is_finished());
    }
}
