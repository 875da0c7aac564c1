//! Slack channel adapter using Socket Mode
//!
//! Events arrive over a websocket opened with the app-level token; replies
//! and lookups go through the Web API with the bot token. Only `app_mention`
//! events are turned into text.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::mention::{self, UserDirectory};
use super::{Channel, IncomingText, SUCCESS_REPLY};
use crate::config::SlackSettings;
use crate::{Error, Result};

const SLACK_API_URL: &str = "https://slack.com/api";

/// First wait after a failed reconnect (doubles each attempt)
pub const INITIAL_RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Longest wait between reconnect attempts
pub const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

type SlackSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Slack API response wrapper
#[derive(Debug, Deserialize)]
struct SlackResponse<T> {
    ok: bool,
    error: Option<String>,
    #[serde(flatten)]
    data: Option<T>,
}

/// Auth test response
#[derive(Debug, Deserialize)]
struct AuthTestResponse {
    user_id: String,
    team: String,
    bot_id: Option<String>,
}

/// Socket Mode connection response
#[derive(Debug, Deserialize)]
struct ConnectionsOpenResponse {
    url: String,
}

/// User info response
#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    user: SlackUser,
}

#[derive(Debug, Deserialize)]
struct SlackUser {
    name: String,
}

/// Chat post message request
#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon_emoji: Option<&'a str>,
}

/// Identity of the bot user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    /// User id mentions of the bot carry
    pub user_id: String,
    /// Workspace name
    pub team: String,
}

/// Slack Web API client
#[derive(Debug, Clone)]
pub struct SlackApi {
    client: reqwest::Client,
    bot_token: String,
    base_url: String,
}

impl SlackApi {
    /// Create a client for the public Slack API
    #[must_use]
    pub fn new(bot_token: String) -> Self {
        Self::with_base_url(bot_token, SLACK_API_URL.to_string())
    }

    /// Create a client for another API root
    #[must_use]
    pub fn with_base_url(bot_token: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            bot_token,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Channel(format!("Slack {method} request failed: {e}")))?;

        let body: SlackResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::Channel(format!("Slack {method} parse error: {e}")))?;

        if !body.ok {
            return Err(Error::Channel(format!(
                "Slack {method} failed: {}",
                body.error.unwrap_or_default()
            )));
        }

        body.data
            .ok_or_else(|| Error::Channel(format!("Slack {method} returned no data")))
    }

    /// Identify the bot
    ///
    /// # Errors
    ///
    /// Returns [`Error::Channel`] if the token is rejected
    pub async fn auth_test(&self) -> Result<BotIdentity> {
        let request = self
            .client
            .post(format!("{}/auth.test", self.base_url))
            .bearer_auth(&self.bot_token);
        let auth: AuthTestResponse = self.call("auth.test", request).await?;

        tracing::info!(
            user_id = %auth.user_id,
            team = %auth.team,
            bot_id = ?auth.bot_id,
            "Slack authenticated"
        );

        Ok(BotIdentity {
            user_id: auth.user_id,
            team: auth.team,
        })
    }

    /// Get a Socket Mode websocket URL
    ///
    /// # Errors
    ///
    /// Returns [`Error::Channel`] if the app-level token is rejected
    pub async fn open_connection(&self, app_token: &str) -> Result<String> {
        let request = self
            .client
            .post(format!("{}/apps.connections.open", self.base_url))
            .bearer_auth(app_token);
        let open: ConnectionsOpenResponse = self.call("apps.connections.open", request).await?;
        Ok(open.url)
    }

    /// Post `text` to `channel`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Channel`] if the message is rejected
    pub async fn post_message(&self, channel: &str, text: &str, icon_emoji: Option<&str>) -> Result<()> {
        let request = self
            .client
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(&self.bot_token)
            .json(&PostMessageRequest {
                channel,
                text,
                icon_emoji,
            });
        let _: serde_json::Value = self.call("chat.postMessage", request).await?;

        tracing::debug!(channel = %channel, "Slack message sent");
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for SlackApi {
    async fn user_name(&self, user_id: &str) -> Result<String> {
        let request = self
            .client
            .get(format!("{}/users.info", self.base_url))
            .bearer_auth(&self.bot_token)
            .query(&[("user", user_id)]);
        let info: UserInfoResponse = self.call("users.info", request).await?;
        Ok(info.user.name)
    }
}

/// Socket Mode envelope
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    envelope_id: Option<String>,
    payload: Option<serde_json::Value>,
    reason: Option<String>,
}

/// Events API callback carried by an `events_api` envelope
#[derive(Debug, Deserialize)]
struct EventCallback {
    event: SlackEventType,
}

/// Slack event types
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum SlackEventType {
    /// App mention
    #[serde(rename = "app_mention")]
    AppMention(SlackMentionEvent),
    /// Other events (ignored)
    #[serde(other)]
    Other,
}

/// Slack app mention event
#[derive(Debug, Deserialize)]
struct SlackMentionEvent {
    channel: String,
    user: Option<String>,
    #[serde(default)]
    text: String,
}

/// Slack channel adapter
pub struct SlackChannel {
    api: SlackApi,
    app_token: String,
    icon: String,
    bot_user_id: Option<String>,
    socket: Option<SlackSocket>,
    reconnect_delay: Duration,
}

impl SlackChannel {
    /// Create a Slack channel from its settings
    #[must_use]
    pub fn new(settings: &SlackSettings) -> Self {
        Self::with_api(
            SlackApi::new(settings.token.clone()),
            settings.app_level_token.clone(),
            settings.icon.clone(),
        )
    }

    /// Create a Slack channel over a given API client
    #[must_use]
    pub const fn with_api(api: SlackApi, app_token: String, icon: String) -> Self {
        Self {
            api,
            app_token,
            icon,
            bot_user_id: None,
            socket: None,
            reconnect_delay: INITIAL_RECONNECT_DELAY,
        }
    }

    /// Set the first wait after a failed reconnect
    #[must_use]
    pub const fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    async fn open_socket(&mut self) -> Result<()> {
        let url = self.api.open_connection(&self.app_token).await?;
        let (socket, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| Error::Channel(format!("Slack websocket connect failed: {e}")))?;

        self.socket = Some(socket);
        tracing::info!("start websocket connection with Slack");
        Ok(())
    }

    /// Reopen the socket after a drop, backing off until Slack accepts
    async fn reconnect(&mut self) {
        let mut delay = self.reconnect_delay;
        let mut attempt: u32 = 1;

        while let Err(e) = self.open_socket().await {
            tracing::warn!(
                error = %e,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Slack reconnect failed, retrying"
            );
            tokio::time::sleep(delay).await;
            delay = delay.saturating_mul(2).min(MAX_RECONNECT_DELAY);
            attempt = attempt.saturating_add(1);
        }
    }

    /// Turn an `events_api` payload into text, if it is a mention
    async fn mention_text(&self, payload: serde_json::Value) -> Option<IncomingText> {
        let callback: EventCallback = match serde_json::from_value(payload) {
            Ok(callback) => callback,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring Slack event payload");
                return None;
            }
        };

        let SlackEventType::AppMention(event) = callback.event else {
            return None;
        };

        let text = mention::prepare_text(&event.text, self.bot_user_id.as_deref(), &self.api).await;
        if text.is_empty() {
            tracing::debug!(channel = %event.channel, "empty mention ignored");
            return None;
        }

        Some(IncomingText {
            text,
            channel_id: Some(event.channel),
            sender_id: event.user,
        })
    }
}

#[async_trait]
impl Channel for SlackChannel {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn connect(&mut self) -> Result<()> {
        let identity = self.api.auth_test().await?;
        self.bot_user_id = Some(identity.user_id);
        self.open_socket().await?;
        tracing::info!("Slack channel connected");
        Ok(())
    }

    async fn next_text(&mut self) -> Result<Option<IncomingText>> {
        loop {
            if self.socket.is_none() {
                self.reconnect().await;
            }
            let Some(socket) = self.socket.as_mut() else {
                continue;
            };

            let frame = match socket.next().await {
                Some(Ok(Message::Text(frame))) => frame,
                Some(Ok(Message::Close(_))) | None => {
                    tracing::warn!("Slack websocket closed, reconnecting");
                    self.socket = None;
                    continue;
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Slack websocket error, reconnecting");
                    self.socket = None;
                    continue;
                }
            };

            let envelope: Envelope = match serde_json::from_str(frame.as_str()) {
                Ok(envelope) => envelope,
                Err(e) => {
                    tracing::warn!(error = %e, "unparsable Slack envelope");
                    continue;
                }
            };

            if let Some(id) = &envelope.envelope_id {
                let ack = serde_json::json!({ "envelope_id": id }).to_string();
                if let Err(e) = socket.send(Message::Text(ack.into())).await {
                    tracing::warn!(error = %e, "failed to acknowledge Slack envelope");
                }
            }

            match envelope.kind.as_str() {
                "hello" => tracing::debug!("Slack socket ready"),
                "disconnect" => {
                    tracing::info!(reason = ?envelope.reason, "Slack asked to reconnect");
                    self.socket = None;
                }
                "events_api" => {
                    if let Some(payload) = envelope.payload
                        && let Some(incoming) = self.mention_text(payload).await
                    {
                        return Ok(Some(incoming));
                    }
                }
                other => tracing::debug!(kind = other, "ignoring Slack envelope"),
            }
        }
    }

    async fn acknowledge(&mut self, incoming: &IncomingText, outcome: &Result<()>) -> Result<()> {
        let Some(channel) = incoming.channel_id.as_deref() else {
            return Ok(());
        };

        let text = match outcome {
            Ok(()) => SUCCESS_REPLY.to_string(),
            Err(e) => e.to_string(),
        };
        let icon = (!self.icon.is_empty()).then_some(self.icon.as_str());

        self.api.post_message(channel, &text, icon).await
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut socket) = self.socket.take() {
            let _ = socket.close(None).await;
        }
        tracing::info!("Slack channel disconnected");
        Ok(())
    }
}
