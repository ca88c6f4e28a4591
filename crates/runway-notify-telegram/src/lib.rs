// # Telegram Notification Transport
//
// This crate delivers runway alerts through the Telegram Bot API.
//
// ## Behavior
//
// - One HTTP request per `send` (the dispatcher owns fan-out and concurrency)
// - HTTP timeout configured (30 seconds)
// - Specific error messages for HTTP status codes (400, 401, 403, 404, 429, 5xx)
// - A 2xx response with `"ok": false` is still a failure
// - Dry-run mode logs the message instead of sending it
// - No retries: a failed delivery is reported and dropped
//
// ## Security Requirements
//
// - Bot token NEVER appears in logs, errors or `Debug` output
// - Transport fails fast if the token is empty
//
// ## API Reference
//
// - Telegram Bot API: https://core.telegram.org/bots/api
// - Send Message: POST `/bot<token>/sendMessage` with `{"chat_id", "text"}`

use async_trait::async_trait;
use runway_core::ComponentRegistry;
use runway_core::config::TransportConfig;
use runway_core::traits::{NotificationTransport, NotificationTransportFactory};
use runway_core::{Error, Result};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

/// Telegram Bot API base URL
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API transport
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, `send` logs the recipient and text and returns
/// success without contacting Telegram.
///
/// # Security
///
/// The Debug implementation does NOT expose the bot token.
pub struct TelegramTransport {
    /// Bot token issued by BotFather
    /// ⚠️ NEVER log this value
    bot_token: String,

    /// API base URL, without trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Log instead of sending
    dry_run: bool,
}

impl std::fmt::Debug for TelegramTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramTransport")
            .field("bot_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl TelegramTransport {
    /// Create a new Telegram transport
    ///
    /// # Parameters
    ///
    /// - `bot_token`: Bot token issued by BotFather
    /// - `api_base`: API base URL override (defaults to https://api.telegram.org)
    /// - `dry_run`: If true, log messages instead of sending them
    pub fn new(bot_token: impl Into<String>, api_base: Option<String>, dry_run: bool) -> Result<Self> {
        let bot_token = bot_token.into();
        if bot_token.is_empty() {
            return Err(Error::config("Telegram bot token cannot be empty"));
        }

        let api_base = api_base
            .filter(|base| !base.is_empty())
            .unwrap_or_else(|| TELEGRAM_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            bot_token,
            api_base,
            client,
            dry_run,
        })
    }

    /// Create a new Telegram transport in dry-run mode
    pub fn new_dry_run(bot_token: impl Into<String>) -> Result<Self> {
        Self::new(bot_token, None, true)
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// `sendMessage` endpoint (contains the token, never log it)
    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }

    /// Request body for `sendMessage`
    ///
    /// Numeric recipient ids are sent as numbers, anything else (such as
    /// `@channelname`) as a string.
    fn send_message_body(recipient_id: &str, text: &str) -> Value {
        let chat_id = match recipient_id.parse::<i64>() {
            Ok(id) => json!(id),
            Err(_) => json!(recipient_id),
        };
        json!({
            "chat_id": chat_id,
            "text": text,
        })
    }
}

#[async_trait]
impl NotificationTransport for TelegramTransport {
    async fn send(&self, recipient_id: &str, text: &str) -> Result<()> {
        if self.dry_run {
            tracing::info!("[DRY-RUN] Would send to chat {}: {}", recipient_id, text);
            return Ok(());
        }

        tracing::debug!("Sending message to chat {}", recipient_id);

        let response = self
            .client
            .post(self.send_message_url())
            .json(&Self::send_message_body(recipient_id, text))
            .send()
            .await
            // The URL carries the token
            .map_err(|e| Error::transport(format!("HTTP request failed: {}", e.without_url())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response".to_string());

        let parsed: Option<ApiResponse> = serde_json::from_str(&body).ok();
        let description = parsed
            .as_ref()
            .and_then(|r| r.description.clone())
            .unwrap_or_else(|| body.clone());

        if !status.is_success() {
            return match status.as_u16() {
                400 => Err(Error::transport(format!(
                    "Bad request for chat {}. Status: {} - {}",
                    recipient_id, status, description
                ))),
                401 | 404 => Err(Error::transport(format!(
                    "Authentication failed: Invalid bot token. Status: {}",
                    status
                ))),
                403 => Err(Error::transport(format!(
                    "Bot cannot message chat {}. Status: {} - {}",
                    recipient_id, status, description
                ))),
                429 => Err(Error::transport(format!(
                    "Rate limit exceeded. Status: {} - {}",
                    status, description
                ))),
                500..=599 => Err(Error::transport(format!(
                    "Telegram server error (transient): {} - {}",
                    status, description
                ))),
                _ => Err(Error::transport(format!(
                    "sendMessage failed: {} - {}",
                    status, description
                ))),
            };
        }

        match parsed {
            Some(ApiResponse { ok: true, .. }) => {
                tracing::debug!("Message delivered to chat {}", recipient_id);
                Ok(())
            }
            Some(ApiResponse { ok: false, .. }) => Err(Error::transport(format!(
                "Telegram rejected message for chat {}: {}",
                recipient_id, description
            ))),
            None => Err(Error::transport(format!(
                "Invalid response format from Telegram. Status: {}",
                status
            ))),
        }
    }

    fn transport_name(&self) -> &'static str {
        "telegram"
    }
}

/// Factory for creating Telegram transports
pub struct TelegramFactory;

impl NotificationTransportFactory for TelegramFactory {
    fn create(&self, config: &TransportConfig) -> Result<Box<dyn NotificationTransport>> {
        match config {
            TransportConfig::Telegram {
                bot_token,
                api_base,
                dry_run,
            } => {
                if bot_token.is_empty() {
                    return Err(Error::config("Telegram bot token is required"));
                }

                // Check for dry-run mode environment variable
                let dry_run = *dry_run
                    || std::env::var("RUNWAY_MODE")
                        .unwrap_or_default()
                        .eq_ignore_ascii_case("dry-run");

                if dry_run {
                    tracing::warn!(
                        "Telegram transport running in DRY-RUN mode - no messages will be sent"
                    );
                }

                Ok(Box::new(TelegramTransport::new(
                    bot_token.clone(),
                    api_base.clone(),
                    dry_run,
                )?))
            }
            _ => Err(Error::config("Invalid config for Telegram transport")),
        }
    }
}

/// Register the Telegram transport with a registry
///
/// # Example
///
/// ```rust
/// use runway_core::ComponentRegistry;
///
/// let registry = ComponentRegistry::new();
/// runway_notify_telegram::register(&registry);
/// assert!(registry.has_transport("telegram"));
/// ```
pub fn register(registry: &ComponentRegistry) {
    registry.register_transport("telegram", Box::new(TelegramFactory));
}
