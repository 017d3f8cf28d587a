//! Chat notification delivery.
//!
//! Delivery is best-effort: [`send_message`] logs failures and reports them
//! as a boolean, it never propagates them into the polling loop.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{HeraldError, Result};

/// A destination for text notifications.
pub trait Messenger {
    fn send(&self, chat_id: &str, text: &str) -> Result<()>;
}

/// Telegram Bot API `sendMessage` client.
pub struct TelegramMessenger {
    client: Client,
    send_url: String,
    display_url: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

impl TelegramMessenger {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            send_url: format!(
                "{}/bot{}/sendMessage",
                config.telegram_api_url, config.telegram_token
            ),
            // The token is part of the path; never log or report it
            display_url: format!("{}/bot<token>/sendMessage", config.telegram_api_url),
        }
    }
}

impl Messenger for TelegramMessenger {
    fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.send_url)
            .json(&SendMessage { chat_id, text })
            .send()
            .map_err(|source| HeraldError::Network {
                url: self.display_url.clone(),
                source: source.without_url(),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(HeraldError::Http {
                url: self.display_url.clone(),
                status,
            });
        }
        Ok(())
    }
}

/// Send `text` to `chat_id`, logging the outcome. Returns whether it was
/// delivered.
pub fn send_message(messenger: &dyn Messenger, chat_id: &str, text: &str) -> bool {
    match messenger.send(chat_id, text) {
        Ok(()) => {
            info!(chat_id, "message sent: {text}");
            true
        }
        Err(e) => {
            error!(chat_id, kind = e.kind(), "failed to send message: {e}");
            false
        }
    }
}
