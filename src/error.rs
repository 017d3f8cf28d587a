//! Error types for herald.
//!
//! Every failure the polling loop can observe is one of these variants. The
//! `Display` text is what ends up in the chat, so it is written for the
//! recipient rather than for the log.

use reqwest::StatusCode;

/// Errors produced while fetching, validating, or delivering review status.
#[derive(Debug, thiserror::Error)]
pub enum HeraldError {
    /// Connection failure, timeout, or a body that could not be read.
    #[error("Ошибка соединения с {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with something other than 200 OK.
    #[error("Эндпоинт {url} недоступен. Код ответа API: {}", .status.as_u16())]
    Http { url: String, status: StatusCode },

    /// The response body is not valid JSON.
    #[error("Ответ не содержит валидный JSON: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },

    /// The payload is JSON but not the shape the API promises.
    #[error("{0}")]
    Shape(String),

    /// A required environment variable is missing or blank.
    #[error("Отсутствует обязательная переменная окружения: {name}")]
    Config { name: &'static str },
}

impl HeraldError {
    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape(message.into())
    }

    /// Short tag for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Http { .. } => "http",
            Self::Parse { .. } => "parse",
            Self::Shape(_) => "shape",
            Self::Config { .. } => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, HeraldError>;
