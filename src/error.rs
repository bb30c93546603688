use std::{error::Error as StdError, fmt};
use thiserror::Error;

const BODY_PREVIEW_LIMIT: usize = 512;

/// Rejected task input. Blocks submission; nothing is sent or stored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title and description are required")]
    MissingTitleAndDescription,
    #[error("title is required")]
    MissingTitle,
    #[error("description is required")]
    MissingDescription,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Request,
    Body,
    Decode,
    Status,
    Unknown,
}

impl TransportErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Request => "request",
            Self::Body => "body",
            Self::Decode => "decode",
            Self::Status => "status",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A call to the task service did not complete with a 2xx response.
#[derive(Debug)]
pub struct TransportError {
    kind: TransportErrorKind,
    method: &'static str,
    url: String,
    status: Option<u16>,
    message: String,
    source: Option<reqwest::Error>,
}

impl TransportError {
    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, method: &'static str, url: &str) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_request() {
            TransportErrorKind::Request
        } else if err.is_body() {
            TransportErrorKind::Body
        } else if err.is_decode() {
            TransportErrorKind::Decode
        } else {
            TransportErrorKind::Unknown
        };
        Self {
            kind,
            method,
            url: url.to_string(),
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
            source: Some(err),
        }
    }

    pub(crate) fn invalid_url(url: &str, message: String) -> Self {
        Self {
            kind: TransportErrorKind::Request,
            method: "BUILD",
            url: url.to_string(),
            status: None,
            message: format!("invalid service URL: {message}"),
            source: None,
        }
    }

    pub(crate) fn status_error(method: &'static str, url: &str, status: u16, body: &str) -> Self {
        Self {
            kind: TransportErrorKind::Status,
            method,
            url: url.to_string(),
            status: Some(status),
            message: preview_body(body),
            source: None,
        }
    }

    pub(crate) fn decode_error(
        method: &'static str,
        url: &str,
        status: u16,
        err: serde_json::Error,
        body: &str,
    ) -> Self {
        Self {
            kind: TransportErrorKind::Decode,
            method,
            url: url.to_string(),
            status: Some(status),
            message: format!(
                "failed to decode response body: {} | body={}",
                err,
                preview_body(body)
            ),
            source: None,
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} failed kind={}", self.method, self.url, self.kind)?;
        if let Some(status) = self.status {
            write!(f, " status={}", status)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|err| err as &(dyn StdError + 'static))
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("config error: {0}")]
    Config(String),
    #[error("terminal error: {0}")]
    Terminal(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Transport(_) => 3,
            _ => 1,
        }
    }
}

fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    let mut out: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();
    if trimmed.chars().nth(BODY_PREVIEW_LIMIT).is_some() {
        out.push_str("...");
    }
    out
}
