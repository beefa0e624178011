//! Minimal STOMP 1.2 text framing for talking to the chat broker.
//!
//! Only the handful of commands the client needs are built here; decoding is
//! generic over the command so unexpected frames can be logged and skipped.

pub const STOMP_VERSION: &str = "1.2";
pub const CMD_CONNECT: &str = "CONNECT";
pub const CMD_CONNECTED: &str = "CONNECTED";
pub const CMD_SUBSCRIBE: &str = "SUBSCRIBE";
pub const CMD_SEND: &str = "SEND";
pub const CMD_MESSAGE: &str = "MESSAGE";
pub const CMD_ERROR: &str = "ERROR";
pub const CMD_RECEIPT: &str = "RECEIPT";

const FRAME_TERMINATOR: char = '\0';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StompError {
    #[error("frame is missing its NUL terminator")]
    Unterminated,
    #[error("frame has no command line")]
    MissingCommand,
    #[error("malformed header line {0:?}")]
    MalformedHeader(String),
    #[error("invalid escape sequence in header {0:?}")]
    InvalidEscape(String),
    #[error("content-length {declared} exceeds body of {available} bytes")]
    ContentLength { declared: usize, available: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StompFrame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl StompFrame {
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn connect(host: &str) -> Self {
        Self::new(CMD_CONNECT)
            .header("accept-version", STOMP_VERSION)
            .header("host", host)
            .header("heart-beat", "0,0")
    }

    #[must_use]
    pub fn subscribe(id: &str, destination: &str) -> Self {
        Self::new(CMD_SUBSCRIBE)
            .header("id", id)
            .header("destination", destination)
    }

    #[must_use]
    pub fn send(destination: &str, json_body: impl Into<String>) -> Self {
        Self::new(CMD_SEND)
            .header("destination", destination)
            .header("content-type", "application/json")
            .body(json_body)
    }

    /// First value of a header, as STOMP 1.2 says repeated headers resolve.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn encode(&self) -> String {
        let escape = self.command != CMD_CONNECT && self.command != CMD_CONNECTED;
        let mut out = String::with_capacity(self.command.len() + self.body.len() + 64);
        out.push_str(&self.command);
        out.push('\n');
        for (name, value) in &self.headers {
            if escape {
                out.push_str(&escape_header(name));
                out.push(':');
                out.push_str(&escape_header(value));
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        if !self.body.is_empty() && self.header_value("content-length").is_none() {
            out.push_str(&format!("content-length:{}\n", self.body.len()));
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push(FRAME_TERMINATOR);
        out
    }

    /// Decode one frame. Returns `Ok(None)` for a heart-beat (bare EOLs).
    pub fn decode(raw: &str) -> Result<Option<Self>, StompError> {
        let trimmed = raw.trim_start_matches(['\r', '\n']);
        if trimmed.is_empty() {
            return Ok(None);
        }

        let (head, rest) = split_head(trimmed).ok_or(StompError::Unterminated)?;

        let mut lines = head.lines();
        let command = lines
            .next()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .ok_or(StompError::MissingCommand)?
            .to_string();
        let unescape = command != CMD_CONNECT && command != CMD_CONNECTED;

        let mut headers = Vec::new();
        for line in lines {
            let line = line.trim_end_matches('\r');
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| StompError::MalformedHeader(line.to_string()))?;
            if unescape {
                headers.push((unescape_header(name)?, unescape_header(value)?));
            } else {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        let declared_length = headers
            .iter()
            .find(|(name, _)| name == "content-length")
            .and_then(|(_, value)| value.trim().parse::<usize>().ok());

        let body = match declared_length {
            Some(length) => {
                let body = rest.get(..length).ok_or(StompError::ContentLength {
                    declared: length,
                    available: rest.len(),
                })?;
                if !rest[length..].starts_with(FRAME_TERMINATOR) {
                    return Err(StompError::Unterminated);
                }
                body
            }
            None => {
                let end = rest.find(FRAME_TERMINATOR).ok_or(StompError::Unterminated)?;
                &rest[..end]
            }
        };

        Ok(Some(Self {
            command,
            headers,
            body: body.to_string(),
        }))
    }
}

/// Split at the first blank line, whichever line ending it uses.
fn split_head(raw: &str) -> Option<(&str, &str)> {
    let lf = raw.find("\n\n").map(|at| (at, 2));
    let crlf = raw.find("\r\n\r\n").map(|at| (at, 4));
    let (at, len) = match (lf, crlf) {
        (Some(lf), Some(crlf)) => lf.min(crlf),
        (found, None) | (None, found) => found?,
    };
    Some((&raw[..at], &raw[at + len..]))
}

fn escape_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_header(raw: &str) -> Result<String, StompError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            _ => return Err(StompError::InvalidEscape(raw.to_string())),
        }
    }
    Ok(out)
}
