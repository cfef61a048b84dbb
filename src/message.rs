//! Parsing of received messages: responses on the client side and requests on the server side.
use crate::error::{Error, Result};
use crate::protocol::{find_header_end, HttpHeaders, HttpMethod, HttpVersion, Parser, HEADER_DELIMITER};
use crate::transport::BodyLength;
use std::str;

/// Substituted for `Last-Modified` or `Content-Length` when a 2xx response omits them.
pub const NOT_SPECIFIED: &str = "NOT SPECIFIED!";
pub const UNKNOWN_SERVER: &str = "Unknown";

/// A received message, split on the first header delimiter.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ParsedMessage {
    start_line: String,
    headers: HttpHeaders,
    raw_header: String,
    body: Vec<u8>,
}

fn split_header(raw_header: &str) -> (&str, HttpHeaders) {
    let mut lines = raw_header.split("\r\n");
    let start_line = lines.next().unwrap_or_default();
    (start_line, HttpHeaders::from_lines(lines))
}

impl ParsedMessage {
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let end = find_header_end(raw)
            .ok_or_else(|| Error::MalformedMessage("missing header delimiter".into()))?;
        let raw_header = str::from_utf8(&raw[..end])
            .map_err(|e| Error::MalformedMessage(format!("header is not utf-8: {}", e)))?;
        let (start_line, headers) = split_header(raw_header);

        Ok(ParsedMessage {
            start_line: start_line.into(),
            headers,
            raw_header: raw_header.into(),
            body: raw[end + HEADER_DELIMITER.len()..].to_vec(),
        })
    }

    pub fn start_line(&self) -> &str {
        &self.start_line
    }

    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// Everything before the delimiter, start line included.
    pub fn raw_header(&self) -> &str {
        &self.raw_header
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Status code from an `HTTP/1.x <code> ...` status line.
    pub fn status_code(&self) -> Result<u32> {
        let mut parser = Parser::new(&self.start_line);
        let version: HttpVersion = parser.parse_token()?.parse()?;
        if version.major() != 1 {
            return Err(Error::MalformedMessage(format!(
                "unsupported version in '{}'",
                self.start_line
            )));
        }
        parser.parse_number()
    }

    pub fn server(&self) -> &str {
        self.header("Server").unwrap_or(UNKNOWN_SERVER)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum StatusDetails {
    Success {
        last_modified: String,
        content_length: String,
    },
    Redirect {
        location: String,
    },
    Other,
}

/// What the client reports about a response.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ResponseOutcome {
    code: u32,
    server: String,
    details: StatusDetails,
}

impl ResponseOutcome {
    pub fn from_message(message: &ParsedMessage) -> Result<Self> {
        let code = message.status_code()?;
        let optional = |key: &str| message.header(key).unwrap_or(NOT_SPECIFIED).to_string();

        let details = match code {
            200..=299 => StatusDetails::Success {
                last_modified: optional("Last-Modified"),
                content_length: optional("Content-Length"),
            },
            300..=399 => StatusDetails::Redirect {
                location: message
                    .header("Location")
                    .ok_or_else(|| {
                        Error::MalformedMessage(format!("{} response without Location", code))
                    })?
                    .into(),
            },
            _ => StatusDetails::Other,
        };

        Ok(ResponseOutcome {
            code,
            server: message.server().into(),
            details,
        })
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn details(&self) -> &StatusDetails {
        &self.details
    }

    pub fn is_success(&self) -> bool {
        matches!(self.details, StatusDetails::Success { .. })
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RequestLine {
    method: HttpMethod,
    path: String,
}

impl RequestLine {
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl str::FromStr for RequestLine {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parser = Parser::new(s);
        let method = parser.parse_token()?.parse()?;
        let path = parser.parse_token()?;
        let version = parser.parse_token()?;
        if !version.starts_with("HTTP") {
            return Err(Error::MalformedMessage(format!("bad request line '{}'", s)));
        }

        Ok(RequestLine {
            method,
            path: path.into(),
        })
    }
}

/// A request received by the server.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct IncomingRequest {
    line: RequestLine,
    message: ParsedMessage,
}

impl IncomingRequest {
    /// The method is checked before the rest of the message, so an unknown method is
    /// reported as such even when the message is otherwise malformed. An empty request
    /// has no method token and is only malformed.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let line_end = raw
            .windows(2)
            .position(|w| w == b"\r\n")
            .unwrap_or(raw.len());
        let first_line = String::from_utf8_lossy(&raw[..line_end]);
        let mut parser = Parser::new(&first_line);
        if let Ok(token) = parser.parse_token() {
            token.parse::<HttpMethod>()?;
        }

        let message = ParsedMessage::parse(raw)?;
        let line = message.start_line().parse()?;
        Ok(IncomingRequest { line, message })
    }

    pub fn method(&self) -> HttpMethod {
        self.line.method()
    }

    pub fn path(&self) -> &str {
        self.line.path()
    }

    pub fn message(&self) -> &ParsedMessage {
        &self.message
    }

    /// The uploaded content of a PUT. Without a `Content-Length` the body ends with a
    /// blank line terminator, which is not part of the content.
    pub fn upload(&self) -> &[u8] {
        let body = self.message.body();
        match self.message.headers().content_length() {
            Some(n) => &body[..n.min(body.len())],
            None => body.strip_suffix(HEADER_DELIMITER).unwrap_or(body),
        }
    }
}

/// Body framing of a response with the given header block.
pub fn response_body_length(raw_header: &str) -> BodyLength {
    let (_, headers) = split_header(raw_header);
    match headers.content_length() {
        Some(n) => BodyLength::Fixed(n),
        None => BodyLength::UntilClose,
    }
}

/// Body framing of a request with the given header block. A GET without
/// `Content-Length` has no body.
pub fn request_body_length(raw_header: &str) -> BodyLength {
    let (start_line, headers) = split_header(raw_header);
    if let Some(n) = headers.content_length() {
        return BodyLength::Fixed(n);
    }
    let method = Parser::new(start_line)
        .parse_token()
        .and_then(|token| token.parse::<HttpMethod>());
    match method {
        Ok(HttpMethod::Put) => BodyLength::UntilClose,
        _ => BodyLength::Empty,
    }
}
