use crate::error::{Error, Result};
use crate::url::HttpUrl;
use std::cmp;
use std::fmt;
use std::str;

/// Separates the header block from the body.
pub const HEADER_DELIMITER: &[u8] = b"\r\n\r\n";

pub const USER_AGENT: &str = concat!("http10/", env!("CARGO_PKG_VERSION"));
pub const SERVER_NAME: &str = concat!("http10-server/", env!("CARGO_PKG_VERSION"));
pub const CONTENT_TYPE: &str = "text/html;charset=utf-8";

/// Position of the first header delimiter in `buf`, if any.
pub fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_DELIMITER.len())
        .position(|w| w == HEADER_DELIMITER)
}

pub(crate) struct Parser<'a> {
    s: &'a str,
    position: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(s: &'a str) -> Self {
        Parser { s, position: 0 }
    }

    fn expect(&mut self, expected: &str) -> Result<()> {
        if self.position >= self.s.len() {
            return Err(Error::MalformedMessage(format!("expected '{}'", expected)));
        }

        let remaining = &self.s[self.position..];
        if !remaining.starts_with(expected) {
            let end = cmp::min(remaining.len(), expected.len());
            let actual = remaining.get(..end).unwrap_or(remaining);
            return Err(Error::MalformedMessage(format!(
                "expected '{}', got '{}'",
                expected, actual
            )));
        }
        self.position += expected.len();
        Ok(())
    }

    fn parse_digit(&mut self) -> Result<u32> {
        let c = self.s[self.position..]
            .chars()
            .next()
            .ok_or_else(|| Error::MalformedMessage("expected digit".into()))?;
        let digit = c
            .to_digit(10)
            .ok_or_else(|| Error::MalformedMessage(format!("expected digit, got '{}'", c)))?;
        self.position += c.len_utf8();
        Ok(digit)
    }

    fn parse_until(&mut self, div: &str) -> Result<&'a str> {
        let remaining = &self.s[self.position..];
        let pos = remaining.find(div).ok_or_else(|| {
            Error::MalformedMessage(format!("expected '{}' in '{}'", div, remaining))
        })?;
        self.position += pos;
        Ok(&remaining[..pos])
    }

    fn consume_whitespace(&mut self) {
        while self.s[self.position..].starts_with(' ') || self.s[self.position..].starts_with('\t')
        {
            self.position += 1
        }
    }

    pub(crate) fn parse_token(&mut self) -> Result<&'a str> {
        if self.position >= self.s.len() {
            return Err(Error::MalformedMessage("expected token".into()));
        }

        let remaining = &self.s[self.position..];
        let end = remaining.find(|c: char| c == ' ' || c == '\t').unwrap_or(remaining.len());
        let token = &remaining[..end];
        self.position += token.len();
        self.consume_whitespace();

        Ok(token)
    }

    pub(crate) fn parse_number(&mut self) -> Result<u32> {
        let token = self.parse_token()?;
        token
            .parse()
            .map_err(|_| Error::MalformedMessage(format!("expected number, got '{}'", token)))
    }

    pub(crate) fn parse_remaining(&mut self) -> &'a str {
        let remaining = &self.s[self.position..];
        self.position = self.s.len();
        remaining
    }
}

#[cfg(test)]
mod parser_tests {
    use super::Parser;

    #[test]
    fn parse_empty() {
        let mut parser = Parser::new("");
        assert!(parser.expect("a").is_err());
        assert!(parser.parse_digit().is_err());
        assert!(parser.parse_token().is_err());
    }

    #[test]
    fn expect_failure() {
        let mut parser = Parser::new("abcdefg");
        parser.expect("abc").unwrap();
        assert!(parser.expect("deg").is_err());
        parser.expect("defg").unwrap();
        assert!(parser.expect("a").is_err());
    }

    #[test]
    fn parse_token_with_lots_of_space() {
        let mut parser = Parser::new("abc  \t    def");
        assert_eq!(parser.parse_token().unwrap(), "abc");
        assert_eq!(parser.parse_token().unwrap(), "def");
        assert!(parser.parse_token().is_err());
    }

    #[test]
    fn parse_until() {
        let mut parser = Parser::new("abc_def");
        assert_eq!(parser.parse_until("_").unwrap(), "abc");
        parser.expect("_").unwrap();
        assert!(parser.parse_until("_").is_err());
    }

    #[test]
    fn parse_number() {
        let mut parser = Parser::new("123 abc");
        assert_eq!(parser.parse_number().unwrap(), 123);
        assert!(parser.parse_number().is_err());
    }

    #[test]
    fn parse_digit_rejects_multibyte() {
        let mut parser = Parser::new("é");
        assert!(parser.parse_digit().is_err());
    }

    #[test]
    fn parse_remaining() {
        let mut parser = Parser::new("123 abc");
        parser.parse_token().unwrap();
        assert_eq!(parser.parse_remaining(), "abc");
        assert_eq!(parser.parse_remaining(), "");
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HttpVersion {
    major: u32,
    minor: u32,
}

impl HttpVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        HttpVersion { major, minor }
    }

    pub fn major(&self) -> u32 {
        self.major
    }
}

impl str::FromStr for HttpVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parser = Parser::new(s);
        parser.expect("HTTP/")?;

        let major = parser.parse_digit()?;
        parser.expect(".")?;
        let minor = parser.parse_digit()?;
        if !parser.parse_remaining().is_empty() {
            return Err(Error::MalformedMessage(format!("bad version '{}'", s)));
        }
        Ok(HttpVersion::new(major, minor))
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    OK,
    BadRequest,
    NotFound,
    /// Non-standard code sent when an uploaded file could not be written.
    FileNotCreated,
    /// A 200 answering a successful upload.
    FileCreated,
}

impl HttpStatus {
    pub fn code(&self) -> u32 {
        match self {
            HttpStatus::OK => 200,
            HttpStatus::BadRequest => 400,
            HttpStatus::NotFound => 404,
            HttpStatus::FileNotCreated => 606,
            HttpStatus::FileCreated => 200,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            HttpStatus::OK => "OK",
            HttpStatus::BadRequest => "Bad Request",
            HttpStatus::NotFound => "Not Found",
            HttpStatus::FileNotCreated => "FAILED File NOT Created",
            HttpStatus::FileCreated => "OK File Created",
        }
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

#[cfg(test)]
mod http_status_tests {
    use super::HttpStatus;

    #[test]
    fn display() {
        assert_eq!(&HttpStatus::OK.to_string(), "200 OK");
        assert_eq!(&HttpStatus::NotFound.to_string(), "404 Not Found");
        assert_eq!(
            &HttpStatus::FileNotCreated.to_string(),
            "606 FAILED File NOT Created"
        );
        assert_eq!(&HttpStatus::FileCreated.to_string(), "200 OK File Created");
        assert_eq!(HttpStatus::FileCreated.code(), HttpStatus::OK.code());
    }
}

/// The two methods this crate speaks. Anything else is rejected at parse time.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum HttpMethod {
    Get,
    Put,
}

impl str::FromStr for HttpMethod {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_ref() {
            "GET" => Ok(HttpMethod::Get),
            "PUT" => Ok(HttpMethod::Put),
            _ => Err(Error::UnknownMethod(s.into())),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Put => write!(f, "PUT"),
        }
    }
}


#[derive(Debug, PartialEq, Eq, Clone)]
pub struct HttpHeader {
    key: String,
    value: String,
}

impl HttpHeader {
    pub fn new<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        HttpHeader {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl str::FromStr for HttpHeader {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parser = Parser::new(s);
        let key = parser.parse_until(":")?;
        parser.expect(": ")?;
        let value = parser.parse_remaining();

        Ok(HttpHeader::new(key, value))
    }
}

#[cfg(test)]
mod http_header_tests {
    use super::HttpHeader;

    #[test]
    fn parse_success() {
        assert_eq!(
            "key: value".parse::<HttpHeader>().unwrap(),
            HttpHeader::new("key", "value")
        );
        assert_eq!(
            "Content-Type: text/html;charset=utf-8"
                .parse::<HttpHeader>()
                .unwrap(),
            HttpHeader::new("Content-Type", "text/html;charset=utf-8")
        );
        assert_eq!(
            "Date: Mon, 01 Jan 2024 10:00:00 GMT"
                .parse::<HttpHeader>()
                .unwrap(),
            HttpHeader::new("Date", "Mon, 01 Jan 2024 10:00:00 GMT")
        );
    }

    #[test]
    fn parse_failure_no_value() {
        assert!("key".parse::<HttpHeader>().is_err());
        assert!("key:value".parse::<HttpHeader>().is_err());
    }
}

/// Headers in the order they were added or received. Names are compared exactly.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct HttpHeaders {
    headers: Vec<HttpHeader>,
}

impl HttpHeaders {
    pub fn new() -> Self {
        HttpHeaders::default()
    }

    /// Value of the first header named exactly `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.key == key)
            .map(|h| h.value.as_str())
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.headers.push(HttpHeader::new(key, value));
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn content_length(&self) -> Option<usize> {
        self.get("Content-Length")?.trim().parse().ok()
    }

    /// Builds headers from the lines following a start line. Lines which are not
    /// `Name: value` pairs are skipped.
    pub fn from_lines<'a, I: IntoIterator<Item = &'a str>>(lines: I) -> Self {
        let mut headers = vec![];
        for line in lines {
            match line.parse::<HttpHeader>() {
                Ok(header) => headers.push(header),
                Err(e) => tracing::debug!(line, error = %e, "skipping header line"),
            }
        }
        HttpHeaders::from(headers)
    }
}

impl From<Vec<HttpHeader>> for HttpHeaders {
    fn from(headers: Vec<HttpHeader>) -> Self {
        HttpHeaders { headers }
    }
}

impl fmt::Display for HttpHeaders {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for h in &self.headers {
            write!(f, "{}: {}\r\n", h.key, h.value)?;
        }
        Ok(())
    }
}


/// An outgoing request. Only GET and PUT can be built, and only PUT carries a body.
#[derive(Debug, PartialEq, Eq)]
pub struct HttpRequest {
    method: HttpMethod,
    uri: String,
    version: HttpVersion,
    headers: HttpHeaders,
    body: Option<Vec<u8>>,
}

impl HttpRequest {
    fn new(method: HttpMethod, url: &HttpUrl) -> Self {
        let mut headers = HttpHeaders::new();
        headers.insert("Host", url.host());
        headers.insert("User-Agent", USER_AGENT);
        HttpRequest {
            method,
            uri: url.path().into(),
            version: HttpVersion::new(1, 0),
            headers,
            body: None,
        }
    }

    pub fn get(url: &HttpUrl) -> Self {
        HttpRequest::new(HttpMethod::Get, url)
    }

    pub fn put<B: Into<Vec<u8>>>(url: &HttpUrl, body: B) -> Self {
        let mut request = HttpRequest::new(HttpMethod::Put, url);
        request.body = Some(body.into());
        request
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// The bytes put on the wire. A PUT body is followed by a terminating blank line.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = self.to_string().into_bytes();
        if let Some(body) = &self.body {
            out.extend_from_slice(body);
            out.extend_from_slice(HEADER_DELIMITER);
        }
        out
    }
}

/// Formats the request line and headers, without the body.
impl fmt::Display for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}\r\n", self.method, self.uri, self.version)?;
        write!(f, "{}", self.headers)?;
        write!(f, "\r\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod http_request_tests {
    use super::{HttpMethod, HttpRequest, USER_AGENT};
    use crate::url::HttpUrl;

    fn url(s: &str) -> HttpUrl {
        s.parse().unwrap()
    }

    #[test]
    fn get_has_no_body() {
        let request = HttpRequest::get(&url("http://localhost:8080/test.txt"));
        assert_eq!(request.method(), HttpMethod::Get);
        assert_eq!(request.uri(), "/test.txt");
        assert!(request.body().is_none());
        let expected = format!(
            "GET /test.txt HTTP/1.0\r\nHost: localhost\r\nUser-Agent: {}\r\n\r\n",
            USER_AGENT
        );
        assert_eq!(request.serialize(), expected.into_bytes());
    }

    #[test]
    fn put_appends_body_and_terminator() {
        let request = HttpRequest::put(&url("http://example.com/out.txt"), "data");
        let expected = format!(
            "PUT /out.txt HTTP/1.0\r\nHost: example.com\r\nUser-Agent: {}\r\n\r\ndata\r\n\r\n",
            USER_AGENT
        );
        assert_eq!(request.serialize(), expected.into_bytes());
    }

    #[test]
    fn default_path() {
        let request = HttpRequest::get(&url("http://example.com"));
        assert!(request.to_string().starts_with("GET / HTTP/1.0\r\n"));
    }
}

/// An outgoing response. The connection is always closed after it is sent.
#[derive(Debug, PartialEq, Eq)]
pub struct HttpResponse {
    version: HttpVersion,
    status: HttpStatus,
    headers: HttpHeaders,
    body: Vec<u8>,
}

impl HttpResponse {
    pub fn new<B: Into<Vec<u8>>>(status: HttpStatus, body: B) -> Self {
        let body = body.into();
        let mut headers = HttpHeaders::new();
        headers.insert("Server", SERVER_NAME);
        headers.insert("Content-Length", body.len().to_string());
        headers.insert("Connection", "close");
        headers.insert("Content-Type", CONTENT_TYPE);
        HttpResponse {
            version: HttpVersion::new(1, 0),
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> HttpStatus {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = self.to_string().into_bytes();
        out.extend_from_slice(&self.body);
        out
    }
}

/// Formats the status line and headers, without the body.
impl fmt::Display for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {}\r\n",
            self.version,
            self.status.code(),
            self.status.reason()
        )?;
        write!(f, "{}", self.headers)?;
        write!(f, "\r\n")?;
        Ok(())
    }
}
