//! Blocking socket plumbing. Every connection carries exactly one request and one response.
use crate::error::{Error, Result};
use crate::message::response_body_length;
use crate::protocol::{find_header_end, HEADER_DELIMITER};
use crate::url::HttpUrl;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

const READ_CHUNK: usize = 4096;

/// How much body follows a header block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyLength {
    Empty,
    Fixed(usize),
    UntilClose,
}

/// Reads one message: everything up to the header delimiter, then as much body as
/// `body_length` decides from the header block. Stops early if the peer closes.
///
/// Read failures are `Connection` errors. A body length that cannot be added to the
/// header size is a `MalformedMessage`.
pub fn read_message<R, F>(reader: &mut R, body_length: F) -> Result<Vec<u8>>
where
    R: Read,
    F: Fn(&str) -> BodyLength,
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];
    let mut wanted: Option<usize> = None;
    let mut header_seen = false;

    loop {
        if let Some(total) = wanted {
            if buf.len() >= total {
                buf.truncate(total);
                break;
            }
        }

        let n = match reader.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Connection(e)),
        };
        if n == 0 {
            if let Some(total) = wanted {
                tracing::warn!(expected = total, received = buf.len(), "peer closed early");
            }
            break;
        }

        // The delimiter may straddle the previous chunk.
        let scan_from = buf.len().saturating_sub(HEADER_DELIMITER.len() - 1);
        buf.extend_from_slice(&chunk[..n]);

        if !header_seen {
            if let Some(end) = find_header_end(&buf[scan_from..]) {
                header_seen = true;
                let end = scan_from + end;
                let body_start = end + HEADER_DELIMITER.len();
                wanted = match body_length(&String::from_utf8_lossy(&buf[..end])) {
                    BodyLength::Empty => Some(body_start),
                    BodyLength::Fixed(len) => Some(body_start.checked_add(len).ok_or_else(|| {
                        Error::MalformedMessage(format!("Content-Length {} is too large", len))
                    })?),
                    BodyLength::UntilClose => None,
                };
            }
        }
    }

    tracing::debug!(bytes = buf.len(), "read message");
    Ok(buf)
}

/// Sends `request` over a fresh connection and reads the response until it is complete
/// or the server closes. The write side is shut down after sending so the server can
/// read an unframed body to its end.
pub fn exchange(url: &HttpUrl, request: &[u8]) -> Result<Vec<u8>> {
    let mut stream = TcpStream::connect((url.host(), url.port())).map_err(Error::Connection)?;
    tracing::debug!(host = url.host(), port = url.port(), "connected");

    stream.write_all(request).map_err(Error::Connection)?;
    stream.flush().map_err(Error::Connection)?;
    stream.shutdown(Shutdown::Write).map_err(Error::Connection)?;

    read_message(&mut stream, response_body_length)
}
