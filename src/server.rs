//! A sequential HTTP/1.0 server. One connection is accepted, read, answered and closed
//! before the next is accepted.
//!
//! # File Server Example
//! ```rust,no_run
//! use std::net;
//!
//! use http10::server::{FileHandler, HttpServer};
//! use http10::store::FileStore;
//!
//! fn main() -> http10::error::Result<()> {
//!     let socket = net::TcpListener::bind("127.0.0.1:8080")?;
//!     let handler = FileHandler::new(FileStore::new(std::env::current_dir()?));
//!     let mut server = HttpServer::new(socket, handler);
//!     server.serve_forever()?;
//!     Ok(())
//! }
//! ```
use crate::error::{Error, Result};
use crate::message::{request_body_length, IncomingRequest};
use crate::protocol::{HttpMethod, HttpResponse, HttpStatus};
use crate::store::FileStore;
use crate::transport;
use std::convert::Infallible;
use std::io::{self, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};

impl From<Error> for HttpResponse {
    fn from(error: Error) -> Self {
        match error {
            Error::FileWrite(_) => HttpResponse::new(HttpStatus::FileNotCreated, "File NOT Created"),
            e => HttpResponse::new(HttpStatus::BadRequest, e.to_string()),
        }
    }
}

/// Represents the ability to accept a new connection.
pub trait Listen {
    type Stream: io::Read + io::Write;
    fn accept(&self) -> io::Result<(Self::Stream, SocketAddr)>;
}

impl Listen for TcpListener {
    type Stream = TcpStream;
    fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self)
    }
}

/// Represents the ability to service GET and PUT requests.
pub trait HttpRequestHandler {
    type Error: Into<HttpResponse>;

    fn get(&mut self, uri: &str) -> std::result::Result<HttpResponse, Self::Error>;

    fn put(&mut self, uri: &str, body: &[u8]) -> std::result::Result<HttpResponse, Self::Error>;
}

/// Serves and stores files under a `FileStore` root.
pub struct FileHandler {
    store: FileStore,
}

impl FileHandler {
    pub fn new(store: FileStore) -> Self {
        FileHandler { store }
    }
}

impl HttpRequestHandler for FileHandler {
    type Error = Error;

    fn get(&mut self, uri: &str) -> Result<HttpResponse> {
        match self.store.read(uri) {
            Ok(Some(contents)) => Ok(HttpResponse::new(HttpStatus::OK, contents)),
            Ok(None) => Ok(HttpResponse::new(HttpStatus::NotFound, "404 Not Found")),
            Err(e) => {
                tracing::warn!(uri, error = %e, "could not read file");
                Ok(HttpResponse::new(HttpStatus::NotFound, "404 Not Found"))
            }
        }
    }

    fn put(&mut self, uri: &str, body: &[u8]) -> Result<HttpResponse> {
        let path = self.store.write(uri, body).map_err(|e| {
            tracing::warn!(uri, error = %e, "upload failed");
            e
        })?;
        tracing::info!(path = %path.display(), bytes = body.len(), "stored upload");
        Ok(HttpResponse::new(HttpStatus::FileCreated, "File Created"))
    }
}

pub struct HttpServer<L: Listen, H: HttpRequestHandler> {
    connection_stream: L,
    request_handler: H,
}

impl<L: Listen, H: HttpRequestHandler> HttpServer<L, H> {
    pub fn new(connection_stream: L, request_handler: H) -> Self {
        HttpServer {
            connection_stream,
            request_handler,
        }
    }

    /// Accept one connection, answer its request and close it.
    ///
    /// A request with an unknown method is returned as an error without a response.
    pub fn serve_one(&mut self) -> Result<()> {
        let (mut stream, peer) = self
            .connection_stream
            .accept()
            .map_err(Error::Connection)?;
        let request = transport::read_message(&mut stream, request_body_length)
            .and_then(|raw| IncomingRequest::parse(&raw));

        let response = match request {
            Ok(request) => {
                println!("{}:{}:{}", peer.ip(), peer.port(), request.method());
                println!("{}", request.message().raw_header());
                self.dispatch(&request)
            }
            Err(e @ Error::Connection(_)) => return Err(e),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!(%peer, error = %e, "rejecting request");
                e.into()
            }
        };

        tracing::info!(%peer, status = %response.status(), "responding");
        stream
            .write_all(&response.serialize())
            .and_then(|()| stream.flush())
            .map_err(Error::Connection)
    }

    fn dispatch(&mut self, request: &IncomingRequest) -> HttpResponse {
        match request.method() {
            HttpMethod::Get => self.request_handler.get(request.path()),
            HttpMethod::Put => self.request_handler.put(request.path(), request.upload()),
        }
        .unwrap_or_else(Into::into)
    }

    /// Run `serve_one` in a loop until a fatal error. Errors on a single connection are
    /// logged and the loop carries on.
    pub fn serve_forever(&mut self) -> Result<Infallible> {
        loop {
            match self.serve_one() {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => tracing::error!(error = %e, "connection failed"),
            }
        }
    }
}

#[cfg(test)]
pub fn test_server(
    root: &std::path::Path,
) -> Result<(u16, HttpServer<TcpListener, FileHandler>)> {
    let server_socket = TcpListener::bind("127.0.0.1:0")?;
    let server_address = server_socket.local_addr()?;
    let handler = FileHandler::new(FileStore::new(root));
    let server = HttpServer::new(server_socket, handler);

    Ok((server_address.port(), server))
}
