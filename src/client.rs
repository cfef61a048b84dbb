//! The client side: one GET or PUT per connection, reported to an output sink.
//!
//! ```rust,no_run
//! use http10::client::HttpClient;
//! use http10::store::FileStore;
//!
//! fn main() -> http10::error::Result<()> {
//!     let mut client = HttpClient::new(std::io::stdout(), FileStore::new("."));
//!     let outcome = client.get("http://localhost:8080/test.txt")?;
//!     println!("got {}", outcome.code());
//!     Ok(())
//! }
//! ```
use crate::error::{Error, Result};
use crate::message::{ParsedMessage, ResponseOutcome, StatusDetails};
use crate::protocol::HttpRequest;
use crate::store::FileStore;
use crate::transport;
use crate::url::{has_http_scheme, HttpUrl};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

pub struct HttpClient<W: io::Write> {
    out: W,
    downloads: FileStore,
}

fn parse_url(url: &str) -> Result<HttpUrl> {
    if !has_http_scheme(url) {
        return Err(Error::InvalidUrl(url.into()));
    }
    url.parse()
}

impl<W: io::Write> HttpClient<W> {
    /// Reports are written to `out`; successful GET bodies are saved in `downloads`.
    pub fn new(out: W, downloads: FileStore) -> Self {
        HttpClient { out, downloads }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Fetches `url` and stores the body if the response is a 2xx.
    pub fn get(&mut self, url: &str) -> Result<ResponseOutcome> {
        let url = parse_url(url)?;
        let (outcome, message) = self.send(&url, &HttpRequest::get(&url))?;

        if outcome.is_success() {
            let path = self.downloads.save_download(&url, message.body())?;
            tracing::info!(path = %path.display(), bytes = message.body().len(), "saved body");
        }
        Ok(outcome)
    }

    /// Uploads the contents of `local_path` to `url`. The response body is not stored.
    pub fn put(&mut self, url: &str, local_path: &Path) -> Result<ResponseOutcome> {
        if !has_http_scheme(url) {
            return Err(Error::InvalidUrl(url.into()));
        }
        if !local_path.is_file() {
            return Err(Error::InvalidArguments(format!(
                "{} is not a file",
                local_path.display()
            )));
        }
        let body = fs::read(local_path)?;

        let url = parse_url(url)?;
        let (outcome, _) = self.send(&url, &HttpRequest::put(&url, body))?;
        Ok(outcome)
    }

    fn send(
        &mut self,
        url: &HttpUrl,
        request: &HttpRequest,
    ) -> Result<(ResponseOutcome, ParsedMessage)> {
        let bytes = request.serialize();
        writeln!(self.out, "{}", String::from_utf8_lossy(&bytes))?;

        let raw = transport::exchange(url, &bytes)?;
        let message = ParsedMessage::parse(&raw)?;
        let outcome = ResponseOutcome::from_message(&message)?;
        self.report(&outcome, &message)?;
        Ok((outcome, message))
    }

    fn report(&mut self, outcome: &ResponseOutcome, message: &ParsedMessage) -> io::Result<()> {
        writeln!(self.out, "{}", outcome.code())?;
        writeln!(self.out, "{}", outcome.server())?;
        match outcome.details() {
            StatusDetails::Success {
                last_modified,
                content_length,
            } => {
                writeln!(self.out, "{}", last_modified)?;
                writeln!(self.out, "{}", content_length)?;
            }
            StatusDetails::Redirect { location } => writeln!(self.out, "{}", location)?,
            StatusDetails::Other => {}
        }
        writeln!(self.out)?;
        writeln!(self.out, "{}", message.raw_header())?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::HttpClient;
    use crate::error::Error;
    use crate::message::{StatusDetails, NOT_SPECIFIED};
    use crate::protocol::SERVER_NAME;
    use crate::server::test_server;
    use crate::store::FileStore;
    use std::fs;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::path::Path;
    use std::thread;

    /// Starts a server over `root` which answers `requests` connections.
    fn serve(root: &Path, requests: usize) -> (u16, thread::JoinHandle<()>) {
        crate::logging::init_test_logging();
        let (port, mut server) = test_server(root).unwrap();
        let handle = thread::spawn(move || {
            for _ in 0..requests {
                server.serve_one().unwrap();
            }
        });
        (port, handle)
    }

    /// Answers one connection with `response`, whatever the request was.
    fn canned(response: &'static [u8]) -> (u16, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = vec![];
            stream.read_to_end(&mut request).unwrap();
            stream.write_all(response).unwrap();
        });
        (port, handle)
    }

    fn client(downloads: &Path) -> HttpClient<Vec<u8>> {
        HttpClient::new(vec![], FileStore::new(downloads))
    }

    #[test]
    fn get_saves_body() {
        let served = tempfile::tempdir().unwrap();
        let downloads = tempfile::tempdir().unwrap();
        fs::write(served.path().join("test.txt"), "hello").unwrap();
        let (port, handle) = serve(served.path(), 1);

        let mut client = client(downloads.path());
        let outcome = client
            .get(&format!("http://localhost:{}/test.txt", port))
            .unwrap();
        handle.join().unwrap();

        assert_eq!(outcome.code(), 200);
        assert_eq!(outcome.server(), SERVER_NAME);
        assert_eq!(
            outcome.details(),
            &StatusDetails::Success {
                last_modified: NOT_SPECIFIED.into(),
                content_length: "5".into(),
            }
        );
        assert_eq!(
            fs::read(downloads.path().join("__localhost.test.txt")).unwrap(),
            b"hello"
        );

        let output = String::from_utf8(client.into_output()).unwrap();
        assert!(output.starts_with("GET /test.txt HTTP/1.0\r\nHost: localhost\r\n"));
        let report = format!(
            "200\n{}\n{}\n5\n\nHTTP/1.0 200 OK\r\nServer: {}\r\n",
            SERVER_NAME, NOT_SPECIFIED, SERVER_NAME
        );
        assert!(output.contains(&report), "{}", output);
    }

    #[test]
    fn get_missing_saves_nothing() {
        let served = tempfile::tempdir().unwrap();
        let downloads = tempfile::tempdir().unwrap();
        let (port, handle) = serve(served.path(), 1);

        let mut client = client(downloads.path());
        let outcome = client
            .get(&format!("http://localhost:{}/missing.txt", port))
            .unwrap();
        handle.join().unwrap();

        assert_eq!(outcome.code(), 404);
        assert_eq!(outcome.details(), &StatusDetails::Other);
        assert_eq!(fs::read_dir(downloads.path()).unwrap().count(), 0);
    }

    #[test]
    fn put_uploads_file() {
        let served = tempfile::tempdir().unwrap();
        let local = tempfile::tempdir().unwrap();
        let local_file = local.path().join("upload.txt");
        fs::write(&local_file, "data").unwrap();
        let (port, handle) = serve(served.path(), 1);

        let mut client = client(local.path());
        let outcome = client
            .put(&format!("http://localhost:{}/out.txt", port), &local_file)
            .unwrap();
        handle.join().unwrap();

        assert_eq!(outcome.code(), 200);
        assert_eq!(fs::read(served.path().join("out.txt")).unwrap(), b"data");
        // Only the uploaded file itself, no stored response body.
        assert_eq!(fs::read_dir(local.path()).unwrap().count(), 1);
    }

    #[test]
    fn put_then_get_round_trip() {
        let served = tempfile::tempdir().unwrap();
        let local = tempfile::tempdir().unwrap();
        let local_file = local.path().join("upload.bin");
        let contents: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        fs::write(&local_file, &contents).unwrap();
        let (port, handle) = serve(served.path(), 2);

        let mut client = client(local.path());
        let url = format!("http://localhost:{}/copy.bin", port);
        assert_eq!(client.put(&url, &local_file).unwrap().code(), 200);
        assert_eq!(client.get(&url).unwrap().code(), 200);
        handle.join().unwrap();

        assert_eq!(
            fs::read(local.path().join("__localhost.copy.bin")).unwrap(),
            contents
        );
    }

    #[test]
    fn put_to_directory_is_rejected() {
        let served = tempfile::tempdir().unwrap();
        fs::create_dir(served.path().join("sub")).unwrap();
        let local = tempfile::tempdir().unwrap();
        let local_file = local.path().join("upload.txt");
        fs::write(&local_file, "data").unwrap();
        let (port, handle) = serve(served.path(), 1);

        let mut client = client(local.path());
        let outcome = client
            .put(&format!("http://localhost:{}/sub", port), &local_file)
            .unwrap();
        handle.join().unwrap();

        assert_eq!(outcome.code(), 606);
        assert_eq!(outcome.details(), &StatusDetails::Other);
        assert!(served.path().join("sub").is_dir());
        assert_eq!(fs::read_dir(served.path().join("sub")).unwrap().count(), 0);
    }

    #[test]
    fn put_requires_local_file() {
        let local = tempfile::tempdir().unwrap();
        let mut client = client(local.path());
        assert!(matches!(
            client.put("http://localhost:1/x", &local.path().join("missing")),
            Err(Error::InvalidArguments(_))
        ));
        assert!(matches!(
            client.put("http://localhost:1/x", local.path()),
            Err(Error::InvalidArguments(_))
        ));
        assert!(client.into_output().is_empty());
    }

    #[test]
    fn invalid_urls() {
        let local = tempfile::tempdir().unwrap();
        let local_file = local.path().join("f");
        fs::write(&local_file, "x").unwrap();
        let mut client = client(local.path());

        assert!(matches!(
            client.get("ftp://localhost/x"),
            Err(Error::InvalidUrl(_))
        ));
        assert!(matches!(
            client.get("http://bad_host/x"),
            Err(Error::InvalidUrl(_))
        ));
        assert!(matches!(
            client.put("localhost/x", &local_file),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn refused_connection() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let downloads = tempfile::tempdir().unwrap();
        let mut client = client(downloads.path());

        let error = client
            .get(&format!("http://127.0.0.1:{}/x", port))
            .unwrap_err();
        assert!(matches!(error, Error::Connection(_)));
        assert!(error.to_string().starts_with("Connection refused"));
    }

    #[test]
    fn redirect_reports_location() {
        let downloads = tempfile::tempdir().unwrap();
        let (port, handle) = canned(
            b"HTTP/1.0 302 Found\r\nServer: elsewhere/1.0\r\nLocation: http://localhost/moved.txt\r\n\r\nmoved",
        );

        let mut client = client(downloads.path());
        let outcome = client
            .get(&format!("http://localhost:{}/old.txt", port))
            .unwrap();
        handle.join().unwrap();

        assert_eq!(outcome.code(), 302);
        assert!(!outcome.is_success());
        assert_eq!(
            outcome.details(),
            &StatusDetails::Redirect {
                location: "http://localhost/moved.txt".into()
            }
        );
        assert_eq!(fs::read_dir(downloads.path()).unwrap().count(), 0);

        let output = String::from_utf8(client.into_output()).unwrap();
        assert!(output.ends_with(
            "302\nelsewhere/1.0\nhttp://localhost/moved.txt\n\n\
             HTTP/1.0 302 Found\r\nServer: elsewhere/1.0\r\nLocation: http://localhost/moved.txt\n"
        ));
    }

    #[test]
    fn redirect_without_location_is_malformed() {
        let downloads = tempfile::tempdir().unwrap();
        let (port, handle) = canned(b"HTTP/1.0 301 Moved Permanently\r\nServer: x\r\n\r\n");

        let mut client = client(downloads.path());
        let result = client.get(&format!("http://localhost:{}/old.txt", port));
        handle.join().unwrap();

        assert!(matches!(result, Err(Error::MalformedMessage(_))));
        assert_eq!(fs::read_dir(downloads.path()).unwrap().count(), 0);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn oversized_response_length_is_malformed() {
        let downloads = tempfile::tempdir().unwrap();
        let (port, handle) = canned(
            b"HTTP/1.0 200 OK\r\nContent-Length: 18446744073709551615\r\n\r\nabc",
        );

        let mut client = client(downloads.path());
        let result = client.get(&format!("http://localhost:{}/big", port));
        handle.join().unwrap();

        assert!(matches!(result, Err(Error::MalformedMessage(_))));
        assert_eq!(fs::read_dir(downloads.path()).unwrap().count(), 0);
    }
}
