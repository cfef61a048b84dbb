//! Local files behind the client's downloads and the server's GET and PUT handlers.
//!
//! Request paths are resolved under a root directory without any sandboxing, so a path
//! such as `/../x` escapes the root. Writes always create or truncate.
use crate::error::{Error, Result};
use crate::url::HttpUrl;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        FileStore { root: root.into() }
    }

    pub fn resolve(&self, request_path: &str) -> PathBuf {
        self.root.join(request_path.trim_start_matches('/'))
    }

    /// Contents of the regular file at `request_path`, or `None` if there is none.
    pub fn read(&self, request_path: &str) -> Result<Option<Vec<u8>>> {
        let path = self.resolve(request_path);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(fs::read(path)?))
    }

    pub fn write(&self, request_path: &str, contents: &[u8]) -> Result<PathBuf> {
        let path = self.resolve(request_path);
        fs::write(&path, contents).map_err(Error::FileWrite)?;
        Ok(path)
    }

    /// `__` followed by host and path with every `/` turned into `.`.
    pub fn download_name(url: &HttpUrl) -> String {
        format!("__{}{}", url.host(), url.path()).replace('/', ".")
    }

    pub fn save_download(&self, url: &HttpUrl, body: &[u8]) -> Result<PathBuf> {
        let path = self.root.join(Self::download_name(url));
        fs::write(&path, body)?;
        Ok(path)
    }
}
