use std::convert;
use std::error;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum Error {
    InvalidUrl(String),
    InvalidArguments(String),
    Connection(io::Error),
    MalformedMessage(String),
    FileWrite(io::Error),
    UnknownMethod(String),
    IoError(io::Error),
}

pub type Result<R> = std::result::Result<R, Error>;

impl Error {
    /// Errors which must stop the server loop rather than just the current connection.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::UnknownMethod(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidUrl(url) => write!(f, "invalid url '{}'", url),
            Error::InvalidArguments(msg) => write!(f, "invalid arguments: {}", msg),
            Error::Connection(e) => write!(f, "Connection refused ({})", e),
            Error::MalformedMessage(msg) => write!(f, "malformed message: {}", msg),
            Error::FileWrite(e) => write!(f, "file not created ({})", e),
            Error::UnknownMethod(m) => write!(f, "unknown method '{}'", m),
            Error::IoError(e) => write!(f, "{}", e),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::InvalidUrl(_) => None,
            Error::InvalidArguments(_) => None,
            Error::Connection(e) => Some(e),
            Error::MalformedMessage(_) => None,
            Error::FileWrite(e) => Some(e),
            Error::UnknownMethod(_) => None,
            Error::IoError(e) => Some(e),
        }
    }
}

impl convert::From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::IoError(e)
    }
}
