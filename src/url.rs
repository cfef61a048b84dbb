//! Absolute `http://` urls of the form `http://<host>[:<port>][/<path>]`.
use crate::error::{Error, Result};
use std::fmt;
use std::str;

const SCHEME: &str = "http://";
const DEFAULT_PORT: u16 = 80;

/// Returns true if `url` names the only scheme this crate speaks.
pub fn has_http_scheme(url: &str) -> bool {
    url.starts_with(SCHEME)
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct HttpUrl {
    host: String,
    port: u16,
    path: String,
}

impl HttpUrl {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Always starts with `/`. Query text, if any, is kept verbatim.
    pub fn path(&self) -> &str {
        &self.path
    }
}

fn is_host_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.'
}

impl str::FromStr for HttpUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidUrl(s.into());

        let rest = s.strip_prefix(SCHEME).ok_or_else(invalid)?;

        let host_end = rest.find(|c: char| !is_host_char(c)).unwrap_or(rest.len());
        let (host, rest) = rest.split_at(host_end);
        if host.is_empty() {
            return Err(invalid());
        }

        let (port, rest) = match rest.strip_prefix(':') {
            Some(rest) => {
                let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
                let (digits, rest) = rest.split_at(digits_end);
                let port: u16 = digits.parse().map_err(|_| invalid())?;
                if port == 0 {
                    return Err(invalid());
                }
                (port, rest)
            }
            None => (DEFAULT_PORT, rest),
        };

        let path = match rest {
            "" => "/",
            p if p.starts_with('/') => p,
            _ => return Err(invalid()),
        };

        Ok(HttpUrl {
            host: host.into(),
            port,
            path: path.into(),
        })
    }
}

impl fmt::Display for HttpUrl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", SCHEME, self.host)?;
        if self.port != DEFAULT_PORT {
            write!(f, ":{}", self.port)?;
        }
        write!(f, "{}", self.path)
    }
}
