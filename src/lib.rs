//! A minimal HTTP/1.0 client and file server that speak GET and PUT over raw TCP sockets.
//!
//! See the `client` module for the client side.
//! See the `server` module for the server side.
//! See the `protocol` and `message` modules for building and parsing messages.

pub mod cli;
pub mod client;
pub mod error;
pub mod logging;
pub mod message;
pub mod protocol;
pub mod server;
pub mod store;
pub mod transport;
pub mod url;
