//! Command line arguments for the `client` and `server` binaries.
use clap::{Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "client", version, about = "Fetch or upload one file over HTTP/1.0")]
pub struct ClientArgs {
    #[command(subcommand)]
    pub command: ClientCommand,

    /// Directory where bodies of successful GETs are saved.
    #[arg(long, global = true, env = "HTTP10_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum ClientCommand {
    /// Fetch a url and save the body of a 2xx response.
    #[command(name = "GET")]
    Get { url: String },

    /// Upload a local file to a url.
    #[command(name = "PUT")]
    Put { url: String, file: PathBuf },
}

#[derive(Debug, Parser)]
#[command(name = "server", version, about = "Serve and accept files over HTTP/1.0")]
pub struct ServerArgs {
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    #[arg(long, env = "HTTP10_BIND", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Directory request paths are resolved against.
    #[arg(long, env = "HTTP10_ROOT", default_value = ".")]
    pub root: PathBuf,
}
