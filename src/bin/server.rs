use std::net;
use std::process::ExitCode;

use clap::Parser;
use http10::cli::ServerArgs;
use http10::server::{FileHandler, HttpServer};
use http10::store::FileStore;

fn main() -> ExitCode {
    http10::logging::init();
    let args = ServerArgs::parse();

    let socket = match net::TcpListener::bind((args.bind, args.port)) {
        Ok(socket) => socket,
        Err(e) => {
            eprintln!("ERR - could not listen on {}:{} ({})", args.bind, args.port, e);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(bind = %args.bind, port = args.port, root = %args.root.display(), "server started");

    let handler = FileHandler::new(FileStore::new(args.root));
    let mut server = HttpServer::new(socket, handler);
    match server.serve_forever() {
        Ok(never) => match never {},
        Err(e) => {
            eprintln!("ERR - {}", e);
            ExitCode::FAILURE
        }
    }
}
