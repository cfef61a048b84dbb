use std::io;
use std::process::ExitCode;

use clap::Parser;
use http10::cli::{ClientArgs, ClientCommand};
use http10::client::HttpClient;
use http10::store::FileStore;

fn main() -> ExitCode {
    http10::logging::init();
    let args = ClientArgs::parse();

    let mut client = HttpClient::new(io::stdout(), FileStore::new(args.output_dir));
    let result = match args.command {
        ClientCommand::Get { url } => client.get(&url),
        ClientCommand::Put { url, file } => client.put(&url, &file),
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERR - {}", e);
            ExitCode::FAILURE
        }
    }
}
