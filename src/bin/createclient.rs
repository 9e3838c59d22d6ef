//! `createclient` - provision a client into the registry file.

use clap::Parser;
use request_signer::provision_client;
use std::{path::PathBuf, process::ExitCode};

/// Create an authorized client with a supplied or generated private key.
#[derive(Parser)]
#[command(name = "createclient", version)]
struct Args {
    /// Client id to create.
    #[arg(short, long)]
    client: String,
    /// Private key (base64url). Generated when omitted.
    #[arg(short, long)]
    key: Option<String>,
    /// Registry file, created if missing.
    #[arg(long, env = "REQUEST_SIGNER_CLIENTS_FILE", default_value = "clients.json")]
    store: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match provision_client(&args.store, &args.client, args.key.as_deref()) {
        Ok(client) => {
            println!("Client ID: {}", client.client_id);
            println!("Private Key: {}", client.private_key);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_and_long_flags() {
        let args = Args::try_parse_from(["createclient", "-c", "apps-a", "-k", "YQ=="]).unwrap();
        assert_eq!(args.client, "apps-a");
        assert_eq!(args.key.as_deref(), Some("YQ=="));

        let args = Args::try_parse_from(["createclient", "--client", "apps-b", "--store", "x.json"]).unwrap();
        assert_eq!(args.client, "apps-b");
        assert_eq!(args.key, None);
        assert_eq!(args.store, PathBuf::from("x.json"));
    }

    #[test]
    fn test_client_is_required() {
        assert!(Args::try_parse_from(["createclient"]).is_err());
    }
}
