//! # signet
//!
//! Entry point for the `signet` binary. Parses the command line, initializes
//! logging, then either generates a key or signs a transaction file.
//!
//! - `-kg -kf <path>` generates a key and writes it to `<path>`
//! - `-s -kf <path> -tx <path>` signs a transaction and writes
//!   `<name>_signed.json` next to it
//!
//! Exits with status 0 on success and 1 on any error.

mod cli;
mod logging;

use anyhow::{Context, Result};
use base64::Engine;
use clap::{CommandFactory, Parser};
use signet::{KeyHandler, RsaKeyHandler, Signer};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use cli::{Action, SignetCli};

fn main() -> ExitCode {
    let cli = match SignetCli::try_parse_from(cli::normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    logging::init_logging("warn");

    let action = match cli.action() {
        Ok(action) => action,
        Err(reason) => {
            eprintln!("{}", SignetCli::command().render_help());
            eprintln!("\n{}\n", reason);
            return ExitCode::FAILURE;
        }
    };

    let outcome = match action {
        Action::KeyGen {
            key_path,
            public_key_path,
        } => generate_key(&key_path, public_key_path.as_deref()),
        Action::Sign { key_path, tx_path } => sign(&key_path, &tx_path),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn generate_key(key_path: &Path, public_key_path: Option<&Path>) -> Result<()> {
    let key = RsaKeyHandler::generate().context("generating key")?;
    key.export(key_path)
        .with_context(|| format!("exporting key to {}", key_path.display()))?;

    if let Some(public_key_path) = public_key_path {
        key.export_public_key(public_key_path).with_context(|| {
            format!("exporting public key to {}", public_key_path.display())
        })?;
        println!("Public key exported to {}", public_key_path.display());
    }

    println!("Key generated and exported to {}", key_path.display());
    Ok(())
}

fn sign(key_path: &Path, tx_path: &Path) -> Result<()> {
    let key = RsaKeyHandler::import(key_path)
        .with_context(|| format!("importing key from {}", key_path.display()))?;

    let tx_data = fs::read(tx_path)
        .with_context(|| format!("reading transaction file {}", tx_path.display()))?;

    let mut signer = Signer::new(&key)
        .with_transaction(&tx_data)
        .context("loading transaction")?;
    signer.sign().context("signing transaction")?;

    let tx = signer
        .transaction()
        .context("signer holds no transaction")?;

    let signed_path = signed_path(tx_path);
    tx.save(&signed_path)
        .with_context(|| format!("saving signed transaction to {}", signed_path.display()))?;
    tracing::info!(path = %signed_path.display(), "signed transaction written");

    let engine = base64::engine::general_purpose::STANDARD;
    println!("Transaction signatures: \n");
    for (stream_id, signature) in &tx.signatures {
        println!("Stream ID: {}", stream_id);
        println!("Signature: {}\n", engine.encode(signature));
    }

    println!("Done");
    Ok(())
}

/// `dir/name.ext` becomes `dir/name_signed.json`; the name ends at its first dot.
fn signed_path(tx_path: &Path) -> PathBuf {
    let file_name = tx_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name.split('.').next().unwrap_or_default();

    let dir = tx_path.parent().unwrap_or_else(|| Path::new(""));
    dir.join(format!("{}_signed.json", stem))
}
