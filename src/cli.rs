//! # CLI Interface
//!
//! Command-line arguments for `signet`, defined with `clap` derive.
//!
//! Flags are spelled with a single dash (`-kg`, `-kf <path>`, `-tx <path>`),
//! so [`normalize_args`] rewrites those spellings into clap long flags before
//! parsing. The double-dash forms work as well.

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

/// Multi-letter flags that may be written with a single dash.
const LONG_FLAGS: &[&str] = &["kg", "kf", "tx", "pf", "sign"];

/// Ledger transaction signer.
///
/// Generates RSA signing keys and signs transaction documents.
#[derive(Parser, Debug)]
#[command(name = "signet", about = "Ledger transaction signer", version)]
pub struct SignetCli {
    /// Generate a new RSA key pair.
    #[arg(long = "kg")]
    pub key_gen: bool,

    /// Sign the transaction file.
    #[arg(short = 's', long = "sign")]
    pub sign: bool,

    /// Path to the RSA private key PEM file.
    #[arg(long = "kf", value_name = "PATH")]
    pub key_path: Option<PathBuf>,

    /// Path to the transaction file.
    #[arg(long = "tx", value_name = "PATH")]
    pub tx_path: Option<PathBuf>,

    /// With -kg, also write the public key PEM file here.
    #[arg(long = "pf", value_name = "PATH")]
    pub public_key_path: Option<PathBuf>,
}

/// What the user asked for, with its required paths resolved.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    KeyGen {
        key_path: PathBuf,
        public_key_path: Option<PathBuf>,
    },
    Sign {
        key_path: PathBuf,
        tx_path: PathBuf,
    },
}

impl SignetCli {
    /// Resolve the requested action, or explain which flag is missing.
    ///
    /// Key generation wins when both `-kg` and `-s` are given.
    pub fn action(&self) -> Result<Action, &'static str> {
        if self.key_gen {
            let key_path = self.key_path.clone().ok_or("Missing key file path")?;
            return Ok(Action::KeyGen {
                key_path,
                public_key_path: self.public_key_path.clone(),
            });
        }

        if self.sign {
            let tx_path = self.tx_path.clone().ok_or("Missing transaction file path")?;
            let key_path = self.key_path.clone().ok_or("Missing key file path")?;
            return Ok(Action::Sign { key_path, tx_path });
        }

        Err("Missing required flags")
    }
}

/// Rewrite `-kf`, `-kf=path` and friends into `--kf`, `--kf=path`.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let rewritten = arg
                .to_str()
                .filter(|text| is_single_dash_long_flag(text))
                .map(|text| OsString::from(format!("-{}", text)));
            rewritten.unwrap_or(arg)
        })
        .collect()
}

fn is_single_dash_long_flag(arg: &str) -> bool {
    if arg.starts_with("--") {
        return false;
    }
    arg.strip_prefix('-')
        .and_then(|flag| flag.split('=').next())
        .is_some_and(|name| LONG_FLAGS.contains(&name))
}
