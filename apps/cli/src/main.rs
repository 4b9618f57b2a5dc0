//! ephemchat - command-line access to the ephemchat encryption core.
//!
//! Every subcommand prints a single JSON document on stdout so the output can
//! be piped between invocations (`seal | open`).

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::OsRng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use ephemchat_crypto::config::CryptoConfig;
use ephemchat_crypto::key_wrap::{unwrap_private_key, wrap_private_key_with, WrappedPrivateKey};
use ephemchat_crypto::{encrypt_for_both, generate_key_pair, EphemeralEnvelope, Role};

/// Per-message end-to-end encryption for ephemchat
#[derive(Parser)]
#[command(name = "ephemchat")]
#[command(version)]
#[command(about = "Key generation, key wrapping and dual-recipient message encryption")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new X25519 key pair
    Keygen,

    /// Wrap a private key under a password for server-side recovery
    Wrap {
        /// Hex-encoded private key
        #[arg(long, env = "EPHEMCHAT_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,

        /// Password the key is wrapped under
        #[arg(long, env = "EPHEMCHAT_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Recover a private key from a wrapped blob
    Unwrap {
        /// Wrapped private key (base64)
        #[arg(long)]
        wrapped: String,

        /// Password the key was wrapped under
        #[arg(long, env = "EPHEMCHAT_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Encrypt a message so both receiver and sender can read it
    Seal {
        /// Message text
        #[arg(short, long)]
        message: String,

        /// Receiver's hex public key
        #[arg(long)]
        receiver: String,

        /// Sender's hex public key
        #[arg(long)]
        sender: String,
    },

    /// Decrypt one side of a sealed envelope
    ///
    /// The envelope JSON is read from --envelope, or from stdin when omitted.
    Open {
        /// Path to envelope JSON
        #[arg(short, long)]
        envelope: Option<PathBuf>,

        /// Which box to open
        #[arg(long = "as", value_enum, default_value = "receiver")]
        side: Side,

        /// Hex-encoded private key of that side
        #[arg(long, env = "EPHEMCHAT_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    Receiver,
    Sender,
}

impl From<Side> for Role {
    fn from(side: Side) -> Self {
        match side {
            Side::Receiver => Role::Receiver,
            Side::Sender => Role::Sender,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WrapOutput {
    encrypted_private_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UnwrapOutput<'a> {
    private_key: &'a str,
}

#[derive(Serialize)]
struct OpenOutput {
    message: String,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = CryptoConfig::load().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let cli = Cli::parse();
    run(cli.command, &config)
}

fn run(command: Commands, config: &CryptoConfig) -> Result<()> {
    match command {
        Commands::Keygen => {
            let pair = generate_key_pair().context("generating key pair")?;
            print_json(&pair)
        }
        Commands::Wrap {
            private_key,
            password,
        } => {
            let private_key = Zeroizing::new(private_key);
            let password = Zeroizing::new(password);
            let wrapped =
                wrap_private_key_with(&mut OsRng, &private_key, &password, config.kdf)
                    .context("wrapping private key")?;
            print_json(&WrapOutput {
                encrypted_private_key: wrapped.into_string(),
            })
        }
        Commands::Unwrap { wrapped, password } => {
            let password = Zeroizing::new(password);
            let private_key = Zeroizing::new(
                unwrap_private_key(&WrappedPrivateKey::from(wrapped), &password)
                    .context("unwrapping private key")?,
            );
            print_json(&UnwrapOutput {
                private_key: &private_key,
            })
        }
        Commands::Seal {
            message,
            receiver,
            sender,
        } => {
            let envelope =
                encrypt_for_both(&message, &receiver, &sender).context("sealing message")?;
            print_json(&envelope)
        }
        Commands::Open {
            envelope,
            side,
            private_key,
        } => {
            let private_key = Zeroizing::new(private_key);
            let json = read_envelope(envelope.as_ref())?;
            let envelope: EphemeralEnvelope =
                serde_json::from_str(&json).context("parsing envelope JSON")?;
            let message = envelope
                .open_as(side.into(), &private_key)
                .context("opening envelope")?;
            print_json(&OpenOutput { message })
        }
    }
}

fn read_envelope(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading envelope from {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading envelope from stdin")?;
            Ok(buf)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{json}");
    Ok(())
}
