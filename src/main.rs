use anyhow::{Context, Result};
use bb84_cipher::cipher::{format_bits, parse_bits};
use bb84_cipher::protocols::bb84;
use bb84_cipher::{EntropyMode, Plaintext, QkdConfig, Session, decrypt, encrypt};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Encrypted bits shown in a transaction report.
const SAMPLE_BITS: usize = 20;

#[derive(Parser)]
#[command(name = "bb84-cipher")]
#[command(about = "BB84 key distribution simulator and key-derived XOR cipher")]
#[command(version)]
struct Cli {
    /// TOML file with protocol settings
    #[arg(long, global = true, env = "BB84_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RunArgs {
    /// Raw qubits to exchange
    #[arg(short, long)]
    length: Option<usize>,

    /// Draw bits from the pseudo-random generator instead of simulated qubits
    #[arg(long, conflicts_with = "quantum")]
    pseudo: bool,

    /// Draw bits from simulated qubits, overriding the config file
    #[arg(long)]
    quantum: bool,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run BB84 and print the session
    Keygen(RunArgs),
    /// Run BB84, then encrypt and decrypt a message with the shared key
    Transact {
        #[command(flatten)]
        run: RunArgs,

        /// Message to protect
        #[arg(short, long)]
        message: String,
    },
    /// Encrypt a message with a key given as a 0/1 string
    Encrypt {
        #[arg(short, long)]
        message: String,
        #[arg(short, long)]
        key: String,
    },
    /// Decrypt a 0/1 bit string with a key given as a 0/1 string
    Decrypt {
        #[arg(short, long)]
        bits: String,
        #[arg(short, long)]
        key: String,
    },
}

#[derive(Serialize)]
struct KeygenReport<'a> {
    shared_key_length: usize,
    matching_bases_percentage: f64,
    session: &'a Session,
}

#[derive(Serialize)]
struct TransactionReport {
    original_message: String,
    shared_key_length: usize,
    encrypted_data_length: usize,
    encrypted_sample: Vec<bool>,
    decrypted_data: Plaintext,
    decryption_successful: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "bb84_cipher=debug"
    } else {
        "bb84_cipher=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    println!("{json}");
    Ok(())
}

/// Config file settings, overridden by any flag given on the command line.
fn resolve_config(path: Option<&Path>, args: &RunArgs) -> Result<QkdConfig> {
    let mut config = match path {
        Some(path) => QkdConfig::load(path)
            .with_context(|| format!("Load config {}", path.display()))?,
        None => QkdConfig::default(),
    };
    if let Some(length) = args.length {
        config.key_length = length;
    }
    if args.pseudo {
        config.entropy = EntropyMode::PseudoRandom;
    } else if args.quantum {
        config.entropy = EntropyMode::Quantum;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    Ok(config)
}

fn transaction_report(session: &Session, message: String) -> Result<TransactionReport> {
    let encrypted = encrypt(&message, session.shared_key())
        .context("Shared key came out empty, rerun the protocol")?;
    let decrypted = decrypt(&encrypted, session.shared_key())?;
    Ok(TransactionReport {
        shared_key_length: session.shared_key().len(),
        encrypted_data_length: encrypted.len(),
        encrypted_sample: encrypted.iter().copied().take(SAMPLE_BITS).collect(),
        decryption_successful: decrypted.as_text() == Some(message.as_str()),
        decrypted_data: decrypted,
        original_message: message,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Keygen(args) => {
            let config = resolve_config(cli.config.as_deref(), &args)?;
            let session = bb84::run_with_config(&config)?;
            print_json(&KeygenReport {
                shared_key_length: session.shared_key().len(),
                matching_bases_percentage: session.matching_percentage(),
                session: &session,
            })
        }
        Commands::Transact { run, message } => {
            let config = resolve_config(cli.config.as_deref(), &run)?;
            let session = bb84::run_with_config(&config)?;
            print_json(&transaction_report(&session, message)?)
        }
        Commands::Encrypt { message, key } => {
            let key = parse_bits(&key)?;
            println!("{}", format_bits(&encrypt(&message, &key)?));
            Ok(())
        }
        Commands::Decrypt { bits, key } => {
            let bits = parse_bits(&bits)?;
            let key = parse_bits(&key)?;
            match decrypt(&bits, &key)? {
                Plaintext::Text(text) => println!("{text}"),
                Plaintext::Bits(bits) => println!("{}", format_bits(&bits)),
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_flags() -> RunArgs {
        RunArgs {
            length: None,
            pseudo: false,
            quantum: false,
            seed: None,
        }
    }

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn defaults_without_file_or_flags() {
        let config = resolve_config(None, &no_flags()).unwrap();
        assert_eq!(config, QkdConfig::default());
    }

    #[test]
    fn file_settings_apply_without_flags() {
        let file = config_file("key_length = 12\nentropy = \"pseudo-random\"\nseed = 3\n");
        let config = resolve_config(Some(file.path()), &no_flags()).unwrap();
        assert_eq!(config.key_length, 12);
        assert_eq!(config.entropy, EntropyMode::PseudoRandom);
        assert_eq!(config.seed, Some(3));
    }

    #[test]
    fn flags_override_file() {
        let file = config_file("key_length = 12\nseed = 3\n");
        let args = RunArgs {
            length: Some(40),
            pseudo: true,
            quantum: false,
            seed: Some(9),
        };
        let config = resolve_config(Some(file.path()), &args).unwrap();
        assert_eq!(config.key_length, 40);
        assert_eq!(config.entropy, EntropyMode::PseudoRandom);
        assert_eq!(config.seed, Some(9));
    }

    #[test]
    fn quantum_flag_overrides_pseudo_random_file() {
        let file = config_file("entropy = \"pseudo-random\"\n");
        let args = RunArgs {
            quantum: true,
            ..no_flags()
        };
        let config = resolve_config(Some(file.path()), &args).unwrap();
        assert_eq!(config.entropy, EntropyMode::Quantum);
    }

    #[test]
    fn pseudo_and_quantum_flags_conflict() {
        let parsed = Cli::try_parse_from(["bb84-cipher", "keygen", "--pseudo", "--quantum"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn transaction_report_carries_original_message() {
        let config = QkdConfig {
            key_length: 64,
            entropy: EntropyMode::PseudoRandom,
            seed: Some(5),
        };
        let session = bb84::run_with_config(&config).unwrap();
        let report = transaction_report(&session, "pay 10".to_string()).unwrap();

        assert_eq!(report.original_message, "pay 10");
        assert!(report.decryption_successful);
        assert_eq!(report.encrypted_data_length, 48);
        assert_eq!(report.encrypted_sample.len(), SAMPLE_BITS);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["original_message"], "pay 10");
        assert_eq!(json["decrypted_data"], "pay 10");
    }
}
