//! Command-line armorlink client.
//!
//! Connects to a server, shows its public key for confirmation, sends a
//! fresh session key and exits with a code identifying the first failure.

use armorlink::{
    AcceptAll, ConsolePrompt, DEFAULT_PORT, DigestAlgorithm, Error, HmacLayer, Result, SymmetricCipher, TrustPrompt,
    client,
};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Secure-channel client with trust-on-first-use server keys
#[derive(Parser, Debug)]
#[command(name = "armorlink-client", version, about)]
struct Args {
    /// Server address, `host` or `host:port`
    target: String,

    /// Log protocol steps to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Read/write deadline in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Digest for the envelope and the authentication layer
    #[arg(long, default_value = "sha512")]
    digest: DigestAlgorithm,

    /// Symmetric cipher the session key is sized for
    #[arg(long, default_value = "aes256")]
    cipher: SymmetricCipher,

    /// Accept the server key without asking
    #[arg(long)]
    yes: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("armorlink-client: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let (host, port) = parse_target(&args.target)?;

    let mut builder = client().with_digest(args.digest).with_cipher(args.cipher);
    if let Some(secs) = args.timeout {
        builder = builder.with_io_timeout(Duration::from_secs(secs));
    }
    let client = builder.build()?;

    let mut prompt: Box<dyn TrustPrompt> = if args.yes {
        Box::new(AcceptAll)
    } else {
        Box::new(ConsolePrompt::stdio())
    };

    let (_stream, session) = client.connect((host.as_str(), port), prompt.as_mut())?;
    let layer = HmacLayer::new(client.config().crypto.digest)?;

    info!(
        cipher = %session.session_key().cipher(),
        digest = %layer.algorithm(),
        "connection established"
    );
    println!("Session established with {}:{}", host, port);
    Ok(())
}

/// Split `host[:port]`; bracketed IPv6 literals keep their colons.
fn parse_target(target: &str) -> Result<(String, u16)> {
    let bad_port = |p: &str| Error::Config(format!("invalid port '{}'", p));

    if let Some(rest) = target.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| Error::Config(format!("unterminated '[' in '{}'", target)))?;
        let port = match tail.strip_prefix(':') {
            Some(p) => p.parse().map_err(|_| bad_port(p))?,
            None if tail.is_empty() => DEFAULT_PORT,
            None => return Err(Error::Config(format!("unexpected '{}' after address", tail))),
        };
        return Ok((host.to_string(), port));
    }

    match target.split_once(':') {
        Some((host, p)) if !p.contains(':') => Ok((host.to_string(), p.parse().map_err(|_| bad_port(p))?)),
        _ if target.is_empty() => Err(Error::Config("empty server address".into())),
        _ => Ok((target.to_string(), DEFAULT_PORT)),
    }
}
