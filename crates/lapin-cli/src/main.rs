//! # lapin-cli
//!
//! Deployment tooling for Lapin Forms:
//! - `lapin check-env [path]` -- validate the configuration file before
//!   startup (non-zero exit blocks deployment)
//! - `lapin generate-key` -- mint a fresh 64-hex-char encryption key
//! - `lapin init-db` -- open the default database and run migrations

mod check;
mod envfile;

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use lapin_shared::crypto;
use lapin_store::Database;

use crate::check::ConfigError;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("check-env") => check_env(args.get(1).map(PathBuf::from)),
        Some("generate-key") => {
            generate_key();
            Ok(())
        }
        Some("init-db") => init_db(),
        _ => {
            eprintln!("usage: lapin <check-env [path] | generate-key | init-db>");
            std::process::exit(2);
        }
    }
}

fn check_env(path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from(".env"));

    if !path.exists() {
        return Err(ConfigError::ConfigurationMissing(path).into());
    }

    let vars = envfile::load(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    tracing::debug!(path = %path.display(), vars = vars.len(), "loaded configuration file");

    let gitignore = std::fs::read_to_string(".gitignore").ok();

    let report = check::check(&vars, gitignore.as_deref());
    print!("{}", report.render());

    if !report.passed() {
        return Err(ConfigError::ConfigurationInvalid(report.problems.len()).into());
    }
    Ok(())
}

fn generate_key() {
    let key = crypto::generate_key_hex();

    println!("Your encryption key:");
    println!("{key}");
    println!();
    println!("Add it to your configuration file:");
    println!();
    println!("ENCRYPTION_KEY={key}");
    println!();
    println!("Keep this key secure and never commit it to version control.");
}

fn init_db() -> anyhow::Result<()> {
    let key_hex = encryption_key_from_env()
        .context("ENCRYPTION_KEY not set (in the environment or .env); run `lapin generate-key` first")?;
    let key = crypto::parse_key_hex(&key_hex)?;

    let db = Database::new(&key)?;
    match db.path() {
        Some(path) => println!("database ready at {}", path.display()),
        None => println!("database ready"),
    }
    Ok(())
}

/// Process environment wins over the `.env` file.
fn encryption_key_from_env() -> Option<String> {
    if let Ok(key) = std::env::var("ENCRYPTION_KEY") {
        if !key.is_empty() {
            return Some(key);
        }
    }

    envfile::load(Path::new(".env"))
        .ok()
        .and_then(|vars| vars.get("ENCRYPTION_KEY").cloned())
}
