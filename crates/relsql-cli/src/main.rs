//! relsql developer CLI
//!
//! Reads a JSON query tree from a file (or stdin), translates it and prints
//! `{ "fingerprint": ..., "command": ... }` to stdout.

use anyhow::{Context, Result};
use relsql_ir::Query;
use relsql_translate::{TranslatedCommand, Translator};
use serde::Serialize;
use std::io::Read;
use tracing::{debug, info};

mod config;
mod logging;

use config::Config;

#[derive(Debug, Serialize)]
struct Output {
    fingerprint: String,
    command: TranslatedCommand,
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some("-") | None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read query from stdin")?;
            Ok(buf)
        }
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("Failed to read query file {}", path)),
    }
}

fn run(config: &Config, path: Option<&str>) -> Result<String> {
    let input = read_input(path)?;
    let query: Query = serde_json::from_str(&input).context("Input is not a valid query tree")?;

    let fingerprint = query.fingerprint();
    debug!(fingerprint = %fingerprint, "parsed query");

    let translator = Translator::new(config.translator.clone());
    let command = translator
        .translate(&query)
        .with_context(|| format!("Failed to translate query {}", fingerprint))?;

    let output = Output { fingerprint, command };
    let rendered = if config.output.pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    };
    rendered.context("Failed to serialize command")
}

fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::load_or_default().context("Failed to load configuration")?;
    config.apply_logging_env();
    logging::init();

    let path = std::env::args().nth(1);
    info!(input = path.as_deref().unwrap_or("<stdin>"), "translating query");

    let json = run(&config, path.as_deref())?;
    println!("{}", json);
    Ok(())
}
