//! WebGrid - browser-automation grid coordinator
//!
//! Main entry point for the WebGrid CLI and server.

mod cli;
mod register;
mod server;

use std::collections::BTreeMap;

use clap::Parser;
use tracing::warn;

use webgrid_config::{Config, ConfigLoader, ConfigValidator, DriverConfig, ValidationResult};

use cli::{Cli, Commands, ListenArgs};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = ConfigLoader::load_or_default(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Hub {
        listen: ListenArgs::default(),
    }) {
        Commands::Hub { listen } => {
            apply_listen(&mut config, &listen);
            prepare(&config)?;
            server::run_grid(config, None).await
        }
        Commands::Standalone {
            listen,
            max_sessions,
            drivers,
        } => {
            apply_listen(&mut config, &listen);
            apply_drivers(&mut config, max_sessions, drivers);
            prepare(&config)?;
            let local = register::build_local_node(&config)?;
            server::run_grid(config, Some(local)).await
        }
        Commands::Check => {
            let result = ConfigValidator::validate(&config)?;
            print_validation(&result);
            match result.into_error() {
                Some(err) => Err(err.into()),
                None => Ok(()),
            }
        }
    }
}

/// Validate, then start logging. Warnings are logged once tracing is up.
fn prepare(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let result = ConfigValidator::validate(config)?;
    let warnings: Vec<String> = result
        .warnings
        .iter()
        .map(|w| format!("{}: {}", w.path, w.message))
        .collect();
    if let Some(err) = result.into_error() {
        return Err(err.into());
    }

    server::init_tracing(&config.logging)?;
    for warning in warnings {
        warn!("Config: {}", warning);
    }
    Ok(())
}

fn apply_listen(config: &mut Config, listen: &ListenArgs) {
    if let Some(ref host) = listen.host {
        config.server.host = host.clone();
    }
    if let Some(port) = listen.port {
        config.server.port = port;
    }
}

fn apply_drivers(config: &mut Config, max_sessions: Option<usize>, drivers: Vec<(String, url::Url)>) {
    if max_sessions.is_some() {
        config.node.max_sessions = max_sessions;
    }
    for (browser, url) in drivers {
        let mut stereotype = BTreeMap::new();
        stereotype.insert("browserName".to_string(), browser.into());
        config.node.drivers.push(DriverConfig {
            url: url.to_string(),
            stereotype,
        });
    }
}

fn print_validation(result: &ValidationResult) {
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }
    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    if result.is_valid() {
        println!("Configuration OK");
    }
}
