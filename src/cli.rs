//! CLI definitions for WebGrid.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use url::Url;

/// WebGrid CLI.
#[derive(Parser)]
#[command(name = "webgrid")]
#[command(about = "Browser-automation grid coordinator")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (defaults to ~/.config/webgrid/config.toml when present)
    #[arg(short, long, global = true, env = "WEBGRID_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the coordinator only; nodes register over HTTP (default)
    Hub {
        #[command(flatten)]
        listen: ListenArgs,
    },

    /// Run the coordinator together with an in-process node
    Standalone {
        #[command(flatten)]
        listen: ListenArgs,

        /// Concurrent sessions on the local node
        #[arg(long)]
        max_sessions: Option<usize>,

        /// Local WebDriver service as BROWSER=URL, e.g. chrome=http://localhost:9515
        #[arg(long = "driver", value_parser = parse_driver)]
        drivers: Vec<(String, Url)>,
    },

    /// Validate the configuration and exit
    Check,
}

/// Overrides for `[server]`.
#[derive(Args, Default)]
pub(crate) struct ListenArgs {
    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind
    #[arg(long)]
    pub port: Option<u16>,
}

fn parse_driver(value: &str) -> Result<(String, Url), String> {
    let (browser, url) = value
        .split_once('=')
        .ok_or_else(|| format!("expected BROWSER=URL, got '{}'", value))?;
    if browser.is_empty() {
        return Err("browser name cannot be empty".to_string());
    }
    let url = Url::parse(url).map_err(|e| format!("invalid driver url '{}': {}", url, e))?;
    Ok((browser.to_string(), url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_driver() {
        let (browser, url) = parse_driver("chrome=http://localhost:9515").unwrap();
        assert_eq!(browser, "chrome");
        assert_eq!(url.port(), Some(9515));

        assert!(parse_driver("chrome").is_err());
        assert!(parse_driver("=http://localhost:9515").is_err());
        assert!(parse_driver("chrome=not a url").is_err());
    }

    #[test]
    fn test_default_command() {
        let cli = Cli::try_parse_from(["webgrid"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_standalone_args() {
        let cli = Cli::try_parse_from([
            "webgrid",
            "standalone",
            "--port",
            "5444",
            "--max-sessions",
            "2",
            "--driver",
            "firefox=http://localhost:4445",
            "--config",
            "grid.toml",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("grid.toml")));
        match cli.command {
            Some(Commands::Standalone {
                listen,
                max_sessions,
                drivers,
            }) => {
                assert_eq!(listen.port, Some(5444));
                assert!(listen.host.is_none());
                assert_eq!(max_sessions, Some(2));
                assert_eq!(drivers[0].0, "firefox");
            }
            _ => panic!("Expected standalone"),
        }
    }
}
