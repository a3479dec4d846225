//! Logging setup and grid startup.

use std::sync::Arc;

use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use webgrid_api::{GridServer, GridServerConfig};
use webgrid_config::{Config, ConfigLoader, LoggingConfig};
use webgrid_node::LocalNode;
use webgrid_protocols::Node;

use crate::register::{build_state, register_static_nodes};

/// Initialize tracing with console output and, when `logging.dir` is set,
/// a daily rotated log file.
///
/// `RUST_LOG` takes precedence over `logging.level`.
pub(crate) fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console = if logging.json {
        fmt::layer().json().with_current_span(false).boxed()
    } else {
        fmt::layer().with_target(true).with_ansi(true).boxed()
    };

    let file = match logging.dir {
        Some(ref dir) => {
            let log_dir = ConfigLoader::expand_path(dir);
            std::fs::create_dir_all(&log_dir)?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("webgrid")
                .filename_suffix("log")
                .max_log_files(30)
                .build(&log_dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // The worker flushes on drop, so it lives as long as the process.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .init();

    Ok(())
}

/// Run the grid in the foreground until Ctrl-C.
///
/// `local` is registered next to the `[[nodes]]` entries when running
/// standalone.
pub(crate) async fn run_grid(
    config: Config,
    local: Option<LocalNode>,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(&config)?;

    let remote = register_static_nodes(&state, &config)?;
    if remote > 0 {
        info!("Registered {} static node(s)", remote);
    }

    if let Some(node) = local {
        info!(
            node = %node.id(),
            capacity = node.max_sessions(),
            slots = node.stereotypes().len(),
            "Registered local node"
        );
        state.distributor.add(Arc::new(node))?;
    }

    let server = GridServer::new(
        GridServerConfig {
            host: config.server.host.clone(),
            port: config.server.port,
            max_body_bytes: config.server.max_body_bytes,
        },
        state,
    );

    info!("Starting WebGrid on {}", server.addr());
    info!("Advertised at {}", config.server.advertised_url());
    server.run().await
}
