//! Alarm relay.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────┐
//!                       │                     ALARMS                       │
//!                       │                                                  │
//!     POST /alarms      │  ┌─────────┐    ┌────────────┐    ┌──────────┐   │
//!     ──────────────────┼─▶│  http   │───▶│ validation │───▶│  alarm   │───┼──▶ SMTP
//!                       │  │ server  │    │ (registry) │    │  mailer  │   │
//!                       │  └─────────┘    └────────────┘    └──────────┘   │
//!                       │       ▲                                          │
//!                       │       │          ┌────────────────────────────┐  │
//!                       │  ┌─────────┐     │      Cross-Cutting         │  │
//!                       │  │ config  │     │  observability, lifecycle  │  │
//!                       │  │ default │     └────────────────────────────┘  │
//!                       │  │ + {env} │                                     │
//!                       │  └─────────┘                                     │
//!                       └──────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use alarms::alarm::SmtpMailer;
use alarms::config::{active_environment, load_config};
use alarms::lifecycle::{signals, Bootstrap, Shutdown, StartupError};
use alarms::observability::{logging, metrics};
use alarms::validation::ConstraintRegistry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let environment = active_environment();

    // Subscriber first; everything after this point logs.
    let config = load_config(&environment).map_err(StartupError::from)?;
    logging::init_logging(&config.log_settings()).map_err(StartupError::from)?;

    tracing::info!(
        app = %config.app_name(),
        environment = %environment,
        "alarms v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let registry = ConstraintRegistry::with_builtins().map_err(StartupError::from)?;
    tracing::debug!(constraints = registry.len(), "Constraint registry ready");
    let boot = Bootstrap::assemble(&environment, registry, config)?;
    tracing::info!(
        mail_host = %boot.mail.host,
        mail_port = boot.mail.port,
        receivers = boot.config.alarm_receivers().len(),
        "Configuration loaded"
    );

    let metrics_settings = boot.config.metrics_settings();
    if metrics_settings.enabled {
        let addr: SocketAddr = metrics_settings
            .listen
            .parse()
            .map_err(|_| StartupError::MetricsAddress(metrics_settings.listen.clone()))?;
        metrics::init_metrics(addr).map_err(StartupError::from)?;
    }

    let mailer = Arc::new(SmtpMailer::new(&boot.mail).map_err(StartupError::from)?);
    let server = boot.http_server(mailer);

    let address = boot.config.listen_addr();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for alarms"
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
