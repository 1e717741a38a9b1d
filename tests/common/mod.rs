//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alarms::alarm::{AlarmMail, MailError, Mailer};
use alarms::config::HttpSettings;
use alarms::http::HttpServer;
use alarms::lifecycle::{bootstrap, Shutdown};
use async_trait::async_trait;
use tokio::net::TcpListener;

/// Token configured in `configs/test.toml`.
pub const TEST_TOKEN: &str = "test-token";

/// Mailer that records instead of sending.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<AlarmMail>>,
    fail: bool,
    delay: Option<Duration>,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Mailer that takes `delay` before recording each mail.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<AlarmMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: &AlarmMail) -> Result<(), MailError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(MailError::NoReceivers);
        }
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

/// Start the relay with the `test` environment on an ephemeral port.
pub async fn start_relay(mailer: Arc<RecordingMailer>) -> (SocketAddr, Shutdown) {
    let boot = bootstrap("test").unwrap();
    let server = boot.http_server(mailer);
    serve(server).await
}

/// Start the relay with `test` settings except for the HTTP middleware settings.
pub async fn start_relay_with(mailer: Arc<RecordingMailer>, settings: HttpSettings) -> (SocketAddr, Shutdown) {
    let boot = bootstrap("test").unwrap();
    let server = HttpServer::new(boot.app_state(mailer), &settings);
    serve(server).await
}

async fn serve(server: HttpServer) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
