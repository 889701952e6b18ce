//! Fire-and-forget delivery of log records to a remote collector
//!
//! Each record is posted as `{stack, level, package, message}` with a bearer
//! token. Delivery runs on a spawned task and its failures are only reported
//! through `tracing`, never to the caller.

use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::RemoteLogConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

/// Part of the application a record comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Package {
    Handler,
    Service,
    Config,
}

impl Package {
    pub fn as_str(self) -> &'static str {
        match self {
            Package::Handler => "handler",
            Package::Service => "service",
            Package::Config => "config",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub stack: String,
    pub level: LogLevel,
    pub package: Package,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum LogDeliveryError {
    #[error("log request failed: {0}")]
    Request(#[from] reqwest::Error),
}

struct RemoteSink {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl RemoteSink {
    async fn deliver(&self, record: &LogRecord) -> Result<(), LogDeliveryError> {
        let mut request = self.client.post(&self.endpoint).json(record);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request.send().await?.error_for_status()?;
        Ok(())
    }
}

/// Logging collaborator. Every record is emitted locally through `tracing`
/// and, when an endpoint is configured, also shipped to the collector.
#[derive(Clone)]
pub struct RemoteLogger {
    stack: Arc<str>,
    sink: Option<Arc<RemoteSink>>,
}

impl RemoteLogger {
    /// Local `tracing` output only
    pub fn disabled() -> Self {
        Self {
            stack: Arc::from("backend"),
            sink: None,
        }
    }

    pub fn new(config: &RemoteLogConfig) -> anyhow::Result<Self> {
        let sink = match &config.endpoint {
            Some(endpoint) if !endpoint.is_empty() => {
                let client = reqwest::Client::builder()
                    .timeout(config.timeout())
                    .build()
                    .context("Failed to build remote log HTTP client")?;
                Some(Arc::new(RemoteSink {
                    client,
                    endpoint: endpoint.clone(),
                    token: config.token.clone().filter(|t| !t.is_empty()),
                }))
            }
            _ => None,
        };

        Ok(Self {
            stack: Arc::from(config.stack.as_str()),
            sink,
        })
    }

    pub fn is_remote(&self) -> bool {
        self.sink.is_some()
    }

    pub fn log(&self, level: LogLevel, package: Package, message: impl Into<String>) {
        let message = message.into();
        emit_local(level, package, &message);

        let Some(sink) = &self.sink else {
            return;
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("no async runtime available, remote log record dropped");
            return;
        };

        let sink = Arc::clone(sink);
        let record = LogRecord {
            stack: self.stack.to_string(),
            level,
            package,
            message,
        };

        runtime.spawn(async move {
            if let Err(err) = sink.deliver(&record).await {
                warn!(endpoint = %sink.endpoint, error = %err, "remote log delivery failed");
            }
        });
    }
}

fn emit_local(level: LogLevel, package: Package, message: &str) {
    let package = package.as_str();
    match level {
        LogLevel::Debug => debug!(package, "{message}"),
        LogLevel::Info => info!(package, "{message}"),
        LogLevel::Warn => warn!(package, "{message}"),
        LogLevel::Error => error!(package, "{message}"),
        LogLevel::Fatal => error!(package, fatal = true, "{message}"),
    }
}
