//! Application execution logic.
//!
//! This module contains the main async loop that reads newline-delimited
//! JSON events and forwards each one to the configured webhooks.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::task::{JoinError, JoinSet};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::SplitStream;

use wa_relay::config::ValidatedConfig;
use wa_relay::dispatch::Dispatcher;
use wa_relay::event::Event;
use wa_relay::media::{FileMediaStore, MediaExtractor};
use wa_relay::webhook::{HttpDelivery, ReqwestClient, WebhookDelivery};

/// Type alias for the application's dispatcher.
type AppDispatcher = Dispatcher<HttpDelivery<ReqwestClient>, FileMediaStore>;

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to create the HTTP client.
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Failed to open the event input file.
    #[error("Failed to open input '{}': {source}", path.display())]
    OpenInput {
        /// Path to the input file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to read from the event input.
    #[error("Failed to read events: {0}")]
    ReadInput(#[source] std::io::Error),
}

/// Outcome counters for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    /// Events forwarded (or built, in dry-run mode) successfully
    pub forwarded: usize,
    /// Events that failed to build or deliver
    pub failed: usize,
    /// Lines that could not be parsed as events
    pub skipped: usize,
}

/// Per-run settings for [`relay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RelayOptions {
    /// Build and log payloads without delivering them
    dry_run: bool,
    /// Forwards allowed to run at the same time; reading pauses at the limit
    max_in_flight: usize,
}

impl RelayOptions {
    const fn from_config(config: &ValidatedConfig) -> Self {
        Self {
            dry_run: config.dry_run,
            max_in_flight: config.max_in_flight,
        }
    }
}

impl RelayStats {
    fn record(&mut self, joined: Result<bool, JoinError>) {
        match joined {
            Ok(true) => self.forwarded += 1,
            Ok(false) => self.failed += 1,
            Err(e) => {
                tracing::error!("Forward task failed: {e}");
                self.failed += 1;
            }
        }
    }
}

impl fmt::Display for RelayStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} event(s) forwarded, {} failed, {} line(s) skipped",
            self.forwarded, self.failed, self.skipped
        )
    }
}

/// Executes the main application loop.
///
/// This function:
/// 1. Creates the HTTP delivery client and the dispatcher
/// 2. Opens the event input (file or stdin)
/// 3. Forwards every event until end of input or a shutdown signal
///
/// # Errors
///
/// Returns an error if:
/// - The HTTP client cannot be created
/// - The input file cannot be opened or read
///
/// # Coverage Note
///
/// This function is excluded from coverage because it requires
/// real stdin and signal handling.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<(), RunError> {
    let dispatcher = Arc::new(create_dispatcher(&config)?);
    let options = RelayOptions::from_config(&config);

    if config.dry_run {
        tracing::info!("Dry-run mode enabled - payloads will be logged but not sent");
    }

    let stats = if let Some(ref path) = config.input {
        tracing::info!("Reading events from {}", path.display());
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| RunError::OpenInput {
                path: path.clone(),
                source: e,
            })?;
        relay(BufReader::new(file), dispatcher, options, shutdown_signal()).await?
    } else {
        tracing::info!("Reading events from stdin");
        relay(
            BufReader::new(tokio::io::stdin()),
            dispatcher,
            options,
            shutdown_signal(),
        )
        .await?
    };

    tracing::info!("Finished: {stats}");
    Ok(())
}

/// Creates the dispatcher from configuration.
fn create_dispatcher(config: &ValidatedConfig) -> Result<AppDispatcher, RunError> {
    let client = ReqwestClient::with_timeout(config.timeout).map_err(RunError::Client)?;

    let delivery = HttpDelivery::new(client)
        .with_retry_policy(config.retry_policy.clone())
        .with_request_timeout(config.timeout)
        .with_strict_status(config.strict_status);

    Ok(Dispatcher::new(
        config.dispatch_config(),
        FileMediaStore::new(),
        delivery,
    ))
}

/// Reads events from `reader` and forwards each one in its own task.
///
/// Stops reading at end of input or when `shutdown` completes, then waits
/// for in-flight forwards. Lines are split on raw `\n` bytes, so a line that
/// is not valid UTF-8 or not a valid event is logged and skipped. At most
/// `options.max_in_flight` forwards run at once.
async fn relay<R, D, M>(
    reader: R,
    dispatcher: Arc<Dispatcher<D, M>>,
    options: RelayOptions,
    shutdown: impl Future<Output = ()>,
) -> Result<RelayStats, RunError>
where
    R: AsyncBufRead + Unpin,
    D: WebhookDelivery + 'static,
    M: MediaExtractor + 'static,
{
    let mut lines = SplitStream::new(reader.split(b'\n'));
    let mut tasks = JoinSet::new();
    let mut stats = RelayStats::default();
    let mut read_error = None;
    let mut line_number: usize = 0;

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                tracing::info!("Shutdown signal received, stopping...");
                break;
            }

            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                stats.record(joined);
            }

            line = lines.next(), if tasks.len() < options.max_in_flight.max(1) => {
                match line {
                    Some(Ok(line)) => {
                        line_number += 1;
                        match parse_event(&line) {
                            Ok(Some(event)) => {
                                tasks.spawn(handle_event(
                                    Arc::clone(&dispatcher),
                                    event,
                                    options.dry_run,
                                ));
                            }
                            Ok(None) => {}
                            Err(e) => {
                                tracing::warn!("Skipping malformed event on line {line_number}: {e}");
                                stats.skipped += 1;
                            }
                        }
                    }
                    Some(Err(e)) => {
                        read_error = Some(e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    if !tasks.is_empty() {
        tracing::info!("Waiting for {} in-flight event(s)", tasks.len());
    }
    while let Some(joined) = tasks.join_next().await {
        stats.record(joined);
    }

    match read_error {
        Some(e) => Err(RunError::ReadInput(e)),
        None => Ok(stats),
    }
}

/// Parses one raw input line.
///
/// Blank lines yield `Ok(None)`. A trailing `\r` is ignored.
fn parse_event(line: &[u8]) -> Result<Option<Event>, serde_json::Error> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(line).map(Some)
}

/// Forwards one event, or only builds and logs its payload in dry-run mode.
///
/// Returns true on success. Failures are logged by the dispatcher.
async fn handle_event<D, M>(dispatcher: Arc<Dispatcher<D, M>>, event: Event, dry_run: bool) -> bool
where
    D: WebhookDelivery,
    M: MediaExtractor,
{
    if !dry_run {
        return dispatcher.forward(event).await.is_ok();
    }

    match dispatcher.build_payload(&event).await {
        Ok(payload) => match payload.to_bytes() {
            Ok(bytes) => {
                tracing::info!(
                    "Dry-run: {} payload for {} webhook(s): {}",
                    event.kind(),
                    dispatcher.endpoints().len(),
                    String::from_utf8_lossy(&bytes)
                );
                true
            }
            Err(e) => {
                tracing::error!("Dry-run: failed to serialize {} payload: {e}", event.kind());
                false
            }
        },
        Err(e) => {
            tracing::error!("Dry-run: failed to build {} payload: {e}", event.kind());
            false
        }
    }
}

/// Returns a future that completes when a shutdown signal is received.
///
/// If a handler cannot be installed, that signal source never fires.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
