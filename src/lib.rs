//! # icon-dl
//!
//! Sequential downloader for icon catalogs that serve each icon as an SVG and a
//! PNG behind numeric identifiers.
//!
//! ## Design Philosophy
//!
//! icon-dl is designed to be:
//! - **Resumable** - a pair already valid on disk is never requested again
//! - **Strict about integrity** - a pair counts as done only when both files
//!   decode; anything less is deleted and fetched again
//! - **Polite** - one request at a time, rate-limit backoff, and a fresh HTTP
//!   identity once corrupted downloads pile up
//!
//! ## Quick Start
//!
//! ```no_run
//! use icon_dl::{Config, IconDownloader, links, shutdown_token};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file(&Config::family_path("phosphor"))?;
//!     let urls = links::load_or_extract(&config).await?;
//!
//!     let mut downloader = IconDownloader::new(config)?;
//!     let summary = downloader.run(&urls, &shutdown_token()).await;
//!     println!("{} downloaded, {} failed", summary.succeeded, summary.failed);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Library sweep for invalid files
pub mod cleanup;
/// Configuration types
pub mod config;
/// Core downloader implementation (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Detail-page URL parsing
pub mod identity;
/// Detail-page URL sources
pub mod links;
/// Retry logic with exponential backoff
pub mod retry;
/// HTTP session rotation
pub mod session;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;
/// Asset integrity checks
pub mod validation;

// Re-export commonly used types
pub use cleanup::{SweepReport, sweep};
pub use config::{Config, ProxySelection};
pub use downloader::IconDownloader;
pub use error::{AttemptError, Error, ParseFailure, Result};
pub use identity::IdentityParser;
pub use links::{CachedLinks, LinkSource, PageLinkExtractor};
pub use session::SessionManager;
pub use types::{AssetIdentity, AssetKind, Outcome, RunSummary};
pub use validation::{AssetValidator, FormatValidator};

use tokio_util::sync::CancellationToken;

/// Create a cancellation token that fires on the first termination signal.
///
/// Hand the token to [`IconDownloader::run`] so that Ctrl+C stops the batch
/// after cleaning up the asset in flight.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// Must be called from within a tokio runtime.
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.cancel();
    });
    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            let name = tokio::select! {
                _ = sigterm.recv() => "SIGTERM",
                _ = sigint.recv() => "SIGINT",
            };
            tracing::info!(signal = name, "stopping after the current asset");
        }
        (Ok(mut only), Err(e)) | (Err(e), Ok(mut only)) => {
            tracing::warn!(error = %e, "could not register every signal handler");
            only.recv().await;
            tracing::info!("termination signal received, stopping");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "could not register signal handlers, using ctrl_c fallback");
            if tokio::signal::ctrl_c().await.is_err() {
                // Without any handler the run can only end on its own
                std::future::pending::<()>().await;
            }
            tracing::info!("Ctrl+C received, stopping");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Ctrl+C received, stopping after the current asset"),
        Err(e) => {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}
