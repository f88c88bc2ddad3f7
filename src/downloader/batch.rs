//! Sequential batch loop over detail-page URLs.

use super::IconDownloader;
use crate::types::RunSummary;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

impl IconDownloader {
    /// Process every URL in order, one asset at a time
    ///
    /// Unparseable URLs are logged and counted; no single asset can stop the
    /// run. Cancelling `cancel` stops the loop: between assets nothing is left
    /// to clean up, and an asset caught mid-download keeps its files only if
    /// both are already valid.
    pub async fn run(&mut self, urls: &[String], cancel: &CancellationToken) -> RunSummary {
        let total = urls.len();
        let mut summary = RunSummary {
            total,
            ..RunSummary::default()
        };

        for (index, url) in urls.iter().enumerate() {
            if cancel.is_cancelled() {
                summary.interrupted = true;
                break;
            }
            info!(item = index + 1, total, %url, "processing");

            let identity = match self.parser.parse(url) {
                Ok(identity) => identity,
                Err(e) => {
                    warn!(error = %e, "skipping link");
                    summary.unparseable += 1;
                    continue;
                }
            };

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                outcome = self.process(&identity) => Some(outcome),
            };

            match outcome {
                Some(outcome) => summary.record(outcome),
                None => {
                    self.settle_interrupted(&identity).await;
                    summary.interrupted = true;
                    break;
                }
            }
        }

        if summary.interrupted {
            warn!(processed = summary.processed(), total, "run interrupted");
        }
        info!(
            total,
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            premium = summary.premium,
            failed = summary.failed,
            unparseable = summary.unparseable,
            generation = self.session.generation(),
            "run finished"
        );
        summary
    }
}
