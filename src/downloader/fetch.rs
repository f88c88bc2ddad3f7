//! Single-endpoint fetches and their classification.

use super::IconDownloader;
use crate::error::{FatalReason, FetchOutcome, RetryReason};
use crate::retry::jittered;
use reqwest::StatusCode;
use std::path::Path;
use tracing::warn;

impl IconDownloader {
    /// GET one URL with the live session and classify the response
    ///
    /// - 403 is premium content and fatal for the asset
    /// - 429 backs off (base delay plus jitter) before reporting a retryable failure
    /// - any other non-2xx status, an empty body or a transport error is retryable
    pub(crate) async fn fetch(&self, url: &str) -> FetchOutcome {
        let response = match self.session.current().get(url).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Retryable(RetryReason::Transport(e.to_string())),
        };

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return FetchOutcome::Fatal(FatalReason::Premium(status.as_u16()));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let limits = &self.config.rate_limit;
            let wait = jittered(limits.base_delay, limits.jitter_min, limits.jitter_max);
            warn!(%url, wait_secs = wait.as_secs_f64(), "rate limited, backing off");
            tokio::time::sleep(wait).await;
            return FetchOutcome::Retryable(RetryReason::RateLimited);
        }
        if !status.is_success() {
            return FetchOutcome::Retryable(RetryReason::Status(status.as_u16()));
        }

        match response.bytes().await {
            Ok(body) if body.is_empty() => FetchOutcome::Retryable(RetryReason::EmptyBody),
            Ok(body) => FetchOutcome::Success(body.to_vec()),
            Err(e) => FetchOutcome::Retryable(RetryReason::Transport(e.to_string())),
        }
    }

    /// [`fetch`](Self::fetch) and write a successful body verbatim to `path`
    pub(crate) async fn fetch_to_file(&self, url: &str, path: &Path) -> FetchOutcome {
        match self.fetch(url).await {
            FetchOutcome::Success(body) => match tokio::fs::write(path, &body).await {
                Ok(()) => FetchOutcome::Success(body),
                Err(e) => FetchOutcome::Retryable(RetryReason::Write {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }),
            },
            other => other,
        }
    }
}
