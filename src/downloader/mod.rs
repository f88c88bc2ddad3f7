//! Core downloader implementation split into focused submodules.
//!
//! The `IconDownloader` struct and its methods are organized by concern:
//! - this module - per-asset orchestration (`process`) and the attempt cycle
//! - [`fetch`] - single GET requests and their classification
//! - [`batch`] - the sequential loop over detail-page URLs
//!
//! One asset moves through `Pending -> Fetching -> Validating` and ends in
//! `Success`, `Skipped`, `PremiumSkipped` or `Failed`; a corrupted pair sends
//! it back to `Fetching` until the retry policy runs out.

mod batch;
mod fetch;

#[cfg(test)]
pub(crate) mod test_helpers;

#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::error::{AttemptError, FetchOutcome, Result};
use crate::identity::IdentityParser;
use crate::retry::retry_with_state;
use crate::session::SessionManager;
use crate::types::{AssetIdentity, AssetKind, Outcome};
use crate::utils;
use crate::validation::{AssetValidator, FormatValidator};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Sequential icon downloader
///
/// Owns the HTTP session and the failure counter; nothing is shared, so no
/// locking is involved.
pub struct IconDownloader {
    /// Configuration (validated at construction)
    pub(crate) config: Arc<Config>,
    /// Detail-page URL parser
    pub(crate) parser: IdentityParser,
    /// Live HTTP session and consecutive-failure counter
    pub(crate) session: SessionManager,
    /// File integrity checks
    pub(crate) validator: Arc<dyn AssetValidator>,
}

/// Everything one asset needs, resolved once before the first attempt
#[derive(Debug, Clone)]
pub(crate) struct AssetJob {
    pub(crate) identity: AssetIdentity,
    pub(crate) vector_path: PathBuf,
    pub(crate) raster_path: PathBuf,
    pub(crate) vector_url: String,
    pub(crate) raster_url: String,
}

impl AssetJob {
    pub(crate) fn new(identity: &AssetIdentity, config: &Config) -> Self {
        let root = config.icon_dir();
        let url_for = |template: &str| template.replace(crate::config::ID_PLACEHOLDER, &identity.numeric_id);
        Self {
            identity: identity.clone(),
            vector_path: identity.vector_path(root),
            raster_path: identity.raster_path(root),
            vector_url: url_for(&config.download.vector_url_template),
            raster_url: url_for(&config.download.raster_url_template),
        }
    }

    /// Both halves in fetch order: vector first, then raster
    fn files(&self) -> [(AssetKind, &str, &Path); 2] {
        [
            (AssetKind::Vector, &self.vector_url, &self.vector_path),
            (AssetKind::Raster, &self.raster_url, &self.raster_path),
        ]
    }

    async fn remove_pair(&self) {
        utils::remove_files(&[&self.vector_path, &self.raster_path]).await;
    }
}

/// What is on disk for an asset before any request is made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PairState {
    /// Both files present and valid
    Valid,
    /// Both files present, at least one invalid
    Corrupted,
    /// At least one file missing
    Incomplete,
}

impl IconDownloader {
    /// Create a downloader with the default [`FormatValidator`]
    pub fn new(config: Config) -> Result<Self> {
        Self::with_validator(config, Arc::new(FormatValidator))
    }

    /// Create a downloader with a custom validator
    pub fn with_validator(config: Config, validator: Arc<dyn AssetValidator>) -> Result<Self> {
        config.validate()?;
        let parser = IdentityParser::from_config(&config)?;
        let session = SessionManager::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            parser,
            session,
            validator,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Detail-page URL parser built from the configuration
    pub fn parser(&self) -> &IdentityParser {
        &self.parser
    }

    /// Live session state (generation, failure streak)
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Resolve one asset: skip it, download it, or give up on it
    ///
    /// Never returns an error; every failure ends in one of the [`Outcome`]
    /// variants and is logged.
    pub async fn process(&mut self, identity: &AssetIdentity) -> Outcome {
        let job = AssetJob::new(identity, &self.config);

        match self.pair_state(&job).await {
            PairState::Valid => {
                info!(asset = %identity, "skipping existing valid pair");
                return Outcome::Skipped;
            }
            PairState::Corrupted => {
                warn!(asset = %identity, "existing pair is corrupted, downloading again");
                job.remove_pair().await;
            }
            PairState::Incomplete => {
                // A lone file from an earlier run must not pair with a fresh one
                job.remove_pair().await;
            }
        }

        let folder = identity.folder(self.config.icon_dir());
        if let Err(e) = tokio::fs::create_dir_all(&folder).await {
            error!(asset = %identity, ?folder, error = %e, "cannot create icon folder");
            return Outcome::Failed;
        }

        let config = Arc::clone(&self.config);
        let mut attempt = AttemptCycle {
            downloader: self,
            job: &job,
        };
        let result = retry_with_state(&config.retry, &mut attempt, |cycle, number| {
            Box::pin(cycle.run(number))
        })
        .await;

        match result {
            Ok(attempts) => {
                info!(asset = %identity, attempts, "downloaded");
                Outcome::Success
            }
            Err(AttemptError::Premium { url }) => {
                info!(asset = %identity, %url, "premium icon, skipping");
                Outcome::PremiumSkipped
            }
            Err(e @ AttemptError::Corrupted { .. }) => {
                error!(
                    asset = %identity,
                    attempts = config.retry.max_attempts,
                    error = %e,
                    "giving up on asset"
                );
                Outcome::Failed
            }
        }
    }

    pub(crate) async fn pair_state(&self, job: &AssetJob) -> PairState {
        if !utils::exists(&job.vector_path).await || !utils::exists(&job.raster_path).await {
            return PairState::Incomplete;
        }
        if self.pair_is_valid(job) {
            PairState::Valid
        } else {
            PairState::Corrupted
        }
    }

    fn pair_is_valid(&self, job: &AssetJob) -> bool {
        self.validator.is_valid(&job.vector_path, AssetKind::Vector)
            && self.validator.is_valid(&job.raster_path, AssetKind::Raster)
    }

    /// Clean up after an asset whose processing was cut short
    ///
    /// A valid pair stays; anything else is removed so that no half-written
    /// file survives the interruption.
    pub(crate) async fn settle_interrupted(&self, identity: &AssetIdentity) {
        let job = AssetJob::new(identity, &self.config);
        if self.pair_state(&job).await != PairState::Valid {
            debug!(asset = %identity, "removing partial files of interrupted asset");
            job.remove_pair().await;
        }
    }
}

/// One asset's attempt state, borrowed mutably by the retry combinator
struct AttemptCycle<'a> {
    downloader: &'a mut IconDownloader,
    job: &'a AssetJob,
}

impl AttemptCycle<'_> {
    /// Fetch both files, then validate them as a pair
    async fn run(&mut self, attempt: u32) -> std::result::Result<u32, AttemptError> {
        let job = self.job;
        let downloader = &mut *self.downloader;
        debug!(asset = %job.identity, attempt, "fetching pair");

        for (kind, url, path) in job.files() {
            match downloader.fetch_to_file(url, path).await {
                FetchOutcome::Success(body) => {
                    debug!(asset = %job.identity, %kind, bytes = body.len(), "saved");
                }
                FetchOutcome::Retryable(reason) => {
                    warn!(asset = %job.identity, %kind, %url, %reason, attempt, "download failed");
                }
                FetchOutcome::Fatal(reason) => {
                    debug!(asset = %job.identity, %kind, %url, %reason, "aborting asset");
                    job.remove_pair().await;
                    return Err(AttemptError::Premium {
                        url: url.to_string(),
                    });
                }
            }
        }

        let vector_valid = downloader
            .validator
            .is_valid(&job.vector_path, AssetKind::Vector);
        let raster_valid = downloader
            .validator
            .is_valid(&job.raster_path, AssetKind::Raster);

        if vector_valid && raster_valid {
            downloader.session.record_success();
            return Ok(attempt);
        }

        let streak = downloader.session.consecutive_failures() + 1;
        match downloader.session.record_failure() {
            Ok(rotated) => warn!(
                asset = %job.identity,
                attempt,
                vector_valid,
                raster_valid,
                consecutive_failures = streak,
                rotated,
                "corrupted download"
            ),
            Err(e) => error!(asset = %job.identity, error = %e, "session rotation failed"),
        }
        job.remove_pair().await;

        Err(AttemptError::Corrupted {
            vector_valid,
            raster_valid,
        })
    }
}
