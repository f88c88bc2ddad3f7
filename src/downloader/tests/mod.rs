// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::test_helpers::*;
use super::*;
use crate::error::{FatalReason, FetchOutcome, RetryReason};
use crate::types::{AssetIdentity, DEFAULT_VARIANT, Outcome, RunSummary};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
