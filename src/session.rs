//! HTTP session identity and rotation
//!
//! Some catalogs start serving truncated or empty bodies to clients they have
//! flagged. The [`SessionManager`] owns the one live `reqwest::Client` and
//! replaces it wholesale, with a new user agent and optionally a new proxy,
//! once corrupted downloads pile up.

use crate::config::{Config, ProxySelection};
use crate::error::{Error, Result};
use rand::Rng;
use rand::seq::SliceRandom;
use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::{debug, info};

/// Firefox version numbers drawn for each new user agent
const BROWSER_VERSIONS: RangeInclusive<u32> = 90..=120;

/// Owns the current HTTP client and the consecutive-failure counter
pub struct SessionManager {
    client: reqwest::Client,
    user_agent: String,
    proxy: Option<String>,
    proxies: Vec<String>,
    selection: ProxySelection,
    next_proxy: usize,
    request_timeout: Duration,
    rotation_threshold: u32,
    consecutive_failures: u32,
    generation: u64,
}

impl SessionManager {
    /// Build the manager and its first session
    pub fn new(config: &Config) -> Result<Self> {
        let proxies = config.session.proxies.clone();
        let selection = config.session.proxy_selection;
        let mut next_proxy = 0;
        let proxy = pick_proxy(&proxies, selection, &mut next_proxy);
        let user_agent = random_user_agent();
        let client = build_client(&user_agent, proxy.as_deref(), config.download.request_timeout)?;

        Ok(Self {
            client,
            user_agent,
            proxy,
            proxies,
            selection,
            next_proxy,
            request_timeout: config.download.request_timeout,
            rotation_threshold: config.session.rotation_threshold.max(1),
            consecutive_failures: 0,
            generation: 1,
        })
    }

    /// The live client
    pub fn current(&self) -> &reqwest::Client {
        &self.client
    }

    /// User agent sent by the live client
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Proxy used by the live client, if any
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    /// Number of sessions built so far (1 right after construction)
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Corrupted attempts since the last success or rotation
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Replace the live client with a fresh identity and reset the failure counter
    ///
    /// If the new client cannot be built the old one stays in place.
    pub fn rotate(&mut self) -> Result<()> {
        let user_agent = random_user_agent();
        let proxy = pick_proxy(&self.proxies, self.selection, &mut self.next_proxy);
        let client = build_client(&user_agent, proxy.as_deref(), self.request_timeout)?;

        self.client = client;
        self.user_agent = user_agent;
        self.proxy = proxy;
        self.consecutive_failures = 0;
        self.generation += 1;

        info!(
            generation = self.generation,
            user_agent = %self.user_agent,
            proxy = self.proxy.as_deref().unwrap_or("none"),
            "session rotated"
        );
        Ok(())
    }

    /// Count one corrupted attempt; rotates once the threshold is reached
    ///
    /// Returns whether a rotation happened.
    pub fn record_failure(&mut self) -> Result<bool> {
        self.consecutive_failures += 1;
        debug!(
            consecutive_failures = self.consecutive_failures,
            threshold = self.rotation_threshold,
            "corrupted attempt recorded"
        );
        if self.consecutive_failures >= self.rotation_threshold {
            self.rotate()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Reset the failure counter after a valid download
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }
}

fn pick_proxy(proxies: &[String], selection: ProxySelection, next: &mut usize) -> Option<String> {
    if proxies.is_empty() {
        return None;
    }
    match selection {
        ProxySelection::Random => proxies.choose(&mut rand::thread_rng()).cloned(),
        ProxySelection::RoundRobin => {
            let proxy = proxies[*next % proxies.len()].clone();
            *next = (*next + 1) % proxies.len();
            Some(proxy)
        }
    }
}

fn random_user_agent() -> String {
    let mut rng = rand::thread_rng();
    let rv = rng.gen_range(BROWSER_VERSIONS);
    let firefox = rng.gen_range(BROWSER_VERSIONS);
    format!(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:{rv}.0) Gecko/20100101 Firefox/{firefox}.0"
    )
}

fn build_client(user_agent: &str, proxy: Option<&str>, timeout: Duration) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout);
    if let Some(proxy) = proxy {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| Error::config(format!("{proxy}: {e}"), "session.proxies"))?;
        builder = builder.proxy(proxy);
    }
    Ok(builder.build()?)
}
