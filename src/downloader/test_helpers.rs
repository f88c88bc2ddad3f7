//! Shared test helpers for creating IconDownloader instances in tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::config::Config;
use crate::downloader::IconDownloader;
use crate::types::AssetIdentity;
use std::io::Cursor;
use std::time::Duration;
use tempfile::{TempDir, tempdir};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Minimal well-formed SVG document
pub(crate) const SAMPLE_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 256 256"><path d="M128,24a104,104,0,1,0,104,104"/></svg>"#;

/// Body the catalog sends instead of an asset when it throttles a client
pub(crate) const THROTTLE_PAGE: &str = "<html><body>Please slow down</body></html>";

/// A small but fully valid PNG
pub(crate) fn sample_png() -> Vec<u8> {
    let img = image::RgbaImage::from_fn(32, 32, |x, y| {
        image::Rgba([(x * 8) as u8, (y * 8) as u8, ((x + y) * 4) as u8, 255])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Config pointing at a mock server, with fast retries and no backoff
pub(crate) fn test_config(icon_root: &std::path::Path, server_uri: &str) -> Config {
    let mut config = Config::default();
    config.catalog.icon_dir = icon_root.to_path_buf();
    config.catalog.icon_types = vec!["thin".into(), "bold".into()];
    config.download.vector_url_template = format!("{server_uri}/icons/{{id}}/download/svg/4096");
    config.download.raster_url_template = format!("{server_uri}/icons/{{id}}/download/png/1024");
    config.download.request_timeout = Duration::from_secs(10);
    config.retry.max_attempts = 3;
    config.retry.initial_delay = Duration::ZERO;
    config.rate_limit.base_delay = Duration::ZERO;
    config.rate_limit.jitter_min = Duration::ZERO;
    config.rate_limit.jitter_max = Duration::from_millis(10);
    config
}

/// Downloader writing under a fresh temp dir; the dir must be kept alive
pub(crate) fn create_test_downloader(
    server: &MockServer,
    tweak: impl FnOnce(&mut Config),
) -> (IconDownloader, TempDir) {
    let temp_dir = tempdir().unwrap();
    let mut config = test_config(&temp_dir.path().join("icons"), &server.uri());
    tweak(&mut config);
    let downloader = IconDownloader::new(config).unwrap();
    (downloader, temp_dir)
}

pub(crate) fn identity(id: &str, name: &str, variant: &str) -> AssetIdentity {
    AssetIdentity {
        numeric_id: id.into(),
        base_name: name.into(),
        variant: variant.into(),
    }
}

pub(crate) fn svg_path(id: &str) -> String {
    format!("/icons/{id}/download/svg/4096")
}

pub(crate) fn png_path(id: &str) -> String {
    format!("/icons/{id}/download/png/1024")
}

/// Serve a valid SVG and PNG for `id`
pub(crate) async fn mount_valid_asset(server: &MockServer, id: &str) {
    Mock::given(method("GET"))
        .and(path(svg_path(id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_SVG))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(png_path(id)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(sample_png()))
        .mount(server)
        .await;
}

/// Number of requests the mock server has seen so far
pub(crate) async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}
