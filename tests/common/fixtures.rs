//! Icon fixtures and a mock catalog

use std::io::Cursor;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Minimal well-formed SVG
pub const VALID_SVG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24">
  <circle cx="12" cy="12" r="10"/>
</svg>"#;

/// SVG cut off mid-document
pub const TRUNCATED_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"><circle cx="12""#;

/// What a throttling catalog sends instead of an icon
pub const HTML_ERROR_PAGE: &str = "<!DOCTYPE html><html><body><h1>Too many requests</h1></body></html>";

/// A valid PNG of the given edge length
pub fn valid_png(size: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(size, size, |x, y| {
        image::Rgba([x as u8, y as u8, 128, 255])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// A PNG whose data stream ends halfway
pub fn truncated_png() -> Vec<u8> {
    let mut bytes = valid_png(64);
    bytes.truncate(bytes.len() / 2);
    bytes
}

/// Catalog page linking to the given `(id, slug)` detail pages
pub fn catalog_page(icons: &[(&str, &str)]) -> String {
    let anchors: String = icons
        .iter()
        .map(|(id, slug)| format!(r#"<a href="/icons/{id}/{slug}">{slug}</a>"#))
        .collect();
    format!("<html><body><a href=\"/pricing\">Pricing</a>{anchors}</body></html>")
}

/// Serve a valid pair for `id`
pub async fn serve_valid_icon(server: &MockServer, id: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/icons/{id}/download/svg/4096")))
        .respond_with(ResponseTemplate::new(200).set_body_string(VALID_SVG))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/icons/{id}/download/png/1024")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(valid_png(48)))
        .mount(server)
        .await;
}

/// Answer both endpoints of `id` with `status`
pub async fn serve_status(server: &MockServer, id: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/icons/{id}/download/svg/4096")))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/icons/{id}/download/png/1024")))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Detail-page URL as it appears in a link cache
pub fn detail_url(server: &MockServer, id: &str, slug: &str) -> String {
    format!("{}/icons/{id}/{slug}", server.uri())
}
