//! Structural validation of downloaded assets
//!
//! A file that exists is not necessarily usable: interrupted transfers and
//! throttled responses leave truncated PNGs and HTML error pages behind. The
//! downloader asks an [`AssetValidator`] about every file before it counts a
//! pair as done.

use crate::types::AssetKind;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::path::Path;
use tracing::debug;

/// Capability that decides whether a file on disk is well-formed for its kind
///
/// Implementations must never fail: a missing or unreadable file is simply
/// invalid.
pub trait AssetValidator: Send + Sync {
    /// Returns true if `path` holds a well-formed asset of `kind`
    fn is_valid(&self, path: &Path, kind: AssetKind) -> bool;
}

/// Default validator: full PNG decode, SVG well-formedness plus root check
#[derive(Clone, Copy, Debug, Default)]
pub struct FormatValidator;

impl AssetValidator for FormatValidator {
    fn is_valid(&self, path: &Path, kind: AssetKind) -> bool {
        let checked = match kind {
            AssetKind::Raster => check_raster(path),
            AssetKind::Vector => check_vector(path),
        };
        match checked {
            Ok(()) => true,
            Err(reason) => {
                debug!(?path, %kind, %reason, "asset failed validation");
                false
            }
        }
    }
}

/// Decode the whole image, pixel data included
///
/// Header inspection alone would accept a file cut off mid-transfer.
fn check_raster(path: &Path) -> Result<(), String> {
    let reader = image::ImageReader::open(path)
        .map_err(|e| e.to_string())?
        .with_guessed_format()
        .map_err(|e| e.to_string())?;
    reader.decode().map(|_| ()).map_err(|e| e.to_string())
}

fn check_vector(path: &Path) -> Result<(), String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    let root = parse_root_element(&bytes)?;
    if root.to_ascii_lowercase().contains("svg") {
        Ok(())
    } else {
        Err(format!("root element is <{root}>, not <svg>"))
    }
}

/// Parse a complete XML document and return its root element's qualified name
fn parse_root_element(xml: &[u8]) -> Result<String, String> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().check_end_names = true;

    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut root: Option<String> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| format!("XML parse error at {}: {e}", reader.buffer_position()))?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if depth == 0 {
                    if root.is_some() {
                        return Err("more than one root element".to_string());
                    }
                    root = Some(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                }
                for attr in e.attributes() {
                    let attr = attr.map_err(|err| format!("malformed attribute: {err}"))?;
                    attr.unescape_value()
                        .map_err(|err| format!("bad attribute value: {err}"))?;
                }
                if matches!(event, Event::Start(_)) {
                    depth += 1;
                }
            }
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "end tag without start tag".to_string())?;
            }
            Event::Text(ref t) => {
                t.unescape()
                    .map_err(|err| format!("bad character data: {err}"))?;
                if depth == 0 && !t.iter().all(u8::is_ascii_whitespace) {
                    return Err("text outside the root element".to_string());
                }
            }
            Event::CData(_) if depth == 0 => {
                return Err("CDATA outside the root element".to_string());
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if depth != 0 {
        return Err(format!("document ends with {depth} unclosed element(s)"));
    }
    root.ok_or_else(|| "no root element".to_string())
}
