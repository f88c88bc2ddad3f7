//! Test configuration helpers

use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::MockServer;

/// Workspace for one test: a temp dir holding the config file, link cache and icons
pub struct TestWorkspace {
    /// Keeps the directory alive for the duration of the test
    pub dir: TempDir,
    /// Path of the written configuration file
    pub config_path: PathBuf,
}

impl TestWorkspace {
    /// Icon root configured for this workspace
    pub fn icon_root(&self) -> PathBuf {
        self.dir.path().join("icons")
    }

    /// Link cache configured for this workspace
    pub fn links_file(&self) -> PathBuf {
        self.dir.path().join("links.txt")
    }

    /// Write a link cache with one URL per line
    pub fn write_links(&self, urls: &[String]) {
        std::fs::write(self.links_file(), urls.join("\n")).unwrap();
    }
}

/// Write a family configuration file aimed at `server`
///
/// Retries are fast and pauses are zero; `extra` is merged over the defaults
/// so a test can tweak any key.
pub fn write_config(server: &MockServer, extra: serde_json::Value) -> TestWorkspace {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let mut value = json!({
        "target_url": format!("{}/catalog", server.uri()),
        "icon_dir": root.join("icons"),
        "links_file": root.join("links.txt"),
        "icon_types": ["thin", "bold", "fill"],
        "prefix_to_remove": "ph_",
        "vector_url_template": format!("{}/icons/{{id}}/download/svg/4096", server.uri()),
        "raster_url_template": format!("{}/icons/{{id}}/download/png/1024", server.uri()),
        "request_timeout": 10,
        "link_css": "a.icon-link",
        "headless_mode": true,
        "retry": { "max_attempts": 3, "initial_delay": 0 },
        "rate_limit": { "base_delay": 0, "jitter_min": 0, "jitter_max": 0 }
    });
    merge(&mut value, extra);

    let config_path = root.join("configuration_test.json");
    std::fs::write(&config_path, serde_json::to_vec_pretty(&value).unwrap()).unwrap();
    TestWorkspace { dir, config_path }
}

fn merge(base: &mut serde_json::Value, extra: serde_json::Value) {
    match (base, extra) {
        (serde_json::Value::Object(base), serde_json::Value::Object(extra)) => {
            for (key, value) in extra {
                merge(base.entry(key).or_insert(serde_json::Value::Null), value);
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Load the workspace configuration through the public API
pub fn load(workspace: &TestWorkspace) -> icon_dl::Config {
    icon_dl::Config::from_file(Path::new(&workspace.config_path)).unwrap()
}
