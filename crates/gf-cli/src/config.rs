//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use gf_core::{AFK_CLIENT, WINDOW_CLIENT};
use serde::{Deserialize, Serialize};

/// Application configuration.
///
/// Command-line flags take precedence over every value here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Client prefix identifying window buckets.
    pub window_client: String,
    /// Client prefix identifying afk buckets.
    pub afk_client: String,
    /// Default gap target in milliseconds.
    pub gap_ms: u64,
    /// Processes that write to the database and must not run during a fill.
    pub writer_processes: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_client: WINDOW_CLIENT.to_string(),
            afk_client: AFK_CLIENT.to_string(),
            gap_ms: 0,
            writer_processes: vec!["aw-server".to_string(), "aw-server-rust".to_string()],
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // GAPFILL_GAP_MS, GAPFILL_WINDOW_CLIENT, ...
        figment = figment.merge(Env::prefixed("GAPFILL_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for gapfill.
///
/// On Linux: `~/.config/gapfill`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("gapfill"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn default_targets_activitywatch_watchers() {
        let config = Config::default();
        assert_eq!(config.window_client, "aw-watcher-window");
        assert_eq!(config.afk_client, "aw-watcher-afk");
        assert_eq!(config.gap_ms, 0);
        assert_eq!(config.writer_processes, ["aw-server", "aw-server-rust"]);
    }

    #[test]
    fn config_dir_ends_with_gapfill() {
        let path = dirs_config_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "gapfill");
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "gap_ms = 250").unwrap();
        writeln!(file, "writer_processes = []").unwrap();
        file.flush().unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();

        assert_eq!(config.gap_ms, 250);
        assert!(config.writer_processes.is_empty());
        assert_eq!(config.afk_client, "aw-watcher-afk");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "gap_ms = \"soon\"").unwrap();
        file.flush().unwrap();

        assert!(Config::load_from(Some(file.path())).is_err());
    }
}
