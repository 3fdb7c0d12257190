//! Path provider abstraction.
//!
//! Resolves where the database, settings file, logs and rendered wallpapers
//! live, so the engine never hardcodes a platform directory.

use std::path::PathBuf;
use std::sync::Arc;

/// Trait for providing application data paths.
pub trait PathProvider: Send + Sync {
    /// Get the root application data directory.
    fn app_data_dir(&self) -> PathBuf;

    /// Get the database directory.
    fn database_dir(&self) -> PathBuf {
        self.app_data_dir().join("Database")
    }

    /// Get the settings file path.
    fn settings_path(&self) -> PathBuf {
        self.app_data_dir().join("Config").join("settings.json")
    }

    /// Get the logs directory.
    fn logs_dir(&self) -> PathBuf {
        self.app_data_dir().join("Logs")
    }

    /// Directory the file applier writes `home.png` / `lock.png` into.
    fn output_dir(&self) -> PathBuf {
        self.app_data_dir().join("Wallpapers")
    }

    /// Get the database file path.
    fn database_path(&self) -> PathBuf {
        self.database_dir().join("paperize.db")
    }
}

/// Shared reference to a PathProvider implementation.
pub type SharedPathProvider = Arc<dyn PathProvider>;

/// Default path provider rooted at `<data dir>/Paperize`.
#[derive(Debug, Clone)]
pub struct DefaultPathProvider {
    app_data_dir: PathBuf,
}

impl DefaultPathProvider {
    pub fn new() -> Self {
        let app_data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Paperize");
        Self { app_data_dir }
    }

    /// Create a provider with a custom base directory.
    ///
    /// Used by tests and the `--data-dir` flag.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            app_data_dir: base_dir,
        }
    }
}

impl Default for DefaultPathProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PathProvider for DefaultPathProvider {
    fn app_data_dir(&self) -> PathBuf {
        self.app_data_dir.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_rooted_at_base_dir() {
        let provider = DefaultPathProvider::with_base_dir(PathBuf::from("/tmp/paperize"));
        assert_eq!(
            provider.database_path(),
            PathBuf::from("/tmp/paperize/Database/paperize.db")
        );
        assert_eq!(
            provider.settings_path(),
            PathBuf::from("/tmp/paperize/Config/settings.json")
        );
        assert!(provider.output_dir().starts_with("/tmp/paperize"));
    }
}
