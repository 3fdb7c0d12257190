//! Paperize Core Library
//!
//! This crate provides the wallpaper rotation engine for Paperize: albums built
//! from loose images and folders, per-target shuffled playback queues, a
//! trigger-driven rotation controller and a maintenance refresh pass. It is
//! frontend-agnostic; the host supplies paths and an event sink.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `models`: Data structures (Album, Folder, Wallpaper, SelectedAlbum, triggers, settings keys)
//! - `db`: SQLite album store implementing the repository capabilities
//! - `services`: Queue manager, rotation controller, refresher, renderer, applier, workers
//! - `events`: Event emission abstraction (EventSink trait)
//! - `paths`: Path provider abstraction (PathProvider trait)
//! - `utils`: Error handling
//!
//! # Example
//!
//! ```no_run
//! use paperize_core::{
//!     events::LoggingEventSink,
//!     models::{Trigger, TriggerParams},
//!     paths::DefaultPathProvider,
//!     PaperizeCore,
//! };
//! use std::sync::Arc;
//!
//! let core = PaperizeCore::new(
//!     Arc::new(DefaultPathProvider::new()),
//!     Arc::new(LoggingEventSink),
//! )
//! .unwrap();
//!
//! core.start().unwrap();
//! core.dispatch(Trigger::Start, TriggerParams::default()).unwrap();
//! ```

pub mod db;
pub mod events;
pub mod models;
pub mod paths;
pub mod services;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use db::{AlbumRepository, Database, DatabaseStats, SelectedAlbumRepository};
pub use events::{EventSink, LoggingEventSink, NoOpEventSink, SharedEventSink};
pub use models::{Album, Folder, SelectedAlbum, Target, Trigger, TriggerJob, TriggerParams, Wallpaper};
pub use paths::{DefaultPathProvider, PathProvider, SharedPathProvider};
pub use services::{
    ControllerDeps, JsonSettingsStore, Outcome, RotationController, RotationWorkers,
    SettingsStore,
};
pub use utils::{AppError, AppResult, CommandError};

use std::sync::Arc;

use services::{
    DirectoryScanner, FileWallpaperApplier, ImageRenderer, LocalContentResolver,
};

/// Paperize core application context.
///
/// Holds the shared stores, the per-target workers and the rotation
/// controller they feed.
pub struct PaperizeCore {
    /// Album store
    pub db: Arc<Database>,
    /// Path provider for resolving application paths
    pub path_provider: SharedPathProvider,
    /// Key-value rotation settings
    pub settings: Arc<JsonSettingsStore>,
    /// Event sink for notifications
    pub event_sink: SharedEventSink,
    /// Timer + per-target worker threads
    pub workers: Arc<RotationWorkers>,
    /// Trigger handler
    pub controller: Arc<RotationController>,
}

impl PaperizeCore {
    /// Create a new PaperizeCore instance.
    ///
    /// Opens (and migrates) the database, loads the settings file and wires
    /// the controller to the workers. Worker threads are started by
    /// [`start`](Self::start).
    pub fn new(path_provider: SharedPathProvider, event_sink: SharedEventSink) -> AppResult<Self> {
        let db = Database::open_with_provider(path_provider.as_ref())?;
        db.init()?;
        let db = Arc::new(db);

        let settings = Arc::new(JsonSettingsStore::new(path_provider.as_ref())?);
        let workers = RotationWorkers::new();

        let controller = Arc::new(RotationController::new(ControllerDeps {
            albums: db.clone(),
            selected: db.clone(),
            settings: settings.clone(),
            renderer: Arc::new(ImageRenderer::with_defaults()),
            applier: Arc::new(FileWallpaperApplier::new(path_provider.output_dir())?),
            scheduler: workers.clone(),
            events: event_sink.clone(),
            resolver: Arc::new(LocalContentResolver::new()),
            scanner: Arc::new(DirectoryScanner::with_defaults()),
        }));

        Ok(Self {
            db,
            path_provider,
            settings,
            event_sink,
            workers,
            controller,
        })
    }

    /// Start the per-target worker threads.
    pub fn start(&self) -> AppResult<()> {
        self.workers.start(self.controller.clone())
    }

    /// Route a trigger to the workers.
    ///
    /// A `combined` trigger is split into home and lock jobs when the two
    /// targets are scheduled separately.
    pub fn dispatch(&self, trigger: Trigger, params: TriggerParams) -> AppResult<()> {
        for job in self.controller.initial_jobs(trigger, params) {
            self.workers.submit(job)?;
        }
        Ok(())
    }

    /// Process a trigger synchronously on the calling thread.
    pub fn process_now(&self, trigger: Trigger, params: TriggerParams) -> AppResult<Vec<Outcome>> {
        self.controller
            .initial_jobs(trigger, params)
            .into_iter()
            .map(|job| self.controller.process(job))
            .collect()
    }

    /// Get the database reference.
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Get the path provider reference.
    pub fn paths(&self) -> &SharedPathProvider {
        &self.path_provider
    }

    /// Stop the timer and worker threads.
    pub fn shutdown(&self) {
        self.workers.shutdown();
    }
}

impl Drop for PaperizeCore {
    fn drop(&mut self) {
        self.workers.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateAlbum, SettingKey};
    use crate::testing::write_png;
    use tempfile::TempDir;

    #[test]
    fn test_paperize_core_creation() {
        let tmp = TempDir::new().unwrap();
        let path_provider = Arc::new(DefaultPathProvider::with_base_dir(tmp.path().to_path_buf()));
        let event_sink: SharedEventSink = Arc::new(NoOpEventSink);

        let core = PaperizeCore::new(path_provider, event_sink).unwrap();

        let stats = core.db.stats().unwrap();
        assert_eq!(stats.album_count, 0);
        assert!(core.paths().output_dir().is_dir());
    }

    #[test]
    fn test_process_now_rotates_to_output_file() {
        let tmp = TempDir::new().unwrap();
        let images = tmp.path().join("images");
        std::fs::create_dir(&images).unwrap();
        let uri = write_png(&images, "one.png", 8, 4, [200, 10, 10]);

        let path_provider = Arc::new(DefaultPathProvider::with_base_dir(tmp.path().join("data")));
        let core = PaperizeCore::new(path_provider, Arc::new(NoOpEventSink)).unwrap();

        core.db
            .create_album(&CreateAlbum {
                album_name: "a".to_string(),
                display_name: None,
            })
            .unwrap();
        core.db.add_wallpapers("a", &[uri.clone()]).unwrap();
        let aww = core.db.get_album_with_wallpaper_and_folder("a").unwrap().unwrap();
        core.db
            .upsert_selected_album(&SelectedAlbum::from_album(&aww))
            .unwrap();

        let s = &core.settings;
        s.put_bool(SettingKey::EnableChanger, true).unwrap();
        s.put_bool(SettingKey::EnableHomeWallpaper, true).unwrap();
        s.put_string(SettingKey::HomeAlbumName, "a").unwrap();
        s.put_int(SettingKey::DisplayWidth, 4).unwrap();
        s.put_int(SettingKey::DisplayHeight, 4).unwrap();

        let outcomes = core
            .process_now(Trigger::Start, TriggerParams::default())
            .unwrap();
        assert!(matches!(&outcomes[..], [Outcome::Rotated { uri: u, .. }] if *u == uri));

        let written = core.paths().output_dir().join("home.png");
        let img = image::open(&written).unwrap();
        assert_eq!((img.width(), img.height()), (4, 4));
        assert!(core.workers.scheduled_at(Target::Home).is_some());

        core.shutdown();
    }
}
