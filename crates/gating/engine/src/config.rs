//! Process-wide, hot-reloadable gating configuration.
//!
//! Readers take a [`VersionedSnapshot`] once per adapter invocation and use
//! it for every sub-decision of that call. Writers swap the whole settings
//! value; a reader never sees half of an update.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

use tag_gating_types::{ConfigError, ConfigSnapshot, GatingSettings};

/// A snapshot tagged with the config revision that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedSnapshot {
    pub revision: u64,
    pub snapshot: ConfigSnapshot,
}

/// One installed revision: the operator settings and what they resolved to.
///
/// Resolution happens once, when the settings are installed, so readers
/// never re-validate and an unusable configuration is reported once per
/// revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub revision: u64,
    pub settings: Arc<GatingSettings>,
    pub snapshot: ConfigSnapshot,
    /// Why enforcement was dropped, for enabled-but-invalid settings.
    pub error: Option<ConfigError>,
}

impl ResolvedConfig {
    fn install(revision: u64, settings: GatingSettings) -> Self {
        let (snapshot, error) = settings.resolve();
        if let Some(e) = &error {
            warn!(revision, error = %e, "Gating configuration unusable, enforcement disabled");
        }
        Self {
            revision,
            settings: Arc::new(settings),
            snapshot,
            error,
        }
    }
}

pub struct GatingConfigStore {
    current: RwLock<Arc<ResolvedConfig>>,
    source: Option<PathBuf>,
}

impl GatingConfigStore {
    pub fn new(settings: GatingSettings) -> Self {
        Self {
            current: RwLock::new(Arc::new(ResolvedConfig::install(1, settings))),
            source: None,
        }
    }

    /// Load settings from a TOML file and remember it for [`Self::reload`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let settings = read_settings(path)?;
        info!(path = %path.display(), enabled = settings.enabled, "Gating configuration loaded");
        let mut store = Self::new(settings);
        store.source = Some(path.to_path_buf());
        Ok(store)
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// The installed revision, read once.
    pub fn current(&self) -> Arc<ResolvedConfig> {
        // Revisions are replaced wholesale, so a poisoned lock still holds a
        // complete value.
        let current = match self.current.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(&current)
    }

    /// Current operator settings.
    pub fn settings(&self) -> Arc<GatingSettings> {
        Arc::clone(&self.current().settings)
    }

    pub fn revision(&self) -> u64 {
        self.current().revision
    }

    /// The immutable snapshot adapters evaluate against.
    ///
    /// Enabled-but-invalid settings resolve to `Disabled`: every surface
    /// stops enforcing together rather than some erroring and some not.
    pub fn snapshot(&self) -> VersionedSnapshot {
        let current = self.current();
        VersionedSnapshot {
            revision: current.revision,
            snapshot: current.snapshot.clone(),
        }
    }

    /// Install new settings. Returns the new revision.
    pub fn replace(&self, settings: GatingSettings) -> u64 {
        let mut current = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let revision = current.revision + 1;
        info!(
            revision,
            enabled = settings.enabled,
            tag = %settings.tag_name,
            "Gating configuration replaced"
        );
        *current = Arc::new(ResolvedConfig::install(revision, settings));
        revision
    }

    /// Re-read the file this store was loaded from.
    ///
    /// A file that cannot be read or parsed leaves the current settings in
    /// place. A file that parses but fails validation is installed and
    /// resolves to `Disabled`.
    pub fn reload(&self) -> Result<u64, ConfigError> {
        let path = self
            .source
            .as_deref()
            .ok_or_else(|| ConfigError::Io("configuration was not loaded from a file".into()))?;
        match read_settings(path) {
            Ok(settings) => Ok(self.replace(settings)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Gating configuration reload failed");
                Err(e)
            }
        }
    }
}

impl Default for GatingConfigStore {
    fn default() -> Self {
        Self::new(GatingSettings::default())
    }
}

fn read_settings(path: &Path) -> Result<GatingSettings, ConfigError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
    toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
}
