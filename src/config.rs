//! Sorting options, file filters and the settings file.
//!
//! [`SortOptions`] is the working configuration handed to the planner and
//! executor. It carries an [`ExtensionFilter`] (allow-list) and an
//! [`ExcludeSet`] (names to skip). [`Settings`] holds user defaults loaded
//! from a TOML file.
//!
//! # Settings File Format
//!
//! ```toml
//! templates_file = "/home/me/sort-templates.json"
//!
//! [defaults]
//! move_files = true
//! flatten = false
//! sort_folders = false
//! extensions = ""
//! exclude = ["Thumbs.db", ".DS_Store"]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Allow-list token that admits files without an extension.
pub const EMPTY_EXTENSION_TOKEN: &str = "leer";

/// Name of the settings file looked up in the current directory.
const LOCAL_SETTINGS_FILE: &str = ".foldersortrc.toml";

/// Errors that can occur while loading the settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Settings file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration in {}: {reason}", .path.display())]
    ConfigInvalid { path: PathBuf, reason: String },
    /// IO error while reading the settings file.
    #[error("IO error reading configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Returns the per-user directory holding settings and templates.
pub fn app_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("foldersort"))
}

/// User settings loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Overrides the location of the template store.
    #[serde(default)]
    pub templates_file: Option<PathBuf>,

    /// Option values used when neither a template nor a flag sets them.
    #[serde(default)]
    pub defaults: Defaults,
}

/// Default option values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default = "default_move_files")]
    pub move_files: bool,
    #[serde(default)]
    pub flatten: bool,
    #[serde(default)]
    pub sort_folders: bool,
    #[serde(default)]
    pub extensions: String,
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_move_files() -> bool {
    true
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            move_files: default_move_files(),
            flatten: false,
            sort_folders: false,
            extensions: String::new(),
            exclude: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings, with fallback to defaults.
    ///
    /// Attempts to load settings in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.foldersortrc.toml` in the current directory
    /// 3. Look for `config.toml` in the per-user config directory
    /// 4. Fall back to default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file is found or named but cannot be
    /// read or parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local = PathBuf::from(LOCAL_SETTINGS_FILE);
        if local.exists() {
            return Self::load_from_file(&local);
        }

        if let Some(dir) = app_config_dir() {
            let user = dir.join("config.toml");
            if user.exists() {
                return Self::load_from_file(&user);
            }
        }

        Ok(Self::default())
    }

    /// Load settings from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let settings: Settings =
            toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Returns the template store path: the configured one, else the per-user default.
    pub fn templates_path(&self) -> Option<PathBuf> {
        self.templates_file
            .clone()
            .or_else(|| app_config_dir().map(|dir| dir.join("templates.json")))
    }
}

/// Extension allow-list parsed from a comma-separated string.
///
/// An empty list allows every file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionFilter {
    allowed: Vec<String>,
}

impl ExtensionFilter {
    /// Parses `"jpg, PNG,leer"` into `["jpg", "png", "leer"]`.
    pub fn parse(csv: &str) -> Self {
        let allowed = csv
            .split(',')
            .map(|ext| ext.trim().to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { allowed }
    }

    /// Returns `true` if the filter admits every file.
    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    /// Checks whether a file with the given extension passes the filter.
    ///
    /// `None` and an empty string both mean "no extension"; such files pass
    /// only when the allow-list is empty or contains [`EMPTY_EXTENSION_TOKEN`].
    pub fn allows(&self, ext: Option<&str>) -> bool {
        if self.allowed.is_empty() {
            return true;
        }
        match ext.filter(|ext| !ext.is_empty()) {
            Some(ext) => {
                let ext = ext.to_lowercase();
                self.allowed.iter().any(|allowed| *allowed == ext)
            }
            None => self
                .allowed
                .iter()
                .any(|allowed| allowed == EMPTY_EXTENSION_TOKEN),
        }
    }
}

/// Names of files and folders to skip, compared case-insensitively.
///
/// Keeps insertion order so lists round-trip through templates unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludeSet {
    names: Vec<String>,
}

impl ExcludeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the comma-joined form stored in templates. Empty items are dropped.
    pub fn from_csv(csv: &str) -> Self {
        let mut set = Self::new();
        for name in csv.split(',').filter(|name| !name.is_empty()) {
            set.add(name);
        }
        set
    }

    /// Joins the names with commas.
    pub fn to_csv(&self) -> String {
        self.names.join(",")
    }

    /// Adds a name. Returns `false` if exactly this name is already present.
    ///
    /// Names differing only in case are kept as separate entries; matching
    /// ignores case either way.
    pub fn add(&mut self, name: &str) -> bool {
        if name.is_empty() || self.names.iter().any(|existing| existing == name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    /// Removes a name, ignoring case. Returns `false` if it was not present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.names.len();
        let needle = name.to_lowercase();
        self.names.retain(|existing| existing.to_lowercase() != needle);
        self.names.len() != before
    }

    /// Case-insensitive exact match against a file or folder name.
    pub fn contains(&self, name: &str) -> bool {
        let needle = name.to_lowercase();
        self.names
            .iter()
            .any(|existing| existing.to_lowercase() == needle)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for ExcludeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.add(name.as_ref());
        }
        set
    }
}

/// Whether files are moved or copied into the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Move,
    Copy,
}

impl TransferMode {
    pub fn from_move_flag(move_files: bool) -> Self {
        if move_files { Self::Move } else { Self::Copy }
    }

    /// Past-tense verb for summaries.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Move => "moved",
            Self::Copy => "copied",
        }
    }
}

/// The full set of options for one sorting run.
#[derive(Debug, Clone, PartialEq)]
pub struct SortOptions {
    /// Folder whose contents are sorted.
    pub source: PathBuf,
    /// Folder that receives the category subfolders.
    pub target: PathBuf,
    /// Move files instead of copying them.
    pub move_files: bool,
    /// Recurse into subfolders and drop their structure.
    pub flatten: bool,
    /// Comma-separated extension allow-list.
    pub extensions: String,
    /// Names to skip.
    pub exclude: ExcludeSet,
    /// Also sort whole top-level subfolders into the folder bucket.
    pub sort_folders: bool,
}

impl SortOptions {
    /// Options with every flag at its default.
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self::with_defaults(source, target, &Defaults::default())
    }

    /// Options seeded from settings defaults.
    pub fn with_defaults(
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        defaults: &Defaults,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            move_files: defaults.move_files,
            flatten: defaults.flatten,
            extensions: defaults.extensions.clone(),
            exclude: defaults.exclude.iter().collect(),
            sort_folders: defaults.sort_folders,
        }
    }

    pub fn mode(&self) -> TransferMode {
        TransferMode::from_move_flag(self.move_files)
    }

    pub fn extension_filter(&self) -> ExtensionFilter {
        ExtensionFilter::parse(&self.extensions)
    }
}
