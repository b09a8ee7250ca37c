//! Named option snapshots persisted as a single JSON document.
//!
//! The store is a flat object mapping template names to [`Template`]
//! values. It is read once when opened and rewritten in full on every
//! change, so concurrent external edits resolve as last writer wins.

use crate::config::{ExcludeSet, SortOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from template store operations.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No template with the given name exists.
    #[error("Template not found: {name}")]
    NotFound { name: String },
    /// A template name must not be empty.
    #[error("Template name must not be empty")]
    EmptyName,
    /// Failed to write the store file.
    #[error("Failed to write templates to {}: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to serialize the store.
    #[error("Failed to serialize templates: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// A saved set of sorting options.
///
/// Field names match the JSON document. Missing fields take defaults, so
/// older or hand-written files still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub source_folder: String,
    #[serde(default)]
    pub target_folder: String,
    #[serde(default = "default_move_files")]
    pub move_files: bool,
    #[serde(default)]
    pub flatten: bool,
    /// Comma-separated extension allow-list.
    #[serde(default)]
    pub extensions: String,
    /// Comma-joined excluded names.
    #[serde(default)]
    pub exclude_patterns: String,
    #[serde(default)]
    pub sort_folders: bool,
}

fn default_move_files() -> bool {
    true
}

impl Default for Template {
    fn default() -> Self {
        Self {
            source_folder: String::new(),
            target_folder: String::new(),
            move_files: default_move_files(),
            flatten: false,
            extensions: String::new(),
            exclude_patterns: String::new(),
            sort_folders: false,
        }
    }
}

impl Template {
    /// Snapshot of the given working options.
    pub fn from_options(options: &SortOptions) -> Self {
        Self {
            source_folder: options.source.to_string_lossy().into_owned(),
            target_folder: options.target.to_string_lossy().into_owned(),
            move_files: options.move_files,
            flatten: options.flatten,
            extensions: options.extensions.clone(),
            exclude_patterns: options.exclude.to_csv(),
            sort_folders: options.sort_folders,
        }
    }

    /// Restores working options from this template.
    pub fn to_options(&self) -> SortOptions {
        SortOptions {
            source: PathBuf::from(&self.source_folder),
            target: PathBuf::from(&self.target_folder),
            move_files: self.move_files,
            flatten: self.flatten,
            extensions: self.extensions.clone(),
            exclude: self.exclude_set(),
            sort_folders: self.sort_folders,
        }
    }

    pub fn exclude_set(&self) -> ExcludeSet {
        ExcludeSet::from_csv(&self.exclude_patterns)
    }

    pub fn set_exclude_set(&mut self, exclude: &ExcludeSet) {
        self.exclude_patterns = exclude.to_csv();
    }
}

/// Templates keyed by unique name, backed by one JSON file.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    path: PathBuf,
    templates: BTreeMap<String, Template>,
}

impl TemplateStore {
    /// Opens the store at `path`.
    ///
    /// A missing, unreadable or corrupt file yields an empty store; the
    /// problem is logged, not returned.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let templates = Self::read_templates(&path);
        debug!(path = %path.display(), count = templates.len(), "opened template store");
        Self { path, templates }
    }

    fn read_templates(path: &Path) -> BTreeMap<String, Template> {
        if !path.exists() {
            return BTreeMap::new();
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read templates, starting empty");
                return BTreeMap::new();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "corrupt templates file, starting empty");
            BTreeMap::new()
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Template names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Template)> {
        self.templates
            .iter()
            .map(|(name, template)| (name.as_str(), template))
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Saves `template` under `name`, overwriting any existing one, and
    /// persists the store. Returns `true` if a template was replaced.
    pub fn save(&mut self, name: &str, template: Template) -> TemplateResult<bool> {
        if name.trim().is_empty() {
            return Err(TemplateError::EmptyName);
        }
        let replaced = self.templates.insert(name.to_string(), template).is_some();
        self.persist()?;
        Ok(replaced)
    }

    /// Removes the named template and persists the store.
    pub fn delete(&mut self, name: &str) -> TemplateResult<Template> {
        let removed = self
            .templates
            .remove(name)
            .ok_or_else(|| TemplateError::NotFound {
                name: name.to_string(),
            })?;
        self.persist()?;
        Ok(removed)
    }

    /// Applies `edit` to the named template and persists the store.
    pub fn update<F>(&mut self, name: &str, edit: F) -> TemplateResult<&Template>
    where
        F: FnOnce(&mut Template),
    {
        let template = self
            .templates
            .get_mut(name)
            .ok_or_else(|| TemplateError::NotFound {
                name: name.to_string(),
            })?;
        edit(template);
        self.persist()?;
        self.templates
            .get(name)
            .ok_or_else(|| TemplateError::NotFound {
                name: name.to_string(),
            })
    }

    /// Writes the whole store, creating its directory if needed.
    fn persist(&self) -> TemplateResult<()> {
        let write_failed = |source: std::io::Error| TemplateError::WriteFailed {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(write_failed)?;
        }

        let file = File::create(&self.path).map_err(write_failed)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.templates)?;
        writer.write_all(b"\n").map_err(write_failed)?;
        writer.flush().map_err(write_failed)?;

        debug!(path = %self.path.display(), count = self.templates.len(), "saved templates");
        Ok(())
    }
}
