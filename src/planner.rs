//! Builds the list of transfers that sorting a source folder would perform.
//!
//! Planning only reads the filesystem. The resulting [`Plan`] can be shown
//! to the user and then handed to the executor unchanged.

use crate::config::{ExcludeSet, ExtensionFilter, SortOptions};
use crate::file_category::{Category, FOLDER_BUCKET, classify};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

/// Errors that abort planning. No partial plan is returned.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The source folder does not exist or is not a directory.
    #[error("Source folder is not a directory: {}", .path.display())]
    InvalidSource { path: PathBuf },
    /// A directory in the source tree could not be read.
    #[error("Cannot read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// What a plan entry transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A single file, sorted into the given category folder.
    File(Category),
    /// A whole top-level subfolder, sorted into the folder bucket.
    Folder,
}

/// One pending transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: EntryKind,
}

impl PlanEntry {
    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }

    /// Name of the folder directly under the target that this entry lands in.
    pub fn bucket(&self) -> &'static str {
        match self.kind {
            EntryKind::File(category) => category.dir_name(),
            EntryKind::Folder => FOLDER_BUCKET,
        }
    }
}

/// Ordered transfers: all files first, then whole folders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub entries: Vec<PlanEntry>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn file_count(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.is_folder()).count()
    }

    pub fn folder_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_folder()).count()
    }

    /// Number of entries per destination bucket, sorted by bucket name.
    pub fn bucket_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.bucket().to_string()).or_insert(0) += 1;
        }
        counts
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlanEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a PlanEntry;
    type IntoIter = std::slice::Iter<'a, PlanEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Plans how the source folder of `options` is sorted into its target.
///
/// Files come first, in walk order (files of a folder before its
/// subfolders, names sorted). When folder sorting is on, each remaining
/// top-level subfolder follows as a whole-folder entry.
///
/// # Errors
///
/// Returns an error if the source folder or any folder the walk enters
/// cannot be read.
///
/// # Examples
///
/// ```no_run
/// use foldersort::config::SortOptions;
/// use foldersort::planner::plan;
///
/// let options = SortOptions::new("/home/me/Downloads", "/home/me/Sorted");
/// let plan = plan(&options)?;
/// for entry in &plan {
///     println!("{} -> {}", entry.source.display(), entry.destination.display());
/// }
/// # Ok::<(), foldersort::planner::PlanError>(())
/// ```
pub fn plan(options: &SortOptions) -> Result<Plan, PlanError> {
    if !options.source.is_dir() {
        return Err(PlanError::InvalidSource {
            path: options.source.clone(),
        });
    }

    let filter = options.extension_filter();
    let mut entries = plan_files(options, &filter)?;
    let file_count = entries.len();

    if options.sort_folders {
        entries.extend(plan_folders(options)?);
    }

    info!(
        source = %options.source.display(),
        files = file_count,
        folders = entries.len() - file_count,
        "planned sort"
    );
    Ok(Plan { entries })
}

fn plan_files(options: &SortOptions, filter: &ExtensionFilter) -> Result<Vec<PlanEntry>, PlanError> {
    let max_depth = if options.flatten { usize::MAX } else { 1 };
    let target = absolute(&options.target);

    let walker = WalkDir::new(&options.source)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by(|a, b| {
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_entry(|entry| !is_pruned_dir(entry, &options.exclude, &target));

    let mut entries = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| options.source.clone());
            PlanError::Unreadable {
                path,
                source: e.into(),
            }
        })?;

        if entry.path().is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if options.exclude.contains(&name) {
            debug!(file = %entry.path().display(), "excluded by name");
            continue;
        }

        let ext = entry.path().extension().map(|ext| ext.to_string_lossy());
        if !filter.allows(ext.as_deref()) {
            continue;
        }

        let category = classify(ext.as_deref().unwrap_or(""));
        let destination = options
            .target
            .join(category.dir_name())
            .join(entry.file_name());
        if absolute(&destination) == absolute(entry.path()) {
            debug!(file = %entry.path().display(), "already in place");
            continue;
        }
        entries.push(PlanEntry {
            source: entry.into_path(),
            destination,
            kind: EntryKind::File(category),
        });
    }
    Ok(entries)
}

/// Excluded folders, and the target folder when it sits inside the source,
/// are never entered.
fn is_pruned_dir(entry: &DirEntry, exclude: &ExcludeSet, target: &Path) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    exclude.contains(&entry.file_name().to_string_lossy()) || absolute(entry.path()) == target
}

fn plan_folders(options: &SortOptions) -> Result<Vec<PlanEntry>, PlanError> {
    let unreadable = |source: std::io::Error| PlanError::Unreadable {
        path: options.source.clone(),
        source,
    };
    let target = absolute(&options.target);
    let bucket = options.target.join(FOLDER_BUCKET);

    let mut names = Vec::new();
    for entry in fs::read_dir(&options.source).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        let path = entry.path();
        if !path.is_dir() || absolute(&path) == target {
            continue;
        }
        let name = entry.file_name();
        if options.exclude.contains(&name.to_string_lossy()) {
            debug!(folder = %path.display(), "excluded by name");
            continue;
        }
        names.push(name);
    }
    names.sort();

    Ok(names
        .into_iter()
        .map(|name| PlanEntry {
            source: options.source.join(&name),
            destination: bucket.join(&name),
            kind: EntryKind::Folder,
        })
        .collect())
}

/// Absolute form of `path` with `.` and `..` resolved lexically, for comparisons.
fn absolute(path: &Path) -> PathBuf {
    let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent");
        }
        fs::write(path, "content").expect("Failed to write file");
    }

    #[test]
    fn test_plan_missing_source_is_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let options = SortOptions::new(temp_dir.path().join("missing"), temp_dir.path());
        assert!(matches!(
            plan(&options),
            Err(PlanError::InvalidSource { .. })
        ));
    }

    #[test]
    fn test_plan_empty_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("src");
        fs::create_dir(&source).expect("Failed to create source");

        let plan = plan(&SortOptions::new(&source, temp_dir.path().join("dst")))
            .expect("Planning failed");
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_orders_files_before_folders() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("src");
        touch(&source.join("b.txt"));
        touch(&source.join("a.png"));
        touch(&source.join("projects/readme.md"));

        let mut options = SortOptions::new(&source, temp_dir.path().join("dst"));
        options.sort_folders = true;
        let plan = plan(&options).expect("Planning failed");

        let kinds: Vec<_> = plan.iter().map(|entry| entry.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EntryKind::File(Category::Images),
                EntryKind::File(Category::Documents),
                EntryKind::Folder,
            ]
        );
        assert_eq!(plan.file_count(), 2);
        assert_eq!(plan.folder_count(), 1);
    }

    #[test]
    fn test_plan_files_without_extension() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("src");
        touch(&source.join("Makefile"));
        touch(&source.join("notes.txt"));
        let target = temp_dir.path().join("dst");

        let mut options = SortOptions::new(&source, &target);
        let all = plan(&options).expect("Planning failed");
        assert_eq!(all.len(), 2);
        assert_eq!(all.entries[0].destination, target.join("Other").join("Makefile"));

        options.extensions = "txt".to_string();
        let filtered = plan(&options).expect("Planning failed");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.entries[0].destination, target.join("Documents").join("notes.txt"));

        options.extensions = "txt, LEER".to_string();
        assert_eq!(plan(&options).expect("Planning failed").len(), 2);
    }

    #[test]
    fn test_flatten_skips_target_inside_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().to_path_buf();
        let target = source.join("sorted");
        touch(&source.join("a.jpg"));
        touch(&target.join("Images").join("old.jpg"));

        let mut options = SortOptions::new(&source, &target);
        options.flatten = true;
        options.sort_folders = true;
        let plan = plan(&options).expect("Planning failed");

        assert_eq!(plan.len(), 1);
        assert_eq!(plan.entries[0].source, source.join("a.jpg"));
    }

    #[test]
    fn test_target_with_parent_components_is_pruned() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("src");
        let target = source.join("..").join("src").join("sorted");
        touch(&source.join("a.jpg"));
        touch(&source.join("sorted").join("Images").join("old.jpg"));

        let mut options = SortOptions::new(&source, &target);
        options.flatten = true;
        options.sort_folders = true;
        let plan = plan(&options).expect("Planning failed");

        assert_eq!(plan.len(), 1);
        assert_eq!(plan.entries[0].source, source.join("a.jpg"));
    }

    #[test]
    fn test_sorting_in_place_skips_sorted_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("Downloads");
        touch(&root.join("new.png"));
        touch(&root.join("Images").join("old.jpg"));

        let mut options = SortOptions::new(&root, &root);
        options.flatten = true;
        let plan = plan(&options).expect("Planning failed");

        assert_eq!(plan.len(), 1);
        assert_eq!(plan.entries[0].source, root.join("new.png"));
    }

    #[test]
    fn test_absolute_resolves_parent_components() {
        let base = std::path::absolute("/").expect("absolute root");
        assert_eq!(
            absolute(&base.join("a").join("..").join("b").join(".").join("c")),
            base.join("b").join("c")
        );
    }

    #[test]
    fn test_bucket_counts() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("src");
        touch(&source.join("a.jpg"));
        touch(&source.join("b.png"));
        touch(&source.join("c.mp3"));
        touch(&source.join("sub/d.txt"));

        let mut options = SortOptions::new(&source, temp_dir.path().join("dst"));
        options.sort_folders = true;
        let counts = plan(&options).expect("Planning failed").bucket_counts();

        assert_eq!(counts.get("Images"), Some(&2));
        assert_eq!(counts.get("Audio"), Some(&1));
        assert_eq!(counts.get("folder"), Some(&1));
        assert_eq!(counts.get("Documents"), None);
    }
}
