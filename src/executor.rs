//! Carries out a sort plan by moving or copying each entry into place.
//!
//! Entries are processed strictly in plan order. The first failure stops
//! the run; everything transferred before it stays where it was put.
use crate::config::TransferMode;
use crate::planner::{Plan, PlanEntry};
use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// The entry that stopped an execution run.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// Failed to create the folder an entry is transferred into.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        /// Position of the failing entry in the plan.
        index: usize,
        path: PathBuf,
        source: io::Error,
    },
    /// Failed to move or copy an entry.
    #[error("Failed to {action} {} to {}: {source}", .from.display(), .to.display())]
    TransferFailed {
        /// Position of the failing entry in the plan.
        index: usize,
        action: &'static str,
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

impl ExecuteError {
    /// Position of the failing entry in the plan.
    pub fn index(&self) -> usize {
        match self {
            Self::DirectoryCreationFailed { index, .. } | Self::TransferFailed { index, .. } => {
                *index
            }
        }
    }

    /// Path of the item that could not be transferred.
    pub fn failed_path(&self) -> &Path {
        match self {
            Self::DirectoryCreationFailed { path, .. } => path,
            Self::TransferFailed { from, .. } => from,
        }
    }
}

/// Result type for plan execution.
pub type ExecuteResult<T> = Result<T, ExecuteError>;

/// Counts for a run that completed without error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Files moved or copied.
    pub files: usize,
    /// Whole folders moved or copied.
    pub folders: usize,
    /// Folders left alone because their destination already existed.
    pub skipped_folders: usize,
}

impl ExecutionReport {
    pub fn total(&self) -> usize {
        self.files + self.folders
    }
}

/// Executes every entry of `plan` in order.
///
/// # Errors
///
/// Returns the first failing entry. Entries before it remain applied.
///
/// # Examples
///
/// ```no_run
/// use foldersort::config::{SortOptions, TransferMode};
/// use foldersort::executor::execute;
/// use foldersort::planner::plan;
///
/// let options = SortOptions::new("/home/me/Downloads", "/home/me/Sorted");
/// let plan = plan(&options).expect("planning failed");
/// match execute(&plan, TransferMode::Copy) {
///     Ok(report) => println!("{} files copied", report.files),
///     Err(e) => eprintln!("Stopped at {}: {}", e.failed_path().display(), e),
/// }
/// ```
pub fn execute(plan: &Plan, mode: TransferMode) -> ExecuteResult<ExecutionReport> {
    execute_with_progress(plan, mode, |_| {})
}

/// Like [`execute`], calling `on_entry` after each entry is handled.
pub fn execute_with_progress<F>(
    plan: &Plan,
    mode: TransferMode,
    mut on_entry: F,
) -> ExecuteResult<ExecutionReport>
where
    F: FnMut(&PlanEntry),
{
    let mut report = ExecutionReport::default();

    for (index, entry) in plan.iter().enumerate() {
        if entry.is_folder() {
            if entry.destination.exists() {
                debug!(folder = %entry.destination.display(), "destination exists, skipping");
                report.skipped_folders += 1;
            } else {
                transfer_folder(index, entry, mode)?;
                report.folders += 1;
            }
        } else {
            transfer_file(index, entry, mode)?;
            report.files += 1;
        }
        on_entry(entry);
    }

    info!(
        files = report.files,
        folders = report.folders,
        skipped = report.skipped_folders,
        "sort finished"
    );
    Ok(report)
}

fn transfer_file(index: usize, entry: &PlanEntry, mode: TransferMode) -> ExecuteResult<()> {
    ensure_parent(index, &entry.destination)?;

    let result = match mode {
        TransferMode::Move => move_file(&entry.source, &entry.destination),
        TransferMode::Copy => copy_file(&entry.source, &entry.destination),
    };
    result.map_err(|source| transfer_failed(index, entry, mode, source))
}

fn transfer_folder(index: usize, entry: &PlanEntry, mode: TransferMode) -> ExecuteResult<()> {
    ensure_parent(index, &entry.destination)?;

    let result = match mode {
        TransferMode::Move => move_dir(&entry.source, &entry.destination),
        TransferMode::Copy => copy_dir_recursive(&entry.source, &entry.destination),
    };
    result.map_err(|source| transfer_failed(index, entry, mode, source))
}

fn ensure_parent(index: usize, destination: &Path) -> ExecuteResult<()> {
    if let Some(parent) = destination.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|source| ExecuteError::DirectoryCreationFailed {
            index,
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

fn transfer_failed(
    index: usize,
    entry: &PlanEntry,
    mode: TransferMode,
    source: io::Error,
) -> ExecuteError {
    warn!(index, from = %entry.source.display(), error = %source, "transfer failed");
    ExecuteError::TransferFailed {
        index,
        action: match mode {
            TransferMode::Move => "move",
            TransferMode::Copy => "copy",
        },
        from: entry.source.clone(),
        to: entry.destination.clone(),
        source,
    }
}

/// Renames the file, falling back to copy-and-delete across filesystems.
///
/// An existing destination is never replaced.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if to.symlink_metadata().is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "destination file already exists",
        ));
    }
    match fs::rename(from, to) {
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(from = %from.display(), "rename crosses devices, copying");
            copy_file(from, to)?;
            fs::remove_file(from)
        }
        result => result,
    }
}

/// Renames the folder, falling back to copy-and-delete across filesystems.
fn move_dir(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(from = %from.display(), "rename crosses devices, copying");
            copy_dir_recursive(from, to)?;
            fs::remove_dir_all(from)
        }
        result => result,
    }
}

/// Copies contents and permissions, then the access and modification times.
fn copy_file(from: &Path, to: &Path) -> io::Result<()> {
    if is_same_file(from, to)? {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "source and destination are the same file",
        ));
    }
    fs::copy(from, to)?;
    let metadata = fs::metadata(from)?;
    let mut times = FileTimes::new();
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    // Read-only copies can still have their times set through a read handle on Unix.
    let file = match File::options().write(true).open(to) {
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => File::open(to)?,
        result => result?,
    };
    file.set_times(times)
}

fn is_same_file(a: &Path, b: &Path) -> io::Result<bool> {
    if !b.exists() {
        return Ok(false);
    }
    Ok(fs::canonicalize(a)? == fs::canonicalize(b)?)
}

/// Copies a folder tree, following links to files and folders.
///
/// A failed copy removes the partly created destination.
fn copy_dir_recursive(from: &Path, to: &Path) -> io::Result<()> {
    if to.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "destination folder already exists",
        ));
    }
    fs::create_dir_all(to)?;

    copy_tree(from, to).inspect_err(|_| {
        if let Err(e) = fs::remove_dir_all(to) {
            warn!(folder = %to.display(), error = %e, "cannot remove partial copy");
        }
    })
}

fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    for entry in WalkDir::new(from).min_depth(1).follow_links(true) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| io::Error::other(e.to_string()))?;
        let dest = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)?;
        } else {
            copy_file(entry.path(), &dest)?;
        }
    }
    Ok(())
}
