//! foldersort - sort files into category folders by extension
//!
//! This library classifies files by extension, plans how a source folder is
//! sorted into category subfolders of a target folder, executes that plan by
//! moving or copying, and keeps reusable option templates in a JSON store.

pub mod cli;
pub mod config;
pub mod executor;
pub mod file_category;
pub mod output;
pub mod planner;
pub mod template;

pub use config::{ConfigError, ExcludeSet, ExtensionFilter, Settings, SortOptions, TransferMode};
pub use executor::{ExecuteError, ExecutionReport, execute};
pub use file_category::{Category, CategoryTable, classify};
pub use planner::{EntryKind, Plan, PlanEntry, PlanError, plan};
pub use template::{Template, TemplateError, TemplateStore};

pub use cli::{Cli, run_cli};
