//! Command-line interface module for foldersort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Merging settings, templates and flags into [`SortOptions`]
//! - Preview and sort orchestration
//! - Template management

use crate::config::{ConfigError, Settings, SortOptions};
use crate::executor::{ExecuteError, execute_with_progress};
use crate::output::OutputFormatter;
use crate::planner::{PlanError, plan};
use crate::template::{Template, TemplateError, TemplateStore};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sort files into category folders by extension.
#[derive(Debug, Parser)]
#[command(name = "foldersort")]
#[command(version)]
#[command(about = "Sort files from a source folder into category folders of a target folder")]
pub struct Cli {
    /// Settings file (default: ./.foldersortrc.toml, then the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Template store file (default: <config dir>/foldersort/templates.json)
    #[arg(long, global = true)]
    pub templates: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show where every file would go, without changing anything
    Preview(SortArgs),

    /// Sort files (and optionally folders) into the target folder
    Sort(SortArgs),

    /// List the names in a folder that can be excluded
    Entries {
        /// Folder to list
        source: PathBuf,
    },

    /// Manage saved templates
    Template {
        #[command(subcommand)]
        action: TemplateAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum TemplateAction {
    /// List saved templates
    List,

    /// Show all settings of a template
    Show {
        /// Template name
        name: String,
    },

    /// Save options under a name, overwriting an existing template
    Save {
        /// Template name
        name: String,

        #[command(flatten)]
        options: SortArgs,
    },

    /// Delete a template
    Delete {
        /// Template name
        name: String,
    },

    /// Edit the exclusion list of a template
    Exclude {
        /// Template name
        name: String,

        /// Name to add to the exclusion list
        #[arg(short, long)]
        add: Vec<String>,

        /// Name to remove from the exclusion list
        #[arg(short, long)]
        remove: Vec<String>,
    },
}

/// Options shared by `preview`, `sort` and `template save`.
///
/// Every flag overrides the value loaded from `--template`, which in turn
/// overrides the settings defaults.
#[derive(Debug, Clone, Default, Args)]
pub struct SortArgs {
    /// Folder whose files are sorted
    pub source: Option<PathBuf>,

    /// Folder that receives the category folders
    pub target: Option<PathBuf>,

    /// Start from a saved template
    #[arg(short, long)]
    pub template: Option<String>,

    /// Move files (default)
    #[arg(long = "move", overrides_with = "copy")]
    pub move_files: bool,

    /// Copy files instead of moving them
    #[arg(long, overrides_with = "move_files")]
    pub copy: bool,

    /// Include files from all subfolders, dropping their structure
    #[arg(long, overrides_with = "no_flatten")]
    pub flatten: bool,

    /// Only sort files directly inside the source folder
    #[arg(long, overrides_with = "flatten")]
    pub no_flatten: bool,

    /// Also move or copy whole subfolders into the "folder" bucket
    #[arg(long, overrides_with = "no_sort_folders")]
    pub sort_folders: bool,

    /// Leave subfolders where they are
    #[arg(long, overrides_with = "sort_folders")]
    pub no_sort_folders: bool,

    /// Only these extensions, comma separated ("leer" matches files without one)
    #[arg(short, long)]
    pub extensions: Option<String>,

    /// File or folder name to skip (repeatable, case-insensitive)
    #[arg(short = 'x', long)]
    pub exclude: Vec<String>,
}

impl SortArgs {
    /// Overlays the flags that were given onto `options`.
    pub fn apply(&self, options: &mut SortOptions) {
        if let Some(source) = &self.source {
            options.source = source.clone();
        }
        if let Some(target) = &self.target {
            options.target = target.clone();
        }
        if self.move_files {
            options.move_files = true;
        } else if self.copy {
            options.move_files = false;
        }
        if self.flatten {
            options.flatten = true;
        } else if self.no_flatten {
            options.flatten = false;
        }
        if self.sort_folders {
            options.sort_folders = true;
        } else if self.no_sort_folders {
            options.sort_folders = false;
        }
        if let Some(extensions) = &self.extensions {
            options.extensions = extensions.clone();
        }
        for name in &self.exclude {
            options.exclude.add(name);
        }
    }
}

/// Errors surfaced to the command-line user.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Execute(#[from] ExecuteError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    /// Neither an argument nor the template provided a folder.
    #[error("No {which} folder given: pass it as an argument or use a template that sets it")]
    MissingFolder { which: &'static str },
    /// No per-user config directory could be determined.
    #[error("Cannot determine the user configuration directory; pass --templates <FILE>")]
    NoConfigDir,
    /// A folder could not be listed.
    #[error("Cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Execute(_) => 2,
            Self::Plan(_) | Self::Io { .. } => 3,
            Self::Template(TemplateError::NotFound { .. }) => 4,
            Self::MissingFolder { .. } => 5,
            _ => 1,
        }
    }
}

/// Loaded settings and template store for one invocation.
pub struct Context {
    pub settings: Settings,
    pub store: TemplateStore,
}

impl Context {
    /// Loads settings and opens the template store named by the global flags.
    pub fn load(config: Option<&Path>, templates: Option<&Path>) -> Result<Self, CliError> {
        let settings = Settings::load(config)?;
        let store_path = templates
            .map(Path::to_path_buf)
            .or_else(|| settings.templates_path())
            .ok_or(CliError::NoConfigDir)?;
        let store = TemplateStore::open(store_path);
        Ok(Self { settings, store })
    }

    /// Merges settings defaults, the selected template and the flags.
    ///
    /// Folders may still be empty; see [`Context::resolve_options`].
    pub fn merge_options(&self, args: &SortArgs) -> Result<SortOptions, CliError> {
        let mut options = match &args.template {
            Some(name) => self.template(name)?.to_options(),
            None => SortOptions::with_defaults(
                PathBuf::new(),
                PathBuf::new(),
                &self.settings.defaults,
            ),
        };
        args.apply(&mut options);
        Ok(options)
    }

    /// Like [`Context::merge_options`], but requires both folders to be set.
    pub fn resolve_options(&self, args: &SortArgs) -> Result<SortOptions, CliError> {
        let options = self.merge_options(args)?;
        if options.source.as_os_str().is_empty() {
            return Err(CliError::MissingFolder { which: "source" });
        }
        if options.target.as_os_str().is_empty() {
            return Err(CliError::MissingFolder { which: "target" });
        }
        Ok(options)
    }

    fn template(&self, name: &str) -> Result<&Template, TemplateError> {
        self.store.get(name).ok_or_else(|| TemplateError::NotFound {
            name: name.to_string(),
        })
    }
}

/// Runs the CLI application with parsed arguments.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use foldersort::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["foldersort", "preview", "/home/me/Downloads", "/home/me/Sorted"]);
/// if let Err(e) = run_cli(cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(cli: Cli) -> Result<(), CliError> {
    let mut context = Context::load(cli.config.as_deref(), cli.templates.as_deref())?;
    run_command(cli.command, &mut context)
}

/// Runs a single command against an already loaded context.
pub fn run_command(command: Command, context: &mut Context) -> Result<(), CliError> {
    match command {
        Command::Preview(args) => preview(&context.resolve_options(&args)?),
        Command::Sort(args) => sort(&context.resolve_options(&args)?),
        Command::Entries { source } => list_entries(&source),
        Command::Template { action } => run_template_action(action, context),
    }
}

/// Plans the sort and prints it without touching any file.
pub fn preview(options: &SortOptions) -> Result<(), CliError> {
    OutputFormatter::preview_notice(&format!(
        "Sorting {} into {}",
        options.source.display(),
        options.target.display()
    ));

    let plan = plan(options)?;
    if plan.is_empty() {
        OutputFormatter::plain("No files found to sort.");
        return Ok(());
    }

    OutputFormatter::plan(&plan, options.sort_folders);
    OutputFormatter::summary_table(&plan.bucket_counts(), plan.len());
    OutputFormatter::preview_notice("No files were modified.");
    Ok(())
}

/// Plans the sort and executes it, stopping at the first failure.
pub fn sort(options: &SortOptions) -> Result<(), CliError> {
    let mode = options.mode();
    OutputFormatter::info(&format!(
        "Sorting {} into {}",
        options.source.display(),
        options.target.display()
    ));

    let plan = plan(options)?;
    if plan.is_empty() {
        OutputFormatter::plain("No files found to sort.");
        return Ok(());
    }
    OutputFormatter::plain(&OutputFormatter::plan_status(&plan, options.sort_folders));

    let progress = OutputFormatter::create_progress_bar(plan.len() as u64);
    let result = execute_with_progress(&plan, mode, |entry| {
        if let Some(name) = entry.source.file_name() {
            progress.set_message(name.to_string_lossy().into_owned());
        }
        progress.inc(1);
    });

    match result {
        Ok(report) => {
            progress.finish_and_clear();
            OutputFormatter::report(&report, mode.verb());
            Ok(())
        }
        Err(e) => {
            progress.abandon();
            OutputFormatter::error(&format!(
                "Stopped at {}; earlier items stay sorted.",
                e.failed_path().display()
            ));
            Err(e.into())
        }
    }
}

/// Prints the names directly inside `source`, folders marked with a slash.
pub fn list_entries(source: &Path) -> Result<(), CliError> {
    let io_error = |e: std::io::Error| CliError::Io {
        path: source.to_path_buf(),
        source: e,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(source).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.path().is_dir() {
            name.push('/');
        }
        names.push(name);
    }
    names.sort();

    if names.is_empty() {
        OutputFormatter::plain("The folder is empty.");
    }
    for name in names {
        OutputFormatter::plain(&name);
    }
    Ok(())
}

fn run_template_action(action: TemplateAction, context: &mut Context) -> Result<(), CliError> {
    match action {
        TemplateAction::List => {
            if context.store.is_empty() {
                OutputFormatter::plain("No templates saved.");
            }
            for (name, template) in context.store.iter() {
                OutputFormatter::plain(&format!(
                    "{}  {} → {}",
                    name, template.source_folder, template.target_folder
                ));
            }
        }
        TemplateAction::Show { name } => {
            let template = context.template(&name)?;
            OutputFormatter::header(&name);
            print_template(template);
        }
        TemplateAction::Save { name, options } => {
            // Saving over an existing name starts from its stored values.
            let options = if options.template.is_none() && context.store.get(&name).is_some() {
                let mut merged = context.template(&name)?.to_options();
                options.apply(&mut merged);
                merged
            } else {
                context.merge_options(&options)?
            };
            let replaced = context
                .store
                .save(&name, Template::from_options(&options))?;
            let verb = if replaced { "updated" } else { "saved" };
            OutputFormatter::success(&format!("Template '{}' {}.", name, verb));
        }
        TemplateAction::Delete { name } => {
            context.store.delete(&name)?;
            OutputFormatter::success(&format!("Template '{}' deleted.", name));
        }
        TemplateAction::Exclude { name, add, remove } => {
            let template = context.store.update(&name, |template| {
                let mut exclude = template.exclude_set();
                for item in &add {
                    exclude.add(item);
                }
                for item in &remove {
                    exclude.remove(item);
                }
                template.set_exclude_set(&exclude);
            })?;
            OutputFormatter::success(&format!(
                "Template '{}' excludes: {}",
                name,
                if template.exclude_patterns.is_empty() {
                    "(nothing)"
                } else {
                    template.exclude_patterns.as_str()
                }
            ));
        }
    }
    Ok(())
}

fn print_template(template: &Template) {
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };
    OutputFormatter::plain(&format!("  Source:       {}", template.source_folder));
    OutputFormatter::plain(&format!("  Target:       {}", template.target_folder));
    OutputFormatter::plain(&format!(
        "  Mode:         {}",
        if template.move_files { "move" } else { "copy" }
    ));
    OutputFormatter::plain(&format!("  Flatten:      {}", yes_no(template.flatten)));
    OutputFormatter::plain(&format!("  Sort folders: {}", yes_no(template.sort_folders)));
    OutputFormatter::plain(&format!("  Extensions:   {}", template.extensions));
    OutputFormatter::plain(&format!("  Exclude:      {}", template.exclude_patterns));
}
