//! CLI command definitions for treeflow
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::format::OutputFormat;
use crate::prefs::FONT_SIZE_STEP;
use crate::types::Status;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Text,
    Markdown,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Markdown => OutputFormat::Markdown,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

/// Hierarchical task tracker with progress derived from leaf tasks
#[derive(Parser, Debug)]
#[command(name = "treeflow", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the task data (overrides config)
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Project to operate on, by id or exact name (default: first project)
    #[arg(short, long, global = true)]
    pub project: Option<String>,

    /// Output format (overrides config)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<FormatArg>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the project tree (default if no subcommand given)
    Show(ShowArgs),

    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Manage nodes within the selected project
    #[command(subcommand)]
    Node(NodeCommand),

    /// Show or change display preferences
    #[command(subcommand)]
    Prefs(PrefsCommand),
}

#[derive(Args, Debug, Default)]
pub struct ShowArgs {
    /// Show only the subtree under this node
    pub node: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// List all projects with their status and progress
    List,

    /// Create a project and make it active
    New {
        /// Project name
        name: String,
    },

    /// Rename a project (and its root node)
    Rename {
        /// Project id or exact name
        #[arg(value_name = "PROJECT")]
        target: String,
        /// New name
        name: String,
    },

    /// Delete a project and all of its nodes
    Delete {
        /// Project id or exact name
        #[arg(value_name = "PROJECT")]
        target: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum NodeCommand {
    /// Add a node (under the project root unless --parent is given)
    Add {
        /// Node title
        title: String,
        /// Parent node id
        #[arg(long)]
        parent: Option<String>,
        /// Longer description
        #[arg(long, default_value = "")]
        description: String,
        /// Initial status
        #[arg(long, default_value = "todo")]
        status: Status,
    },

    /// Edit a node; omitted fields keep their current value
    Edit {
        /// Node id
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// New status (ignored for nodes with children)
        #[arg(long)]
        status: Option<Status>,
    },

    /// Delete a node and its whole subtree
    Delete {
        /// Node id
        id: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Advance a leaf's status: todo -> doing -> review -> done -> todo
    Cycle {
        /// Node id
        id: String,
    },

    /// Collapse or expand a node in tree output
    Collapse {
        /// Node id
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum PrefsCommand {
    /// Show current preferences
    Show,

    /// Switch between dark and light theme
    Theme,

    /// Change the font size by DELTA (clamped to 11..=20)
    Font {
        #[arg(allow_negative_numbers = true, default_value_t = FONT_SIZE_STEP)]
        delta: i32,
    },
}
