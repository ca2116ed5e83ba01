//! treeflow command-line front end
//!
//! Drives a file-backed board: every command loads the registry, applies one
//! change, persists it and prints the result.

use anyhow::{Result, anyhow, bail};
use clap::Parser;
use tracing::{Level, debug};
use treeflow::board::Board;
use treeflow::cli::{Cli, Command, NodeCommand, PrefsCommand, ProjectCommand, ShowArgs};
use treeflow::config::Config;
use treeflow::format::{OutputFormat, format_preferences, format_projects, format_tree};
use treeflow::logging::{self, LogTarget, parse_level};
use treeflow::prefs::Preferences;
use treeflow::store::FileStorage;
use treeflow::types::ProjectId;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::discover(cli.config.as_deref())?;
    if let Some(data_dir) = &cli.data_dir {
        config.storage.data_dir = data_dir.clone();
    }

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        parse_level(&config.logging.level).unwrap_or(Level::WARN)
    };
    logging::init(&LogTarget::parse(&cli.log), level)?;
    debug!(data_dir = %config.storage.data_dir.display(), "Configuration resolved");

    let format: OutputFormat = cli
        .format
        .map(Into::into)
        .unwrap_or(config.display.format);

    config.ensure_data_dir()?;
    let storage = FileStorage::new(&config.storage.data_dir);

    match cli
        .command
        .unwrap_or_else(|| Command::Show(ShowArgs::default()))
    {
        Command::Prefs(cmd) => run_prefs(storage, cmd, format),
        Command::Show(args) => {
            let mut board = Board::open(storage);
            run_show(&mut board, cli.project.as_deref(), args, format)
        }
        Command::Project(cmd) => {
            let mut board = Board::open(storage);
            run_project(&mut board, cmd, format)
        }
        Command::Node(cmd) => {
            let mut board = Board::open(storage);
            run_node(&mut board, cli.project.as_deref(), cmd)
        }
    }
}

/// Resolve the project to work on and make it active.
fn resolve_project(board: &mut Board, selector: Option<&str>) -> Result<ProjectId> {
    let id = match selector {
        Some(selector) => board
            .registry()
            .find_project(selector)
            .map(|p| p.id().to_string())
            .ok_or_else(|| anyhow!("Project not found: {}", selector))?,
        None => board
            .active_project()
            .map(|p| p.id().to_string())
            .ok_or_else(|| anyhow!("No projects yet. Create one with `treeflow project new <NAME>`"))?,
    };
    board.select_project(&id)?;
    Ok(id)
}

fn run_show(
    board: &mut Board,
    selector: Option<&str>,
    args: ShowArgs,
    format: OutputFormat,
) -> Result<()> {
    if board.registry().is_empty() {
        print!("{}", format_projects(&[], format));
        return Ok(());
    }
    let project_id = resolve_project(board, selector)?;
    let view = board
        .node_view(&project_id, args.node.as_deref())
        .ok_or_else(|| anyhow!("Node not found: {}", args.node.unwrap_or_default()))?;
    print!("{}", format_tree(&view, format));
    Ok(())
}

fn run_project(board: &mut Board, cmd: ProjectCommand, format: OutputFormat) -> Result<()> {
    match cmd {
        ProjectCommand::List => {
            print!("{}", format_projects(&board.list_projects(), format));
        }
        ProjectCommand::New { name } => {
            let id = board.create_project(&name)?;
            println!("Created project '{}' <{}>", name.trim(), id);
        }
        ProjectCommand::Rename { target, name } => {
            let id = resolve_project(board, Some(&target))?;
            board.rename_project(&id, &name)?;
            println!("Renamed project <{}> to '{}'", id, name.trim());
        }
        ProjectCommand::Delete { target, yes } => {
            let id = resolve_project(board, Some(&target))?;
            if !yes {
                bail!("Refusing to delete project '{}' and all its nodes without --yes", target);
            }
            let removed = board.delete_project(&id)?;
            println!(
                "Deleted project '{}' ({} nodes)",
                removed.name(),
                removed.tree().node_count()
            );
        }
    }
    Ok(())
}

fn run_node(board: &mut Board, selector: Option<&str>, cmd: NodeCommand) -> Result<()> {
    let project_id = resolve_project(board, selector)?;

    match cmd {
        NodeCommand::Add {
            title,
            parent,
            description,
            status,
        } => {
            let id = board.add_node(&project_id, parent.as_deref(), &title, &description, status)?;
            println!("{}", id);
        }
        NodeCommand::Edit {
            id,
            title,
            description,
            status,
        } => {
            let node = board
                .project(&project_id)
                .and_then(|p| p.tree().find_node(&id))
                .ok_or_else(|| anyhow!("Node not found: {}", id))?;
            let title = title.unwrap_or_else(|| node.title().to_string());
            let description = description.unwrap_or_else(|| node.description().to_string());
            let requested = status;
            let status = status.unwrap_or(node.stored_status());

            let applied = board.edit_node(&project_id, &id, &title, &description, status)?;
            if requested.is_some() && !applied {
                eprintln!("Note: status of a node with children is derived; left unchanged");
            }
            println!("Updated <{}>", id);
        }
        NodeCommand::Delete { id, yes } => {
            if !yes {
                bail!("Refusing to delete node {} and all its children without --yes", id);
            }
            let removed = board.delete_node(&project_id, &id)?;
            println!("Deleted {} node(s)", removed);
        }
        NodeCommand::Cycle { id } => {
            let status = board.cycle_status(&project_id, &id)?;
            println!("<{}> is now {}", id, status.label());
        }
        NodeCommand::Collapse { id } => {
            let collapsed = board.toggle_collapsed(&project_id, &id)?;
            println!(
                "<{}> {}",
                id,
                if collapsed { "collapsed" } else { "expanded" }
            );
        }
    }
    Ok(())
}

fn run_prefs(mut storage: FileStorage, cmd: PrefsCommand, format: OutputFormat) -> Result<()> {
    let mut prefs = Preferences::load(&storage);
    match cmd {
        PrefsCommand::Show => {}
        PrefsCommand::Theme => {
            prefs.toggle_theme(&mut storage)?;
        }
        PrefsCommand::Font { delta } => {
            prefs.change_font_size(delta, &mut storage)?;
        }
    }
    print!("{}", format_preferences(&prefs, format));
    Ok(())
}
