//! Output formatting for project lists and task trees.

use crate::prefs::Preferences;
use crate::types::{NodeView, ProjectSummary, Status};
use serde::{Deserialize, Serialize};

/// Output format for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Markdown,
    Json,
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

/// Single-character marker used in text output.
fn status_marker(status: Status) -> &'static str {
    match status {
        Status::Todo => " ",
        Status::Doing => "~",
        Status::Review => "?",
        Status::Done => "x",
    }
}

/// Format the project list.
pub fn format_projects(projects: &[ProjectSummary], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(&projects),
        OutputFormat::Markdown => {
            let mut md = format!("# Projects ({})\n\n", projects.len());
            if projects.is_empty() {
                md.push_str("No projects yet.\n");
            }
            for p in projects {
                let marker = if p.active { " (active)" } else { "" };
                md.push_str(&format!(
                    "- **{}**{} - {} - {} done - `{}`\n",
                    p.name,
                    marker,
                    p.status.label(),
                    p.progress,
                    p.id
                ));
            }
            md
        }
        OutputFormat::Text => {
            if projects.is_empty() {
                return "No projects yet.\n".to_string();
            }
            let mut out = String::new();
            for p in projects {
                let marker = if p.active { '*' } else { ' ' };
                out.push_str(&format!(
                    "{} [{}] {}  {}  {}\n",
                    marker,
                    status_marker(p.status),
                    p.name,
                    p.progress,
                    p.id
                ));
            }
            out
        }
    }
}

/// Format a subtree. Collapsed nodes hide their children in text and
/// markdown output; JSON always carries the full subtree.
pub fn format_tree(view: &NodeView, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(view),
        OutputFormat::Markdown => {
            let mut md = format!(
                "# {}\n\n{} of {} tasks done - overall: {}\n\n",
                view.title,
                view.progress.done,
                view.progress.total,
                view.status.as_str()
            );
            for child in &view.children {
                push_markdown(&mut md, child, 0);
            }
            md
        }
        OutputFormat::Text => {
            let mut out = format!(
                "{}  ({} of {} tasks done, overall: {})\n",
                view.title,
                view.progress.done,
                view.progress.total,
                view.status.as_str()
            );
            for child in &view.children {
                push_text(&mut out, child, 1);
            }
            out
        }
    }
}

fn push_text(out: &mut String, node: &NodeView, indent: usize) {
    let pad = "  ".repeat(indent);
    let fold = match (node.is_leaf(), node.collapsed) {
        (true, _) => " ",
        (false, true) => "+",
        (false, false) => "-",
    };
    out.push_str(&format!(
        "{}{} [{}] {}",
        pad,
        fold,
        status_marker(node.status),
        node.title
    ));
    if !node.is_leaf() {
        out.push_str(&format!(
            "  {} ({}%)",
            node.progress,
            node.progress.percent()
        ));
    }
    out.push_str(&format!("  <{}>\n", node.id));
    if !node.description.is_empty() {
        out.push_str(&format!("{}      {}\n", pad, node.description));
    }
    if !node.collapsed {
        for child in &node.children {
            push_text(out, child, indent + 1);
        }
    }
}

fn push_markdown(md: &mut String, node: &NodeView, indent: usize) {
    let pad = "  ".repeat(indent);
    let check = if node.status == Status::Done { "x" } else { " " };
    md.push_str(&format!("{}- [{}] **{}**", pad, check, node.title));
    if node.status != Status::Done && node.status != Status::Todo {
        md.push_str(&format!(" _{}_", node.status.label()));
    }
    if !node.is_leaf() {
        md.push_str(&format!(" ({})", node.progress));
    }
    md.push('\n');
    if !node.description.is_empty() {
        md.push_str(&format!("{}  {}\n", pad, node.description));
    }
    if !node.collapsed {
        for child in &node.children {
            push_markdown(md, child, indent + 1);
        }
    }
}

/// Format display preferences.
pub fn format_preferences(prefs: &Preferences, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(prefs),
        OutputFormat::Markdown => format!(
            "- **theme**: {}\n- **font size**: {}px\n",
            prefs.theme, prefs.font_size
        ),
        OutputFormat::Text => {
            let mut out = format!("theme: {}\nfont size: {}px", prefs.theme, prefs.font_size);
            if prefs.at_min() {
                out.push_str(" (minimum)");
            } else if prefs.at_max() {
                out.push_str(" (maximum)");
            }
            out.push('\n');
            out
        }
    }
}
