pub mod cli;
pub mod compositor;
pub mod config;
pub mod document;
pub mod filter;
pub mod logging;
pub mod mapper;
pub mod project;
pub mod report;

use crate::compositor::{build_focus_view, focus_decorations, highlight_set};
use crate::config::EngineConfig;
use crate::document::{DocumentSnapshot, TextDocument};
use crate::filter::validate_pattern;
use crate::project::{FilterDef, ProjectFile, Workspace};
use anyhow::{Context, bail};
pub use cli::{ColorMode, Commands, OutputFormat, cli_parse};
pub use compositor::{FilterDecorations, FocusView, visible_lines};
pub use document::DocumentStore;
pub use filter::{Filter, FilterError, FilterFlags, FilterId, MatchCache};
pub use mapper::LineIndexMapper;
pub use project::{Project, Target};
use serde_json::json;
use std::path::Path;

/// Name of the project used when no project file is given.
const DEFAULT_PROJECT: &str = "default";
/// Group receiving filters passed with --include / --exclude.
const COMMAND_LINE_GROUP: &str = "command line";

fn write_output_file(path: &Path, content: &str) -> anyhow::Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write output file '{}'", path.display()))
}

fn emit(text: &str, output: Option<&Path>) -> anyhow::Result<()> {
    print!("{text}");
    if let Some(path) = output {
        write_output_file(path, text)?;
    }
    Ok(())
}

/// Read a log file as a document. Invalid UTF-8 is replaced, not rejected.
fn load_document(path: &Path) -> anyhow::Result<TextDocument> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read log file '{}'", path.display()))?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    Ok(TextDocument::new(path.display().to_string(), text))
}

fn load_project_file(cli: &cli::Cli) -> anyhow::Result<ProjectFile> {
    match &cli.project {
        Some(path) => config::load_project_file(path).context("Failed to load project file"),
        None => Ok(ProjectFile::default()),
    }
}

/// Build the workspace from the project file and the ad-hoc command line
/// filters, and make sure a project is selected
fn build_workspace(cli: &cli::Cli, config: &EngineConfig) -> anyhow::Result<Workspace> {
    let file = load_project_file(cli)?;
    let mut workspace = Workspace::from_file(&file, config)?;

    if let Some(name) = &cli.project_name {
        workspace.select(name)?;
    }
    if workspace.selected().is_none() {
        workspace.add_project(DEFAULT_PROJECT)?;
        workspace.select(DEFAULT_PROJECT)?;
    }

    if !cli.include.is_empty() || !cli.exclude.is_empty() {
        let project = workspace
            .selected_mut()
            .context("No project selected")?;
        let group = project.add_group(COMMAND_LINE_GROUP);
        for pattern in &cli.include {
            project.add_filter_def(group, &FilterDef::new(pattern.as_str()))?;
        }
        for pattern in &cli.exclude {
            project.add_filter_def(group, &FilterDef::new(pattern.as_str()).excluding())?;
        }
    }

    Ok(workspace)
}

fn apply_color_mode(mode: ColorMode) {
    match mode {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }
}

fn run_check(cli: &cli::Cli) -> anyhow::Result<()> {
    let file = load_project_file(cli)?;
    let patterns = file
        .projects
        .iter()
        .flat_map(|project| project.groups.iter())
        .flat_map(|group| group.filters.iter())
        .map(|filter| filter.pattern.clone())
        .chain(cli.include.iter().cloned())
        .chain(cli.exclude.iter().cloned());

    let results: Vec<(String, Result<(), String>)> = patterns
        .map(|pattern| {
            let result = validate_pattern(&pattern).map_err(|e| e.to_string());
            (pattern, result)
        })
        .collect();
    let invalid = results.iter().filter(|(_, result)| result.is_err()).count();

    let text = match cli.format {
        OutputFormat::Text => report::format_check_text(&results),
        OutputFormat::Json => {
            let entries: Vec<_> = results
                .iter()
                .map(|(pattern, result)| {
                    json!({
                        "pattern": pattern,
                        "valid": result.is_ok(),
                        "error": result.as_ref().err(),
                    })
                })
                .collect();
            to_json_line(&json!({ "check": entries }), "check results")?
        }
    };
    emit(&text, cli.output.as_deref())?;

    if invalid > 0 {
        bail!("{invalid} of {} patterns are invalid", results.len());
    }
    Ok(())
}

fn selected_project(workspace: &mut Workspace) -> anyhow::Result<&mut Project> {
    workspace.selected_mut().context("No project selected")
}

fn to_json_line(value: &serde_json::Value, what: &str) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {what}"))?;
    json.push('\n');
    Ok(json)
}

fn run_focus(cli: &cli::Cli, config: &EngineConfig, file: &Path) -> anyhow::Result<()> {
    let mut workspace = build_workspace(cli, config)?;
    let project = selected_project(&mut workspace)?;
    let doc = load_document(file)?;
    let view = build_focus_view(project, &doc);

    let text = match cli.format {
        OutputFormat::Text => {
            let decorations = focus_decorations(project, &view);
            report::format_focus_text(&view, &decorations)
        }
        OutputFormat::Json => {
            let lines: Vec<_> = view
                .mapper
                .visible()
                .iter()
                .zip(view.document.lines().skip(1))
                .map(|(line, text)| json!({ "line": line + 1, "text": text }))
                .collect();
            to_json_line(
                &json!({
                    "focus": {
                        "file": doc.id(),
                        "project": project.name(),
                        "total_lines": doc.line_count(),
                        "visible_lines": view.mapper.len(),
                        "lines": lines,
                    }
                }),
                "focus view",
            )?
        }
    };
    emit(&text, cli.output.as_deref())
}

fn run_highlight(cli: &cli::Cli, config: &EngineConfig, file: &Path) -> anyhow::Result<()> {
    let mut workspace = build_workspace(cli, config)?;
    let project = selected_project(&mut workspace)?;
    let doc = load_document(file)?;
    let decorations = highlight_set(project, &doc);

    let text = match cli.format {
        OutputFormat::Text => report::format_highlight_text(&doc, &decorations),
        OutputFormat::Json => {
            let filters: Vec<_> = decorations
                .iter()
                .map(|d| {
                    json!({
                        "filter": d.filter,
                        "color": d.color.to_hex(),
                        "lines": d.ranges.iter().map(|r| r.line + 1).collect::<Vec<_>>(),
                    })
                })
                .collect();
            to_json_line(
                &json!({ "highlight": { "file": doc.id(), "filters": filters } }),
                "highlight output",
            )?
        }
    };
    emit(&text, cli.output.as_deref())
}

fn run_stats(cli: &cli::Cli, config: &EngineConfig, file: &Path) -> anyhow::Result<()> {
    let mut workspace = build_workspace(cli, config)?;
    let project = selected_project(&mut workspace)?;
    let doc = load_document(file)?;
    let view = build_focus_view(project, &doc);
    let decorations = highlight_set(project, &doc);
    let report = report::build_stats(project, &doc, &view, &decorations);

    let text = match cli.format {
        OutputFormat::Text => report::format_stats_text(&report),
        OutputFormat::Json => format!("{}\n", report::format_stats_json(&report)),
    };
    emit(&text, cli.output.as_deref())
}

pub fn run() -> anyhow::Result<()> {
    let cli = cli_parse();
    logging::init(cli.verbose);
    apply_color_mode(cli.color);

    let engine_config =
        config::load_config(cli.config.as_deref()).context("Failed to load config")?;
    tracing::debug!(?engine_config, "engine config loaded");

    match &cli.command {
        Commands::Focus { file } => run_focus(&cli, &engine_config, file),
        Commands::Highlight { file } => run_highlight(&cli, &engine_config, file),
        Commands::Stats { file } => run_stats(&cli, &engine_config, file),
        Commands::Check => run_check(&cli),
    }
}
