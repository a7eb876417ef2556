use crate::compositor::{FilterDecorations, FocusView};
use crate::document::DocumentSnapshot;
use crate::filter::{FilterId, Rgb};
use crate::project::Project;
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::fmt::Write;

#[derive(Debug, Clone, Serialize)]
pub struct FilterStats {
    pub id: FilterId,
    pub pattern: String,
    pub color: String,
    pub highlighted: bool,
    pub shown: bool,
    pub exclude: bool,
    pub matches: usize,
    pub decorated: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub document: String,
    pub project: String,
    pub total_lines: usize,
    pub visible_lines: usize,
    pub degraded: bool,
    pub filters: Vec<FilterStats>,
}

/// Collect per-filter statistics. Filters must already be evaluated
/// against `doc`.
pub fn build_stats(
    project: &Project,
    doc: &dyn DocumentSnapshot,
    view: &FocusView,
    decorations: &[FilterDecorations],
) -> StatsReport {
    let decorated: HashMap<FilterId, usize> = decorations
        .iter()
        .map(|d| (d.filter, d.ranges.len()))
        .collect();

    let filters = project
        .filters()
        .map(|filter| {
            let flags = filter.flags();
            FilterStats {
                id: filter.id(),
                pattern: filter.pattern().to_string(),
                color: filter.display_color().to_hex(),
                highlighted: flags.highlighted,
                shown: flags.shown,
                exclude: flags.exclude,
                matches: filter.live_count(),
                decorated: decorated.get(&filter.id()).copied().unwrap_or(0),
            }
        })
        .collect();

    let degraded = project
        .filters()
        .filter_map(|filter| filter.cache().get(doc.id()))
        .any(|entry| entry.degraded);

    StatsReport {
        document: doc.id().to_string(),
        project: project.name().to_string(),
        total_lines: doc.line_count(),
        visible_lines: view.mapper.len(),
        degraded,
        filters,
    }
}

pub fn format_stats_text(report: &StatsReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} ({})",
        "FILTER STATS".bold(),
        report.document,
        report.project
    );
    let _ = writeln!(
        out,
        "Visible lines: {} / {}{}",
        report.visible_lines,
        report.total_lines,
        if report.degraded {
            "  [large file: decorations reduced]"
        } else {
            ""
        }
    );

    if report.filters.is_empty() {
        let _ = writeln!(out, "\nNo filters defined.");
        return out;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Id",
            "Pattern",
            "Color",
            "Mode",
            "Highlighted",
            "Shown",
            "Matches",
            "Decorated",
        ]);

    for stat in &report.filters {
        table.add_row(vec![
            Cell::new(stat.id),
            Cell::new(&stat.pattern),
            Cell::new(&stat.color),
            Cell::new(if stat.exclude { "exclude" } else { "include" }),
            Cell::new(yes_no(stat.highlighted)),
            Cell::new(yes_no(stat.shown)),
            Cell::new(stat.matches),
            Cell::new(stat.decorated),
        ]);
    }

    let _ = writeln!(out, "\n{table}");
    out
}

pub fn format_stats_json(report: &StatsReport) -> String {
    serde_json::to_string_pretty(&json!({ "stats": report }))
        .unwrap_or_else(|_| "{\"stats\":{\"error\":\"failed to serialize stats\"}}".into())
}

/// Print every line of `doc`, coloring decorated lines with the color of the
/// first filter that decorates them
pub fn format_highlight_text(doc: &dyn DocumentSnapshot, decorations: &[FilterDecorations]) -> String {
    let line_colors = first_color_per_line(decorations);
    let mut out = String::new();
    for (number, text) in doc.lines().enumerate() {
        match line_colors.get(&number) {
            Some(color) => {
                let _ = writeln!(
                    out,
                    ">{:>6}: {}",
                    number + 1,
                    text.truecolor(color.r, color.g, color.b)
                );
            }
            None => {
                let _ = writeln!(out, " {:>6}: {}", number + 1, text);
            }
        }
    }
    out
}

/// Focus view text: the header line as is, then one visible line per row
/// numbered with source line numbers. `decorations` are in focus-view lines.
pub fn format_focus_text(view: &FocusView, decorations: &[FilterDecorations]) -> String {
    let line_colors = first_color_per_line(decorations);
    let mut out = String::new();
    for (focus_line, text) in view.document.lines().enumerate() {
        let Some(original) = view.mapper.to_original(focus_line) else {
            let _ = writeln!(out, "{text}");
            continue;
        };
        match line_colors.get(&focus_line) {
            Some(color) => {
                let _ = writeln!(
                    out,
                    "{:>6}: {}",
                    original + 1,
                    text.truecolor(color.r, color.g, color.b)
                );
            }
            None => {
                let _ = writeln!(out, "{:>6}: {}", original + 1, text);
            }
        }
    }
    out
}

fn first_color_per_line(decorations: &[FilterDecorations]) -> HashMap<usize, Rgb> {
    let mut line_colors = HashMap::new();
    for decoration in decorations {
        for range in &decoration.ranges {
            line_colors.entry(range.line).or_insert(decoration.color);
        }
    }
    line_colors
}

/// One line per filter pattern: `ok` or the rejection reason
pub fn format_check_text(results: &[(String, Result<(), String>)]) -> String {
    let mut out = String::new();
    for (pattern, result) in results {
        match result {
            Ok(()) => {
                let _ = writeln!(out, "{} {}", "ok".green(), pattern);
            }
            Err(reason) => {
                let _ = writeln!(out, "{} {}: {}", "invalid".red().bold(), pattern, reason);
            }
        }
    }
    out
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::{build_focus_view, highlight_set};
    use crate::config::EngineConfig;
    use crate::document::TextDocument;

    #[test]
    fn test_stats_count_matches_and_visible_lines() {
        let mut project = Project::new("svc", &EngineConfig::default());
        let group = project.add_group("g");
        project.add_filter(group, "ERROR").unwrap();
        let doc = TextDocument::new("a.log", "ERROR 1\nok\nERROR 2");

        let view = build_focus_view(&mut project, &doc);
        let decorations = highlight_set(&mut project, &doc);
        let report = build_stats(&project, &doc, &view, &decorations);

        assert_eq!(report.total_lines, 3);
        assert_eq!(report.visible_lines, 2);
        assert_eq!(report.filters[0].matches, 2);
        assert_eq!(report.filters[0].decorated, 2);

        let json: serde_json::Value = serde_json::from_str(&format_stats_json(&report)).unwrap();
        assert_eq!(json["stats"]["filters"][0]["pattern"], "ERROR");
    }

    #[test]
    fn test_focus_text_numbers_source_lines() {
        let mut project = Project::new("svc", &EngineConfig::default());
        let group = project.add_group("g");
        project.add_filter(group, "ERROR").unwrap();
        let doc = TextDocument::new("a.log", "ok\nERROR 1\nok\nERROR 2");

        let view = build_focus_view(&mut project, &doc);
        // Plain text: no decorations passed.
        assert_eq!(
            format_focus_text(&view, &[]),
            "\n     2: ERROR 1\n     4: ERROR 2\n"
        );
    }

    #[test]
    fn test_focus_text_of_empty_view_is_the_header_line() {
        let mut project = Project::new("svc", &EngineConfig::default());
        let group = project.add_group("g");
        project.add_filter(group, "FATAL").unwrap();
        let doc = TextDocument::new("a.log", "ok\nERROR 1");

        let view = build_focus_view(&mut project, &doc);
        assert_eq!(format_focus_text(&view, &[]), "\n");
    }
}
