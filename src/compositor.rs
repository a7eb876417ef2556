//! Combining per-filter results into views
//!
//! Decoration does not go through composition: every filter decorates its
//! own matches. Only the focus view, the synthesized document holding the
//! visible lines, combines filters, using these rules:
//!
//! 1. Filters with `shown == false` never take part.
//! 2. If any positive (shown, non-exclude) filter exists, the visible set is
//!    the union of the positive filters' matched lines. Exclude filters do
//!    not subtract from it.
//! 3. Otherwise the visible set is every line of the document minus the
//!    union of the exclude filters' matched lines.
//! 4. The visible set is ordered ascending.

use crate::document::{DocumentSnapshot, TextDocument};
use crate::filter::{DecorationRange, FilterId, Rgb};
use crate::mapper::LineIndexMapper;
use crate::project::Project;
use std::collections::BTreeSet;

/// Decorations one filter contributes to one document
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDecorations {
    pub filter: FilterId,
    pub color: Rgb,
    pub ranges: Vec<DecorationRange>,
}

/// A synthesized focus view and the projection back to its source
#[derive(Debug, Clone)]
pub struct FocusView {
    pub source_id: String,
    pub document: TextDocument,
    pub mapper: LineIndexMapper,
}

/// Evaluate every filter of `project` against `doc`, refreshing live counts
/// as if `doc` were the active document
pub fn evaluate_project(project: &mut Project, doc: &dyn DocumentSnapshot) {
    for filter in project.filters_mut() {
        filter.refresh_count(doc);
    }
}

/// Visible source lines of `document_id`, from the filters' cached results
///
/// Reads the caches as they are: evaluate the filters against the document
/// first (see [`evaluate_project`]), as [`build_focus_view`] does, or stale
/// or missing entries yield stale or missing lines.
pub fn visible_lines(project: &Project, document_id: &str, total_line_count: usize) -> Vec<usize> {
    let (positive, negative): (Vec<_>, Vec<_>) = project
        .filters()
        .filter(|filter| filter.flags().shown)
        .partition(|filter| !filter.flags().exclude);

    if !positive.is_empty() {
        return positive
            .iter()
            .flat_map(|filter| filter.matched_line_numbers(Some(document_id)))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
    }

    let hidden: BTreeSet<usize> = negative
        .iter()
        .flat_map(|filter| filter.matched_line_numbers(Some(document_id)))
        .collect();

    (0..total_line_count)
        .filter(|line| !hidden.contains(line))
        .collect()
}

/// Per-filter decorations for a source document, honoring each filter's
/// decoration predicate
pub fn highlight_set(project: &mut Project, doc: &dyn DocumentSnapshot) -> Vec<FilterDecorations> {
    project
        .filters_mut()
        .map(|filter| FilterDecorations {
            filter: filter.id(),
            color: filter.display_color(),
            ranges: filter.decorations_for(doc),
        })
        .filter(|decorations| !decorations.ranges.is_empty())
        .collect()
}

/// Build the focus view of `source`: an empty header line followed by the
/// visible lines in ascending order
pub fn build_focus_view(project: &mut Project, source: &dyn DocumentSnapshot) -> FocusView {
    evaluate_project(project, source);
    let visible = visible_lines(project, source.id(), source.line_count());
    let lines: Vec<&str> = source.lines().collect();

    let mut text = String::new();
    for &line in &visible {
        text.push('\n');
        text.push_str(lines.get(line).copied().unwrap_or_default());
    }

    tracing::debug!(
        document = source.id(),
        total = lines.len(),
        visible = visible.len(),
        "focus view built"
    );

    FocusView {
        source_id: source.id().to_string(),
        document: TextDocument::focus_view(source.id(), text),
        mapper: LineIndexMapper::new(visible),
    }
}

/// Re-project each filter's source decorations onto the focus view
pub fn focus_decorations(project: &Project, view: &FocusView) -> Vec<FilterDecorations> {
    project
        .filters()
        .filter(|filter| filter.should_decorate(&view.document))
        .filter_map(|filter| {
            let entry = filter.cache().get(&view.source_id)?;
            let ranges = view.mapper.project_ranges(&entry.ranges);
            (!ranges.is_empty()).then(|| FilterDecorations {
                filter: filter.id(),
                color: filter.display_color(),
                ranges,
            })
        })
        .collect()
}
