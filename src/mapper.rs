use crate::filter::DecorationRange;

/// Lines a focus view renders before the first visible source line.
pub const FOCUS_HEADER_LINES: usize = 1;

/// Projection between source line numbers and focus-view line numbers
///
/// Built from the ascending visible-line sequence of one document. Derive a
/// new mapper every time that sequence changes.
#[derive(Debug, Clone, Default)]
pub struct LineIndexMapper {
    visible: Vec<usize>,
}

impl LineIndexMapper {
    /// `visible` must be ascending and free of duplicates
    pub fn new(visible: Vec<usize>) -> Self {
        debug_assert!(visible.windows(2).all(|w| w[0] < w[1]));
        Self { visible }
    }

    /// Focus-view line showing `original`, if it is visible
    pub fn to_focus(&self, original: usize) -> Option<usize> {
        self.visible
            .binary_search(&original)
            .ok()
            .map(|index| index + FOCUS_HEADER_LINES)
    }

    /// Source line shown on focus-view line `focus`. The header has none.
    pub fn to_original(&self, focus: usize) -> Option<usize> {
        focus
            .checked_sub(FOCUS_HEADER_LINES)
            .and_then(|index| self.visible.get(index))
            .copied()
    }

    /// Move decoration ranges onto focus-view lines, dropping the ones whose
    /// source line is not visible
    pub fn project_ranges(&self, ranges: &[DecorationRange]) -> Vec<DecorationRange> {
        ranges
            .iter()
            .filter_map(|range| self.to_focus(range.line).map(|line| range.on_line(line)))
            .collect()
    }

    pub fn visible(&self) -> &[usize] {
        &self.visible
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}
