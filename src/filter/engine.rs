use super::cache::{DecorationRange, MatchCache, MatchCacheEntry};
use super::color::{FilterColor, Rgb};
use super::error::FilterError;
use super::matcher::LineMatcher;
use crate::config::EngineConfig;
use crate::document::{DocumentKind, DocumentSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable identity of a filter within a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FilterId(pub u64);

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FilterId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(FilterId)
    }
}

/// Participation flags of a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterFlags {
    /// Decorate matching lines.
    pub highlighted: bool,
    /// Take part in focus-view inclusion/exclusion.
    pub shown: bool,
    /// Drop matching lines instead of keeping them.
    pub exclude: bool,
}

impl Default for FilterFlags {
    fn default() -> Self {
        Self {
            highlighted: true,
            shown: true,
            exclude: false,
        }
    }
}

/// Borrowed result of evaluating one document
#[derive(Debug, Clone, Copy)]
pub struct Evaluation<'a> {
    pub lines: &'a [usize],
    pub ranges: &'a [DecorationRange],
    pub count: usize,
    pub degraded: bool,
}

impl<'a> From<&'a MatchCacheEntry> for Evaluation<'a> {
    fn from(entry: &'a MatchCacheEntry) -> Self {
        Self {
            lines: &entry.lines,
            ranges: &entry.ranges,
            count: entry.count,
            degraded: entry.degraded,
        }
    }
}

/// A regular-expression filter with its own match cache
///
/// Every mutation goes through an explicit setter that states what it
/// invalidates:
///
/// | setter            | match cache | icon revision | decorations |
/// |-------------------|-------------|---------------|-------------|
/// | `set_pattern`     | all entries | bumped        | re-render   |
/// | `set_highlighted` | kept        | bumped        | re-render   |
/// | `set_shown`       | kept        | bumped        | re-render   |
/// | `set_exclude`     | kept        | bumped        | re-render   |
/// | `set_color`       | kept        | bumped        | re-render   |
#[derive(Debug)]
pub struct Filter {
    id: FilterId,
    matcher: LineMatcher,
    color: FilterColor,
    flags: FilterFlags,
    cache: MatchCache,
    pattern_revision: u64,
    icon_revision: u64,
    live_count: usize,
    decoration_match_ceiling: usize,
}

impl Filter {
    pub fn new(
        id: FilterId,
        pattern: &str,
        color: FilterColor,
        flags: FilterFlags,
        config: &EngineConfig,
    ) -> Result<Self, FilterError> {
        let matcher = LineMatcher::new(pattern)?;
        Ok(Self {
            id,
            matcher,
            color,
            flags,
            cache: MatchCache::new(config),
            pattern_revision: 0,
            icon_revision: 0,
            live_count: 0,
            decoration_match_ceiling: config.large_file.decoration_match_ceiling,
        })
    }

    pub fn id(&self) -> FilterId {
        self.id
    }

    pub fn pattern(&self) -> &str {
        self.matcher.pattern()
    }

    pub fn flags(&self) -> FilterFlags {
        self.flags
    }

    pub fn color(&self) -> FilterColor {
        self.color
    }

    /// Color to show for this filter: inverted while it excludes
    pub fn display_color(&self) -> Rgb {
        if self.flags.exclude {
            self.color.inverted()
        } else {
            self.color.normal()
        }
    }

    pub fn pattern_revision(&self) -> u64 {
        self.pattern_revision
    }

    /// Bumped whenever the sidebar icon of this filter must be redrawn
    pub fn icon_revision(&self) -> u64 {
        self.icon_revision
    }

    /// Match count in the active document, as of the last refresh
    pub fn live_count(&self) -> usize {
        self.live_count
    }

    pub fn cache(&self) -> &MatchCache {
        &self.cache
    }

    /// Positive filter: shown and keeps matching lines
    pub fn is_positive(&self) -> bool {
        self.flags.shown && !self.flags.exclude
    }

    /// Replace the pattern. Invalidates every cached document.
    ///
    /// An invalid pattern is rejected and the current one stays in effect.
    pub fn set_pattern(&mut self, pattern: &str) -> Result<(), FilterError> {
        let matcher = LineMatcher::new(pattern).inspect_err(|e| {
            tracing::warn!(filter = %self.id, error = %e, "pattern rejected");
        })?;

        self.matcher = matcher;
        self.pattern_revision += 1;
        self.cache.invalidate_all(self.pattern_revision);
        self.live_count = 0;
        self.icon_revision += 1;
        tracing::debug!(
            filter = %self.id,
            pattern,
            revision = self.pattern_revision,
            "pattern replaced"
        );
        Ok(())
    }

    /// Returns whether the flag changed. Cache is kept.
    pub fn set_highlighted(&mut self, highlighted: bool) -> bool {
        let changed = self.flags.highlighted != highlighted;
        self.flags.highlighted = highlighted;
        self.touch_icon(changed)
    }

    /// Returns whether the flag changed. Cache is kept.
    pub fn set_shown(&mut self, shown: bool) -> bool {
        let changed = self.flags.shown != shown;
        self.flags.shown = shown;
        self.touch_icon(changed)
    }

    /// Returns whether the flag changed. Cache and hue are kept.
    pub fn set_exclude(&mut self, exclude: bool) -> bool {
        let changed = self.flags.exclude != exclude;
        self.flags.exclude = exclude;
        self.touch_icon(changed)
    }

    pub fn set_color(&mut self, color: FilterColor) -> bool {
        let changed = self.color != color;
        self.color = color;
        self.touch_icon(changed)
    }

    fn touch_icon(&mut self, changed: bool) -> bool {
        if changed {
            self.icon_revision += 1;
        }
        changed
    }

    pub fn evaluate(&mut self, doc: &dyn DocumentSnapshot) -> Evaluation<'_> {
        self.evaluate_at(doc, Utc::now())
    }

    /// Matched lines, decoration ranges and count for `doc`, reusing the
    /// cached scan while it is valid at `now`
    pub fn evaluate_at(&mut self, doc: &dyn DocumentSnapshot, now: DateTime<Utc>) -> Evaluation<'_> {
        Evaluation::from(self.cache.get_or_compute_at(doc, &self.matcher, now))
    }

    /// Re-evaluate the active document and store its match count
    pub fn refresh_count(&mut self, active: &dyn DocumentSnapshot) -> usize {
        self.refresh_count_at(active, Utc::now())
    }

    pub fn refresh_count_at(&mut self, active: &dyn DocumentSnapshot, now: DateTime<Utc>) -> usize {
        let count = self.evaluate_at(active, now).count;
        self.live_count = count;
        count
    }

    /// Matched line numbers of one document, or of every cached document in
    /// the order they were first evaluated. Lines of different documents are
    /// concatenated as they are, without deduplication.
    pub fn matched_line_numbers(&self, document_id: Option<&str>) -> Vec<usize> {
        match document_id {
            Some(id) => self
                .cache
                .get(id)
                .map(|entry| entry.lines.clone())
                .unwrap_or_default(),
            None => self
                .cache
                .iter()
                .flat_map(|(_, entry)| entry.lines.iter().copied())
                .collect(),
        }
    }

    /// Whether lines of `doc` should be decorated with this filter's color
    pub fn should_decorate(&self, doc: &dyn DocumentSnapshot) -> bool {
        if !self.flags.highlighted || self.flags.exclude {
            return false;
        }
        if doc.kind() == DocumentKind::Focus && !self.flags.shown {
            return false;
        }
        if self.cache.is_large(doc) {
            return self.flags.shown && self.live_count < self.decoration_match_ceiling;
        }
        true
    }

    /// Decoration ranges for `doc`, treating it as the active document.
    /// Empty when the decoration predicate does not hold.
    pub fn decorations_for(&mut self, doc: &dyn DocumentSnapshot) -> Vec<DecorationRange> {
        self.decorations_for_at(doc, Utc::now())
    }

    pub fn decorations_for_at(
        &mut self,
        doc: &dyn DocumentSnapshot,
        now: DateTime<Utc>,
    ) -> Vec<DecorationRange> {
        self.refresh_count_at(doc, now);
        if !self.should_decorate(doc) {
            return Vec::new();
        }
        self.cache
            .get(doc.id())
            .map(|entry| entry.ranges.clone())
            .unwrap_or_default()
    }

    /// Drop cached results of a closed document
    pub fn forget_document(&mut self, document_id: &str) -> bool {
        self.cache.invalidate(document_id)
    }

    /// Release every cached entry. Consumes the filter so nothing can reach
    /// its cache afterwards.
    pub fn dispose(mut self) {
        tracing::debug!(filter = %self.id, entries = self.cache.len(), "filter disposed");
        self.cache.clear();
    }
}
