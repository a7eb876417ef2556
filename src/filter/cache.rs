//! Per-filter match cache
//!
//! One [`MatchCache`] belongs to one filter and holds at most one
//! [`MatchCacheEntry`] per document. An entry is reused only while the
//! document's version, byte size and content hash all equal the values it
//! was captured with, the pattern has not been replaced since, and the entry
//! is younger than the TTL. Anything else falls back to a full rescan.

use super::matcher::LineMatcher;
use crate::config::EngineConfig;
use crate::document::{ContentHash, DocumentSnapshot};
use chrono::{DateTime, TimeDelta, Utc};
use indexmap::IndexMap;
use serde::Serialize;

/// A whole-line decoration, `[0, end_column)` on `line`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecorationRange {
    pub line: usize,
    pub end_column: usize,
}

impl DecorationRange {
    pub fn whole_line(line: usize, text: &str) -> Self {
        Self {
            line,
            end_column: text.chars().count(),
        }
    }

    /// Same range moved to another line number
    pub fn on_line(self, line: usize) -> Self {
        Self { line, ..self }
    }
}

/// Result of scanning one document with one pattern, plus its fingerprint
#[derive(Debug, Clone)]
pub struct MatchCacheEntry {
    pub version: u64,
    pub byte_size: usize,
    pub content_hash: ContentHash,
    pub captured_at: DateTime<Utc>,
    /// Captured while the document was over the large-file threshold.
    pub degraded: bool,
    pub pattern_revision: u64,
    /// Matched line numbers, ascending. Never truncated.
    pub lines: Vec<usize>,
    /// Decoration ranges. Capped in degraded mode.
    pub ranges: Vec<DecorationRange>,
    pub count: usize,
    sequence: u64,
}

impl MatchCacheEntry {
    fn matches_snapshot(&self, doc: &dyn DocumentSnapshot) -> bool {
        self.version == doc.version()
            && self.byte_size == doc.byte_size()
            && self.content_hash == doc.content_hash()
    }

    fn is_expired(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        let ttl = if self.degraded { ttl / 2 } else { ttl };
        now.signed_duration_since(self.captured_at) > ttl
    }
}

#[derive(Debug, Clone)]
struct CacheSettings {
    max_entries: usize,
    ttl: TimeDelta,
    large_file_bytes: usize,
    max_decoration_ranges: usize,
}

impl From<&EngineConfig> for CacheSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_entries: config.cache.max_entries.max(1),
            ttl: config.cache.ttl(),
            large_file_bytes: config.large_file.threshold_bytes,
            max_decoration_ranges: config.large_file.max_decoration_ranges,
        }
    }
}

/// Bounded document -> entry table for a single filter
#[derive(Debug, Clone)]
pub struct MatchCache {
    entries: IndexMap<String, MatchCacheEntry>,
    settings: CacheSettings,
    pattern_revision: u64,
    scans: u64,
}

impl MatchCache {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            entries: IndexMap::new(),
            settings: CacheSettings::from(config),
            pattern_revision: 0,
            scans: 0,
        }
    }

    pub fn get_or_compute(
        &mut self,
        doc: &dyn DocumentSnapshot,
        matcher: &LineMatcher,
    ) -> &MatchCacheEntry {
        self.get_or_compute_at(doc, matcher, Utc::now())
    }

    /// Return the cached entry for `doc` if it is still valid at `now`,
    /// otherwise rescan the document and store the new entry.
    pub fn get_or_compute_at(
        &mut self,
        doc: &dyn DocumentSnapshot,
        matcher: &LineMatcher,
        now: DateTime<Utc>,
    ) -> &MatchCacheEntry {
        self.sweep_expired(now);

        let fresh = self.entries.get(doc.id()).is_some_and(|entry| {
            entry.pattern_revision == self.pattern_revision && entry.matches_snapshot(doc)
        });

        if fresh {
            tracing::trace!(document = doc.id(), "match cache hit");
        } else {
            let entry = self.scan(doc, matcher, now);
            self.entries.insert(doc.id().to_string(), entry);
            self.enforce_capacity(doc.id());
        }

        &self.entries[doc.id()]
    }

    /// Cached entry for `document_id`, without any validity check
    pub fn get(&self, document_id: &str) -> Option<&MatchCacheEntry> {
        self.entries.get(document_id)
    }

    /// Entries in the order their documents were first computed
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MatchCacheEntry)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    /// Drop the entry for one document (document closed)
    pub fn invalidate(&mut self, document_id: &str) -> bool {
        self.entries.shift_remove(document_id).is_some()
    }

    /// Drop every entry and move to a new pattern revision
    pub fn invalidate_all(&mut self, pattern_revision: u64) {
        tracing::debug!(
            dropped = self.entries.len(),
            pattern_revision,
            "match cache invalidated"
        );
        self.entries.clear();
        self.pattern_revision = pattern_revision;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of full document scans performed so far
    pub fn scan_count(&self) -> u64 {
        self.scans
    }

    pub fn is_large(&self, doc: &dyn DocumentSnapshot) -> bool {
        doc.byte_size() > self.settings.large_file_bytes
    }

    fn scan(
        &mut self,
        doc: &dyn DocumentSnapshot,
        matcher: &LineMatcher,
        now: DateTime<Utc>,
    ) -> MatchCacheEntry {
        let degraded = self.is_large(doc);
        let range_cap = if degraded {
            self.settings.max_decoration_ranges
        } else {
            usize::MAX
        };

        let mut lines = Vec::new();
        let mut ranges = Vec::new();
        for (number, text) in doc.lines().enumerate() {
            if matcher.matches(text) {
                lines.push(number);
                if ranges.len() < range_cap {
                    ranges.push(DecorationRange::whole_line(number, text));
                }
            }
        }

        self.scans += 1;
        tracing::debug!(
            document = doc.id(),
            version = doc.version(),
            matches = lines.len(),
            ranges = ranges.len(),
            degraded,
            "scanned document"
        );

        MatchCacheEntry {
            version: doc.version(),
            byte_size: doc.byte_size(),
            content_hash: doc.content_hash(),
            captured_at: now,
            degraded,
            pattern_revision: self.pattern_revision,
            count: lines.len(),
            lines,
            ranges,
            sequence: self.scans,
        }
    }

    fn sweep_expired(&mut self, now: DateTime<Utc>) {
        let ttl = self.settings.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now, ttl));
        let expired = before - self.entries.len();
        if expired > 0 {
            tracing::debug!(expired, "match cache entries expired");
        }
    }

    fn enforce_capacity(&mut self, keep: &str) {
        let excess = self
            .entries
            .len()
            .saturating_sub(self.settings.max_entries);
        if excess == 0 {
            return;
        }

        let mut by_age: Vec<(DateTime<Utc>, u64, String)> = self
            .entries
            .iter()
            .filter(|(id, _)| id.as_str() != keep)
            .map(|(id, entry)| (entry.captured_at, entry.sequence, id.clone()))
            .collect();
        by_age.sort();

        for (_, _, id) in by_age.into_iter().take(excess) {
            tracing::debug!(document = %id, "match cache entry evicted");
            self.entries.shift_remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, LargeFileConfig};
    use crate::document::TextDocument;

    fn config(max_entries: usize, ttl_secs: u64) -> EngineConfig {
        EngineConfig {
            cache: CacheConfig {
                max_entries,
                ttl_secs,
            },
            large_file: LargeFileConfig::default(),
        }
    }

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_unchanged_document_is_a_cache_hit() {
        let mut cache = MatchCache::new(&config(4, 60));
        let matcher = LineMatcher::new("ERROR").unwrap();
        let doc = TextDocument::new("a.log", "ok\nERROR one\nok\nERROR two");

        let first = cache.get_or_compute_at(&doc, &matcher, t0()).lines.clone();
        let second = cache
            .get_or_compute_at(&doc, &matcher, t0() + TimeDelta::seconds(10))
            .lines
            .clone();

        assert_eq!(first, vec![1, 3]);
        assert_eq!(first, second);
        assert_eq!(cache.scan_count(), 1);
    }

    #[test]
    fn test_edit_triggers_rescan() {
        let mut cache = MatchCache::new(&config(4, 60));
        let matcher = LineMatcher::new("ERROR").unwrap();
        let mut doc = TextDocument::new("a.log", "ERROR");

        cache.get_or_compute_at(&doc, &matcher, t0());
        doc.append("\nERROR again");
        let entry = cache.get_or_compute_at(&doc, &matcher, t0());

        assert_eq!(entry.lines, vec![0, 1]);
        assert_eq!(entry.version, 2);
        assert_eq!(cache.scan_count(), 2);
    }

    #[test]
    fn test_reused_version_with_different_content_is_stale() {
        let mut cache = MatchCache::new(&config(4, 60));
        let matcher = LineMatcher::new("x").unwrap();
        let a = TextDocument::new("a.log", "x\ny");
        // Same id, same version counter, same size, different text.
        let b = TextDocument::new("a.log", "y\nx");

        cache.get_or_compute_at(&a, &matcher, t0());
        let entry = cache.get_or_compute_at(&b, &matcher, t0());

        assert_eq!(entry.lines, vec![1]);
        assert_eq!(cache.scan_count(), 2);
    }

    #[test]
    fn test_degraded_entries_expire_at_half_ttl() {
        let mut cfg = config(4, 60);
        cfg.large_file.threshold_bytes = 4;
        let mut cache = MatchCache::new(&cfg);
        let matcher = LineMatcher::new("x").unwrap();
        let doc = TextDocument::new("big.log", "x\nx\nx");

        assert!(cache.get_or_compute_at(&doc, &matcher, t0()).degraded);
        cache.get_or_compute_at(&doc, &matcher, t0() + TimeDelta::seconds(30));
        assert_eq!(cache.scan_count(), 1);
        cache.get_or_compute_at(&doc, &matcher, t0() + TimeDelta::seconds(31));
        assert_eq!(cache.scan_count(), 2);
    }

    #[test]
    fn test_pattern_revision_mismatch_is_never_reused() {
        let mut cache = MatchCache::new(&config(4, 60));
        let doc = TextDocument::new("a.log", "alpha\nbeta");

        let old = LineMatcher::new("alpha").unwrap();
        cache.get_or_compute_at(&doc, &old, t0());
        cache.invalidate_all(1);
        assert!(cache.is_empty());

        let new = LineMatcher::new("beta").unwrap();
        assert_eq!(cache.get_or_compute_at(&doc, &new, t0()).lines, vec![1]);
    }

    #[test]
    fn test_recompute_keeps_document_order() {
        let mut cache = MatchCache::new(&config(4, 60));
        let matcher = LineMatcher::new("x").unwrap();
        let mut a = TextDocument::new("a.log", "x");
        let b = TextDocument::new("b.log", "x");

        cache.get_or_compute_at(&a, &matcher, t0());
        cache.get_or_compute_at(&b, &matcher, t0());
        a.append("\nx");
        cache.get_or_compute_at(&a, &matcher, t0());

        let ids: Vec<&str> = cache.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["a.log", "b.log"]);
    }
}
