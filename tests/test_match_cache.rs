use chrono::{DateTime, TimeDelta, Utc};
use log_focus::config::{CacheConfig, EngineConfig, LargeFileConfig};
use log_focus::document::TextDocument;
use log_focus::filter::{Filter, FilterColor, FilterFlags, FilterId, LineMatcher, MatchCache};

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
        .expect("valid RFC3339 timestamp")
        .with_timezone(&Utc)
}

fn config(max_entries: usize, ttl_secs: u64) -> EngineConfig {
    EngineConfig {
        cache: CacheConfig {
            max_entries,
            ttl_secs,
        },
        large_file: LargeFileConfig::default(),
    }
}

fn log_text(lines: usize) -> String {
    (0..lines)
        .map(|i| {
            if i % 3 == 0 {
                format!("2026-03-01 ERROR request {i} failed")
            } else {
                format!("2026-03-01 INFO request {i} ok")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_cache_hit_matches_fresh_scan_without_rescanning() {
    let matcher = LineMatcher::new("ERROR").unwrap();
    let doc = TextDocument::new("app.log", log_text(30));
    let mut cache = MatchCache::new(&config(8, 60));

    let first = cache.get_or_compute_at(&doc, &matcher, t0()).lines.clone();
    for i in 1..10 {
        let again = cache
            .get_or_compute_at(&doc, &matcher, t0() + TimeDelta::seconds(i))
            .lines
            .clone();
        assert_eq!(again, first);
    }
    assert_eq!(cache.scan_count(), 1);

    let mut fresh = MatchCache::new(&config(8, 60));
    let scratch = fresh.get_or_compute_at(&doc, &matcher, t0());
    assert_eq!(scratch.lines, first);
    assert_eq!(scratch.count, 10);
}

#[test]
fn test_pattern_change_never_serves_old_results() {
    let mut filter = Filter::new(
        FilterId(1),
        "ERROR",
        FilterColor::from_hue(30.0),
        FilterFlags::default(),
        &EngineConfig::default(),
    )
    .unwrap();
    let a = TextDocument::new("a.log", "ERROR\nINFO\nERROR");
    let b = TextDocument::new("b.log", "INFO\nERROR");

    assert_eq!(filter.evaluate(&a).lines, &[0, 2]);
    assert_eq!(filter.evaluate(&b).lines, &[1]);

    filter.set_pattern("INFO").unwrap();
    assert_eq!(filter.evaluate(&a).lines, &[1]);
    assert_eq!(filter.evaluate(&b).lines, &[0]);
    assert_eq!(filter.matched_line_numbers(None), vec![1, 0]);
}

#[test]
fn test_capacity_eviction_drops_oldest_first() {
    let matcher = LineMatcher::new("x").unwrap();
    let mut cache = MatchCache::new(&config(3, 3600));

    for i in 0..5 {
        let doc = TextDocument::new(format!("doc{i}.log"), "x");
        cache.get_or_compute_at(&doc, &matcher, t0() + TimeDelta::seconds(i));
    }

    let ids: Vec<&str> = cache.iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec!["doc2.log", "doc3.log", "doc4.log"]);
}

#[test]
fn test_recomputing_refreshes_eviction_age() {
    let matcher = LineMatcher::new("x").unwrap();
    let mut cache = MatchCache::new(&config(2, 3600));
    let mut a = TextDocument::new("a.log", "x");
    let b = TextDocument::new("b.log", "x");
    let c = TextDocument::new("c.log", "x");

    cache.get_or_compute_at(&a, &matcher, t0());
    cache.get_or_compute_at(&b, &matcher, t0() + TimeDelta::seconds(1));
    a.append("\nx");
    cache.get_or_compute_at(&a, &matcher, t0() + TimeDelta::seconds(2));
    cache.get_or_compute_at(&c, &matcher, t0() + TimeDelta::seconds(3));

    assert!(cache.get("a.log").is_some());
    assert!(cache.get("b.log").is_none());
    assert!(cache.get("c.log").is_some());
}

#[test]
fn test_expired_entry_is_recomputed() {
    let matcher = LineMatcher::new("x").unwrap();
    let doc = TextDocument::new("a.log", "x\ny");
    let mut cache = MatchCache::new(&config(4, 60));

    cache.get_or_compute_at(&doc, &matcher, t0());
    cache.get_or_compute_at(&doc, &matcher, t0() + TimeDelta::seconds(60));
    assert_eq!(cache.scan_count(), 1);

    let entry = cache.get_or_compute_at(&doc, &matcher, t0() + TimeDelta::seconds(61));
    assert_eq!(entry.captured_at, t0() + TimeDelta::seconds(61));
    assert_eq!(cache.scan_count(), 2);
}

#[test]
fn test_ttl_sweep_removes_other_documents() {
    let matcher = LineMatcher::new("x").unwrap();
    let old = TextDocument::new("old.log", "x");
    let new = TextDocument::new("new.log", "x");
    let mut cache = MatchCache::new(&config(4, 60));

    cache.get_or_compute_at(&old, &matcher, t0());
    cache.get_or_compute_at(&new, &matcher, t0() + TimeDelta::seconds(120));

    assert!(cache.get("old.log").is_none());
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_large_file_caps_decorations_but_not_matches() {
    let mut cfg = config(4, 60);
    cfg.large_file = LargeFileConfig {
        threshold_bytes: 1_000,
        max_decoration_ranges: 500,
        decoration_match_ceiling: 1_000,
    };
    let text = vec!["match me"; 10_000].join("\n");
    let doc = TextDocument::new("huge.log", text);
    let matcher = LineMatcher::new("match").unwrap();
    let mut cache = MatchCache::new(&cfg);

    let entry = cache.get_or_compute_at(&doc, &matcher, t0());
    assert!(entry.degraded);
    assert_eq!(entry.lines.len(), 10_000);
    assert_eq!(entry.count, 10_000);
    assert_eq!(entry.ranges.len(), 500);
}

#[test]
fn test_small_file_keeps_every_decoration() {
    let text = vec!["match me"; 700].join("\n");
    let doc = TextDocument::new("small.log", text);
    let matcher = LineMatcher::new("match").unwrap();
    let mut cache = MatchCache::new(&EngineConfig::default());

    let entry = cache.get_or_compute_at(&doc, &matcher, t0());
    assert!(!entry.degraded);
    assert_eq!(entry.ranges.len(), 700);
}

#[test]
fn test_large_file_with_many_matches_is_not_decorated() {
    let mut cfg = config(4, 60);
    cfg.large_file = LargeFileConfig {
        threshold_bytes: 1_000,
        max_decoration_ranges: 500,
        decoration_match_ceiling: 1_000,
    };
    let mut filter = Filter::new(
        FilterId(1),
        "match",
        FilterColor::from_hue(0.0),
        FilterFlags::default(),
        &cfg,
    )
    .unwrap();
    let doc = TextDocument::new("huge.log", vec!["match me"; 10_000].join("\n"));

    assert!(filter.decorations_for(&doc).is_empty());
    assert_eq!(filter.live_count(), 10_000);
    assert_eq!(filter.matched_line_numbers(Some("huge.log")).len(), 10_000);
}
