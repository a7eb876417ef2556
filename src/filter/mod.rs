//! Regular-expression line filters
//!
//! A [`Filter`] pairs a compiled [`LineMatcher`] with display flags, a color
//! pair and a per-document [`MatchCache`]. Repeated evaluation of an
//! unchanged document is a cache hit; any change to the document, the
//! pattern or the entry's age forces a synchronous rescan.
//!
//! # Flags
//!
//! - `highlighted` - decorate matching lines
//! - `shown` - take part in the focus view
//! - `exclude` - drop matching lines from the focus view instead of keeping them
//!
//! # Large documents
//!
//! Documents above the configured size threshold are scanned in degraded
//! mode: the matched line list stays complete, but the decoration range
//! list is capped and decorations are suppressed when a filter matches too
//! many lines.

pub mod cache;
pub mod color;
pub mod engine;
pub mod error;
pub mod matcher;

pub use cache::{DecorationRange, MatchCache, MatchCacheEntry};
pub use color::{ColorAllocator, FilterColor, Rgb};
pub use engine::{Evaluation, Filter, FilterFlags, FilterId};
pub use error::FilterError;
pub use matcher::{LineMatcher, validate_pattern};
