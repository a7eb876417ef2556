use super::error::FilterError;
use regex::Regex;

/// A compiled line pattern
///
/// Matching is a plain per-line regular expression test. The source text
/// of the pattern stays available through [`LineMatcher::pattern`].
#[derive(Debug, Clone)]
pub struct LineMatcher {
    regex: Regex,
}

impl LineMatcher {
    /// Compile `pattern`, rejecting malformed expressions. The empty pattern
    /// is valid and matches every line.
    pub fn new(pattern: &str) -> Result<Self, FilterError> {
        let regex = Regex::new(pattern).map_err(|e| FilterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { regex })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn matches(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}

/// Check that `pattern` would be accepted, without keeping the compiled form.
pub fn validate_pattern(pattern: &str) -> Result<(), FilterError> {
    LineMatcher::new(pattern).map(|_| ())
}
