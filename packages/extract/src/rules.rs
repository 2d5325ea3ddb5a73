//! Ordered pattern rules for field extraction.
//!
//! Roster documents changed layout several times, so most fields can be
//! recognised by more than one pattern. A [`RuleChain`] holds those patterns
//! in priority order: the first rule whose regex matches the line decides
//! the outcome, and its `refine` step may still reject the captured text.
//! New layouts are supported by appending a rule, never by reordering.

use regex::Regex;

/// Post-processing applied to the text captured by a rule.
pub type Refine = fn(&str) -> Option<String>;

/// A single named pattern with the capture group it extracts.
pub struct PatternRule {
    /// Short identifier used in debug logging.
    pub name: &'static str,
    regex: Regex,
    refine: Refine,
}

impl PatternRule {
    /// Creates a rule that returns capture group 1 unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is not a valid regex. Rules are built from
    /// string literals at startup.
    #[must_use]
    pub fn new(name: &'static str, pattern: &str) -> Self {
        Self::with_refine(name, pattern, |s| Some(s.to_string()))
    }

    /// Creates a rule whose capture group 1 is passed through `refine`.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is not a valid regex.
    #[must_use]
    pub fn with_refine(name: &'static str, pattern: &str, refine: Refine) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).expect("valid regex"),
            refine,
        }
    }

    /// Returns the raw capture group 1 if the rule matches `line`.
    #[must_use]
    pub fn capture<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.regex
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// Patterns tried in priority order.
pub struct RuleChain {
    rules: Vec<PatternRule>,
}

impl RuleChain {
    #[must_use]
    pub const fn new(rules: Vec<PatternRule>) -> Self {
        Self { rules }
    }

    /// Applies the first matching rule to `line`.
    ///
    /// Returns `None` when no rule matches, or when the first matching
    /// rule's refine step rejects the capture. Later rules are not
    /// consulted once a rule has matched.
    #[must_use]
    pub fn first_match(&self, line: &str) -> Option<String> {
        for rule in &self.rules {
            if let Some(captured) = rule.capture(line) {
                let refined = (rule.refine)(captured);
                log::trace!("rule '{}' matched: {captured:?} -> {refined:?}", rule.name);
                return refined;
            }
        }
        None
    }
}

/// Collapses runs of whitespace into single spaces and trims the ends.
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
