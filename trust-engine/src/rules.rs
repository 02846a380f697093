//! Ordered, tagged keyword rules and the signal collector they feed

use crate::types::Signal;
use tracing::debug;

/// A keyword category; only the first matching keyword contributes
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    /// Category tag, used in logs
    pub category: &'static str,
    /// Points added when any keyword matches
    pub points: i32,
    /// Reason prefix, rendered as `<label>: "<keyword>"`
    pub label: &'static str,
    /// Keywords in priority order, lower-case
    pub keywords: &'static [&'static str],
}

impl KeywordRule {
    /// First keyword contained in `haystack` (expected lower-case)
    pub fn first_match(&self, haystack: &str) -> Option<&'static str> {
        self.keywords.iter().copied().find(|kw| haystack.contains(kw))
    }

    /// Push a signal for the first match; returns whether the rule fired
    pub fn apply(&self, haystack: &str, signals: &mut SignalSet) -> bool {
        match self.first_match(haystack) {
            Some(keyword) => {
                debug!(category = self.category, keyword, "keyword rule fired");
                signals.add(self.points, format!("{}: \"{}\"", self.label, keyword));
                true
            }
            None => false,
        }
    }
}

/// Apply every category in table order
pub fn apply_all(rules: &[KeywordRule], haystack: &str, signals: &mut SignalSet) {
    for rule in rules {
        rule.apply(haystack, signals);
    }
}

/// Ordered collection of fired signals
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalSet {
    signals: Vec<Signal>,
}

impl SignalSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a signal
    pub fn add(&mut self, points: i32, reason: impl Into<String>) {
        self.signals.push(Signal::new(points, reason));
    }

    /// Raw (unclamped, unjittered) risk sum
    pub fn raw_risk(&self) -> i32 {
        self.signals.iter().map(|s| s.points).sum()
    }

    /// Whether a reason with this exact text fired
    pub fn has_reason(&self, reason: &str) -> bool {
        self.signals.iter().any(|s| s.reason == reason)
    }

    /// Number of signals
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// No signal fired
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Signals in firing order
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Reasons in firing order
    pub fn into_reasons(self) -> Vec<String> {
        self.signals.into_iter().map(|s| s.reason).collect()
    }
}
