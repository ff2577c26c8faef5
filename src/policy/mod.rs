//! Label model for flow-control rules
//!
//! Plain value objects: a rule owns a set of string labels, a labeling
//! rule additionally names the data attribute the labels apply to.
//! Labels accumulate: adding labels is a set union and never replaces the
//! existing set.

use indexmap::IndexSet;
use serde::Serialize;

/// A flow-control rule owning a set of labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Rule {
    labels: IndexSet<String>,
}

impl Rule {
    /// Create a rule with no labels
    pub fn new() -> Self {
        Self::default()
    }

    /// Add labels to the existing set
    ///
    /// Set union: existing labels are kept, duplicates are ignored.
    /// Adding the same labels again is a no-op.
    pub fn add_labels<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for label in labels {
            self.labels.insert(label.into());
        }
    }

    /// The label set, read-only
    pub fn labels(&self) -> &IndexSet<String> {
        &self.labels
    }

    /// Check for a single label
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }
}

/// A labeling rule: labels plus the attribute they apply to
///
/// No validation is performed on label or attribute strings; any string is
/// accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelingRule {
    attribute: String,
    #[serde(flatten)]
    rule: Rule,
}

impl LabelingRule {
    /// Create a labeling rule with initial labels for an attribute
    pub fn new<I, S>(attribute: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rule = Rule::new();
        rule.add_labels(labels);
        LabelingRule {
            attribute: attribute.into(),
            rule,
        }
    }

    /// The attribute the labels apply to
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Rename the attribute
    pub fn set_attribute(&mut self, attribute: impl Into<String>) {
        self.attribute = attribute.into();
    }

    /// Add labels (set union, like `Rule::add_labels`)
    pub fn add_labels<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule.add_labels(labels);
    }

    /// The label set, read-only
    pub fn labels(&self) -> &IndexSet<String> {
        self.rule.labels()
    }
}
