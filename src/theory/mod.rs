//! Clauses and theories
//!
//! A `Theory` is an ordered collection of clauses forming a policy (or a
//! policy composed with route facts). Theories are immutable values:
//! deriving a verification theory never touches the base policy, so
//! concurrent verifications can share one snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parser::{self, ParseError};
use crate::term::Term;

/// One rule or fact: a head term, optionally dependent on body goals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    /// Head term (always callable)
    pub head: Term,
    /// Conjunction of body goals; empty for facts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<Term>,
}

impl Clause {
    pub fn new(head: Term, body: Vec<Term>) -> Self {
        Clause { head, body }
    }

    /// Create a fact (empty body)
    pub fn fact(head: Term) -> Self {
        Clause { head, body: Vec::new() }
    }

    /// Check if this clause is a fact
    pub fn is_fact(&self) -> bool {
        self.body.is_empty()
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.head)?;
        if !self.body.is_empty() {
            write!(f, " :- ")?;
            for (i, goal) in self.body.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", goal)?;
            }
        }
        write!(f, ".")
    }
}

/// An ordered, immutable collection of clauses
///
/// Clause order is the resolution scan order; it decides the order in which
/// solutions are enumerated, not which solutions exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theory {
    clauses: Vec<Clause>,
}

impl Theory {
    /// Create an empty theory
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a rule-language document into a theory
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        Ok(Theory {
            clauses: parser::parse_program(source)?,
        })
    }

    /// Build a theory from clauses
    pub fn from_clauses(clauses: Vec<Clause>) -> Self {
        Theory { clauses }
    }

    /// The clauses, in declaration order
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Number of clauses
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Check if the theory has no clauses
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Derive a new theory: this theory's clauses followed by the other's
    ///
    /// `self` is left untouched; route verification relies on this to
    /// compose policy and route facts without mutating the policy.
    pub fn appended(&self, extra: &Theory) -> Theory {
        let mut clauses = self.clauses.clone();
        clauses.extend(extra.clauses.iter().cloned());
        Theory { clauses }
    }

    /// Structured JSON export (inspection form; `Display` is the
    /// round-tripping text form)
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{\"clauses\":[]}".to_string())
    }
}

impl fmt::Display for Theory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for clause in &self.clauses {
            writeln!(f, "{}", clause)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: &str = r#"
        entrynode(a).
        stmt(b).
        edge(a, b).
        path(X, Y, [X, Y]) :- edge(X, Y).
        path(X, Z, [X|T]) :- edge(X, Y), path(Y, Z, T).
    "#;

    #[test]
    fn test_parse_and_len() {
        let t = Theory::parse(POLICY).unwrap();
        assert_eq!(t.len(), 5);
        assert!(t.clauses()[0].is_fact());
        assert!(!t.clauses()[3].is_fact());
    }

    #[test]
    fn test_display_roundtrip() {
        let t = Theory::parse(POLICY).unwrap();
        let serialized = t.to_string();
        let reparsed = Theory::parse(&serialized).unwrap();
        assert_eq!(t, reparsed);
    }

    #[test]
    fn test_roundtrip_preserves_quoting_and_operators() {
        let src = "check(X) :- X is 1+2, X =< 5, label('needs review').\n";
        let t = Theory::parse(src).unwrap();
        let reparsed = Theory::parse(&t.to_string()).unwrap();
        assert_eq!(t, reparsed);
    }

    #[test]
    fn test_appended_leaves_base_untouched() {
        let base = Theory::parse("stmt(a).").unwrap();
        let extra = Theory::parse("stmt(b).").unwrap();
        let derived = base.appended(&extra);
        assert_eq!(base.len(), 1);
        assert_eq!(derived.len(), 2);
        assert_eq!(derived.clauses()[0], base.clauses()[0]);
    }

    #[test]
    fn test_clause_display() {
        let t = Theory::parse("path(X, Y, [X, Y]) :- edge(X, Y).").unwrap();
        assert_eq!(
            t.clauses()[0].to_string(),
            "path(X, Y, [X, Y]) :- edge(X, Y)."
        );
    }

    #[test]
    fn test_to_json_contains_clauses() {
        let t = Theory::parse("edge(a, b).").unwrap();
        let json = t.to_json();
        assert!(json.contains("edge"));
        assert!(json.contains("clauses"));
    }
}
