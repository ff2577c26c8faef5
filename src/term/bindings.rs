//! Binding environment for resolution
//!
//! Variables are bound at most once; backtracking unbinds them by rolling
//! the trail back to a saved mark. This gives choice points O(k) restore
//! cost where k is the number of bindings made since the mark.

use fnv::FnvHashMap;

use super::{Term, Variable};

/// A trail position, saved before trying an alternative
pub type Mark = usize;

/// Mapping from variable IDs to terms, with a trail for rollback
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    map: FnvHashMap<u64, Term>,
    trail: Vec<u64>,
}

impl Bindings {
    /// Create an empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bound variables
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if no variables are bound
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Bind a variable to a term, recording it on the trail
    ///
    /// The variable must be unbound; rebinding indicates a bug in the
    /// resolution loop, which always dereferences before binding.
    pub fn bind(&mut self, var: &Variable, term: Term) {
        debug_assert!(!self.map.contains_key(&var.id), "variable bound twice");
        self.map.insert(var.id, term);
        self.trail.push(var.id);
    }

    /// Look up a variable's direct binding
    pub fn lookup(&self, var: &Variable) -> Option<&Term> {
        self.map.get(&var.id)
    }

    /// Save the current trail position
    pub fn mark(&self) -> Mark {
        self.trail.len()
    }

    /// Undo all bindings made since the mark
    pub fn undo_to(&mut self, mark: Mark) {
        for id in self.trail.drain(mark..) {
            self.map.remove(&id);
        }
    }

    /// Follow variable chains one level short of full resolution
    ///
    /// Returns the term the argument ultimately stands for: either a
    /// non-variable term (possibly with unresolved subterms) or an unbound
    /// variable.
    pub fn walk<'a>(&'a self, term: &'a Term) -> &'a Term {
        let mut cursor = term;
        while let Term::Var(v) = cursor {
            match self.map.get(&v.id) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        cursor
    }

    /// Fully resolve a term: every bound variable is replaced by its value,
    /// recursively
    pub fn resolve(&self, term: &Term) -> Term {
        match self.walk(term) {
            Term::Struct(f, args) => Term::Struct(
                f.clone(),
                args.iter().map(|a| self.resolve(a)).collect(),
            ),
            other => other.clone(),
        }
    }
}
