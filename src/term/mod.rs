//! Logical term representations
//!
//! This module defines the core data types for the rule language:
//! - Atoms (symbolic constants)
//! - Integers (numeric constants)
//! - Variables (resolved through a binding environment)
//! - Compound structures (a functor applied to argument terms)
//!
//! Lists are ordinary compound terms built from the cons functor `'.'/2`
//! and the nil atom `[]`, with `[a, b | T]` sugar in display and parsing.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

mod bindings;

pub use bindings::Bindings;

/// The cons functor used for list cells
pub const CONS: &str = ".";

/// The nil atom terminating proper lists
pub const NIL: &str = "[]";

/// A logic variable
///
/// Source-level variables carry `id == 0`; resolution standardizes clause
/// copies apart by assigning fresh ids from a per-solve counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variable {
    /// Variable name as written in the source
    pub name: String,
    /// Unique ID, 0 until renamed apart
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: u64,
}

fn is_zero(id: &u64) -> bool {
    *id == 0
}

impl Variable {
    pub fn new(name: &str) -> Self {
        Variable {
            name: name.to_string(),
            id: 0,
        }
    }

    /// Create a fresh variable with a new ID
    pub fn fresh(name: &str, counter: &mut u64) -> Self {
        *counter += 1;
        Variable {
            name: name.to_string(),
            id: *counter,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A term in the rule language
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Term {
    /// A symbolic constant
    Atom(String),
    /// An integer constant
    Int(i64),
    /// A variable
    Var(Variable),
    /// A compound structure: functor applied to one or more arguments
    Struct(String, Vec<Term>),
}

impl Term {
    /// Create an atom term
    pub fn atom(name: impl Into<String>) -> Self {
        Term::Atom(name.into())
    }

    /// Create an integer term
    pub fn int(value: i64) -> Self {
        Term::Int(value)
    }

    /// Create a variable term (source-level, id 0)
    pub fn var(name: &str) -> Self {
        Term::Var(Variable::new(name))
    }

    /// Create a compound term
    ///
    /// A zero-argument structure collapses to an atom.
    pub fn structure(functor: impl Into<String>, args: Vec<Term>) -> Self {
        let functor = functor.into();
        if args.is_empty() {
            Term::Atom(functor)
        } else {
            Term::Struct(functor, args)
        }
    }

    /// The empty list
    pub fn nil() -> Self {
        Term::Atom(NIL.to_string())
    }

    /// Build a proper list from elements
    pub fn list(elements: Vec<Term>) -> Self {
        Self::list_with_tail(elements, Term::nil())
    }

    /// Build a list from elements with an explicit tail
    pub fn list_with_tail(elements: Vec<Term>, tail: Term) -> Self {
        elements.into_iter().rev().fold(tail, |acc, elem| {
            Term::Struct(CONS.to_string(), vec![elem, acc])
        })
    }

    /// Check if this term is a variable
    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    /// Check if this term is the nil atom
    pub fn is_nil(&self) -> bool {
        matches!(self, Term::Atom(a) if a == NIL)
    }

    /// Check if this term may appear as a goal or clause head
    pub fn is_callable(&self) -> bool {
        matches!(self, Term::Atom(_) | Term::Struct(_, _))
    }

    /// Check if this term is ground (contains no variables)
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Var(_) => false,
            Term::Atom(_) | Term::Int(_) => true,
            Term::Struct(_, args) => args.iter().all(|a| a.is_ground()),
        }
    }

    /// Functor name and arity, for atoms and structures
    pub fn functor(&self) -> Option<(&str, usize)> {
        match self {
            Term::Atom(name) => Some((name, 0)),
            Term::Struct(name, args) => Some((name, args.len())),
            _ => None,
        }
    }

    /// Decompose a cons-cell chain into its elements
    ///
    /// Returns the elements and, for improper lists, the non-nil tail.
    pub fn as_list(&self) -> Option<(Vec<&Term>, Option<&Term>)> {
        let mut elements = Vec::new();
        let mut cursor = self;
        loop {
            match cursor {
                Term::Struct(f, args) if f == CONS && args.len() == 2 => {
                    elements.push(&args[0]);
                    cursor = &args[1];
                }
                Term::Atom(a) if a == NIL => return Some((elements, None)),
                _ if !elements.is_empty() => return Some((elements, Some(cursor))),
                _ => return None,
            }
        }
    }

    /// Collect all variables in this term, in first-occurrence order
    pub fn variables(&self) -> Vec<Variable> {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars
    }

    fn collect_variables(&self, vars: &mut Vec<Variable>) {
        match self {
            Term::Var(v) => {
                if !vars.contains(v) {
                    vars.push(v.clone());
                }
            }
            Term::Struct(_, args) => {
                for arg in args {
                    arg.collect_variables(vars);
                }
            }
            Term::Atom(_) | Term::Int(_) => {}
        }
    }

    /// Check if this term contains the variable with the given ID
    pub fn contains_var(&self, id: u64) -> bool {
        match self {
            Term::Var(v) => v.id == id,
            Term::Struct(_, args) => args.iter().any(|a| a.contains_var(id)),
            Term::Atom(_) | Term::Int(_) => false,
        }
    }

    /// Standardize variables apart using a counter
    ///
    /// Every distinct variable in the term gets a fresh ID; occurrences of
    /// the same variable map to the same fresh variable. Used to rename
    /// clause copies before unification so separate resolution steps cannot
    /// capture each other's variables.
    pub fn rename_apart(
        &self,
        counter: &mut u64,
        mapping: &mut HashMap<Variable, Variable>,
    ) -> Term {
        match self {
            Term::Var(v) => {
                if let Some(renamed) = mapping.get(v) {
                    Term::Var(renamed.clone())
                } else {
                    let renamed = Variable::fresh(&v.name, counter);
                    mapping.insert(v.clone(), renamed.clone());
                    Term::Var(renamed)
                }
            }
            Term::Struct(f, args) => Term::Struct(
                f.clone(),
                args.iter().map(|a| a.rename_apart(counter, mapping)).collect(),
            ),
            Term::Atom(_) | Term::Int(_) => self.clone(),
        }
    }
}

// ============================================================================
// Operator table (shared by display and parser)
// ============================================================================

/// Operator fixity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixity {
    /// Infix, non-associative (xfx)
    Xfx,
    /// Infix, left-associative (yfx)
    Yfx,
    /// Prefix (fy)
    Fy,
}

/// Look up an operator's precedence and fixity
pub fn operator(name: &str) -> Option<(u32, Fixity)> {
    match name {
        "=" | "\\=" | "==" | "\\==" | "<" | "=<" | ">" | ">=" | "=:=" | "=\\=" | "is" => {
            Some((700, Fixity::Xfx))
        }
        "+" | "-" => Some((500, Fixity::Yfx)),
        "*" | "//" | "mod" => Some((400, Fixity::Yfx)),
        "\\+" => Some((900, Fixity::Fy)),
        _ => None,
    }
}

/// Check whether an atom name can be written without quotes
pub fn is_plain_atom(name: &str) -> bool {
    if name == NIL {
        return true;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn write_atom(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if is_plain_atom(name) {
        write!(f, "{}", name)
    } else {
        write!(f, "'")?;
        for c in name.chars() {
            match c {
                '\'' => write!(f, "\\'")?,
                '\\' => write!(f, "\\\\")?,
                _ => write!(f, "{}", c)?,
            }
        }
        write!(f, "'")
    }
}

/// Precedence-aware term writer
///
/// `max_prec` is the highest operator precedence printable without
/// parentheses in the current position.
fn write_term(f: &mut fmt::Formatter<'_>, term: &Term, max_prec: u32) -> fmt::Result {
    match term {
        Term::Atom(name) => write_atom(f, name),
        Term::Int(n) => write!(f, "{}", n),
        Term::Var(v) => write!(f, "{}", v),
        Term::Struct(functor, args) => {
            // List sugar
            if functor == CONS && args.len() == 2 {
                if let Some((elements, tail)) = term.as_list() {
                    write!(f, "[")?;
                    for (i, elem) in elements.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write_term(f, elem, 999)?;
                    }
                    if let Some(tail) = tail {
                        write!(f, "|")?;
                        write_term(f, tail, 999)?;
                    }
                    return write!(f, "]");
                }
            }
            // Operator sugar
            match operator(functor) {
                Some((prec, Fixity::Xfx)) if args.len() == 2 => {
                    let parens = prec > max_prec;
                    if parens {
                        write!(f, "(")?;
                    }
                    write_term(f, &args[0], prec - 1)?;
                    write!(f, " {} ", functor)?;
                    write_term(f, &args[1], prec - 1)?;
                    if parens {
                        write!(f, ")")?;
                    }
                    Ok(())
                }
                Some((prec, Fixity::Yfx)) if args.len() == 2 => {
                    let parens = prec > max_prec;
                    if parens {
                        write!(f, "(")?;
                    }
                    write_term(f, &args[0], prec)?;
                    write!(f, "{}", functor)?;
                    write_term(f, &args[1], prec - 1)?;
                    if parens {
                        write!(f, ")")?;
                    }
                    Ok(())
                }
                Some((prec, Fixity::Fy)) if args.len() == 1 => {
                    let parens = prec > max_prec;
                    if parens {
                        write!(f, "(")?;
                    }
                    write!(f, "{} ", functor)?;
                    write_term(f, &args[0], prec)?;
                    if parens {
                        write!(f, ")")?;
                    }
                    Ok(())
                }
                _ => {
                    write_atom(f, functor)?;
                    write!(f, "(")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write_term(f, arg, 999)?;
                    }
                    write!(f, ")")
                }
            }
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_term(f, self, 1200)
    }
}
