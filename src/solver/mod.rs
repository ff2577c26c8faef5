//! SLD resolution engine
//!
//! Resolves a goal conjunction against a theory: scans clauses in stored
//! order, unifies the goal with renamed-apart clause heads, and pushes the
//! clause body onto the goal stack. Alternatives not yet tried are kept as
//! explicit choice points, so backtracking (and cancellation checks) never
//! depend on host-stack recursion.
//!
//! Solutions are enumerated lazily: `next_solution` suspends after each
//! success and resumes from the most recent choice point when asked again.

use std::collections::HashMap;
use std::time::Instant;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::parser::{self, ParseError};
use crate::term::{Bindings, Term, Variable};
use crate::theory::{Clause, Theory};

mod builtins;
mod library;
mod unify;

pub use builtins::{eval_arith, BuiltinError};
pub use unify::unify;

/// Resolution limits
///
/// A theory with unbounded recursive rules has no inherent termination
/// guarantee; the limits below are the only way to bound such a solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Maximum resolution steps per solve (0 = unlimited)
    pub max_steps: u64,
    /// Absolute deadline, checked once per resolution step
    #[serde(skip)]
    pub deadline: Option<Instant>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            max_steps: 1_000_000,
            deadline: None,
        }
    }
}

/// Resolution error or end-of-sequence signal
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SolveError {
    /// All choice points are exhausted; not a failure, the sequence is over
    #[error("no more solutions")]
    NoMoreSolutions,

    /// The goal text could not be parsed; reported before any resolution
    #[error("malformed goal: {0}")]
    MalformedGoal(ParseError),

    #[error("resolution stopped after {0} steps")]
    StepLimit(u64),

    #[error("resolution deadline exceeded")]
    DeadlineExceeded,
}

/// One satisfying assignment for a query
///
/// A yielded solution is always a success; the map holds each query
/// variable's fully resolved value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Solution {
    bindings: IndexMap<String, Term>,
}

impl Solution {
    /// Value bound to a query variable, if any
    pub fn var_value(&self, name: &str) -> Option<&Term> {
        self.bindings.get(name)
    }

    /// All query variable bindings, in query order
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.bindings.is_empty() {
            return write!(f, "yes");
        }
        for (i, (name, term)) in self.bindings.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} = {}", name, term)?;
        }
        Ok(())
    }
}

/// A suspended alternative: the goal it was created for, the goals that
/// followed it, the next clause index to try, and the trail mark to restore
#[derive(Debug)]
struct ChoicePoint {
    goal: Term,
    rest: Vec<Term>,
    next_clause: usize,
    mark: usize,
}

/// SLD resolution machine over one theory snapshot
///
/// One solver serves one query; concurrent queries each get their own
/// solver instance.
#[derive(Debug)]
pub struct Solver {
    clauses: Vec<Clause>,
    goals: Vec<Term>,
    choice_points: Vec<ChoicePoint>,
    bindings: Bindings,
    counter: u64,
    query_vars: IndexMap<String, Variable>,
    config: SolverConfig,
    steps: u64,
    started: bool,
    exhausted: bool,
}

impl Solver {
    /// Create a solver for already-parsed goals
    pub fn new(theory: &Theory, goals: Vec<Term>, config: SolverConfig) -> Self {
        let mut clauses: Vec<Clause> = library::library_clauses().to_vec();
        clauses.extend(theory.clauses().iter().cloned());

        let mut counter = 0;
        let mut mapping = HashMap::new();
        let renamed: Vec<Term> = goals
            .iter()
            .map(|g| g.rename_apart(&mut counter, &mut mapping))
            .collect();

        let mut query_vars = IndexMap::new();
        for goal in &goals {
            for var in goal.variables() {
                if let Some(fresh) = mapping.get(&var) {
                    query_vars
                        .entry(var.name.clone())
                        .or_insert_with(|| fresh.clone());
                }
            }
        }

        // Goal stack: first goal on top
        let mut goal_stack = renamed;
        goal_stack.reverse();

        Solver {
            clauses,
            goals: goal_stack,
            choice_points: Vec::new(),
            bindings: Bindings::new(),
            counter,
            query_vars,
            config,
            steps: 0,
            started: false,
            exhausted: false,
        }
    }

    /// Create a solver from query text
    ///
    /// A goal that cannot be parsed is reported as `MalformedGoal` before
    /// any resolution begins.
    pub fn for_query(theory: &Theory, query: &str, config: SolverConfig) -> Result<Self, SolveError> {
        let goals = parser::parse_query(query).map_err(SolveError::MalformedGoal)?;
        debug!(query, goal_count = goals.len(), "starting resolution");
        Ok(Solver::new(theory, goals, config))
    }

    /// Produce the next solution, resuming from the latest choice point
    ///
    /// After exhaustion every further call keeps returning
    /// `NoMoreSolutions`.
    pub fn next_solution(&mut self) -> Result<Solution, SolveError> {
        if self.exhausted {
            return Err(SolveError::NoMoreSolutions);
        }

        let mut resume: Option<(Term, usize)> = None;
        if self.started {
            match self.pop_choice_point() {
                Some(r) => resume = Some(r),
                None => {
                    self.exhausted = true;
                    return Err(SolveError::NoMoreSolutions);
                }
            }
        }
        self.started = true;

        loop {
            self.steps += 1;
            if self.config.max_steps > 0 && self.steps > self.config.max_steps {
                self.exhausted = true;
                return Err(SolveError::StepLimit(self.config.max_steps));
            }
            if let Some(deadline) = self.config.deadline {
                if Instant::now() >= deadline {
                    self.exhausted = true;
                    return Err(SolveError::DeadlineExceeded);
                }
            }

            let (goal, from_clause) = match resume.take() {
                Some(r) => r,
                None => match self.goals.pop() {
                    Some(goal) => (goal, 0),
                    None => {
                        let solution = self.capture_solution();
                        trace!(%solution, "solution found");
                        return Ok(solution);
                    }
                },
            };

            let goal = self.bindings.walk(&goal).clone();
            let step = match goal.functor() {
                Some(("\\+", 1)) => self.solve_negation(&goal)?,
                Some((name, arity)) if builtins::is_builtin(name, arity) => {
                    match builtins::eval(&goal, &mut self.bindings) {
                        Ok(true) => Step::Continue,
                        Ok(false) => Step::Backtrack,
                        Err(err) => {
                            // Branch-local failure; resolution recovers by
                            // backtracking
                            warn!(%goal, %err, "builtin evaluation failed");
                            Step::Backtrack
                        }
                    }
                }
                Some(_) => self.resolve_against_clauses(goal, from_clause),
                None => {
                    warn!(%goal, "goal is not callable");
                    Step::Backtrack
                }
            };

            match step {
                Step::Continue => {}
                Step::Backtrack => match self.pop_choice_point() {
                    Some(r) => resume = Some(r),
                    None => {
                        self.exhausted = true;
                        return Err(SolveError::NoMoreSolutions);
                    }
                },
            }
        }
    }

    /// First-solution mode: stop after one success
    pub fn solve_first(&mut self) -> Result<Option<Solution>, SolveError> {
        match self.next_solution() {
            Ok(solution) => Ok(Some(solution)),
            Err(SolveError::NoMoreSolutions) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Find-all mode: backtrack until exhaustion
    pub fn solve_all(&mut self) -> Result<Vec<Solution>, SolveError> {
        let mut solutions = Vec::new();
        loop {
            match self.next_solution() {
                Ok(solution) => solutions.push(solution),
                Err(SolveError::NoMoreSolutions) => return Ok(solutions),
                Err(err) => return Err(err),
            }
        }
    }

    /// Iterator over remaining solutions; stops at exhaustion or error
    pub fn solutions(&mut self) -> impl Iterator<Item = Solution> + '_ {
        std::iter::from_fn(move || self.next_solution().ok())
    }

    /// Resolution steps taken so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn resolve_against_clauses(&mut self, goal: Term, from_clause: usize) -> Step {
        let (name, arity) = match goal.functor() {
            Some(f) => f,
            None => return Step::Backtrack,
        };
        let mut idx = from_clause;
        while idx < self.clauses.len() {
            let matches_functor = self.clauses[idx]
                .head
                .functor()
                .is_some_and(|(n, a)| n == name && a == arity);
            if !matches_functor {
                idx += 1;
                continue;
            }

            let mark = self.bindings.mark();
            let mut mapping = HashMap::new();
            let head = self.clauses[idx]
                .head
                .rename_apart(&mut self.counter, &mut mapping);
            if unify(&goal, &head, &mut self.bindings) {
                let body: Vec<Term> = self.clauses[idx]
                    .body
                    .iter()
                    .map(|g| g.rename_apart(&mut self.counter, &mut mapping))
                    .collect();
                // Remaining alternatives become a choice point
                self.choice_points.push(ChoicePoint {
                    goal: goal.clone(),
                    rest: self.goals.clone(),
                    next_clause: idx + 1,
                    mark,
                });
                for subgoal in body.into_iter().rev() {
                    self.goals.push(subgoal);
                }
                return Step::Continue;
            }
            // unify rolled the trail back already
            idx += 1;
        }
        Step::Backtrack
    }

    /// Negation as failure: succeed iff the inner goal has no solution
    fn solve_negation(&mut self, goal: &Term) -> Result<Step, SolveError> {
        let inner = match goal {
            Term::Struct(_, args) => self.bindings.resolve(&args[0]),
            _ => return Ok(Step::Backtrack),
        };
        if !inner.is_callable() {
            warn!(%inner, "negated goal is not callable");
            return Ok(Step::Backtrack);
        }
        let mut sub = Solver {
            clauses: self.clauses.clone(),
            goals: vec![inner],
            choice_points: Vec::new(),
            bindings: Bindings::new(),
            counter: self.counter,
            query_vars: IndexMap::new(),
            config: self.config.clone(),
            steps: 0,
            started: false,
            exhausted: false,
        };
        match sub.next_solution() {
            Ok(_) => Ok(Step::Backtrack),
            Err(SolveError::NoMoreSolutions) => Ok(Step::Continue),
            Err(err) => Err(err),
        }
    }

    fn pop_choice_point(&mut self) -> Option<(Term, usize)> {
        let cp = self.choice_points.pop()?;
        self.bindings.undo_to(cp.mark);
        self.goals = cp.rest;
        Some((cp.goal, cp.next_clause))
    }

    fn capture_solution(&self) -> Solution {
        let bindings = self
            .query_vars
            .iter()
            .filter(|(name, _)| !name.starts_with('_'))
            .map(|(name, var)| {
                (
                    name.clone(),
                    self.bindings.resolve(&Term::Var(var.clone())),
                )
            })
            .collect();
        Solution { bindings }
    }
}

enum Step {
    Continue,
    Backtrack,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn theory(src: &str) -> Theory {
        Theory::parse(src).unwrap()
    }

    fn solver(src: &str, query: &str) -> Solver {
        Solver::for_query(&theory(src), query, SolverConfig::default()).unwrap()
    }

    #[test]
    fn test_fact_query() {
        let mut s = solver("edge(a, b).", "edge(a, b)");
        let solution = s.next_solution().unwrap();
        assert!(solution.is_empty());
        assert_eq!(s.next_solution(), Err(SolveError::NoMoreSolutions));
    }

    #[test]
    fn test_fact_query_fails() {
        let mut s = solver("edge(a, b).", "edge(b, a)");
        assert_eq!(s.next_solution(), Err(SolveError::NoMoreSolutions));
    }

    #[test]
    fn test_variable_binding() {
        let mut s = solver("edge(a, b).", "edge(a, X)");
        let solution = s.next_solution().unwrap();
        assert_eq!(solution.var_value("X"), Some(&Term::atom("b")));
    }

    #[test]
    fn test_solutions_in_clause_order() {
        let mut s = solver("n(1). n(2). n(3).", "n(X)");
        let all = s.solve_all().unwrap();
        let values: Vec<_> = all.iter().map(|s| s.var_value("X").unwrap().clone()).collect();
        assert_eq!(values, vec![Term::int(1), Term::int(2), Term::int(3)]);
    }

    #[test]
    fn test_exhaustion_is_sticky() {
        let mut s = solver("n(1).", "n(X)");
        assert!(s.next_solution().is_ok());
        assert_eq!(s.next_solution(), Err(SolveError::NoMoreSolutions));
        assert_eq!(s.next_solution(), Err(SolveError::NoMoreSolutions));
    }

    #[test]
    fn test_rule_chaining() {
        let src = r#"
            parent(tom, bob).
            parent(bob, ann).
            grandparent(X, Z) :- parent(X, Y), parent(Y, Z).
        "#;
        let mut s = solver(src, "grandparent(tom, Who)");
        let solution = s.next_solution().unwrap();
        assert_eq!(solution.var_value("Who"), Some(&Term::atom("ann")));
        assert_eq!(s.next_solution(), Err(SolveError::NoMoreSolutions));
    }

    #[test]
    fn test_backtracking_across_conjunction() {
        let src = r#"
            p(1). p(2).
            q(2). q(3).
        "#;
        let mut s = solver(src, "p(X), q(X)");
        let all = s.solve_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].var_value("X"), Some(&Term::int(2)));
    }

    #[test]
    fn test_recursive_path_enumeration() {
        let src = r#"
            edge(a, b). edge(b, c). edge(a, c).
            path(X, Y, [X, Y]) :- edge(X, Y).
            path(X, Z, [X|T]) :- edge(X, Y), path(Y, Z, T).
        "#;
        let mut s = solver(src, "path(a, c, T)");
        let all = s.solve_all().unwrap();
        // a->c directly and a->b->c
        assert_eq!(all.len(), 2);
        let paths: Vec<String> = all
            .iter()
            .map(|s| s.var_value("T").unwrap().to_string())
            .collect();
        assert!(paths.contains(&"[a, c]".to_string()));
        assert!(paths.contains(&"[a, b, c]".to_string()));
    }

    #[test]
    fn test_first_vs_all() {
        let src = "n(1). n(2). n(3).";
        let mut s = solver(src, "n(X)");
        assert!(s.solve_first().unwrap().is_some());

        let mut s = solver(src, "n(X)");
        assert_eq!(s.solve_all().unwrap().len(), 3);
    }

    #[test]
    fn test_library_member() {
        let mut s = solver("", "member(X, [a, b, c])");
        let all = s.solve_all().unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].var_value("X"), Some(&Term::atom("a")));
    }

    #[test]
    fn test_library_append() {
        let mut s = solver("", "append([a], [b, c], L)");
        let solution = s.next_solution().unwrap();
        assert_eq!(
            solution.var_value("L").unwrap().to_string(),
            "[a, b, c]"
        );
    }

    #[test]
    fn test_library_last() {
        let mut s = solver("", "last([a, b, c], X)");
        let solution = s.next_solution().unwrap();
        assert_eq!(solution.var_value("X"), Some(&Term::atom("c")));
    }

    #[test]
    fn test_negation_as_failure() {
        let src = "blocked(b). ok(X) :- node(X), \\+ blocked(X). node(a). node(b).";
        let mut s = solver(src, "ok(X)");
        let all = s.solve_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].var_value("X"), Some(&Term::atom("a")));
    }

    #[test]
    fn test_arithmetic_in_rules() {
        let src = "double(X, Y) :- Y is X * 2.";
        let mut s = solver(src, "double(21, Y)");
        let solution = s.next_solution().unwrap();
        assert_eq!(solution.var_value("Y"), Some(&Term::int(42)));
    }

    #[test]
    fn test_builtin_error_fails_branch_only() {
        // First clause hits an arithmetic type error; the engine must
        // recover and find the second clause's solution
        let src = r#"
            p(X) :- X is foo + 1.
            p(ok).
        "#;
        let mut s = solver(src, "p(X)");
        let all = s.solve_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].var_value("X"), Some(&Term::atom("ok")));
    }

    #[test]
    fn test_step_limit() {
        let config = SolverConfig {
            max_steps: 100,
            deadline: None,
        };
        let t = theory("loop :- loop.");
        let mut s = Solver::for_query(&t, "loop", config).unwrap();
        assert_eq!(s.next_solution(), Err(SolveError::StepLimit(100)));
        assert_eq!(s.next_solution(), Err(SolveError::NoMoreSolutions));
    }

    #[test]
    fn test_deadline() {
        let config = SolverConfig {
            max_steps: 0,
            deadline: Some(Instant::now() - Duration::from_millis(1)),
        };
        let t = theory("loop :- loop.");
        let mut s = Solver::for_query(&t, "loop", config).unwrap();
        assert_eq!(s.next_solution(), Err(SolveError::DeadlineExceeded));
    }

    #[test]
    fn test_malformed_goal() {
        let t = theory("edge(a, b).");
        let err = Solver::for_query(&t, "edge(a,", SolverConfig::default());
        assert!(matches!(err, Err(SolveError::MalformedGoal(_))));
    }

    #[test]
    fn test_shared_variables_across_goals() {
        let src = "entrynode(a). stmt(b). edge(a, b).";
        let mut s = solver(src, "entrynode(X), edge(X, Y), stmt(Y)");
        let solution = s.next_solution().unwrap();
        assert_eq!(solution.var_value("X"), Some(&Term::atom("a")));
        assert_eq!(solution.var_value("Y"), Some(&Term::atom("b")));
    }

    #[test]
    fn test_solutions_iterator() {
        let mut s = solver("n(1). n(2).", "n(X)");
        assert_eq!(s.solutions().count(), 2);
    }

    #[test]
    fn test_clause_variables_renamed_apart() {
        // Same variable names in different clauses must not interfere
        let src = "p(X) :- q(X). q(X) :- r(X). r(1).";
        let mut s = solver(src, "p(X)");
        let solution = s.next_solution().unwrap();
        assert_eq!(solution.var_value("X"), Some(&Term::int(1)));
    }
}
