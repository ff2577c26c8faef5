//! Rule-language parser
//!
//! Parses the declarative policy/route language: facts and rules in
//! `head :- goal, goal.` clause syntax, with atoms, variables, integers,
//! compound terms, lists, and a small operator table (unification,
//! comparison, arithmetic, negation as failure).
//!
//! Comments: `% to end of line` and `/* block */`.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1},
    combinator::{map, opt, recognize},
    multi::{separated_list0, separated_list1},
    sequence::{pair, preceded},
    IResult,
};

use crate::term::{Term, Variable};
use crate::theory::Clause;

/// Parser error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("Invalid clause at position {position}: {message}")]
    InvalidClause { position: usize, message: String },

    #[error("Unexpected end of input")]
    UnexpectedEof,
}

impl ParseError {
    fn syntax(source: &str, remaining: &str, message: impl Into<String>) -> Self {
        ParseError::Syntax {
            position: source.len() - remaining.len(),
            message: message.into(),
        }
    }

    fn invalid_clause(source: &str, remaining: &str, message: impl Into<String>) -> Self {
        ParseError::InvalidClause {
            position: source.len() - remaining.len(),
            message: message.into(),
        }
    }
}

/// Parse a complete rule-language document into clauses
pub fn parse_program(source: &str) -> Result<Vec<Clause>, ParseError> {
    let mut clauses = Vec::new();
    let mut input = skip_ws(source)?;
    let mut anon_counter: u64 = 0;
    while !input.is_empty() {
        let clause_start = input;
        let (rest, (head, body)) = clause(input).map_err(|e| to_parse_error(source, e))?;
        let head = freshen_anonymous(head, &mut anon_counter);
        let body: Vec<Term> = body
            .into_iter()
            .map(|g| freshen_anonymous(g, &mut anon_counter))
            .collect();
        if !head.is_callable() {
            return Err(ParseError::invalid_clause(
                source,
                clause_start,
                format!("clause head must be an atom or structure, got `{}`", head),
            ));
        }
        for goal in &body {
            if !goal.is_callable() {
                return Err(ParseError::invalid_clause(
                    source,
                    clause_start,
                    format!("body goal must be an atom or structure, got `{}`", goal),
                ));
            }
        }
        clauses.push(Clause::new(head, body));
        input = skip_ws(rest)?;
    }
    Ok(clauses)
}

/// Parse a query: a conjunction of goals, with an optional trailing period
pub fn parse_query(source: &str) -> Result<Vec<Term>, ParseError> {
    let input = skip_ws(source)?;
    if input.is_empty() {
        return Err(ParseError::UnexpectedEof);
    }
    let (rest, goals) =
        separated_list1(list_sep, goal_term)(input).map_err(|e| to_parse_error(source, e))?;
    let rest = opt_period(rest);
    let rest = skip_ws(rest)?;
    if !rest.is_empty() {
        return Err(ParseError::syntax(source, rest, "unexpected trailing input"));
    }
    let mut anon_counter = 0;
    let goals: Vec<Term> = goals
        .into_iter()
        .map(|g| freshen_anonymous(g, &mut anon_counter))
        .collect();
    for goal in &goals {
        if !goal.is_callable() {
            return Err(ParseError::InvalidClause {
                position: 0,
                message: format!("query goal must be an atom or structure, got `{}`", goal),
            });
        }
    }
    Ok(goals)
}

/// Parse a single term (used by tests and tooling)
pub fn parse_term(source: &str) -> Result<Term, ParseError> {
    let input = skip_ws(source)?;
    if input.is_empty() {
        return Err(ParseError::UnexpectedEof);
    }
    let (rest, term) = goal_term(input).map_err(|e| to_parse_error(source, e))?;
    let rest = skip_ws(rest)?;
    if !rest.is_empty() {
        return Err(ParseError::syntax(source, rest, "unexpected trailing input"));
    }
    let mut anon_counter = 0;
    Ok(freshen_anonymous(term, &mut anon_counter))
}

fn to_parse_error(source: &str, err: nom::Err<nom::error::Error<&str>>) -> ParseError {
    match err {
        nom::Err::Incomplete(_) => ParseError::UnexpectedEof,
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            if e.input.is_empty() {
                ParseError::UnexpectedEof
            } else {
                let snippet: String = e.input.chars().take(20).collect();
                ParseError::syntax(source, e.input, format!("unexpected input near `{}`", snippet))
            }
        }
    }
}

// ============================================================================
// Whitespace and comments
// ============================================================================

fn skip_ws(source: &str) -> Result<&str, ParseError> {
    let mut input = source;
    loop {
        let trimmed = input.trim_start();
        if let Some(rest) = trimmed.strip_prefix('%') {
            input = match rest.find('\n') {
                Some(i) => &rest[i + 1..],
                None => "",
            };
        } else if let Some(rest) = trimmed.strip_prefix("/*") {
            input = match rest.find("*/") {
                Some(i) => &rest[i + 2..],
                None => return Err(ParseError::UnexpectedEof),
            };
        } else {
            return Ok(trimmed);
        }
    }
}

/// Combinator-friendly whitespace/comment skipper
fn ws(input: &str) -> IResult<&str, ()> {
    match skip_ws(input) {
        Ok(rest) => Ok((rest, ())),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::TakeUntil,
        ))),
    }
}

fn list_sep(input: &str) -> IResult<&str, ()> {
    let (input, _) = ws(input)?;
    let (input, _) = char(',')(input)?;
    ws(input)
}

fn opt_period(input: &str) -> &str {
    let trimmed = input.trim_start();
    trimmed.strip_prefix('.').unwrap_or(input)
}

// ============================================================================
// Clauses
// ============================================================================

fn clause(input: &str) -> IResult<&str, (Term, Vec<Term>)> {
    let (input, head) = goal_term(input)?;
    let (input, _) = ws(input)?;
    let (input, body) = opt(preceded(pair(tag(":-"), ws), conjunction))(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char('.')(input)?;
    Ok((input, (head, body.unwrap_or_default())))
}

fn conjunction(input: &str) -> IResult<&str, Vec<Term>> {
    separated_list1(list_sep, goal_term)(input)
}

// ============================================================================
// Terms (precedence climbing over a fixed operator table)
// ============================================================================

/// A term in goal or argument position: prefix negation or an infix chain
fn goal_term(input: &str) -> IResult<&str, Term> {
    alt((negation, infix_term))(input)
}

fn negation(input: &str) -> IResult<&str, Term> {
    let (input, _) = tag("\\+")(input)?;
    let (input, _) = ws(input)?;
    let (input, inner) = goal_term(input)?;
    Ok((input, Term::Struct("\\+".to_string(), vec![inner])))
}

/// Precedence 700: non-associative comparison/unification operators
fn infix_term(input: &str) -> IResult<&str, Term> {
    let (input, left) = additive(input)?;
    let (rest, _) = ws(input)?;
    if let Ok((rest, op)) = infix_op(rest) {
        let (rest, _) = ws(rest)?;
        let (rest, right) = additive(rest)?;
        Ok((rest, Term::Struct(op.to_string(), vec![left, right])))
    } else {
        Ok((input, left))
    }
}

fn infix_op(input: &str) -> IResult<&str, &str> {
    alt((
        tag("=:="),
        tag("=\\="),
        tag("=<"),
        tag(">="),
        tag("=="),
        tag("\\=="),
        tag("\\="),
        tag("<"),
        tag(">"),
        tag("="),
        word_op("is"),
    ))(input)
}

/// Precedence 500: left-associative `+` and `-`
fn additive(input: &str) -> IResult<&str, Term> {
    let (mut input, mut acc) = multiplicative(input)?;
    loop {
        let (rest, _) = ws(input)?;
        let op = alt((tag::<_, _, nom::error::Error<&str>>("+"), tag("-")))(rest);
        match op {
            Ok((rest, op)) => {
                let (rest, _) = ws(rest)?;
                let (rest, right) = multiplicative(rest)?;
                acc = Term::Struct(op.to_string(), vec![acc, right]);
                input = rest;
            }
            Err(_) => return Ok((input, acc)),
        }
    }
}

/// Precedence 400: left-associative `*`, `//`, `mod`
fn multiplicative(input: &str) -> IResult<&str, Term> {
    let (mut input, mut acc) = primary(input)?;
    loop {
        let (rest, _) = ws(input)?;
        let op = alt((
            tag::<_, _, nom::error::Error<&str>>("*"),
            tag("//"),
            word_op("mod"),
        ))(rest);
        match op {
            Ok((rest, op)) => {
                let (rest, _) = ws(rest)?;
                let (rest, right) = primary(rest)?;
                acc = Term::Struct(op.to_string(), vec![acc, right]);
                input = rest;
            }
            Err(_) => return Ok((input, acc)),
        }
    }
}

/// Word operators need a boundary so `is` does not swallow `island`
fn word_op(word: &'static str) -> impl Fn(&str) -> IResult<&str, &str> {
    move |input: &str| {
        let (rest, matched) = tag(word)(input)?;
        match rest.chars().next() {
            Some(c) if c.is_ascii_alphanumeric() || c == '_' => Err(nom::Err::Error(
                nom::error::Error::new(input, nom::error::ErrorKind::Tag),
            )),
            _ => Ok((rest, matched)),
        }
    }
}

fn primary(input: &str) -> IResult<&str, Term> {
    alt((integer, variable, list, parenthesized, atom_or_struct))(input)
}

fn parenthesized(input: &str) -> IResult<&str, Term> {
    let (input, _) = char('(')(input)?;
    let (input, _) = ws(input)?;
    let (input, term) = goal_term(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char(')')(input)?;
    Ok((input, term))
}

fn integer(input: &str) -> IResult<&str, Term> {
    let (rest, text) = recognize(pair(opt(char('-')), digit1))(input)?;
    match text.parse::<i64>() {
        Ok(n) => Ok((rest, Term::Int(n))),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        ))),
    }
}

fn variable(input: &str) -> IResult<&str, Term> {
    let (rest, name) = recognize(pair(
        take_while1(|c: char| c.is_ascii_uppercase() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)?;
    Ok((rest, Term::Var(Variable::new(name))))
}

fn list(input: &str) -> IResult<&str, Term> {
    let (input, _) = char('[')(input)?;
    let (input, _) = ws(input)?;
    let (input, elements) = separated_list0(list_sep, goal_term)(input)?;
    let (input, _) = ws(input)?;
    let (input, tail) = opt(preceded(pair(char('|'), ws), goal_term))(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char(']')(input)?;
    let term = match tail {
        Some(tail) => Term::list_with_tail(elements, tail),
        None => Term::list(elements),
    };
    Ok((input, term))
}

fn atom_or_struct(input: &str) -> IResult<&str, Term> {
    let (input, name) = atom_name(input)?;
    // No whitespace allowed between functor and opening parenthesis
    if let Some(rest) = input.strip_prefix('(') {
        let (rest, _) = ws(rest)?;
        let (rest, args) = separated_list1(list_sep, goal_term)(rest)?;
        let (rest, _) = ws(rest)?;
        let (rest, _) = char(')')(rest)?;
        Ok((rest, Term::Struct(name, args)))
    } else {
        Ok((input, Term::Atom(name)))
    }
}

fn atom_name(input: &str) -> IResult<&str, String> {
    alt((quoted_atom, map(plain_atom, str::to_string)))(input)
}

fn plain_atom(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_lowercase()),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn quoted_atom(input: &str) -> IResult<&str, String> {
    let (mut rest, _) = char('\'')(input)?;
    let mut name = String::new();
    loop {
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, '\'')) => return Ok((&rest[1..], name)),
            Some((_, '\\')) => match chars.next() {
                Some((i, c @ ('\'' | '\\'))) => {
                    name.push(c);
                    rest = &rest[i + c.len_utf8()..];
                }
                _ => {
                    return Err(nom::Err::Error(nom::error::Error::new(
                        rest,
                        nom::error::ErrorKind::Escaped,
                    )))
                }
            },
            Some((i, c)) => {
                name.push(c);
                rest = &rest[i + c.len_utf8()..];
            }
            None => {
                return Err(nom::Err::Error(nom::error::Error::new(
                    rest,
                    nom::error::ErrorKind::Char,
                )))
            }
        }
    }
}

/// Give each occurrence of `_` a distinct name, so anonymous variables
/// place no co-reference constraint
fn freshen_anonymous(term: Term, counter: &mut u64) -> Term {
    match term {
        Term::Var(v) if v.name == "_" => {
            *counter += 1;
            Term::var(&format!("_G{}", counter))
        }
        Term::Struct(f, args) => Term::Struct(
            f,
            args.into_iter()
                .map(|a| freshen_anonymous(a, counter))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fact() {
        let clauses = parse_program("edge(a, b).").unwrap();
        assert_eq!(clauses.len(), 1);
        assert_eq!(
            clauses[0].head,
            Term::structure("edge", vec![Term::atom("a"), Term::atom("b")])
        );
        assert!(clauses[0].body.is_empty());
    }

    #[test]
    fn test_parse_rule() {
        let clauses =
            parse_program("path(X, Y, [X, Y]) :- edge(X, Y), stmt(Y).").unwrap();
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].body.len(), 2);
        assert_eq!(clauses[0].head.functor(), Some(("path", 3)));
    }

    #[test]
    fn test_parse_multiple_clauses_with_comments() {
        let src = r#"
            % the route graph
            entrynode(a).
            stmt(b). /* inline */
            edge(a, b).
        "#;
        let clauses = parse_program(src).unwrap();
        assert_eq!(clauses.len(), 3);
    }

    #[test]
    fn test_parse_list_terms() {
        let t = parse_term("[a, b | T]").unwrap();
        let (elements, tail) = t.as_list().unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(tail, Some(&Term::var("T")));

        let t = parse_term("[]").unwrap();
        assert!(t.is_nil());
    }

    #[test]
    fn test_parse_operators() {
        let t = parse_term("X is 1+2*3").unwrap();
        assert_eq!(
            t,
            Term::structure(
                "is",
                vec![
                    Term::var("X"),
                    Term::structure(
                        "+",
                        vec![
                            Term::int(1),
                            Term::structure("*", vec![Term::int(2), Term::int(3)])
                        ]
                    )
                ]
            )
        );
    }

    #[test]
    fn test_parse_parenthesized_arithmetic() {
        let t = parse_term("X is (1+2)*3").unwrap();
        assert_eq!(
            t,
            Term::structure(
                "is",
                vec![
                    Term::var("X"),
                    Term::structure(
                        "*",
                        vec![
                            Term::structure("+", vec![Term::int(1), Term::int(2)]),
                            Term::int(3)
                        ]
                    )
                ]
            )
        );
    }

    #[test]
    fn test_parse_negation() {
        let t = parse_term("\\+ forbidden(X)").unwrap();
        assert_eq!(t.functor(), Some(("\\+", 1)));
    }

    #[test]
    fn test_parse_quoted_atom() {
        let t = parse_term("'Hello world'").unwrap();
        assert_eq!(t, Term::atom("Hello world"));

        let t = parse_term(r"'it\'s'").unwrap();
        assert_eq!(t, Term::atom("it's"));
    }

    #[test]
    fn test_parse_query() {
        let goals = parse_query("entrynode(X), stmt(Y), path(X, Y, T).").unwrap();
        assert_eq!(goals.len(), 3);
        assert_eq!(goals[2].functor(), Some(("path", 3)));
    }

    #[test]
    fn test_anonymous_variables_distinct() {
        let clauses = parse_program("p(_, _).").unwrap();
        let vars = clauses[0].head.variables();
        assert_eq!(vars.len(), 2);
        assert_ne!(vars[0].name, vars[1].name);
    }

    #[test]
    fn test_syntax_error_has_position() {
        let err = parse_program("edge(a, b). foo(").unwrap_err();
        match err {
            ParseError::Syntax { position, .. } => assert!(position >= 12),
            ParseError::UnexpectedEof => {}
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_missing_period_is_error() {
        assert!(parse_program("edge(a, b)").is_err());
    }

    #[test]
    fn test_integer_head_rejected() {
        let err = parse_program("42.").unwrap_err();
        assert!(matches!(err, ParseError::InvalidClause { .. }));
    }

    #[test]
    fn test_variable_goal_rejected() {
        let err = parse_program("p(X) :- X.").unwrap_err();
        assert!(matches!(err, ParseError::InvalidClause { .. }));
    }

    #[test]
    fn test_negative_integer() {
        let t = parse_term("p(-3)").unwrap();
        assert_eq!(t, Term::structure("p", vec![Term::int(-3)]));
    }

    #[test]
    fn test_unterminated_block_comment() {
        assert!(matches!(
            parse_program("edge(a, b). /* oops"),
            Err(ParseError::UnexpectedEof)
        ));
    }
}
