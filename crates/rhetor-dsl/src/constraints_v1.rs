//! `constraints_v1`: mutual-exclusion constraint files.
//!
//! One constraint per line, two ground literals separated by `><` (`#`
//! starts a comment, as in `rules_v1`):
//!
//! ```text
//! healthy >< -healthy ;
//! flies(tweety) >< grounded(tweety) ;
//! ```
//!
//! Constraint literals must be ground: the closed-world defaults the core
//! synthesizes from them assert concrete complements.
//!
//! Callers that can tolerate missing or malformed constraint input use
//! [`constraints_or_empty`], the documented degraded mode: parsing trouble
//! yields an empty constraint set *plus* the error, so correctness-critical
//! callers can still detect that constraints were dropped.

use nom::{
    bytes::complete::tag,
    character::complete::{char as pchar, multispace0},
    combinator::all_consuming,
    sequence::{delimited, preceded},
};
use thiserror::Error;

use rhetor_core::Constraint;

use crate::rules_v1::{literal, strip_comment};

#[derive(Debug, Error)]
pub enum ConstraintsV1ParseError {
    #[error("parse error on line {line}: {message}")]
    Line { line: usize, message: String },
}

/// Parse a constraint file. Fails on the first malformed line.
pub fn parse_constraints_v1(text: &str) -> Result<Vec<Constraint>, ConstraintsV1ParseError> {
    let mut constraints = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }
        let constraint =
            parse_constraint_line(line).map_err(|message| ConstraintsV1ParseError::Line {
                line: line_no,
                message,
            })?;
        constraints.push(constraint);
    }
    Ok(constraints)
}

/// Parse one `left >< right ;` line.
pub fn parse_constraint_line(line: &str) -> Result<Constraint, String> {
    type NomErr<'a> = nom::Err<nom::error::Error<&'a str>>;

    let (rest, left) = preceded(multispace0, literal)(line)
        .map_err(|_: NomErr| "malformed left literal".to_string())?;
    let (rest, _) = preceded(multispace0, tag("><"))(rest)
        .map_err(|_: NomErr| "expected `><` between the constrained literals".to_string())?;
    let (rest, right) = preceded(multispace0, literal)(rest)
        .map_err(|_: NomErr| "malformed right literal".to_string())?;
    let (_, _) = all_consuming(delimited(multispace0, pchar(';'), multispace0))(rest)
        .map_err(|_: NomErr| "expected terminating `;`".to_string())?;

    if !left.is_ground() || !right.is_ground() {
        return Err(format!("constraint literals must be ground: {left} >< {right}"));
    }
    Ok(Constraint { left, right })
}

/// Degraded-mode loading: malformed or absent constraint text yields an
/// empty constraint set instead of failing inference. The error (if any)
/// rides along so callers can still detect that constraints were dropped.
pub fn constraints_or_empty(
    text: Option<&str>,
) -> (Vec<Constraint>, Option<ConstraintsV1ParseError>) {
    match text {
        None => (Vec::new(), None),
        Some(text) => match parse_constraints_v1(text) {
            Ok(constraints) => (constraints, None),
            Err(error) => (Vec::new(), Some(error)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_propositional_and_applied_constraints() {
        let text = "healthy >< -healthy ;\nflies(tweety) >< grounded(tweety) ;\n";
        let constraints = parse_constraints_v1(text).expect("parse constraints_v1");
        assert_eq!(constraints.len(), 2);
        assert_eq!(constraints[0].left.to_string(), "healthy");
        assert_eq!(constraints[0].right.to_string(), "-healthy");
        assert_eq!(constraints[1].right.to_string(), "grounded(tweety)");
    }

    #[test]
    fn non_ground_constraints_are_line_errors() {
        let err = parse_constraints_v1("flies(X) >< -flies(X) ;").expect_err("must fail");
        let ConstraintsV1ParseError::Line { line, message } = err;
        assert_eq!(line, 1);
        assert!(message.contains("ground"), "unexpected message: {message}");
    }

    #[test]
    fn fallback_degrades_to_empty_but_reports() {
        let (constraints, error) = constraints_or_empty(Some("not a constraint"));
        assert!(constraints.is_empty());
        assert!(error.is_some());

        let (constraints, error) = constraints_or_empty(None);
        assert!(constraints.is_empty());
        assert!(error.is_none());

        let (constraints, error) = constraints_or_empty(Some("a >< -a ;"));
        assert_eq!(constraints.len(), 1);
        assert!(error.is_none());
    }
}
