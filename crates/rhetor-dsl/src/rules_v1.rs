//! `rules_v1`: the canonical rule surface syntax.
//!
//! One rule per line, `#` starts a comment, blank lines are ignored:
//!
//! ```text
//! # birds fly, penguins beg to differ
//! R1 :: bird(X) implies flies(X) ;
//! R2 [5] :: penguin(X) implies -flies(X) ;
//! ```
//!
//! - the optional `[n]` block after the name is the rule's salience
//!   (default 0);
//! - body conjuncts are comma-separated literals;
//! - a leading `-` negates a literal; identifiers starting with an
//!   uppercase letter are variables, everything else is a constant;
//! - the trailing `;` is required.
//!
//! The parser produces [`RuleSpec`]s; kind assignment, scope validation and
//! default synthesis happen in `rhetor_core::KnowledgeBase::compile`.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char as pchar, multispace0},
    combinator::{all_consuming, opt, recognize},
    multi::separated_list0,
    sequence::{delimited, pair, preceded},
    IResult,
};
use thiserror::Error;

use rhetor_core::{Literal, RuleSpec, Term};

#[derive(Debug, Error)]
pub enum RulesV1ParseError {
    #[error("parse error on line {line}: {message}")]
    Line { line: usize, message: String },
}

/// Parse a whole rule file. Fails on the first malformed line.
pub fn parse_rules_v1(text: &str) -> Result<Vec<RuleSpec>, RulesV1ParseError> {
    let mut rules = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }
        let rule = parse_rule_line(line).map_err(|message| RulesV1ParseError::Line {
            line: line_no,
            message,
        })?;
        rules.push(rule);
    }
    Ok(rules)
}

/// Parse one `name [salience] :: body implies head ;` line.
pub fn parse_rule_line(line: &str) -> Result<RuleSpec, String> {
    let (rest, name) =
        identifier(line.trim_start()).map_err(|_| "expected a rule name".to_string())?;
    let (rest, salience) = opt(preceded(multispace0, salience_block))(rest)
        .map_err(|_: NomErr| "malformed salience block".to_string())?;
    let (rest, _) = preceded(multispace0, tag("::"))(rest)
        .map_err(|_: NomErr| "expected `::` after the rule name".to_string())?;
    let (rest, body) = separated_list0(ws_comma, preceded(multispace0, literal))(rest)
        .map_err(|_: NomErr| "malformed body literal".to_string())?;
    if body.is_empty() {
        return Err("rule body must contain at least one literal".to_string());
    }
    let (rest, _) = preceded(multispace0, tag("implies"))(rest)
        .map_err(|_: NomErr| "expected `implies` between body and head".to_string())?;
    let (rest, head) = preceded(multispace0, literal)(rest)
        .map_err(|_: NomErr| "malformed head literal".to_string())?;
    let (_, _) = all_consuming(delimited(multispace0, pchar(';'), multispace0))(rest)
        .map_err(|_: NomErr| "expected terminating `;`".to_string())?;
    Ok(RuleSpec {
        name: name.to_string(),
        salience: salience.unwrap_or(0),
        body,
        head,
    })
}

/// Parse a single literal, e.g. `-flies(tweety, X)` or `fever`.
pub fn parse_literal(text: &str) -> Result<Literal, String> {
    all_consuming(delimited(multispace0, literal, multispace0))(text)
        .map(|(_, lit)| lit)
        .map_err(|_: NomErr| format!("malformed literal: {text}"))
}

pub(crate) fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(position) => &line[..position],
        None => line,
    }
}

// ============================================================================
// nom token parsers
// ============================================================================

type NomErr<'a> = nom::Err<nom::error::Error<&'a str>>;

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn ws_comma(input: &str) -> IResult<&str, char> {
    preceded(multispace0, pchar(','))(input)
}

fn salience_block(input: &str) -> IResult<&str, i32> {
    let (input, _) = pchar('[')(input)?;
    let (input, digits) = delimited(
        multispace0,
        recognize(pair(opt(pchar('-')), take_while1(|c: char| c.is_ascii_digit()))),
        multispace0,
    )(input)?;
    let (input, _) = pchar(']')(input)?;
    let value = digits.parse::<i32>().map_err(|_| {
        nom::Err::Failure(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
    })?;
    Ok((input, value))
}

/// Uppercase-initial identifiers are variables, everything else (including
/// bare numbers) is a constant.
pub(crate) fn term(input: &str) -> IResult<&str, Term> {
    alt((
        |input| {
            let (rest, name) = identifier(input)?;
            let term = if name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
                Term::var(name)
            } else {
                Term::constant(name)
            };
            Ok((rest, term))
        },
        |input| {
            let (rest, digits) = take_while1(|c: char| c.is_ascii_digit())(input)?;
            Ok((rest, Term::constant(digits)))
        },
    ))(input)
}

pub(crate) fn literal(input: &str) -> IResult<&str, Literal> {
    let (input, negation) = opt(pchar('-'))(input)?;
    let (input, predicate) = identifier(input)?;
    let (input, args) = opt(delimited(
        preceded(multispace0, pchar('(')),
        separated_list0(ws_comma, preceded(multispace0, term)),
        preceded(multispace0, pchar(')')),
    ))(input)?;
    let lit = Literal {
        predicate: predicate.to_string(),
        args: args.unwrap_or_default(),
        positive: negation.is_none(),
    };
    Ok((input, lit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_rule_file() {
        let text = r#"
            # birds fly, penguins beg to differ
            R1 :: bird(X) implies flies(X) ;
            R2 [5] :: penguin(X) implies -flies(X) ;
        "#;
        let rules = parse_rules_v1(text).expect("parse rules_v1");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].name, "R1");
        assert_eq!(rules[0].salience, 0);
        assert_eq!(rules[0].body[0].to_string(), "bird(X)");
        assert_eq!(rules[0].head.to_string(), "flies(X)");
        assert_eq!(rules[1].salience, 5);
        assert_eq!(rules[1].head.to_string(), "-flies(X)");
    }

    #[test]
    fn parses_multi_conjunct_bodies_and_propositional_literals() {
        let rule = parse_rule_line("Sick [2] :: fever, -vaccinated implies -healthy ;")
            .expect("parse rule line");
        assert_eq!(rule.body.len(), 2);
        assert_eq!(rule.body[1].to_string(), "-vaccinated");
        assert_eq!(rule.head.to_string(), "-healthy");
        assert!(rule.head.args.is_empty());
    }

    #[test]
    fn uppercase_initial_identifiers_are_variables() {
        let lit = parse_literal("eats(Tweety_junior, worm, 42)").expect("parse literal");
        assert_eq!(lit.args[0], Term::var("Tweety_junior"));
        assert_eq!(lit.args[1], Term::constant("worm"));
        assert_eq!(lit.args[2], Term::constant("42"));
    }

    #[test]
    fn negative_salience_is_accepted() {
        let rule = parse_rule_line("Weak [-3] :: a implies b ;").expect("parse rule line");
        assert_eq!(rule.salience, -3);
    }

    #[test]
    fn missing_terminator_is_a_line_error() {
        let err = parse_rules_v1("R1 :: a implies b").expect_err("must fail");
        let RulesV1ParseError::Line { line, message } = err;
        assert_eq!(line, 1);
        assert!(message.contains(";"), "unexpected message: {message}");
    }

    #[test]
    fn empty_bodies_are_rejected_in_the_surface_syntax() {
        // `implies` right after `::` gets consumed as a would-be body
        // literal, so the missing-keyword error is what surfaces.
        let err = parse_rule_line("R1 :: implies b ;").expect_err("must fail");
        assert!(err.contains("implies"), "unexpected message: {err}");
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let text = "\n# only a comment\nR1 :: a implies b ; # trailing\n\n";
        let rules = parse_rules_v1(text).expect("parse rules_v1");
        assert_eq!(rules.len(), 1);
    }
}
