//! Literals: predicate applications with polarity.
//!
//! A literal is the atomic unit of every fact, rule body and rule head in
//! Rhetor: a predicate name, an ordered argument list (constants or free
//! variables), and a polarity flag. Two literals are *complementary* when
//! they share predicate and arguments but disagree on polarity; the engine
//! guarantees a fact set never holds both.
//!
//! The canonical string form prefixes negative polarity with `-` and prints
//! propositional literals (no arguments) without parentheses:
//!
//! ```text
//! flies(tweety)      -flies(tweety)      fever      -healthy
//! ```
//!
//! Canonical strings key the inference graph and the fact index, so
//! `Display` here is load-bearing, not cosmetic.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::unify::Bindings;

/// One argument position of a literal: a constant symbol or a free variable.
///
/// The core discriminates purely by variant. The surface-syntax convention
/// (variables start uppercase) is enforced by the DSL crate, never by
/// inspecting the first character here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    Const(String),
    Var(String),
}

impl Term {
    pub fn constant(name: impl Into<String>) -> Self {
        Term::Const(name.into())
    }

    pub fn var(name: impl Into<String>) -> Self {
        Term::Var(name.into())
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    pub fn name(&self) -> &str {
        match self {
            Term::Const(name) | Term::Var(name) => name,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A predicate application with polarity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub predicate: String,
    #[serde(default)]
    pub args: Vec<Term>,
    #[serde(default = "default_positive")]
    pub positive: bool,
}

fn default_positive() -> bool {
    true
}

impl Literal {
    pub fn positive(predicate: impl Into<String>, args: Vec<Term>) -> Self {
        Literal {
            predicate: predicate.into(),
            args,
            positive: true,
        }
    }

    pub fn negative(predicate: impl Into<String>, args: Vec<Term>) -> Self {
        Literal {
            predicate: predicate.into(),
            args,
            positive: false,
        }
    }

    /// Propositional literal: no arguments, positive polarity.
    pub fn prop(predicate: impl Into<String>) -> Self {
        Literal::positive(predicate, vec![])
    }

    /// The same predicate application with flipped polarity.
    pub fn complement(&self) -> Literal {
        Literal {
            predicate: self.predicate.clone(),
            args: self.args.clone(),
            positive: !self.positive,
        }
    }

    pub fn is_complement_of(&self, other: &Literal) -> bool {
        self.positive != other.positive
            && self.predicate == other.predicate
            && self.args == other.args
    }

    /// A literal is ground when no argument is a free variable.
    pub fn is_ground(&self) -> bool {
        self.args.iter().all(|t| !t.is_var())
    }

    /// Iterate the names of the free variables, left to right.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.args.iter().filter_map(|t| match t {
            Term::Var(name) => Some(name.as_str()),
            Term::Const(_) => None,
        })
    }

    /// Substitute bound variables with their constants. Unbound variables
    /// are left in place; callers check `is_ground` on the result.
    pub fn apply(&self, bindings: &Bindings) -> Literal {
        let args = self
            .args
            .iter()
            .map(|t| match t {
                Term::Var(name) => match bindings.get(name) {
                    Some(value) => Term::Const(value.to_string()),
                    None => t.clone(),
                },
                Term::Const(_) => t.clone(),
            })
            .collect();
        Literal {
            predicate: self.predicate.clone(),
            args,
            positive: self.positive,
        }
    }

    /// Canonical string form; equal to the `Display` output.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Canonical string form of the complement, rendered directly from the
    /// canonical form rather than through a cloned literal. The canonical
    /// form starts with `-` exactly when the polarity is negative.
    pub fn complement_key(&self) -> String {
        let key = self.key();
        if self.positive {
            format!("-{key}")
        } else {
            key[1..].to_string()
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.positive {
            f.write_str("-")?;
        }
        f.write_str(&self.predicate)?;
        if !self.args.is_empty() {
            f.write_str("(")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_prefixes_negation_and_skips_empty_parens() {
        let flies = Literal::positive("flies", vec![Term::constant("tweety")]);
        assert_eq!(flies.to_string(), "flies(tweety)");
        assert_eq!(flies.complement().to_string(), "-flies(tweety)");
        // complement_key agrees with the complement's Display in both
        // polarities.
        assert_eq!(flies.complement_key(), "-flies(tweety)");
        assert_eq!(flies.complement().complement_key(), "flies(tweety)");
        assert_eq!(Literal::prop("fever").to_string(), "fever");
        assert_eq!(Literal::prop("healthy").complement().to_string(), "-healthy");
    }

    #[test]
    fn complement_matches_on_predicate_and_args_only() {
        let a = Literal::positive("p", vec![Term::constant("x")]);
        let b = Literal::negative("p", vec![Term::constant("x")]);
        let c = Literal::negative("p", vec![Term::constant("y")]);
        assert!(a.is_complement_of(&b));
        assert!(!a.is_complement_of(&c));
        assert!(!a.is_complement_of(&a));
    }

    #[test]
    fn groundness_tracks_free_variables() {
        let open = Literal::positive("bird", vec![Term::var("X")]);
        assert!(!open.is_ground());
        let mut bindings = Bindings::new();
        assert!(bindings.bind("X", "tweety"));
        assert!(open.apply(&bindings).is_ground());
        assert_eq!(open.apply(&bindings).to_string(), "bird(tweety)");
    }

    #[test]
    fn serde_round_trips_structurally() {
        let lit = Literal::negative("flies", vec![Term::constant("tweety"), Term::var("X")]);
        let json = serde_json::to_string(&lit).expect("serialize literal");
        let back: Literal = serde_json::from_str(&json).expect("deserialize literal");
        assert_eq!(lit, back);
    }
}
