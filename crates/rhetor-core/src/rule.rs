//! Rules: named, prioritized, defeasible implications.
//!
//! A rule concludes its head whenever its body is satisfied by the current
//! fact set, *unless* a higher-priority rule concludes the complement.
//! Priority is two-layered:
//!
//! - `RuleKind`: ordinary (user-authored) rules always outrank system
//!   defaults synthesized from constraints, whatever their salience.
//! - `salience`: an explicit integer; greater salience outranks within a
//!   kind.
//!
//! Equal kind and equal salience is a *tie*. Ties are resolved
//! first-to-derive-wins: the conflict resolver lets the incumbent
//! conclusion stand. Among rules whose bodies are satisfied in the same
//! round this coincides with declaration order, because the knowledge base
//! evaluates rules in (kind, salience desc, declaration order); a tied rule
//! whose body only becomes satisfiable in a later round loses to the
//! already-held conclusion regardless of where it was declared. Both cases
//! are pinned by tests in `engine.rs`; this is a fixed behavior, not an
//! accident of iteration order.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::literal::Literal;

/// Display prefix for synthesized default-rule names. A display convention
/// only: code discriminates on [`RuleKind`], never on the name.
pub const DEFAULT_RULE_PREFIX: &str = "$default_";

/// Ordinary user-authored rule, or a system default synthesized from a
/// constraint declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Ordinary,
    Default,
}

impl RuleKind {
    /// Rank within the priority order; ordinary rules occupy the higher band.
    fn rank(self) -> u8 {
        match self {
            RuleKind::Ordinary => 1,
            RuleKind::Default => 0,
        }
    }
}

/// A compiled rule inside a knowledge base.
///
/// `index` is the declaration position assigned by
/// [`KnowledgeBase::compile`](crate::knowledge_base::KnowledgeBase::compile);
/// it orders evaluation and breaks priority ties, and takes no part in
/// *strict* outranking.
#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    pub name: String,
    pub kind: RuleKind,
    pub salience: i32,
    pub index: usize,
    pub body: Vec<Literal>,
    pub head: Literal,
}

impl Rule {
    /// Priority key for strict comparisons: kind band, then salience.
    /// Declaration order is deliberately absent: equal keys tie.
    pub fn priority(&self) -> (u8, i32) {
        (self.kind.rank(), self.salience)
    }

    /// Strict outranking: true iff this rule's conclusion prevails over
    /// `other`'s in a head-on conflict.
    pub fn outranks(&self, other: &Rule) -> bool {
        self.priority() > other.priority()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} :: ", self.name)?;
        for (i, lit) in self.body.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{lit}")?;
        }
        if self.body.is_empty() {
            f.write_str("true")?;
        }
        write!(f, " implies {}", self.head)
    }
}

/// An uncompiled rule as produced by the parser collaborator or a JSON
/// knowledge-base document. Kind and declaration index are assigned during
/// compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    #[serde(default)]
    pub salience: i32,
    #[serde(default)]
    pub body: Vec<Literal>,
    pub head: Literal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Term;

    fn rule(kind: RuleKind, salience: i32, index: usize) -> Rule {
        Rule {
            name: format!("r{index}"),
            kind,
            salience,
            index,
            body: vec![Literal::prop("a")],
            head: Literal::prop("b"),
        }
    }

    #[test]
    fn ordinary_outranks_default_regardless_of_salience() {
        let user = rule(RuleKind::Ordinary, -10, 0);
        let system = rule(RuleKind::Default, 100, 1);
        assert!(user.outranks(&system));
        assert!(!system.outranks(&user));
    }

    #[test]
    fn salience_orders_within_a_kind() {
        let low = rule(RuleKind::Ordinary, 0, 0);
        let high = rule(RuleKind::Ordinary, 5, 1);
        assert!(high.outranks(&low));
        assert!(!low.outranks(&high));
    }

    #[test]
    fn equal_kind_and_salience_is_a_tie_not_an_order() {
        let first = rule(RuleKind::Ordinary, 2, 0);
        let second = rule(RuleKind::Ordinary, 2, 1);
        assert!(!first.outranks(&second));
        assert!(!second.outranks(&first));
    }

    #[test]
    fn display_reads_like_the_surface_syntax() {
        let r = Rule {
            name: "R2".to_string(),
            kind: RuleKind::Ordinary,
            salience: 0,
            index: 1,
            body: vec![Literal::positive("penguin", vec![Term::var("X")])],
            head: Literal::negative("flies", vec![Term::var("X")]),
        };
        assert_eq!(r.to_string(), "R2 :: penguin(X) implies -flies(X)");
    }
}
