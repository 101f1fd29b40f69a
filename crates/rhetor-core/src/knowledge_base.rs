//! Knowledge bases: the closed rule collection plus constraint set.
//!
//! Compilation does three jobs before the engine ever runs:
//!
//! 1. **Static validation.** A head variable not bound by a positive body
//!    conjunct, or a negative conjunct using a variable no earlier positive
//!    conjunct binds, makes a rule malformed. Malformed rules are excluded
//!    from firing and reported as [`RuleFault`]s, never fatal to the rest
//!    of the knowledge base.
//! 2. **Default synthesis.** Each constraint `a >< b` declares two ground
//!    literals mutually exclusive. For each constrained literal a system
//!    default rule is synthesized asserting its complement with an empty
//!    body, at the lowest priority band. Defaults implement closed-world
//!    behavior for declared constraints: they hold until any ordinary rule
//!    proves the opposite, at which point they are defeated.
//! 3. **Evaluation order.** Rules are sorted by (kind, salience desc,
//!    declaration order) once, so every round walks them in the same fixed,
//!    reproducible order.
//!
//! The compiled knowledge base is immutable and `Sync`: independent
//! inference calls may share it by reference across threads.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::literal::Literal;
use crate::rule::{Rule, RuleKind, RuleSpec, DEFAULT_RULE_PREFIX};

/// Two ground literals declared mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub left: Literal,
    pub right: Literal,
}

/// A rule or input the compiler rejected. Faults are structured outcomes
/// reported to the caller, not process failures: the offending rule (or
/// constraint, or context literal) is skipped and inference proceeds.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "fault", rename_all = "snake_case")]
pub enum RuleFault {
    #[error("rule {rule}: head variable {variable} is not bound by any positive body literal")]
    UnboundHeadVariable { rule: String, variable: String },
    #[error(
        "rule {rule}: negative body literal {literal} uses variable {variable} \
         before any positive literal binds it"
    )]
    UnboundNegationVariable {
        rule: String,
        literal: String,
        variable: String,
    },
    #[error("constraint {left} >< {right} must be ground")]
    NonGroundConstraint { left: String, right: String },
    #[error("context literal {literal} is not ground")]
    NonGroundFact { literal: String },
}

/// An uncompiled knowledge base as read from a JSON document or built by
/// the DSL parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseSpec {
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

/// The compiled, immutable rule collection the engine runs against.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    rules: Vec<Rule>,
    constraints: Vec<Constraint>,
    /// Rule indices in evaluation order: ordinary before default, then
    /// salience descending, then declaration order.
    firing_order: Vec<usize>,
}

impl KnowledgeBase {
    /// Compile a spec: validate rules, synthesize constraint defaults, fix
    /// the evaluation order. Rejected inputs come back as faults alongside
    /// the (still usable) knowledge base.
    pub fn compile(spec: KnowledgeBaseSpec) -> (KnowledgeBase, Vec<RuleFault>) {
        let mut faults = Vec::new();
        let mut rules = Vec::new();

        for rule_spec in spec.rules {
            match validate_rule(&rule_spec) {
                Some(fault) => faults.push(fault),
                None => {
                    let index = rules.len();
                    rules.push(Rule {
                        name: rule_spec.name,
                        kind: RuleKind::Ordinary,
                        salience: rule_spec.salience,
                        index,
                        body: rule_spec.body,
                        head: rule_spec.head,
                    });
                }
            }
        }

        let mut constraints = Vec::new();
        let mut default_heads: HashSet<String> = HashSet::new();
        for constraint in spec.constraints {
            if !constraint.left.is_ground() || !constraint.right.is_ground() {
                faults.push(RuleFault::NonGroundConstraint {
                    left: constraint.left.to_string(),
                    right: constraint.right.to_string(),
                });
                continue;
            }
            for literal in [&constraint.left, &constraint.right] {
                // One default per distinct constrained literal.
                if !default_heads.insert(literal.key()) {
                    continue;
                }
                let index = rules.len();
                rules.push(Rule {
                    name: format!("{DEFAULT_RULE_PREFIX}{literal}"),
                    kind: RuleKind::Default,
                    salience: 0,
                    index,
                    body: Vec::new(),
                    head: literal.complement(),
                });
            }
            constraints.push(constraint);
        }

        let mut firing_order: Vec<usize> = (0..rules.len()).collect();
        firing_order.sort_by_key(|&i| {
            let (kind, salience) = rules[i].priority();
            (std::cmp::Reverse(kind), std::cmp::Reverse(salience), i)
        });

        (
            KnowledgeBase {
                rules,
                constraints,
                firing_order,
            },
            faults,
        )
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, index: usize) -> &Rule {
        &self.rules[index]
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Rule indices in the fixed evaluation order.
    pub fn firing_order(&self) -> &[usize] {
        &self.firing_order
    }
}

/// Left-to-right scope check over one rule. Positive conjuncts bind their
/// variables for everything to their right (and for the head); negative
/// conjuncts and the head only consume.
fn validate_rule(spec: &RuleSpec) -> Option<RuleFault> {
    let mut bound: HashSet<&str> = HashSet::new();
    for conjunct in &spec.body {
        if conjunct.positive {
            bound.extend(conjunct.variables());
        } else {
            for variable in conjunct.variables() {
                if !bound.contains(variable) {
                    return Some(RuleFault::UnboundNegationVariable {
                        rule: spec.name.clone(),
                        literal: conjunct.to_string(),
                        variable: variable.to_string(),
                    });
                }
            }
        }
    }
    for variable in spec.head.variables() {
        if !bound.contains(variable) {
            return Some(RuleFault::UnboundHeadVariable {
                rule: spec.name.clone(),
                variable: variable.to_string(),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Term;

    fn spec(rules: Vec<RuleSpec>, constraints: Vec<Constraint>) -> KnowledgeBaseSpec {
        KnowledgeBaseSpec { rules, constraints }
    }

    #[test]
    fn malformed_head_variable_is_reported_and_excluded() {
        let bad = RuleSpec {
            name: "R1".to_string(),
            salience: 0,
            body: vec![Literal::positive("bird", vec![Term::var("X")])],
            head: Literal::positive("eats", vec![Term::var("X"), Term::var("Y")]),
        };
        let (kb, faults) = KnowledgeBase::compile(spec(vec![bad], vec![]));
        assert!(kb.rules().is_empty());
        assert_eq!(
            faults,
            vec![RuleFault::UnboundHeadVariable {
                rule: "R1".to_string(),
                variable: "Y".to_string(),
            }]
        );
    }

    #[test]
    fn negative_conjunct_must_consume_earlier_bindings() {
        let bad = RuleSpec {
            name: "R1".to_string(),
            salience: 0,
            body: vec![
                Literal::negative("flies", vec![Term::var("X")]),
                Literal::positive("bird", vec![Term::var("X")]),
            ],
            head: Literal::prop("grounded_animal"),
        };
        let (_, faults) = KnowledgeBase::compile(spec(vec![bad], vec![]));
        assert!(matches!(
            faults.as_slice(),
            [RuleFault::UnboundNegationVariable { variable, .. }] if variable == "X"
        ));
    }

    #[test]
    fn constraints_synthesize_one_default_per_distinct_literal() {
        let healthy = Literal::prop("healthy");
        let constraint = Constraint {
            left: healthy.clone(),
            right: healthy.complement(),
        };
        let (kb, faults) = KnowledgeBase::compile(spec(vec![], vec![constraint]));
        assert!(faults.is_empty());
        let defaults: Vec<&Rule> = kb.rules().iter().collect();
        assert_eq!(defaults.len(), 2);
        assert_eq!(defaults[0].name, "$default_healthy");
        assert_eq!(defaults[0].head, healthy.complement());
        assert_eq!(defaults[0].kind, RuleKind::Default);
        assert_eq!(defaults[1].name, "$default_-healthy");
        assert_eq!(defaults[1].head, healthy);
        assert!(defaults.iter().all(|r| r.body.is_empty()));
    }

    #[test]
    fn non_ground_constraints_degrade_to_a_fault() {
        let constraint = Constraint {
            left: Literal::positive("p", vec![Term::var("X")]),
            right: Literal::negative("p", vec![Term::var("X")]),
        };
        let (kb, faults) = KnowledgeBase::compile(spec(vec![], vec![constraint]));
        assert!(kb.rules().is_empty());
        assert!(kb.constraints().is_empty());
        assert!(matches!(faults.as_slice(), [RuleFault::NonGroundConstraint { .. }]));
    }

    #[test]
    fn firing_order_is_kind_then_salience_then_declaration() {
        let r = |name: &str, salience: i32| RuleSpec {
            name: name.to_string(),
            salience,
            body: vec![Literal::prop("a")],
            head: Literal::prop(name),
        };
        let constraint = Constraint {
            left: Literal::prop("c"),
            right: Literal::prop("c").complement(),
        };
        let (kb, _) = KnowledgeBase::compile(spec(
            vec![r("low", 0), r("high", 3), r("also_low", 0)],
            vec![constraint],
        ));
        let names: Vec<&str> = kb
            .firing_order()
            .iter()
            .map(|&i| kb.rule(i).name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["high", "low", "also_low", "$default_c", "$default_-c"]
        );
    }
}
