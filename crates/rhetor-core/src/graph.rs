//! Provenance: the inference graph and the defeat ledger.
//!
//! The engine records, per held literal, the ordered list of rules that
//! currently justify it, and separately every rule application that lost a
//! conflict. Both are frozen into an immutable [`InferenceResult`] when the
//! fixpoint terminates; the "genuine supporters only" and closed-world
//! views are derived read-only projections, never in-place filters of the
//! graph itself.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::knowledge_base::{KnowledgeBase, RuleFault};
use crate::literal::Literal;
use crate::rule::RuleKind;

/// One justifying rule of a held literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Supporter {
    pub rule: String,
    pub kind: RuleKind,
}

/// Canonical literal string → supporters in firing order. `BTreeMap` keys
/// make serialization byte-stable across calls.
pub type InferenceGraph = BTreeMap<String, Vec<Supporter>>;

/// What overrode a defeated rule application: a higher-priority (or
/// tie-winning) rule, or a caller-supplied context fact, which is
/// indefeasible by construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Defeater {
    Rule { name: String, kind: RuleKind },
    Context,
}

impl Defeater {
    pub fn is_default_rule(&self) -> bool {
        matches!(
            self,
            Defeater::Rule {
                kind: RuleKind::Default,
                ..
            }
        )
    }
}

/// One entry of the defeat ledger: `defeated` proposed `literal`, and `by`
/// prevailed with the complement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefeatRecord {
    pub defeated: String,
    pub defeated_kind: RuleKind,
    pub by: Defeater,
    pub literal: Literal,
}

/// The immutable outcome of one `infer` call.
#[derive(Debug, Clone, Serialize)]
pub struct InferenceResult {
    /// Held ground literals, in derivation order (context first).
    pub facts: Vec<Literal>,
    /// Justifications for every rule-derived literal.
    pub graph: InferenceGraph,
    /// Every defeated rule application, in the order conflicts resolved.
    pub defeated: Vec<DefeatRecord>,
    /// Malformed rules and inputs excluded from this call.
    pub faults: Vec<RuleFault>,
    /// Rounds until fixpoint (including the final no-change pass).
    pub rounds: usize,
}

impl InferenceResult {
    /// Graph entries restricted to ordinary supporters. Entries whose only
    /// support is a system default drop out: this is the "what did the
    /// author's rules actually conclude" view.
    pub fn genuine(&self) -> BTreeMap<&str, Vec<&Supporter>> {
        let mut view = BTreeMap::new();
        for (literal, supporters) in &self.graph {
            let ordinary: Vec<&Supporter> = supporters
                .iter()
                .filter(|s| s.kind == RuleKind::Ordinary)
                .collect();
            if !ordinary.is_empty() {
                view.insert(literal.as_str(), ordinary);
            }
        }
        view
    }

    /// Closed-world additions read off the defeat ledger: when a rule lost
    /// to a system default, the constraint machinery decided against its
    /// conclusion, so that conclusion is surfaced, unless some ordinary
    /// rule already genuinely proved its complement. This reproduces the
    /// output set downstream batch consumers expect.
    pub fn closed_world_additions(&self) -> Vec<Literal> {
        let genuine = self.genuine();
        let mut additions = Vec::new();
        let mut seen: Vec<String> = Vec::new();
        for record in &self.defeated {
            if !record.by.is_default_rule() {
                continue;
            }
            let key = record.literal.key();
            if genuine.contains_key(record.literal.complement_key().as_str()) {
                continue;
            }
            if genuine.contains_key(key.as_str()) || seen.contains(&key) {
                continue;
            }
            seen.push(key);
            additions.push(record.literal.clone());
        }
        additions
    }

    /// True iff `literal`'s canonical key is currently held.
    pub fn holds(&self, key: &str) -> bool {
        self.facts.iter().any(|l| l.key() == key)
    }
}

/// Mutable graph under construction inside the engine. Supporters are rule
/// indices into the knowledge base until the result is frozen.
#[derive(Debug, Default)]
pub(crate) struct GraphBuilder {
    entries: BTreeMap<String, Vec<usize>>,
}

impl GraphBuilder {
    pub(crate) fn new() -> Self {
        GraphBuilder::default()
    }

    pub(crate) fn supporters(&self, key: &str) -> &[usize] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn supports(&self, key: &str, rule_index: usize) -> bool {
        self.supporters(key).contains(&rule_index)
    }

    pub(crate) fn has_ordinary_support(&self, key: &str, kb: &KnowledgeBase) -> bool {
        self.supporters(key)
            .iter()
            .any(|&i| kb.rule(i).kind == RuleKind::Ordinary)
    }

    pub(crate) fn add_supporter(&mut self, key: String, rule_index: usize) {
        self.entries.entry(key).or_default().push(rule_index);
    }

    /// Revoke a literal's entry entirely, returning its former supporters.
    pub(crate) fn revoke(&mut self, key: &str) -> Vec<usize> {
        self.entries.remove(key).unwrap_or_default()
    }

    pub(crate) fn freeze(self, kb: &KnowledgeBase) -> InferenceGraph {
        self.entries
            .into_iter()
            .map(|(literal, supporters)| {
                let supporters = supporters
                    .into_iter()
                    .map(|i| {
                        let rule = kb.rule(i);
                        Supporter {
                            rule: rule.name.clone(),
                            kind: rule.kind,
                        }
                    })
                    .collect();
                (literal, supporters)
            })
            .collect()
    }
}
