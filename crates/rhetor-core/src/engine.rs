//! The forward-chaining fixpoint engine and its conflict resolver.
//!
//! [`infer`] is the single entry point: one knowledge base, one context of
//! ground facts, one immutable [`InferenceResult`] out. The call is pure
//! (no I/O, no retained state, no suspension points), so independent calls
//! may run on independent threads against a shared `&KnowledgeBase`.
//!
//! Each round walks every rule in the knowledge base's fixed evaluation
//! order (kind, salience descending, declaration order) and fires every
//! satisfied instance:
//!
//! - head not yet held and no complement held → add it, record the
//!   supporter;
//! - head already held → append the rule as a further supporter, unless it
//!   already supports it, or it is a system default and an ordinary rule
//!   already produced the literal (user rules are never co-supported by
//!   defaults);
//! - complement held → conflict resolution (below).
//!
//! The loop stops on the first full pass that changes neither the fact set
//! nor the graph nor the ledger. Rules are finite and every supporter and
//! ledger entry is recorded at most once per (rule, literal), so the loop
//! is structurally bounded; cyclic rule dependencies simply never fire.
//!
//! ## Conflict resolution
//!
//! When a firing rule proposes the complement of a held literal:
//!
//! 1. context facts are indefeasible: the firing rule is ledgered as
//!    defeated by [`Defeater::Context`];
//! 2. if the firing rule strictly outranks *every* current supporter of
//!    the opposing literal, that literal is revoked, its former supporters
//!    are ledgered with the firing rule as defeater, and the new head
//!    becomes held;
//! 3. otherwise the firing rule itself is ledgered, defeated by the
//!    highest-priority incumbent supporter;
//! 4. ties (equal kind and salience) fall to case 3: the incumbent,
//!    first-to-derive conclusion wins. Under the fixed evaluation order
//!    this is declaration order when the tied bodies are satisfied in the
//!    same round; a challenger whose body only becomes satisfiable in a
//!    later round loses to the held conclusion wherever it was declared.
//!    This convention is deliberate and tested, not an iteration accident.
//!
//! Once a literal is revoked by a strictly higher-priority rule it cannot
//! return within the call: re-deriving it re-enters case 3 against the
//! defeater.

use ahash::AHashSet;
use tracing::debug;

use crate::graph::{DefeatRecord, Defeater, GraphBuilder, InferenceResult};
use crate::knowledge_base::{KnowledgeBase, RuleFault};
use crate::literal::Literal;
use crate::rule::RuleKind;
use crate::unify::{match_body, FactSet};

/// Run the fixpoint over one (knowledge base, context) pair.
///
/// Non-ground context literals are reported as faults and skipped; they
/// never abort the call.
pub fn infer(kb: &KnowledgeBase, context: &[Literal]) -> InferenceResult {
    let mut state = Engine::new(kb);
    state.seed(context);
    state.run();
    state.freeze()
}

struct Engine<'kb> {
    kb: &'kb KnowledgeBase,
    facts: FactSet,
    graph: GraphBuilder,
    defeated: Vec<DefeatRecord>,
    faults: Vec<RuleFault>,
    /// Canonical keys of caller-supplied facts; indefeasible.
    context_keys: AHashSet<String>,
    /// (rule index, literal key) pairs already ledgered, so a defeated
    /// instance that keeps re-firing is recorded exactly once.
    ledgered: AHashSet<(usize, String)>,
    /// Rules already reported for producing a non-ground head.
    faulted_rules: AHashSet<usize>,
    rounds: usize,
}

impl<'kb> Engine<'kb> {
    fn new(kb: &'kb KnowledgeBase) -> Self {
        Engine {
            kb,
            facts: FactSet::new(),
            graph: GraphBuilder::new(),
            defeated: Vec::new(),
            faults: Vec::new(),
            context_keys: AHashSet::new(),
            ledgered: AHashSet::new(),
            faulted_rules: AHashSet::new(),
            rounds: 0,
        }
    }

    fn seed(&mut self, context: &[Literal]) {
        for literal in context {
            if !literal.is_ground() {
                self.faults.push(RuleFault::NonGroundFact {
                    literal: literal.to_string(),
                });
                continue;
            }
            if self.facts.insert(literal.clone()) {
                self.context_keys.insert(literal.key());
            }
        }
    }

    fn run(&mut self) {
        loop {
            self.rounds += 1;
            let mut changed = false;
            for &rule_index in self.kb.firing_order() {
                changed |= self.fire_rule(rule_index);
            }
            debug!(round = self.rounds, facts = self.facts.len(), changed);
            if !changed {
                break;
            }
        }
    }

    fn fire_rule(&mut self, rule_index: usize) -> bool {
        let rule = self.kb.rule(rule_index);
        let mut changed = false;
        for bindings in match_body(&rule.body, &self.facts) {
            let head = rule.head.apply(&bindings);
            if !head.is_ground() {
                // Compilation already rejects unbound head variables; this
                // is the engine-side report for anything that slips past.
                if self.faulted_rules.insert(rule_index) {
                    let variable = head
                        .variables()
                        .next()
                        .unwrap_or_default()
                        .to_string();
                    self.faults.push(RuleFault::UnboundHeadVariable {
                        rule: rule.name.clone(),
                        variable,
                    });
                }
                continue;
            }
            let key = head.key();
            if self.facts.contains_key(&key) {
                if self.graph.supports(&key, rule_index) {
                    continue;
                }
                if rule.kind == RuleKind::Default
                    && self.graph.has_ordinary_support(&key, self.kb)
                {
                    continue;
                }
                self.graph.add_supporter(key, rule_index);
                changed = true;
            } else if self.facts.contains_key(&head.complement_key()) {
                changed |= self.resolve_conflict(rule_index, head);
            } else {
                debug!(rule = %rule.name, literal = %head, "derived");
                self.graph.add_supporter(key, rule_index);
                self.facts.insert(head);
                changed = true;
            }
        }
        changed
    }

    /// The firing rule proposes `head` while `head`'s complement is held.
    /// Returns whether facts, graph or ledger changed.
    fn resolve_conflict(&mut self, rule_index: usize, head: Literal) -> bool {
        let rule = self.kb.rule(rule_index);
        let opposing = head.complement();
        let opposing_key = opposing.key();

        if self.context_keys.contains(&opposing_key) {
            return self.ledger(rule_index, head, Defeater::Context);
        }

        let supporters = self.graph.supporters(&opposing_key).to_vec();
        debug_assert!(
            !supporters.is_empty(),
            "held non-context literal {opposing_key} has no supporters"
        );

        let prevails = supporters
            .iter()
            .all(|&s| rule.outranks(self.kb.rule(s)));

        if prevails {
            debug!(
                rule = %rule.name,
                revoked = %opposing,
                "conflict: new rule outranks all supporters"
            );
            self.facts.remove(&opposing_key);
            let defeater = Defeater::Rule {
                name: rule.name.clone(),
                kind: rule.kind,
            };
            for former in self.graph.revoke(&opposing_key) {
                self.ledger(former, opposing.clone(), defeater.clone());
            }
            self.graph.add_supporter(head.key(), rule_index);
            self.facts.insert(head);
            true
        } else {
            // Highest-priority incumbent (earliest declared on ties) is
            // named as the defeater.
            let best = supporters
                .iter()
                .copied()
                .max_by_key(|&s| (self.kb.rule(s).priority(), std::cmp::Reverse(s)))
                .expect("supporters checked non-empty");
            let incumbent = self.kb.rule(best);
            debug!(
                rule = %rule.name,
                by = %incumbent.name,
                literal = %head,
                "conflict: incumbent prevails"
            );
            let defeater = Defeater::Rule {
                name: incumbent.name.clone(),
                kind: incumbent.kind,
            };
            self.ledger(rule_index, head, defeater)
        }
    }

    fn ledger(&mut self, rule_index: usize, literal: Literal, by: Defeater) -> bool {
        if !self.ledgered.insert((rule_index, literal.key())) {
            return false;
        }
        let rule = self.kb.rule(rule_index);
        self.defeated.push(DefeatRecord {
            defeated: rule.name.clone(),
            defeated_kind: rule.kind,
            by,
            literal,
        });
        true
    }

    fn freeze(self) -> InferenceResult {
        InferenceResult {
            facts: self.facts.iter().cloned().collect(),
            graph: self.graph.freeze(self.kb),
            defeated: self.defeated,
            faults: self.faults,
            rounds: self.rounds,
        }
    }
}
