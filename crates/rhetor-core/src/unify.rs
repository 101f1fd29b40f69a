//! Matching rule bodies against the derived fact set.
//!
//! The matcher answers one question per rule per round: for which variable
//! substitutions is every body conjunct satisfied? Conjuncts are matched
//! left to right, each match narrowing the active substitution set:
//!
//! - a **positive** conjunct is satisfied by any held fact that unifies
//!   with it under the bindings accumulated so far;
//! - a **negative** conjunct is negation-as-failure against the *current*
//!   fact set: the grounded positive counterpart must be absent. NAF is
//!   evaluated at firing time and never re-checked later. Knowledge-base
//!   compilation guarantees its variables are already bound.
//!
//! Ground conjuncts reduce to membership tests. Fact enumeration follows
//! insertion order, so the binding list a body produces is reproducible
//! call over call; the determinism of the whole engine bottoms out here.

use ahash::AHashMap;

use crate::literal::{Literal, Term};

/// An active substitution: variable name → constant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    map: AHashMap<String, String>,
}

impl Bindings {
    pub fn new() -> Self {
        Bindings::default()
    }

    pub fn get(&self, variable: &str) -> Option<&str> {
        self.map.get(variable).map(String::as_str)
    }

    /// Bind `variable` to `value`. Returns false (leaving the binding set
    /// untouched) when the variable is already bound to a different value.
    pub fn bind(&mut self, variable: &str, value: &str) -> bool {
        match self.map.get(variable) {
            Some(existing) => existing == value,
            None => {
                self.map.insert(variable.to_string(), value.to_string());
                true
            }
        }
    }
}

/// The accumulating set of held ground literals, indexed by canonical
/// string. Iteration follows insertion order; revocation (defeat) removes
/// a literal outright.
#[derive(Debug, Default)]
pub struct FactSet {
    items: Vec<Literal>,
    index: AHashMap<String, usize>,
}

impl FactSet {
    pub fn new() -> Self {
        FactSet::default()
    }

    /// Insert a ground literal. Returns false when already held.
    pub fn insert(&mut self, literal: Literal) -> bool {
        let key = literal.key();
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.items.len());
        self.items.push(literal);
        true
    }

    pub fn contains(&self, literal: &Literal) -> bool {
        self.index.contains_key(&literal.key())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Revoke a held literal by canonical key. Positions shift, so the
    /// index is rebuilt; defeats are rare enough that this stays cheap.
    pub fn remove(&mut self, key: &str) -> Option<Literal> {
        let position = self.index.remove(key)?;
        let removed = self.items.remove(position);
        self.index.clear();
        for (i, item) in self.items.iter().enumerate() {
            self.index.insert(item.key(), i);
        }
        Some(removed)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.items.iter()
    }
}

/// Unify a body literal's arguments with a held fact's arguments,
/// extending `base`. The fact is ground, so unification is one-way:
/// constants must match, variables bind consistently.
fn unify_args(pattern: &Literal, fact: &Literal, base: &Bindings) -> Option<Bindings> {
    if pattern.predicate != fact.predicate
        || pattern.positive != fact.positive
        || pattern.args.len() != fact.args.len()
    {
        return None;
    }
    let mut bindings = base.clone();
    for (pat, value) in pattern.args.iter().zip(fact.args.iter()) {
        match pat {
            Term::Const(name) => {
                if name != value.name() {
                    return None;
                }
            }
            Term::Var(name) => {
                if !bindings.bind(name, value.name()) {
                    return None;
                }
            }
        }
    }
    Some(bindings)
}

/// All substitutions under which `body` is satisfied by `facts`.
///
/// Failure to match any conjunct aborts that candidate substitution; an
/// empty return means the rule does not fire this round. An empty body is
/// satisfied by exactly the empty substitution (system defaults rely on
/// this).
pub fn match_body(body: &[Literal], facts: &FactSet) -> Vec<Bindings> {
    let mut active = vec![Bindings::new()];
    for conjunct in body {
        let mut narrowed = Vec::new();
        if conjunct.positive {
            for bindings in &active {
                for fact in facts.iter() {
                    if let Some(extended) = unify_args(conjunct, fact, bindings) {
                        narrowed.push(extended);
                    }
                }
            }
        } else {
            // Negation-as-failure: keep substitutions under which the
            // positive counterpart is absent right now.
            for bindings in active {
                let grounded = conjunct.apply(&bindings);
                if !facts.contains_key(&grounded.complement_key()) {
                    narrowed.push(bindings);
                }
            }
        }
        active = narrowed;
        if active.is_empty() {
            break;
        }
    }
    active
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(literals: &[Literal]) -> FactSet {
        let mut set = FactSet::new();
        for lit in literals {
            set.insert(lit.clone());
        }
        set
    }

    #[test]
    fn ground_body_reduces_to_membership() {
        let set = facts(&[Literal::prop("a"), Literal::prop("b")]);
        assert_eq!(match_body(&[Literal::prop("a")], &set).len(), 1);
        assert!(match_body(&[Literal::prop("c")], &set).is_empty());
    }

    #[test]
    fn variables_bind_consistently_across_conjuncts() {
        let set = facts(&[
            Literal::positive("bird", vec![Term::constant("tweety")]),
            Literal::positive("bird", vec![Term::constant("sam")]),
            Literal::positive("penguin", vec![Term::constant("tweety")]),
        ]);
        let body = vec![
            Literal::positive("bird", vec![Term::var("X")]),
            Literal::positive("penguin", vec![Term::var("X")]),
        ];
        let matches = match_body(&body, &set);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].get("X"), Some("tweety"));
    }

    #[test]
    fn each_matching_fact_yields_its_own_substitution() {
        let set = facts(&[
            Literal::positive("bird", vec![Term::constant("tweety")]),
            Literal::positive("bird", vec![Term::constant("sam")]),
        ]);
        let body = vec![Literal::positive("bird", vec![Term::var("X")])];
        let matches = match_body(&body, &set);
        // Insertion order of the fact set, hence deterministic.
        assert_eq!(matches[0].get("X"), Some("tweety"));
        assert_eq!(matches[1].get("X"), Some("sam"));
    }

    #[test]
    fn negative_conjunct_is_negation_as_failure() {
        let set = facts(&[
            Literal::positive("bird", vec![Term::constant("tweety")]),
            Literal::positive("bird", vec![Term::constant("sam")]),
            Literal::positive("flies", vec![Term::constant("sam")]),
        ]);
        let body = vec![
            Literal::positive("bird", vec![Term::var("X")]),
            Literal::negative("flies", vec![Term::var("X")]),
        ];
        let matches = match_body(&body, &set);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].get("X"), Some("tweety"));
    }

    #[test]
    fn mismatched_polarity_does_not_unify_positively() {
        let set = facts(&[Literal::negative("flies", vec![Term::constant("tweety")])]);
        let body = vec![Literal::positive("flies", vec![Term::var("X")])];
        assert!(match_body(&body, &set).is_empty());
    }

    #[test]
    fn removal_revokes_membership_and_keeps_order() {
        let mut set = facts(&[Literal::prop("a"), Literal::prop("b"), Literal::prop("c")]);
        assert!(set.remove("b").is_some());
        assert!(!set.contains_key("b"));
        let remaining: Vec<String> = set.iter().map(|l| l.key()).collect();
        assert_eq!(remaining, vec!["a", "c"]);
    }
}
