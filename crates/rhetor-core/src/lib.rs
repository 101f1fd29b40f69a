//! Rhetor core: defeasible forward-chaining inference.
//!
//! Given a knowledge base of prioritized, defeasible rules (plus mutual-
//! exclusion constraints) and a context of observed ground facts, the
//! engine derives everything that follows, resolving contradictions by
//! rule priority and recording full provenance:
//!
//! - [`infer`]: the single, pure entry point;
//! - [`InferenceResult`]: held facts, justification graph, defeat ledger;
//! - [`KnowledgeBase::compile`]: validation plus synthesis of the
//!   closed-world default rules constraints imply.
//!
//! The crate performs no I/O. Parsing rule text and driving batches of
//! contexts live in `rhetor-dsl` and `rhetor-cli` respectively.
//!
//! ```
//! use rhetor_core::{infer, KnowledgeBase, KnowledgeBaseSpec, Literal, RuleSpec, Term};
//!
//! let spec = KnowledgeBaseSpec {
//!     rules: vec![
//!         RuleSpec {
//!             name: "R1".into(),
//!             salience: 0,
//!             body: vec![Literal::positive("bird", vec![Term::var("X")])],
//!             head: Literal::positive("flies", vec![Term::var("X")]),
//!         },
//!         RuleSpec {
//!             name: "R2".into(),
//!             salience: 1,
//!             body: vec![Literal::positive("penguin", vec![Term::var("X")])],
//!             head: Literal::negative("flies", vec![Term::var("X")]),
//!         },
//!     ],
//!     constraints: vec![],
//! };
//! let (kb, faults) = KnowledgeBase::compile(spec);
//! assert!(faults.is_empty());
//!
//! let context = vec![
//!     Literal::positive("bird", vec![Term::constant("tweety")]),
//!     Literal::positive("penguin", vec![Term::constant("tweety")]),
//! ];
//! let result = infer(&kb, &context);
//! assert!(result.holds("-flies(tweety)"));
//! assert_eq!(result.defeated[0].defeated, "R1");
//! ```

pub mod engine;
pub mod graph;
pub mod knowledge_base;
pub mod literal;
pub mod rule;
pub mod unify;

pub use engine::infer;
pub use graph::{DefeatRecord, Defeater, InferenceGraph, InferenceResult, Supporter};
pub use knowledge_base::{Constraint, KnowledgeBase, KnowledgeBaseSpec, RuleFault};
pub use literal::{Literal, Term};
pub use rule::{Rule, RuleKind, RuleSpec, DEFAULT_RULE_PREFIX};
pub use unify::{match_body, Bindings, FactSet};
