//! Rhetor rule/constraint surface syntax.
//!
//! This crate turns external textual rule definitions into the
//! `rhetor-core` structures. Two line-oriented formats, versioned the same
//! way so future dialects stay explicit:
//!
//! - `rules_v1`: `Name [salience] :: body implies head ;`
//! - `constraints_v1`: `left >< right ;`
//!
//! JSON knowledge bases need no parser here: `rhetor_core::KnowledgeBaseSpec`
//! derives `Deserialize` and goes straight through `serde_json`.

pub mod constraints_v1;
pub mod rules_v1;

pub use constraints_v1::{
    constraints_or_empty, parse_constraints_v1, ConstraintsV1ParseError,
};
pub use rules_v1::{parse_literal, parse_rule_line, parse_rules_v1, RulesV1ParseError};
