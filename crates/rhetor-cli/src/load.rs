//! Loading knowledge bases and constraint files from disk.

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;

use rhetor_core::{KnowledgeBase, KnowledgeBaseSpec, RuleFault};
use rhetor_dsl::{constraints_or_empty, parse_rules_v1};

pub struct LoadedKb {
    pub kb: KnowledgeBase,
    /// Rules/constraints the compiler rejected (reported, not fatal).
    pub faults: Vec<RuleFault>,
    /// Set when constraint input was present but malformed and the run
    /// degraded to an empty constraint set.
    pub constraints_degraded: Option<String>,
}

/// Read a knowledge base (`rules_v1` text, or the JSON spec form when the
/// extension is `.json`) plus an optional `constraints_v1` file.
///
/// Missing or malformed constraints follow the documented fallback: empty
/// constraint set, degraded-mode marker set, inference proceeds.
pub fn load_knowledge_base(kb_path: &Path, constraints_path: Option<&Path>) -> Result<LoadedKb> {
    let kb_text = fs::read_to_string(kb_path)
        .with_context(|| format!("reading knowledge base {}", kb_path.display()))?;

    let mut spec = if kb_path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_str::<KnowledgeBaseSpec>(&kb_text)
            .map_err(|e| anyhow!("parsing JSON knowledge base {}: {e}", kb_path.display()))?
    } else {
        let rules = parse_rules_v1(&kb_text)
            .map_err(|e| anyhow!("parsing {}: {e}", kb_path.display()))?;
        KnowledgeBaseSpec {
            rules,
            constraints: vec![],
        }
    };

    let mut constraints_degraded = None;
    if let Some(path) = constraints_path {
        // Unreadable counts as malformed here: constraints silently degrade.
        let text = fs::read_to_string(path).ok();
        let (constraints, error) = constraints_or_empty(text.as_deref());
        match (&text, error) {
            (None, _) => {
                constraints_degraded = Some(format!("unreadable file {}", path.display()));
            }
            (Some(_), Some(error)) => {
                constraints_degraded = Some(error.to_string());
            }
            (Some(_), None) => {}
        }
        spec.constraints.extend(constraints);
    }

    if let Some(reason) = &constraints_degraded {
        eprintln!(
            "{} constraints degraded to an empty set ({reason})",
            "warning:".yellow().bold()
        );
    }

    let (kb, faults) = KnowledgeBase::compile(spec);
    for fault in &faults {
        eprintln!("{} {fault}", "warning:".yellow().bold());
    }

    Ok(LoadedKb {
        kb,
        faults,
        constraints_degraded,
    })
}

/// Parse the comma-separated literal strings of one context record.
pub fn parse_context(literals: &[String]) -> Result<Vec<rhetor_core::Literal>> {
    literals
        .iter()
        .map(|text| rhetor_dsl::parse_literal(text).map_err(|e| anyhow!(e)))
        .collect()
}
