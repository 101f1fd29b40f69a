//! Knowledge-base validation report.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use rhetor_core::RuleKind;

use crate::load::load_knowledge_base;

#[derive(Args)]
pub struct CheckArgs {
    /// Knowledge base: `rules_v1` text, or the JSON spec form for `.json`.
    #[arg(long)]
    kb: PathBuf,

    /// `constraints_v1` file to validate alongside the rules.
    #[arg(long)]
    constraints: Option<PathBuf>,
}

pub fn run(args: CheckArgs) -> Result<()> {
    let loaded = load_knowledge_base(&args.kb, args.constraints.as_deref())?;

    let ordinary = loaded
        .kb
        .rules()
        .iter()
        .filter(|r| r.kind == RuleKind::Ordinary)
        .count();
    let defaults = loaded.kb.rules().len() - ordinary;

    println!(
        "{} {}: {} rules, {} synthesized defaults, {} constraints",
        "ok".green().bold(),
        args.kb.display().to_string().bold(),
        ordinary,
        defaults,
        loaded.kb.constraints().len()
    );
    if !loaded.faults.is_empty() {
        println!(
            "{} {} input(s) excluded from firing",
            "info:".yellow().bold(),
            loaded.faults.len()
        );
    }
    if loaded.constraints_degraded.is_some() {
        println!(
            "{} running in degraded mode: constraint set is empty",
            "info:".yellow().bold()
        );
    }
    Ok(())
}
