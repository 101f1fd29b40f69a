//! Single-context audit view: held facts, supporters, defeat trail.

use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use rhetor_core::{infer, Defeater};

use crate::load::load_knowledge_base;

#[derive(Args)]
pub struct ExplainArgs {
    /// Knowledge base: `rules_v1` text, or the JSON spec form for `.json`.
    #[arg(long)]
    kb: PathBuf,

    /// `constraints_v1` file.
    #[arg(long)]
    constraints: Option<PathBuf>,

    /// Comma-separated context literals, e.g. "bird(tweety), penguin(tweety)".
    context: String,
}

pub fn run(args: ExplainArgs) -> Result<()> {
    let loaded = load_knowledge_base(&args.kb, args.constraints.as_deref())?;

    let context: Vec<rhetor_core::Literal> = args
        .context
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| rhetor_dsl::parse_literal(s).map_err(|e| anyhow!(e)))
        .collect::<Result<_>>()?;

    let result = infer(&loaded.kb, &context);

    println!("{}", "held facts".bold());
    for fact in &result.facts {
        match result.graph.get(&fact.key()) {
            Some(supporters) => {
                let names: Vec<&str> = supporters.iter().map(|s| s.rule.as_str()).collect();
                println!("  {} {} {}", fact, "<-".green(), names.join(", "));
            }
            None => println!("  {} {}", fact, "(context)".dimmed()),
        }
    }

    if !result.defeated.is_empty() {
        println!("{}", "defeated".bold());
        for record in &result.defeated {
            let by = match &record.by {
                Defeater::Rule { name, .. } => name.as_str(),
                Defeater::Context => "context",
            };
            println!(
                "  {} {} {} {}",
                record.defeated,
                format!("({})", record.literal).dimmed(),
                "defeated by".red(),
                by
            );
        }
    }

    if !result.faults.is_empty() {
        println!("{}", "faults".bold());
        for fault in &result.faults {
            println!("  {}", fault.to_string().yellow());
        }
    }

    println!("{} {}", "rounds".bold(), result.rounds);
    Ok(())
}
