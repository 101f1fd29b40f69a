//! The batch driver: NDJSON context records in, fact lines out.
//!
//! Records are independent inferences over a shared read-only knowledge
//! base, so they are evaluated in parallel with rayon and re-emitted in
//! input order, so output is identical to a sequential run. In-place
//! rewrites go through a temp file plus rename so a failed run never
//! leaves the target half-written.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use rayon::prelude::*;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use rhetor_core::{infer, InferenceResult};

use crate::load::{load_knowledge_base, parse_context};

#[derive(Args)]
pub struct InferArgs {
    /// Knowledge base: `rules_v1` text, or the JSON spec form for `.json`.
    #[arg(long)]
    kb: PathBuf,

    /// `constraints_v1` file. Malformed input degrades to an empty
    /// constraint set with a warning.
    #[arg(long)]
    constraints: Option<PathBuf>,

    /// Newline-delimited JSON records: {"context": ["bird(tweety)", ...]}
    facts: PathBuf,

    /// Append `literal <- rule, rule` provenance lines after each record.
    #[arg(long)]
    provenance: bool,

    /// Keep facts whose only support is a system default rule.
    #[arg(long)]
    include_defaults: bool,

    /// Rewrite the facts file itself (atomic: temp file, then rename).
    #[arg(long, conflicts_with = "out")]
    in_place: bool,

    /// Output path (defaults to stdout).
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Deserialize)]
struct ContextRecord {
    #[serde(default)]
    context: Vec<String>,
}

pub fn run(args: InferArgs) -> Result<()> {
    let loaded = load_knowledge_base(&args.kb, args.constraints.as_deref())?;

    let input = fs::read_to_string(&args.facts).with_context(|| {
        format!("reading context records {}", args.facts.display())
    })?;

    // Parse everything up front so a bad record fails the run before any
    // output is produced.
    let mut contexts = Vec::new();
    for (i, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: ContextRecord = serde_json::from_str(line)
            .map_err(|e| anyhow!("record {}: {e}", i + 1))?;
        contexts.push(parse_context(&record.context).map_err(|e| anyhow!("record {}: {e}", i + 1))?);
    }

    let kb = &loaded.kb;
    let blocks: Vec<String> = contexts
        .par_iter()
        .map(|context| format_record(&infer(kb, context), args.include_defaults, args.provenance))
        .collect();

    let mut output = blocks.join("\n");
    if !output.is_empty() {
        output.push('\n');
    }

    if args.in_place {
        let tmp = args.facts.with_extension("tmp");
        let mut file = fs::File::create(&tmp)
            .with_context(|| format!("creating {}", tmp.display()))?;
        file.write_all(output.as_bytes())?;
        fs::rename(&tmp, &args.facts)
            .with_context(|| format!("replacing {}", args.facts.display()))?;
        eprintln!(
            "{} {} ({} records)",
            "rewrote".green().bold(),
            args.facts.display().to_string().bold(),
            blocks.len()
        );
    } else if let Some(out) = args.out {
        fs::write(&out, output).with_context(|| format!("writing {}", out.display()))?;
        eprintln!(
            "{} {} ({} records)",
            "wrote".green().bold(),
            out.display().to_string().bold(),
            blocks.len()
        );
    } else {
        print!("{output}");
    }
    Ok(())
}

/// One output block per record: the derived literal line, optionally
/// followed by provenance lines.
///
/// The fact line contains every graph entry with ordinary support (or any
/// support under `--include-defaults`) plus the closed-world additions the
/// defeat ledger implies, space-joined.
fn format_record(result: &InferenceResult, include_defaults: bool, provenance: bool) -> String {
    let mut literals: Vec<&str> = if include_defaults {
        result.graph.keys().map(String::as_str).collect()
    } else {
        result.genuine().keys().copied().collect()
    };

    let additions: Vec<String> = result
        .closed_world_additions()
        .iter()
        .map(|l| l.key())
        .collect();
    literals.extend(additions.iter().map(String::as_str));

    let mut block = literals.join(" ");
    if provenance {
        for (literal, supporters) in result.genuine() {
            let names: Vec<&str> = supporters.iter().map(|s| s.rule.as_str()).collect();
            block.push_str(&format!("\n  {literal} <- {}", names.join(", ")));
        }
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhetor_core::{KnowledgeBase, KnowledgeBaseSpec};
    use rhetor_dsl::{parse_constraints_v1, parse_rules_v1};

    fn kb(rules: &str, constraints: &str) -> KnowledgeBase {
        let spec = KnowledgeBaseSpec {
            rules: parse_rules_v1(rules).expect("rules"),
            constraints: parse_constraints_v1(constraints).expect("constraints"),
        };
        let (kb, faults) = KnowledgeBase::compile(spec);
        assert!(faults.is_empty());
        kb
    }

    #[test]
    fn record_lines_carry_genuine_facts_and_closed_world_additions() {
        let kb = kb(
            "R1 :: fever implies -healthy ;\n",
            "healthy >< -healthy ;\n",
        );
        let context = parse_context(&["fever".to_string()]).expect("context");
        let result = infer(&kb, &context);
        // -healthy is genuinely derived; the opposing default's defeat adds
        // nothing because the complement is genuinely held.
        assert_eq!(format_record(&result, false, false), "-healthy");
    }

    #[test]
    fn default_only_conclusions_need_include_defaults() {
        let kb = kb("", "p >< -p ;\n");
        let result = infer(&kb, &[]);
        // Genuine view is empty; the ledger's default-vs-default defeat
        // surfaces the losing polarity as a closed-world addition.
        assert_eq!(format_record(&result, false, false), "p");
        assert_eq!(format_record(&result, true, false), "-p p");
    }

    #[test]
    fn in_place_rewrite_replaces_the_records_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let kb_path = dir.path().join("kb.rules");
        let facts_path = dir.path().join("batch.ndjson");
        fs::write(&kb_path, "R1 :: bird(X) implies flies(X) ;\n").expect("write kb");
        fs::write(
            &facts_path,
            "{\"context\": [\"bird(tweety)\"]}\n{\"context\": [\"bird(sam)\"]}\n",
        )
        .expect("write records");

        run(InferArgs {
            kb: kb_path,
            constraints: None,
            facts: facts_path.clone(),
            provenance: false,
            include_defaults: false,
            in_place: true,
            out: None,
        })
        .expect("in-place run");

        let rewritten = fs::read_to_string(&facts_path).expect("read rewritten file");
        assert_eq!(rewritten, "flies(tweety)\nflies(sam)\n");
        assert!(!facts_path.with_extension("tmp").exists());
    }

    #[test]
    fn provenance_lines_follow_the_fact_line() {
        let kb = kb("R1 :: a implies b ;\nR2 :: b implies c ;\n", "");
        let context = parse_context(&["a".to_string()]).expect("context");
        let result = infer(&kb, &context);
        let block = format_record(&result, false, true);
        assert_eq!(block, "b c\n  b <- R1\n  c <- R2");
    }
}
