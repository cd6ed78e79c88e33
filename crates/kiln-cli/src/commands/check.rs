//! Check command implementation.
//!
//! Validates configuration and compiles the rule table without building.

use kiln_pipeline::{RuleTable, SourceFile};

use crate::cli::CheckArgs;
use crate::commands::utils;
use crate::config::{ConfigOverrides, KilnConfig};
use crate::error::Result;
use crate::ui;

/// Execute the check command.
///
/// # Validation Steps
///
/// 1. Load and validate configuration
/// 2. Compile every rule (regexes and transformer names)
/// 3. Classify the current sources against the table
///
/// With `--schema`, prints the JSON Schema of kiln.config.json instead.
pub async fn execute(args: CheckArgs) -> Result<()> {
    if args.schema {
        println!("{}", serde_json::to_string_pretty(&KilnConfig::json_schema())?);
        return Ok(());
    }

    ui::info("Checking configuration...");

    let root = utils::resolve_project_root(args.cwd.as_deref())?;
    let config = KilnConfig::load(&root, args.config.as_deref(), &ConfigOverrides::default())?;
    config.validate()?;
    let table = config.compile_rules()?;

    ui::success("Configuration is valid!");
    print_rules(&table);

    let paths = config.resolve(&root);
    let sources = paths.sources(&table)?;
    report_classification(&table, &sources);

    if !paths.content_base.is_dir() {
        ui::debug(&format!(
            "Content base {} does not exist; the dev server will only serve artifacts",
            paths.content_base.display()
        ));
    }

    Ok(())
}

fn print_rules(table: &RuleTable) {
    ui::info(&format!("{} rules:", table.rules().len()));
    for rule in table.rules() {
        let exclude = rule
            .exclude()
            .map(|pattern| format!(" (exclude {pattern})"))
            .unwrap_or_default();
        eprintln!(
            "  #{} {}{} -> {} [{}]",
            rule.index() + 1,
            rule.test(),
            exclude,
            rule.stage_names().join(" -> "),
            rule.output_kind()
        );
    }
    if !table.excluded_dirs().is_empty() {
        eprintln!("  excluded dirs: {}", table.excluded_dirs().join(", "));
    }
}

fn report_classification(table: &RuleTable, sources: &[SourceFile]) {
    let mut counts = vec![0usize; table.rules().len()];
    let mut skipped = 0;
    for file in sources {
        match table.classify(&file.relative) {
            Some(rule) => counts[rule.index()] += 1,
            None => skipped += 1,
        }
    }

    for (rule, count) in table.rules().iter().zip(&counts) {
        if *count == 0 {
            ui::warning(&format!("Rule #{} matches no sources", rule.index() + 1));
        }
    }
    ui::info(&format!(
        "{} sources, {} matched, {} skipped",
        sources.len(),
        sources.len() - skipped,
        skipped
    ));
}
