//! Terminal output: vocabulary record cards, the rule table, build and run
//! summaries.

use trialmoa_classify::{Classification, CorpusReport, RuleTable, RunStats};
use trialmoa_core::{Predicate, VocabularyRecord, locator};
use trialmoa_store::ReportPaths;
use trialmoa_store::report::frequency_batch;
use trialmoa_vocab::{BuildReport, VocabularyIndex};

const MAX_LIST_ITEMS: usize = 10;

// ── Vocabulary ──

pub fn print_build_report(report: &BuildReport, index: &VocabularyIndex) {
    println!(
        "{:<32} {:<13} {:>9} {:>9} {:>9}  status",
        "source", "kind", "records", "terms", "skipped"
    );
    for s in &report.sources {
        let status = s.failure.as_deref().unwrap_or("ok");
        println!(
            "{:<32} {:<13} {:>9} {:>9} {:>9}  {}",
            s.name,
            s.kind.as_str(),
            s.records,
            s.terms,
            s.malformed,
            status
        );
    }
    println!();
    println!(
        "Index: {} records, {} term keys ({} skipped, {} sources rejected)",
        index.len(),
        index.term_count(),
        report.total_malformed(),
        report.failed_sources().count()
    );
}

/// Print a record as a vertical card, followed by how it classifies.
pub fn print_record_card(
    record: &VocabularyRecord,
    primary: Option<&str>,
    classification: &Classification,
    rules: &RuleTable,
) {
    println!("=== {} ===", record.term);
    println!("  {:<20} {}", "record_id", record.record_id);
    println!("  {:<20} {}", "kind", record.record_kind.as_str());
    print_list("synonyms", record.synonyms.iter().map(String::as_str));
    print_list(
        "tree_locators",
        record.tree_locators.iter().map(String::as_str),
    );
    print_list(
        "pharm_actions",
        record.pharmacological_actions.iter().map(String::as_str),
    );
    if let Some(note) = &record.scope_note {
        println!("  {:<20} {}", "scope_note", note);
    }
    println!();

    println!("Classification");
    match primary {
        Some(loc) => {
            println!("  {:<20} {}", "primary_locator", loc);
            let ancestors: Vec<&str> =
                std::iter::successors(locator::parent(loc), |l| locator::parent(*l)).collect();
            if !ancestors.is_empty() {
                println!("  {:<20} {}", "ancestors", ancestors.join(" > "));
            }
        }
        None => println!("  {:<20} (none in prioritised branches)", "primary_locator"),
    }
    println!("  {:<20} {}", "super_group", classification.label);
    match classification.rule_index.and_then(|i| rules.iter().nth(i).map(|r| (i, r))) {
        Some((i, rule)) => println!(
            "  {:<20} #{} {}",
            "matched_rule",
            i + 1,
            rule.note.as_deref().unwrap_or("")
        ),
        None => println!("  {:<20} (no rule matched)", "matched_rule"),
    }
}

fn print_list<'a>(name: &str, items: impl Iterator<Item = &'a str>) {
    let items: Vec<&str> = items.collect();
    if items.is_empty() {
        return;
    }
    let shown = &items[..items.len().min(MAX_LIST_ITEMS)];
    let more = items.len() - shown.len();
    if more > 0 {
        println!("  {:<20} {} (+{more} more)", name, shown.join(", "));
    } else {
        println!("  {:<20} {}", name, shown.join(", "));
    }
}

// ── Rules ──

pub fn print_rules(branch_priority: &[String], rules: &RuleTable) {
    println!("Branch priority: {}", branch_priority.join(" > "));
    println!();
    for (i, rule) in rules.iter().enumerate() {
        println!("{:>3}. {}", i + 1, rule.label);
        println!("     when {}", describe(&rule.predicate));
        if let Some(note) = &rule.note {
            println!("     note {note}");
        }
    }
    println!("  -. unclassified (no rule matched)");
}

fn describe(predicate: &Predicate) -> String {
    match predicate {
        Predicate::Keyword(words) => format!("term contains any of [{}]", words.join(", ")),
        Predicate::LocatorPrefix(prefixes) => {
            format!("primary locator under any of [{}]", prefixes.join(", "))
        }
        Predicate::Any(inner) => join_nested(inner, " OR "),
        Predicate::All(inner) => join_nested(inner, " AND "),
    }
}

fn join_nested(inner: &[Predicate], op: &str) -> String {
    let parts: Vec<String> = inner.iter().map(describe).collect();
    format!("({})", parts.join(op))
}

// ── Classification run ──

pub fn print_frequencies(report: &CorpusReport) -> anyhow::Result<()> {
    let batch = frequency_batch(report)?;
    println!("{}", arrow::util::pretty::pretty_format_batches(&[batch])?);
    Ok(())
}

pub fn print_run_summary(stats: &RunStats, paths: &ReportPaths) {
    println!(
        "{} drugs: {} computed, {} from cache, {} resolved, {} unclassified, {} rejected selections",
        stats.total,
        stats.computed,
        stats.cached,
        stats.resolved,
        stats.unclassified,
        stats.hallucinated
    );
    println!("  drugs        {}", paths.drugs.display());
    println!("  trials       {}", paths.trials.display());
    println!("  frequencies  {}", paths.frequencies.display());
    println!("  frequencies  {}", paths.frequencies_json.display());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_nested_predicates() {
        let p = Predicate::Any(vec![
            Predicate::keywords(["vaccin"]),
            Predicate::All(vec![
                Predicate::locator_prefixes(["D20.215"]),
                Predicate::keywords(["toxoid"]),
            ]),
        ]);
        assert_eq!(
            describe(&p),
            "(term contains any of [vaccin] OR (primary locator under any of [D20.215] AND term contains any of [toxoid]))"
        );
    }
}
