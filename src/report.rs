//! Console reports for a finished merge.

use unicode_width::UnicodeWidthStr;

use crate::config::MergeConfig;
use crate::merge::MergeStats;
use crate::schema::Schema;
use crate::validate::ValidationReport;

const RULE_WIDTH: usize = 70;
/// Broken relations listed before the rest are summarized.
const BROKEN_LIMIT: usize = 10;

fn rule(out: &mut String) {
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push('\n');
}

/// Pad `text` with spaces to `width` display columns.
fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(UnicodeWidthStr::width(text));
    format!("{}{}", text, " ".repeat(fill))
}

pub fn render_summary(stats: &MergeStats, merged: &Schema, config: &MergeConfig, output: &str) -> String {
    let mut out = String::new();
    let mut databases = stats.databases.clone();
    databases.sort();

    out.push('\n');
    rule(&mut out);
    out.push_str("Merge Complete!\n");
    rule(&mut out);

    out.push_str(&format!("Databases merged: {}\n", databases.join(", ")));
    out.push_str(&format!("Total tables: {} ({} views)\n", stats.total_tables, stats.total_views));
    out.push_str(&format!("Total relations: {}\n", merged.relations.len()));
    out.push_str(&format!("  - From foreign key constraints: {}\n", stats.total_relations));
    if config.extract_view_relations {
        out.push_str(&format!("  - Extracted from view JOINs: {}\n", stats.extracted_relations));
    }
    if stats.deduplicated_count > 0 {
        out.push_str(&format!("  - Duplicates removed: {}\n", stats.deduplicated_count));
    }
    if stats.cross_db_relations > 0 {
        out.push_str(&format!("  - Cross-database relations: {}\n", stats.cross_db_relations));
    }
    out.push_str(&format!("Total functions: {}\n", stats.total_functions));
    out.push_str(&format!("Bracket notation: {}\n", config.use_brackets));
    out.push_str(&format!("Output written to: {}\n", output));
    rule(&mut out);

    out
}

pub fn render_validation(report: &ValidationReport) -> String {
    let mut out = String::new();

    rule(&mut out);
    out.push_str("Schema Validation Report\n");
    rule(&mut out);

    out.push_str(&format!("Total tables: {}\n", report.total_tables));
    out.push_str(&format!("Total relations: {}\n", report.total_relations));
    out.push_str(&format!("  - Foreign key constraints: {}\n", report.fk_relations));
    out.push_str(&format!("  - Virtual relations (extracted): {}\n", report.virtual_relations));
    out.push_str(&format!("Databases found: {}\n", report.databases.join(", ")));

    if !report.per_database.is_empty() {
        let width = report
            .per_database
            .keys()
            .map(|name| UnicodeWidthStr::width(name.as_str()))
            .max()
            .unwrap_or(0);
        for (name, counts) in &report.per_database {
            out.push_str(&format!(
                "  {}  {} table(s), {} relation(s)\n",
                pad(name, width),
                counts.tables,
                counts.relations
            ));
        }
    }

    if report.broken_relations.is_empty() {
        out.push_str("\n✓ All relations are valid!\n");
    } else {
        out.push_str(&format!("\n⚠️  Found {} broken relations:\n", report.broken_relations.len()));
        for broken in report.broken_relations.iter().take(BROKEN_LIMIT) {
            let kind = if broken.is_virtual { "Virtual" } else { "FK" };
            out.push_str(&format!("  [{}] {}\n", kind, broken.relation));
            out.push_str(&format!("       Missing: {} ({})\n", broken.missing, broken.side.as_str()));
        }
        if report.broken_relations.len() > BROKEN_LIMIT {
            out.push_str(&format!("  ... and {} more\n", report.broken_relations.len() - BROKEN_LIMIT));
        }
    }
    rule(&mut out);

    out
}
