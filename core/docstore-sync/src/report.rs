//! Comparison reports between a source and a target entity set.
//!
//! Reporting never writes to a store. Each source property becomes one row
//! with a token diff of the rendered values; the structural differences
//! are listed once per changed field for review.

use crate::planner::{diff_entity, DiffRecord, SkippedEntity, TargetIndex};
use crate::sink::ReportSink;
use crate::textdiff::{diff_tokens, has_changes, DiffOp, DiffSpan};
use docstore_codec::{to_json, to_typed, wire};
use docstore_model::{Entity, IdentityStrategy};
use docstore_types::GenericValue;

/// One source property next to its target counterpart.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub identity: String,
    pub field: String,
    pub source: GenericValue,
    /// `String("")` when the target lacks the entity or the property.
    pub target: GenericValue,
    pub spans: Vec<DiffSpan>,
}

impl ReportRow {
    pub fn is_different(&self) -> bool {
        has_changes(&self.spans)
    }
}

/// The comparison of one kind.
#[derive(Debug, Clone, Default)]
pub struct KindReport {
    pub label: String,
    /// The identity strategy token used to match entities.
    pub key_type: String,
    pub entries_compared: usize,
    pub rows: Vec<ReportRow>,
    /// Structural differences, one per changed field.
    pub updates: Vec<DiffRecord>,
    pub skipped: Vec<SkippedEntity>,
}

impl KindReport {
    pub fn differing_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.is_different()).count()
    }
}

/// Every kind of one comparison run, plus what was left out of it.
#[derive(Debug, Clone, Default)]
pub struct ComparisonReport {
    pub kinds: Vec<KindReport>,
    /// Files and entities that could not be read, one line each.
    pub skipped: Vec<String>,
    /// Kinds that were not compared because a store query failed.
    pub store_errors: Vec<String>,
}

impl ComparisonReport {
    pub fn new(kinds: Vec<KindReport>) -> Self {
        Self {
            kinds,
            ..Self::default()
        }
    }

    pub fn differing_fields(&self) -> usize {
        self.kinds.iter().map(|k| k.updates.len()).sum()
    }

    pub fn has_store_errors(&self) -> bool {
        !self.store_errors.is_empty()
    }

    /// Logs one line per kind, then every store error.
    pub fn log(&self, sink: &dyn ReportSink) {
        for kind in &self.kinds {
            sink.info(&format!(
                "{}: {} entries, {} differing rows, {} fields to update",
                kind.label,
                kind.entries_compared,
                kind.differing_rows(),
                kind.updates.len()
            ));
        }
        if !self.skipped.is_empty() {
            sink.info(&format!("{} entries or files skipped", self.skipped.len()));
        }
        for error in &self.store_errors {
            sink.warn(&format!("store error: {error}"));
        }
    }
}

/// Renders a value as pretty JSON of its normal form.
pub fn render_value(value: &GenericValue) -> String {
    serde_json::to_string_pretty(&to_json(value)).unwrap_or_default()
}

/// Compares `sources` against `targets` for one kind.
pub fn compare_kind(
    strategy: &IdentityStrategy,
    label: &str,
    sources: Vec<Entity>,
    targets: Vec<Entity>,
    sink: &dyn ReportSink,
) -> KindReport {
    let index = TargetIndex::build(strategy, targets, sink);
    let mut report = KindReport {
        label: label.to_string(),
        key_type: strategy.token(),
        entries_compared: sources.len(),
        ..KindReport::default()
    };

    for source in &sources {
        let identity = match strategy.extract(source) {
            Ok(identity) => identity,
            Err(e) => {
                sink.warn(&format!("{}: not compared: {e}", source.context()));
                report.skipped.push(SkippedEntity {
                    context: source.context(),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let target = if identity.is_empty() {
            None
        } else {
            index.get(&identity)
        };

        for (field, value) in &source.properties {
            let counterpart = target
                .and_then(|t| t.get(field))
                .cloned()
                .unwrap_or_else(GenericValue::empty);
            let spans = diff_tokens(&render_value(value), &render_value(&counterpart));
            report.rows.push(ReportRow {
                identity: identity.clone(),
                field: field.clone(),
                source: value.clone(),
                target: counterpart,
                spans,
            });
        }
        report.updates.extend(diff_entity(&identity, source, target));
    }

    sink.info(&format!(
        "{label}: {} entries compared, {} differing fields",
        report.entries_compared,
        report.updates.len()
    ));
    report
}

/// Renders a comparison as a markdown document.
///
/// Store errors and skipped entries are listed after the summary so a
/// partial comparison is never mistaken for a complete one.
pub fn render_markdown(
    source_label: &str,
    target_label: &str,
    comparison: &ComparisonReport,
) -> String {
    let reports = &comparison.kinds;
    let mut out = String::new();
    out.push_str("# Configuration Comparison\n\n");

    out.push_str("## Summary\n");
    out.push_str(&format!("- **Source**: `{source_label}`\n"));
    out.push_str(&format!("- **Target**: `{target_label}`\n"));
    out.push_str(&format!("- **Kinds Compared**: `{}`\n", reports.len()));
    out.push_str(&format!("- **Differing Fields**: `{}`\n", comparison.differing_fields()));
    let skipped_in_kinds: usize = reports.iter().map(|r| r.skipped.len()).sum();
    let skipped = comparison.skipped.len() + skipped_in_kinds;
    out.push_str(&format!("- **Skipped Entries**: `{skipped}`\n"));
    out.push_str(&format!("- **Store Errors**: `{}`\n\n", comparison.store_errors.len()));

    if comparison.has_store_errors() {
        out.push_str("## Store Errors\n\n");
        render_list(&mut out, &comparison.store_errors);
    }
    if !comparison.skipped.is_empty() {
        out.push_str("## Skipped\n\n");
        render_list(&mut out, &comparison.skipped);
    }

    out.push_str("## Table of Contents\n");
    for report in reports {
        out.push_str(&format!("1. [{}](#{})\n", report.label, anchor(&report.label)));
    }
    out.push_str("\n---\n\n");

    for report in reports {
        render_kind(&mut out, source_label, target_label, report);
    }
    out
}

fn render_list(out: &mut String, lines: &[String]) {
    for line in lines {
        out.push_str(&format!("- {}\n", cell(line)));
    }
    out.push('\n');
}

fn render_kind(out: &mut String, source_label: &str, target_label: &str, report: &KindReport) {
    out.push_str(&format!("## {}\n\n", report.label));
    out.push_str("### Overview\n");
    out.push_str(&format!("- **Table Name**: `{}`\n", report.label));
    out.push_str(&format!(
        "- **Total Entries Compared**: `{}`\n",
        report.entries_compared
    ));
    out.push_str(&format!("- **Key Type**: `{}`\n\n", report.key_type));

    out.push_str("### Differences\n\n");
    out.push_str(&format!(
        "| **Key** | **Field** | **{source_label} Value** | **{target_label} Value** | **Difference** |\n"
    ));
    out.push_str("|---------|-----------|-------------------------|-------------------------|------------|\n");
    for row in &report.rows {
        let difference = if row.is_different() {
            render_spans(&row.spans)
        } else {
            String::new()
        };
        out.push_str(&format!(
            "| {} | {} | <pre>{}</pre> | <pre>{}</pre> | <pre>{}</pre> |\n",
            cell(&row.identity),
            cell(&row.field),
            cell(&render_value(&row.source)),
            cell(&render_value(&row.target)),
            difference
        ));
    }

    if !report.skipped.is_empty() {
        out.push_str("\n### Not Compared\n\n");
        let lines: Vec<String> = report
            .skipped
            .iter()
            .map(|s| format!("{}: {}", s.context, s.reason))
            .collect();
        render_list(out, &lines);
    }

    if !report.updates.is_empty() {
        out.push_str("\n### Update Values\n\n");
        out.push_str("| **Key** | **Field** | **Value** |\n");
        out.push_str("|---------|-----------|-----------|\n");
        for update in &report.updates {
            out.push_str(&format!(
                "| {} | {} | <pre>{}</pre> |\n",
                cell(&update.identity),
                cell(&update.field),
                cell(&wire_value(&update.local_value))
            ));
        }
    }

    out.push_str("\n---\n\n");
}

// The value as the store would receive it.
fn wire_value(value: &GenericValue) -> String {
    to_typed(value)
        .and_then(|typed| wire::encode_value(&typed))
        .ok()
        .and_then(|encoded| serde_json::to_string_pretty(&encoded).ok())
        .unwrap_or_else(|| render_value(value))
}

fn render_spans(spans: &[DiffSpan]) -> String {
    spans
        .iter()
        .map(|span| match span.op {
            DiffOp::Equal => cell(&span.text),
            DiffOp::Delete => format!("<span style=\"color:red\">{}</span>", cell(&span.text)),
            DiffOp::Insert => format!("<span style=\"color:green\">{}</span>", cell(&span.text)),
        })
        .collect()
}

// Escapes text for a table cell inside <pre>.
fn cell(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut line_start = true;
    for c in text.chars() {
        match c {
            '\n' => {
                out.push_str("<br>");
                line_start = true;
                continue;
            }
            ' ' if line_start => out.push_str("&nbsp;"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '|' => out.push_str("&#124;"),
            _ => out.push(c),
        }
        line_start = line_start && c == ' ';
    }
    out
}

fn anchor(label: &str) -> String {
    label
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
            ' ' => Some('-'),
            _ => None,
        })
        .collect()
}
