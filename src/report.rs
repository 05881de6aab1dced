use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::NaiveDate;

use crate::catalog::InspectionField;
use crate::models::InspectionRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionSummary {
    pub label: String,
    pub count: usize,
}

pub fn summarize_by_condition(records: &[InspectionRecord]) -> Vec<ConditionSummary> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.condition_label()).or_insert(0) += 1;
    }

    let mut summaries: Vec<ConditionSummary> = counts
        .into_iter()
        .map(|(label, count)| ConditionSummary {
            label: label.to_string(),
            count,
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

fn latest(records: &[InspectionRecord]) -> Option<&InspectionRecord> {
    records.iter().max_by(|a, b| a.date.cmp(&b.date))
}

pub fn build_report(school_name: &str, generated_on: NaiveDate, records: &[InspectionRecord]) -> String {
    let summaries = summarize_by_condition(records);
    let mut output = String::new();

    let _ = writeln!(output, "# School Inspection Report");
    let _ = writeln!(
        output,
        "Generated for {} on {} ({} inspections)",
        school_name,
        generated_on,
        records.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Condition Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No available inspections.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(output, "- {}: {} inspections", summary.label, summary.count);
        }
    }

    let mut ordered = records.to_vec();
    ordered.sort_by(|a, b| b.date.cmp(&a.date));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Inspections");

    if ordered.is_empty() {
        let _ = writeln!(output, "No available inspections.");
    } else {
        for record in ordered.iter() {
            let _ = writeln!(
                output,
                "- {} on {} ({}): {}",
                record.id,
                record.date,
                record.status,
                record.condition_label()
            );
        }
    }

    if let Some(record) = latest(records) {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Latest Inspection");
        let _ = writeln!(output, "- Inspection ID: {}", record.id);
        let _ = writeln!(output, "- Inspection date: {}", record.date);
        for field in InspectionField::ALL {
            let _ = writeln!(output, "- {}: {}", field.label(), record.value(field));
        }
    }

    output
}

/// Plain-text card for a single inspection.
pub fn inspection_detail(record: &InspectionRecord) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Inspection ID:    {}", record.id);
    let _ = writeln!(output, "Inspection date:  {}", record.date);
    let _ = writeln!(output, "School inspected: {}", record.school_name);
    for field in InspectionField::ALL {
        let _ = writeln!(output, "{:<22}{}", format!("{}:", field.label()), record.value(field));
    }
    output
}
