use crate::models::{ReportEntry, ReportRow};

/// Collapse report rows into one entry per question
///
/// Checkbox and multi-select questions produce one row per picked choice;
/// their display values are collected in order. Other questions keep their
/// first row. Unanswered questions (and headings) get no values.
pub fn group_report_rows(rows: Vec<ReportRow>) -> Vec<ReportEntry> {
    let mut entries: Vec<ReportEntry> = Vec::new();

    for row in rows {
        if let Some(existing) = entries.iter_mut().find(|e| e.question_id == row.question_id) {
            if row.question_type.is_multi_valued() {
                existing.values.extend(row.display_value);
            }
            continue;
        }

        entries.push(ReportEntry {
            question_id: row.question_id,
            question_type: row.question_type,
            body: row.body,
            hide_label: row.hide_label,
            layout: row.layout,
            values: row.display_value.into_iter().collect(),
        });
    }

    entries
}
