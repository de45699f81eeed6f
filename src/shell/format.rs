//! Text rendering for shell output.

use std::fmt::Write;

use crate::{Record, Schema, TableInfo};

const MIN_WIDTH: usize = 8;

/// Renders records as a table with one column per schema column.
///
/// ```text
/// id       | name     | age
/// ---------+----------+---------
/// 1        | Ann      | 30
/// (1 row)
/// ```
pub fn render_records(schema: &Schema, records: &[Record]) -> String {
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            schema
                .column_names()
                .map(|column| record.get(column).map(ToString::to_string).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = schema
        .column_names()
        .enumerate()
        .map(|(idx, name)| {
            rows.iter()
                .map(|row| row[idx].chars().count())
                .chain([name.chars().count(), MIN_WIDTH])
                .max()
                .unwrap_or(MIN_WIDTH)
        })
        .collect();

    let mut out = String::new();
    push_row(&mut out, schema.column_names(), &widths);

    let separator: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    out.push_str(separator.join("-+-").trim_end());
    out.push('\n');

    for row in &rows {
        push_row(&mut out, row.iter().map(String::as_str), &widths);
    }

    let noun = if rows.len() == 1 { "row" } else { "rows" };
    let _ = write!(out, "({} {noun})", rows.len());
    out
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line = cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell: <width$}"))
        .collect::<Vec<_>>()
        .join(" | ");
    out.push_str(line.trim_end());
    out.push('\n');
}

pub fn render_table_list(names: &[String]) -> String {
    if names.is_empty() {
        return String::from("No tables.");
    }

    names
        .iter()
        .map(|name| format!("- {name}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_table_info(info: &TableInfo) -> String {
    format!(
        "Table: {}\nColumns: {}\nRecords: {}",
        info.name, info.schema, info.record_count
    )
}
