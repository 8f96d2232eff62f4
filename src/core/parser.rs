use crate::domain::model::{DestinationLookup, StatusReport, StatusTable, TableLayout};

const ROW_MARKER: char = '|';

impl StatusTable {
    /// Reads a pipe-delimited (markdown style) table. Lines not starting
    /// with `|` are ignored.
    pub fn from_pipe_text(text: &str) -> Self {
        let rows = text
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with(ROW_MARKER))
            .map(split_row)
            .collect();

        Self { rows }
    }

    /// Renders the table as pipe-delimited text, one row per line.
    pub fn to_pipe_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                let cells: Vec<String> = row
                    .iter()
                    .map(|cell| cell.replace(ROW_MARKER, "/"))
                    .collect();
                format!("| {} |", cells.join(" | "))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn split_row(line: &str) -> Vec<String> {
    let mut segments: Vec<&str> = line.split(ROW_MARKER).collect();
    // The leading marker always yields an empty first segment.
    segments.remove(0);
    if segments.last().is_some_and(|last| last.trim().is_empty()) {
        segments.pop();
    }
    segments.into_iter().map(|s| s.trim().to_string()).collect()
}

/// Builds a report of the watched destinations in `table`.
///
/// Rows that are too short for the layout are skipped. Destinations absent
/// from `lookup` are ignored. Status glyphs are copied as they appear.
pub fn parse_table(
    table: &StatusTable,
    lookup: &DestinationLookup,
    layout: TableLayout,
) -> StatusReport {
    let mut report = StatusReport::default();
    let needed = layout.destination_column.max(layout.status_column) + 1;

    for row in &table.rows {
        if row.len() < needed {
            continue;
        }

        let Some(display_name) = lookup.display_name(&row[layout.destination_column]) else {
            continue;
        };

        let status = row[layout.status_column].trim().to_string();
        if let Some(previous) = report.entries.insert(display_name.to_string(), status) {
            tracing::debug!(
                "Duplicate row for {} (previous status {:?}), keeping the later one",
                display_name,
                previous
            );
        }
    }

    report
}

pub fn parse_status_text(
    text: &str,
    lookup: &DestinationLookup,
    layout: TableLayout,
) -> StatusReport {
    parse_table(&StatusTable::from_pipe_text(text), lookup, layout)
}
