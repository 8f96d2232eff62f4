//! Picks the EMS status table out of a fetched HTML page.
//!
//! A page usually carries several tables (notices, legends, the status
//! table). Matchers are tried in order; for each matcher the first table
//! satisfying it wins.

use crate::domain::model::{DestinationLookup, StatusTable, TableLayout};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TableMatcher {
    /// The first row contains every keyword.
    HeaderKeywords { keywords: Vec<String> },
    /// Some cell contains any keyword.
    AnyKeyword { keywords: Vec<String> },
    /// Some row has at least this many cells.
    MinColumns { columns: usize },
}

impl TableMatcher {
    pub fn matches(&self, table: &StatusTable) -> bool {
        match self {
            TableMatcher::HeaderKeywords { keywords } => {
                let Some(header) = table.rows.first() else {
                    return false;
                };
                let header = header.join(" ");
                !keywords.is_empty() && keywords.iter().all(|k| header.contains(k.as_str()))
            }
            TableMatcher::AnyKeyword { keywords } => table.rows.iter().flatten().any(|cell| {
                keywords.iter().any(|k| cell.contains(k.as_str()))
            }),
            TableMatcher::MinColumns { columns } => table.max_columns() >= *columns,
        }
    }

    /// Default rules: an "EMS" header, then any watched destination, then
    /// a table wide enough to carry the status column.
    pub fn default_rules(lookup: &DestinationLookup, layout: TableLayout) -> Vec<TableMatcher> {
        let mut destinations: Vec<String> = lookup.source_names().map(str::to_string).collect();
        destinations.sort();

        vec![
            TableMatcher::HeaderKeywords {
                keywords: vec!["EMS".to_string()],
            },
            TableMatcher::AnyKeyword {
                keywords: destinations,
            },
            TableMatcher::MinColumns {
                columns: layout.destination_column.max(layout.status_column) + 1,
            },
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSelection {
    Matched {
        /// Index of the matcher that selected the table.
        rule: usize,
        table_index: usize,
        table: StatusTable,
    },
    NoMatch,
}

/// Extracts every `<table>` of the page as rows of cell text.
pub fn extract_tables(html: &str) -> Vec<StatusTable> {
    let document = Html::parse_document(html);
    let (Ok(table_sel), Ok(row_sel), Ok(cell_sel)) = (
        Selector::parse("table"),
        Selector::parse("tr"),
        Selector::parse("th, td"),
    ) else {
        return Vec::new();
    };

    document
        .select(&table_sel)
        .map(|table| {
            // Rows and cells of nested tables belong to the nested table.
            let owned = |el: &ElementRef<'_>| {
                closest_table(*el).is_some_and(|t| t.id() == table.id())
            };
            let rows = table
                .select(&row_sel)
                .filter(owned)
                .map(|row| {
                    row.select(&cell_sel)
                        .filter(owned)
                        .map(cell_text)
                        .collect::<Vec<_>>()
                })
                .filter(|cells| !cells.is_empty())
                .collect();
            StatusTable::new(rows)
        })
        .collect()
}

fn closest_table(row: ElementRef<'_>) -> Option<ElementRef<'_>> {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn select_table(tables: Vec<StatusTable>, matchers: &[TableMatcher]) -> TableSelection {
    for (rule, matcher) in matchers.iter().enumerate() {
        if let Some(table_index) = tables.iter().position(|t| matcher.matches(t)) {
            tracing::debug!(
                "Table #{} selected by matcher #{} ({:?})",
                table_index,
                rule,
                matcher
            );
            let table = tables.into_iter().nth(table_index).unwrap_or_default();
            return TableSelection::Matched {
                rule,
                table_index,
                table,
            };
        }
    }

    TableSelection::NoMatch
}

pub fn select_from_html(html: &str, matchers: &[TableMatcher]) -> TableSelection {
    select_table(extract_tables(html), matchers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const PAGE: &str = r#"
<html><body>
<table><tr><th>お知らせ</th></tr><tr><td>2024年1月1日 更新</td></tr></table>
<table>
  <tr><th>国・地域</th><th>通常郵便物（航空）</th><th>SAL</th><th>船便</th>
      <th>小包（航空）</th><th>小包（SAL）</th><th>小包（船便）</th><th>EMS</th><th>電子データ</th></tr>
  <tr><td>中華人民共和国</td><td>◯</td><td>×</td><td>◯</td><td>◯</td><td>×</td><td>◯</td><td>◯</td><td>必須</td></tr>
  <tr><td>カナダ</td><td>×</td><td>×</td><td>×</td><td>×</td><td>×</td><td>×</td><td>×</td><td>必須<br>※HSコード推奨</td></tr>
</table>
</body></html>
"#;

    fn lookup() -> DestinationLookup {
        DestinationLookup::new(HashMap::from([(
            "カナダ".to_string(),
            "加拿大".to_string(),
        )]))
    }

    #[test]
    fn test_extract_tables_reads_cells() {
        let tables = extract_tables(PAGE);

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[1].rows.len(), 3);
        assert_eq!(tables[1].rows[1][0], "中華人民共和国");
        assert_eq!(tables[1].rows[2][7], "×");
        assert_eq!(tables[1].rows[2][8], "必須 ※HSコード推奨");
    }

    #[test]
    fn test_header_rule_wins() {
        let rules = TableMatcher::default_rules(&lookup(), TableLayout::default());

        match select_from_html(PAGE, &rules) {
            TableSelection::Matched {
                rule, table_index, ..
            } => {
                assert_eq!(rule, 0);
                assert_eq!(table_index, 1);
            }
            TableSelection::NoMatch => panic!("expected a table"),
        }
    }

    #[test]
    fn test_falls_through_to_later_rules() {
        let page = "<table><tr><td>x</td></tr></table><table><tr><td>カナダ</td><td>×</td></tr></table>";
        let rules = TableMatcher::default_rules(&lookup(), TableLayout::default());

        match select_from_html(page, &rules) {
            TableSelection::Matched {
                rule, table_index, ..
            } => {
                assert_eq!(rule, 1);
                assert_eq!(table_index, 1);
            }
            TableSelection::NoMatch => panic!("expected a table"),
        }
    }

    #[test]
    fn test_no_match() {
        let page = "<p>maintenance</p><table><tr><td>x</td></tr></table>";
        let rules = TableMatcher::default_rules(&lookup(), TableLayout::default());

        assert_eq!(select_from_html(page, &rules), TableSelection::NoMatch);
        assert_eq!(select_from_html("", &rules), TableSelection::NoMatch);
    }

    #[test]
    fn test_nested_table_cells_do_not_shift_outer_columns() {
        let page = "<table><tr><td>a<table><tr><td>inner</td></tr></table></td><td>b</td></tr></table>";
        let tables = extract_tables(page);

        assert_eq!(tables[0].rows, vec![vec!["a inner".to_string(), "b".to_string()]]);
        assert_eq!(tables[1].rows, vec![vec!["inner".to_string()]]);
    }

    #[test]
    fn test_nested_table_rows_stay_with_inner_table() {
        let page = "<table><tr><td><table><tr><td>inner</td></tr></table></td></tr></table>";
        let tables = extract_tables(page);

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows.len(), 1);
        assert_eq!(tables[1].rows, vec![vec!["inner".to_string()]]);
    }
}
