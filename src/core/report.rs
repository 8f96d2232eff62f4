use crate::domain::model::{Category, StatusReport, StatusSymbol};
use std::collections::BTreeMap;

pub const REPORT_SUBJECT: &str = "EMS 配送状况报告";
pub const REPORT_HEADER: &str = "【EMS 配送状况报告】";
pub const REPORT_FOOTER: &str = "详情: https://www.post.japanpost.jp/int/information/overview.html";

/// Destinations per category. Names keep the report's sorted order.
pub fn group(report: &StatusReport) -> BTreeMap<Category, Vec<&str>> {
    let mut groups: BTreeMap<Category, Vec<&str>> = BTreeMap::new();

    // `entries` is a BTreeMap, so iteration is already sorted by name.
    for (destination, glyph) in &report.entries {
        let category = Category::from_symbol(StatusSymbol::from_glyph(glyph));
        groups.entry(category).or_default().push(destination);
    }

    groups
}

pub fn render(report: &StatusReport) -> String {
    let groups = group(report);
    let mut text = format!("{}\n\n", REPORT_HEADER);

    for category in Category::ALL {
        let Some(names) = groups.get(&category) else {
            continue;
        };
        text.push_str(&format!("■ {}\n", category.label()));
        text.push_str(&names.join(", "));
        text.push_str("\n\n");
    }

    text.push_str(REPORT_FOOTER);
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_groups_in_fixed_order() {
        let report: StatusReport = [("美国", "×"), ("中国", "○"), ("英国", "△")]
            .into_iter()
            .collect();

        let text = render(&report);

        let expected = format!(
            "{}\n\n■ 停止受理 (×)\n美国\n\n■ 部分暂停 (△)\n英国\n\n■ 正常受理 (◯)\n中国\n\n{}",
            REPORT_HEADER, REPORT_FOOTER
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_empty_report() {
        let text = render(&StatusReport::default());
        assert_eq!(text, format!("{}\n\n{}", REPORT_HEADER, REPORT_FOOTER));
        assert!(!text.contains('■'));
    }

    #[test]
    fn test_names_sorted_within_category() {
        let report: StatusReport = [("法国", "◯"), ("德国", "◯"), ("中国", "◯"), ("日本", "-")]
            .into_iter()
            .collect();

        let text = render(&report);
        assert!(text.contains("■ 正常受理 (◯)\n中国, 德国, 法国\n\n"));
        assert!(text.contains("■ 暂不处理 (-)\n日本\n\n"));
        assert!(!text.contains("停止受理"));
    }

    #[test]
    fn test_every_destination_in_exactly_one_category() {
        let report: StatusReport = [
            ("a", "◯"),
            ("b", "△"),
            ("c", "×"),
            ("d", "-"),
            ("e", ""),
            ("f", "?"),
        ]
        .into_iter()
        .collect();

        let groups = group(&report);
        let mut seen: Vec<&str> = groups.values().flatten().copied().collect();
        seen.sort();
        assert_eq!(seen, vec!["a", "b", "c", "d", "e", "f"]);
        assert_eq!(groups[&Category::Unspecified], vec!["d", "e", "f"]);
    }

    #[test]
    fn test_render_is_idempotent() {
        let report: StatusReport = [("美国", "△"), ("中国", "◯")].into_iter().collect();
        assert_eq!(render(&report), render(&report));
    }
}
