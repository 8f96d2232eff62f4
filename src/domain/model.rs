use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// EMS acceptance status as printed in the Japan Post table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusSymbol {
    Normal,
    Restricted,
    Suspended,
    Unknown,
}

impl StatusSymbol {
    /// Maps a table glyph to a status. Anything unrecognized, the dash
    /// included, is `Unknown`.
    pub fn from_glyph(glyph: &str) -> Self {
        match glyph.trim() {
            "◯" | "○" | "〇" => StatusSymbol::Normal,
            "△" | "▲" => StatusSymbol::Restricted,
            "×" | "✕" | "✖" | "✗" => StatusSymbol::Suspended,
            _ => StatusSymbol::Unknown,
        }
    }
}

/// Report sections, declared in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Suspended,
    Restricted,
    Normal,
    Unspecified,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Suspended,
        Category::Restricted,
        Category::Normal,
        Category::Unspecified,
    ];

    pub fn from_symbol(symbol: StatusSymbol) -> Self {
        match symbol {
            StatusSymbol::Suspended => Category::Suspended,
            StatusSymbol::Restricted => Category::Restricted,
            StatusSymbol::Normal => Category::Normal,
            StatusSymbol::Unknown => Category::Unspecified,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Suspended => "停止受理 (×)",
            Category::Restricted => "部分暂停 (△)",
            Category::Normal => "正常受理 (◯)",
            Category::Unspecified => "暂不处理 (-)",
        }
    }
}

/// Source-table destination name to display name. Destinations missing
/// from the lookup are not watched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationLookup {
    names: HashMap<String, String>,
}

impl DestinationLookup {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self { names }
    }

    pub fn display_name(&self, source_name: &str) -> Option<&str> {
        self.names.get(source_name).map(String::as_str)
    }

    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The Japan Post (Japanese) to Chinese watch-list.
    pub fn japan_post_default() -> Self {
        const NAMES: &[(&str, &str)] = &[
            ("アメリカ合衆国", "美国"),
            ("イギリス", "英国"),
            ("英国", "英国"),
            ("イタリア", "意大利"),
            ("インド", "印度"),
            ("インドネシア", "印度尼西亚"),
            ("オーストラリア", "澳大利亚"),
            ("オランダ", "荷兰"),
            ("カナダ", "加拿大"),
            ("カンボジア", "柬埔寨"),
            ("コロンビア", "哥伦比亚"),
            ("サウジアラビア", "沙特阿拉伯"),
            ("シンガポール", "新加坡"),
            ("スイス", "瑞士"),
            ("スペイン", "西班牙"),
            ("タイ", "泰国"),
            ("台湾", "台湾"),
            ("中華人民共和国", "中国"),
            ("ドイツ", "德国"),
            ("ニュージーランド", "新西兰"),
            ("ノルウェー", "挪威"),
            ("フィリピン", "菲律宾"),
            ("フランス", "法国"),
            ("ブルガリア", "保加利亚"),
            ("ベトナム", "越南"),
            ("ベルギー", "比利时"),
            ("ポーランド", "波兰"),
            ("ポルトガル", "葡萄牙"),
            ("香港", "香港"),
            ("マカオ", "澳门"),
            ("マレーシア", "马来西亚"),
            ("メキシコ", "墨西哥"),
            ("ルクセンブルク", "卢森堡"),
            ("大韓民国", "韩国"),
            ("アラブ首長国連邦", "阿拉伯联合酋长国"),
            ("アイルランド", "爱尔兰"),
        ];

        Self::new(
            NAMES
                .iter()
                .map(|(source, display)| (source.to_string(), display.to_string()))
                .collect(),
        )
    }
}

/// Fixed column positions of a status table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLayout {
    pub destination_column: usize,
    pub status_column: usize,
}

impl Default for TableLayout {
    fn default() -> Self {
        // Destination | Ordinary Mail x3 | Parcel Post x3 | EMS | Customs
        Self {
            destination_column: 0,
            status_column: 7,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusTable {
    pub rows: Vec<Vec<String>>,
}

impl StatusTable {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn max_columns(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Destination display name to the raw status glyph, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    pub entries: BTreeMap<String, String>,
}

impl StatusReport {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StatusReport {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// On-disk cache of the last fetched table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Pipe-delimited table text.
    pub status: String,
    /// Unix seconds of the fetch.
    pub timestamp: i64,
}

impl CacheRecord {
    /// `None` when the age does not fit in an i64 (corrupt timestamp).
    pub fn age_seconds(&self, now: i64) -> Option<i64> {
        now.checked_sub(self.timestamp)
    }

    /// Future-dated or overflowing timestamps are never fresh.
    pub fn is_fresh(&self, now: i64, expiry_seconds: i64) -> bool {
        self.age_seconds(now)
            .is_some_and(|age| (0..=expiry_seconds).contains(&age))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoRecipients,
    MissingSetting(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent { recipients: usize },
    DryRun,
    Skipped(SkipReason),
}
