//! 結果表の組み立て
//!
//! 検索・重複・照合の結果を「見出し + 行」の表に変換する。
//! 出力形式（端末/CSV/JSON/Excel）はこの表だけを見て書き出す。

use serde_json::Value;
use sheet_recon_common::{
    resolve_display_names, ColumnNameMapping, DuplicateGroup, ReconciliationResult,
    SearchResult, DEFAULT_RECON_HEADERS,
};

/// 照合結果の書き出し順（互換性のため固定）
pub const RECON_EXPORT_FIELDS: [&str; 10] = [
    "DBF_Value",
    "Stawka",
    "Status",
    "SheetName",
    "ColumnName",
    "ColumnIndex",
    "RowIndex",
    "MatchedValue",
    "Czesci",
    "Notes",
];

pub const SEARCH_HEADERS: [&str; 4] = ["Arkusz", "Kolumna", "Komórka", "Wartość"];

pub const DUPLICATE_HEADERS: [&str; 5] = ["Arkusz", "Kolumna", "Wartość", "Liczba", "Wiersze"];

/// 重複の行番号は先頭5件まで表示
const MAX_LISTED_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new<S: AsRef<str>>(headers: &[S]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 見出しをキーにしたオブジェクトの配列（キー順は見出し順）
    pub fn to_json(&self) -> Value {
        let items = self
            .rows
            .iter()
            .map(|row| {
                let object: serde_json::Map<String, Value> = self
                    .headers
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect();
                Value::Object(object)
            })
            .collect();
        Value::Array(items)
    }
}

/// セル値の文字列表現（null は空欄）
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn text(value: &str) -> Value {
    Value::String(value.to_string())
}

fn index(value: Option<usize>) -> Value {
    value.map(Value::from).unwrap_or(Value::Null)
}

/// 検索結果表
pub fn search_table(results: &[SearchResult]) -> Table {
    let mut table = Table::new(&SEARCH_HEADERS);
    for r in results {
        table.rows.push(vec![
            text(&r.sheet_name),
            text(&r.column_name),
            Value::String(r.cell_address()),
            text(&r.matched_value),
        ]);
    }
    table
}

/// "2, 3, 5, 7, 9 ... (+2)" 形式
pub fn format_row_numbers(group: &DuplicateGroup) -> String {
    let rows = group.row_numbers();
    let listed: Vec<String> = rows
        .iter()
        .take(MAX_LISTED_ROWS)
        .map(|r| r.to_string())
        .collect();
    let mut out = listed.join(", ");
    if rows.len() > MAX_LISTED_ROWS {
        out.push_str(&format!(" ... (+{})", rows.len() - MAX_LISTED_ROWS));
    }
    out
}

/// 重複グループ表
pub fn duplicates_table(groups: &[DuplicateGroup]) -> Table {
    let mut table = Table::new(&DUPLICATE_HEADERS);
    for g in groups {
        table.rows.push(vec![
            text(&g.sheet_name),
            text(&g.column_label),
            text(&g.value),
            Value::from(g.count()),
            Value::String(format_row_numbers(g)),
        ]);
    }
    table
}

/// 照合結果の画面表示用（見出しは表示名マッピング適用後）
///
/// 位置順リストは書き出しフィールド用なので、ここでは名前対応表だけを使う。
pub fn recon_display_table(
    results: &[ReconciliationResult],
    mapping: Option<&ColumnNameMapping>,
) -> Table {
    let mapping = mapping.filter(|m| matches!(m, ColumnNameMapping::Map(_)));
    let mut table = Table::new(&resolve_display_names(&DEFAULT_RECON_HEADERS, mapping));
    for r in results {
        let row_number = r.row_index.map(|i| (i + 1).to_string()).unwrap_or_default();
        table.rows.push(vec![
            text(&r.sheet_name),
            text(&r.platnik),
            text(&r.dbf_value),
            text(&r.stawka),
            text(&r.czesci),
            Value::String(r.status.to_string()),
            text(&r.column_name),
            Value::String(row_number),
            text(&r.notes),
        ]);
    }
    table
}

/// 照合結果の書き出し用（固定順、キー名は表示名マッピングで置換可能）
pub fn recon_export_table(
    results: &[ReconciliationResult],
    mapping: Option<&ColumnNameMapping>,
) -> Table {
    let mut table = Table::new(&resolve_display_names(&RECON_EXPORT_FIELDS, mapping));
    for r in results {
        table.rows.push(vec![
            text(&r.dbf_value),
            text(&r.stawka),
            Value::String(r.status.to_string()),
            text(&r.sheet_name),
            text(&r.column_name),
            index(r.column_index),
            index(r.row_index),
            text(&r.matched_value),
            text(&r.czesci),
            text(&r.notes),
        ]);
    }
    table
}
