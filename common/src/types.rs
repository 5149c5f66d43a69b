//! 入出力の型定義
//!
//! コアが受け取る表データと、検索・重複検出・照合の結果型:
//! - TabularSheet: 1タブ分の表データ（変換済み、読み取り専用）
//! - SearchResult / DuplicateGroup: 検索系の出力
//! - ExternalRecord → ReconciledKey → ReconciliationResult: 照合系の入出力

use crate::column::{cell_address, column_letter};
use serde::{Deserialize, Serialize};

/// セル値。値がないセルは `Absent` で、空文字列を含む何にも一致しない
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Cell {
    #[default]
    Absent,
    Text(String),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// テキスト射影（Absentなら None）
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Absent => None,
            Cell::Text(s) => Some(s.as_str()),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Cell::Absent)
    }

    /// 値がないか、空白のみ
    pub fn is_blank(&self) -> bool {
        self.as_text().map(|s| s.trim().is_empty()).unwrap_or(true)
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map(Cell::Text).unwrap_or(Cell::Absent)
    }
}

impl From<Cell> for Option<String> {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Absent => None,
            Cell::Text(s) => Some(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

static ABSENT: Cell = Cell::Absent;

/// 1タブ分の表データ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabularSheet {
    pub name: String,
    /// 行ごとのセル。行の長さは揃っていなくてよい
    pub rows: Vec<Vec<Cell>>,
}

impl TabularSheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// 文字列の2次元配列から作成（空文字列はそのまま Text("") として保持）
    pub fn from_strings<S: AsRef<str>>(name: impl Into<String>, rows: &[Vec<S>]) -> Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|v| Cell::text(v.as_ref())).collect())
            .collect();
        Self::new(name, rows)
    }

    /// 範囲外は Absent として扱う
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&ABSENT)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// 検索ヒット1件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub sheet_name: String,
    pub column_name: String,
    /// 0始まり
    pub column_index: usize,
    /// 0始まり（シート全体での行位置）
    pub row_index: usize,
    pub matched_value: String,
}

impl SearchResult {
    /// A1形式のセル番地（例: "C3"）
    pub fn cell_address(&self) -> String {
        cell_address(self.row_index, self.column_index)
    }
}

/// 同一列内で重複した値のグループ（出現2回以上のみ）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    pub sheet_name: String,
    pub column_label: String,
    pub value: String,
    /// 出現行（0始まり、昇順）
    pub occurrences: Vec<usize>,
}

impl DuplicateGroup {
    pub fn count(&self) -> usize {
        self.occurrences.len()
    }

    /// 表示用の1始まり行番号
    pub fn row_numbers(&self) -> Vec<usize> {
        self.occurrences.iter().map(|r| r + 1).collect()
    }
}

/// 外部レコード（フィールド順を保持）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRecord {
    pub fields: Vec<(String, Option<String>)>,
}

impl ExternalRecord {
    pub fn new(fields: Vec<(String, Option<String>)>) -> Self {
        Self { fields }
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// フィールド値（名前は完全一致）
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExternalRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
        }
    }
}

/// 照合キー（外部レコードからエイリアス解決で得たもの）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledKey {
    pub key_value: String,
    /// 無ければ空文字列
    pub stawka: String,
    /// 無ければ空文字列
    pub czesci: String,
    /// 無ければ空文字列
    pub platnik: String,
}

impl ReconciledKey {
    pub fn new(key_value: impl Into<String>) -> Self {
        Self {
            key_value: key_value.into(),
            ..Default::default()
        }
    }
}

/// 照合ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Found,
    Missing,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Found => write!(f, "Found"),
            MatchStatus::Missing => write!(f, "Missing"),
        }
    }
}

/// 見つかった位置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub sheet_name: String,
    pub column_name: String,
    pub column_index: usize,
    pub row_index: usize,
    pub matched_value: String,
}

/// 照合結果（キー1件につき1件、作成後は不変）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    pub dbf_value: String,
    pub stawka: String,
    pub czesci: String,
    pub platnik: String,
    pub status: MatchStatus,
    pub sheet_name: String,
    pub column_name: String,
    pub column_index: Option<usize>,
    pub row_index: Option<usize>,
    pub matched_value: String,
    pub notes: String,
}

impl ReconciliationResult {
    pub fn found(key: &ReconciledKey, at: Provenance) -> Self {
        let notes = format!(
            "Found in {} at {}{}",
            at.sheet_name,
            column_letter(at.column_index),
            at.row_index + 1
        );
        Self {
            dbf_value: key.key_value.clone(),
            stawka: key.stawka.clone(),
            czesci: key.czesci.clone(),
            platnik: key.platnik.clone(),
            status: MatchStatus::Found,
            sheet_name: at.sheet_name,
            column_name: at.column_name,
            column_index: Some(at.column_index),
            row_index: Some(at.row_index),
            matched_value: at.matched_value,
            notes,
        }
    }

    pub fn missing(key: &ReconciledKey) -> Self {
        Self {
            dbf_value: key.key_value.clone(),
            stawka: key.stawka.clone(),
            czesci: key.czesci.clone(),
            platnik: key.platnik.clone(),
            status: MatchStatus::Missing,
            sheet_name: String::new(),
            column_name: String::new(),
            column_index: None,
            row_index: None,
            matched_value: String::new(),
            notes: "Missing".to_string(),
        }
    }

    pub fn is_found(&self) -> bool {
        self.status == MatchStatus::Found
    }
}

/// 照合の集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconSummary {
    pub total: usize,
    pub found: usize,
    pub missing: usize,
}

impl ReconSummary {
    pub fn from_results(results: &[ReconciliationResult]) -> Self {
        let found = results.iter().filter(|r| r.is_found()).count();
        Self {
            total: results.len(),
            found,
            missing: results.len() - found,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_out_of_range_is_absent() {
        let sheet = TabularSheet::from_strings("S", &[vec!["a", "b"], vec!["c"]]);
        assert_eq!(sheet.cell(1, 1), &Cell::Absent);
        assert_eq!(sheet.cell(5, 0), &Cell::Absent);
        assert_eq!(sheet.cell(0, 1).as_text(), Some("b"));
    }

    #[test]
    fn test_cell_serde_as_option() {
        let json = serde_json::to_string(&vec![Cell::text("x"), Cell::Absent]).unwrap();
        assert_eq!(json, r#"["x",null]"#);
        let back: Vec<Cell> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![Cell::text("x"), Cell::Absent]);
    }

    #[test]
    fn test_found_notes() {
        let key = ReconciledKey::new("12345");
        let result = ReconciliationResult::found(
            &key,
            Provenance {
                sheet_name: "Sheet1".into(),
                column_name: "Order".into(),
                column_index: 1,
                row_index: 5,
                matched_value: "12345".into(),
            },
        );
        assert_eq!(result.notes, "Found in Sheet1 at B6");
        assert_eq!(result.status, MatchStatus::Found);
    }

    #[test]
    fn test_missing_has_empty_provenance() {
        let result = ReconciliationResult::missing(&ReconciledKey::new("99999"));
        assert_eq!(result.notes, "Missing");
        assert!(result.sheet_name.is_empty());
        assert_eq!(result.column_index, None);
        assert_eq!(result.row_index, None);
    }

    #[test]
    fn test_summary() {
        let key = ReconciledKey::new("1");
        let results = vec![
            ReconciliationResult::missing(&key),
            ReconciliationResult::missing(&key),
        ];
        let summary = ReconSummary::from_results(&results);
        assert_eq!(summary, ReconSummary { total: 2, found: 0, missing: 2 });
    }

    #[test]
    fn test_duplicate_row_numbers() {
        let group = DuplicateGroup {
            sheet_name: "S".into(),
            column_label: "Zlecenie".into(),
            value: "12345".into(),
            occurrences: vec![1, 2, 4],
        };
        assert_eq!(group.count(), 3);
        assert_eq!(group.row_numbers(), vec![2, 3, 5]);
    }
}
