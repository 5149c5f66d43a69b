//! ヘッダー正規化・複数行ヘッダーの結合
//!
//! 列名の表記ゆれ（大文字小文字、前後の空白、連続空白、`_` と空白、
//! 合成済み/分解済みのUnicode表現）を吸収した比較キーを作る。
//! 発音区別符号は畳み込まない（"ł" と "l" は別物）。

use crate::error::{Error, Result};
use crate::types::{Cell, TabularSheet};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// 比較専用の正規化キー（表示には使わない）
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// ヘッダー文字列を正規化する
///
/// `_` → 空白、NFC合成、小文字化、前後trim・連続空白の1個化。
/// 何度適用しても結果は変わらない。
pub fn normalize_header(header: &str) -> NormalizedKey {
    let composed: String = header.replace('_', " ").nfc().collect();
    let lowered = composed.to_lowercase();
    NormalizedKey(lowered.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// セルのヘッダー正規化（Absentは空キー）
pub fn normalize_cell(cell: &Cell) -> NormalizedKey {
    cell.as_text().map(normalize_header).unwrap_or_default()
}

/// ヘッダー行の指定（1始まり、順序付き、空は不可）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct HeaderRows(Vec<usize>);

impl HeaderRows {
    /// 行番号リストから作成。0行指定や0番は設定エラー
    pub fn new(rows: Vec<usize>) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::NoHeaderRows);
        }
        let mut unique = Vec::with_capacity(rows.len());
        for row in rows {
            if row == 0 {
                return Err(Error::InvalidHeaderRow(row.to_string()));
            }
            if !unique.contains(&row) {
                unique.push(row);
            }
        }
        Ok(Self(unique))
    }

    /// 単一ヘッダー行（1行目）
    pub fn first() -> Self {
        Self(vec![1])
    }

    /// "1" / "1,2" / "1, 2, 3" 形式の設定文字列を解析する
    pub fn parse(text: &str) -> Result<Self> {
        let mut rows = Vec::new();
        for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let row: usize = token
                .parse()
                .map_err(|_| Error::InvalidHeaderRow(token.to_string()))?;
            rows.push(row);
        }
        Self::new(rows)
    }

    /// 1始まりの行番号
    pub fn rows(&self) -> &[usize] {
        &self.0
    }

    /// データ行の開始位置（0始まり）= 最後のヘッダー行の次
    pub fn data_start(&self) -> usize {
        self.0.iter().copied().max().unwrap_or(1)
    }
}

impl Default for HeaderRows {
    fn default() -> Self {
        Self::first()
    }
}

impl TryFrom<Vec<usize>> for HeaderRows {
    type Error = Error;

    fn try_from(rows: Vec<usize>) -> Result<Self> {
        Self::new(rows)
    }
}

impl From<HeaderRows> for Vec<usize> {
    fn from(rows: HeaderRows) -> Self {
        rows.0
    }
}

/// 1列分の結合済みヘッダー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedHeader {
    /// 表示用（trim済み、大文字小文字は保持）
    pub raw: String,
    /// 比較用
    pub key: NormalizedKey,
}

impl MergedHeader {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let key = normalize_header(&raw);
        Self { raw, key }
    }

    /// 表示名。ヘッダーが空なら "Column C" 形式
    pub fn display_name(&self, column: usize) -> String {
        if self.raw.is_empty() {
            format!("Column {}", crate::column::column_letter(column))
        } else {
            self.raw.clone()
        }
    }
}

/// 指定ヘッダー行を列ごとに結合する
///
/// 列数は指定行の最大長。短い行の不足分や空セルは飛ばし、
/// 指定順に1個の空白で連結してから正規化する。
pub fn merge_header_rows(rows: &[Vec<Cell>], header_rows: &HeaderRows) -> Vec<MergedHeader> {
    let designated: Vec<&[Cell]> = header_rows
        .rows()
        .iter()
        .map(|&r| rows.get(r - 1).map(Vec::as_slice).unwrap_or(&[]))
        .collect();

    let column_count = designated.iter().map(|r| r.len()).max().unwrap_or(0);

    (0..column_count)
        .map(|column| {
            let parts: Vec<&str> = designated
                .iter()
                .filter_map(|row| row.get(column))
                .filter_map(Cell::as_text)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            MergedHeader::new(parts.join(" "))
        })
        .collect()
}

/// シートのヘッダーを結合する
pub fn merge_sheet_headers(sheet: &TabularSheet, header_rows: &HeaderRows) -> Vec<MergedHeader> {
    merge_header_rows(&sheet.rows, header_rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[Option<&str>]]) -> Vec<Vec<Cell>> {
        data.iter()
            .map(|r| r.iter().map(|c| Cell::from(c.map(String::from))).collect())
            .collect()
    }

    #[test]
    fn test_normalize_variants_equal() {
        let base = normalize_header("Numer zlecenia");
        assert_eq!(normalize_header("  numer zlecenia "), base);
        assert_eq!(normalize_header("NUMER_ZLECENIA"), base);
        assert_eq!(normalize_header("Numer   zlecenia"), base);
        assert_eq!(normalize_header("Numer_ _zlecenia"), base);
    }

    #[test]
    fn test_normalize_idempotent() {
        let once = normalize_header("  Stawka__Netto  ");
        let twice = normalize_header(once.as_str());
        assert_eq!(once, twice);
        assert_eq!(once.as_str(), "stawka netto");
    }

    #[test]
    fn test_normalize_canonical_composition() {
        // "ó" 合成済み / o + U+0301
        let composed = normalize_header("Uwagi dodatkowe ó");
        let decomposed = normalize_header("Uwagi dodatkowe o\u{0301}");
        assert_eq!(composed, decomposed);
    }

    #[test]
    fn test_normalize_keeps_diacritics() {
        assert_ne!(normalize_header("Płatnik"), normalize_header("Platnik"));
    }

    #[test]
    fn test_normalize_absent_is_empty() {
        assert!(normalize_cell(&Cell::Absent).is_empty());
    }

    #[test]
    fn test_header_rows_parse() {
        assert_eq!(HeaderRows::parse("1").unwrap().rows(), &[1]);
        assert_eq!(HeaderRows::parse("1,2").unwrap().rows(), &[1, 2]);
        assert_eq!(HeaderRows::parse(" 1, 2, 3 ").unwrap().rows(), &[1, 2, 3]);
        assert_eq!(HeaderRows::parse("2, 1, 2").unwrap().rows(), &[2, 1]);
    }

    #[test]
    fn test_header_rows_invalid() {
        assert!(matches!(HeaderRows::parse(""), Err(Error::NoHeaderRows)));
        assert!(matches!(HeaderRows::parse("  "), Err(Error::NoHeaderRows)));
        assert!(matches!(HeaderRows::parse("1, abc"), Err(Error::InvalidHeaderRow(t)) if t == "abc"));
        assert!(matches!(HeaderRows::parse("0"), Err(Error::InvalidHeaderRow(_))));
        assert!(matches!(HeaderRows::new(vec![]), Err(Error::NoHeaderRows)));
    }

    #[test]
    fn test_header_rows_data_start() {
        assert_eq!(HeaderRows::first().data_start(), 1);
        assert_eq!(HeaderRows::parse("2,1").unwrap().data_start(), 2);
    }

    #[test]
    fn test_merge_two_rows() {
        let data = rows(&[
            &[Some("First"), Some("Last")],
            &[Some("X"), Some("Y")],
        ]);
        let merged = merge_header_rows(&data, &HeaderRows::parse("1,2").unwrap());
        assert_eq!(merged[0].raw, "First X");
        assert_eq!(merged[1].raw, "Last Y");
        assert_eq!(merged[0].key.as_str(), "first x");
    }

    #[test]
    fn test_merge_skips_absent_and_pads_short_rows() {
        let data = rows(&[
            &[Some("Name"), None, Some("City"), Some("Extra")],
            &[None, Some("Age"), Some("Location")],
        ]);
        let merged = merge_header_rows(&data, &HeaderRows::parse("1,2").unwrap());
        let raw: Vec<&str> = merged.iter().map(|h| h.raw.as_str()).collect();
        assert_eq!(raw, vec!["Name", "Age", "City Location", "Extra"]);
    }

    #[test]
    fn test_merge_respects_designated_order() {
        let data = rows(&[&[Some("A")], &[Some("B")]]);
        let merged = merge_header_rows(&data, &HeaderRows::parse("2,1").unwrap());
        assert_eq!(merged[0].raw, "B A");
    }

    #[test]
    fn test_merge_normalizes_underscores() {
        let data = rows(&[
            &[Some("First_Name"), Some("Age  In")],
            &[Some("Last  Name"), Some("Years")],
        ]);
        let merged = merge_header_rows(&data, &HeaderRows::parse("1,2").unwrap());
        assert_eq!(merged[0].key.as_str(), "first name last name");
        assert_eq!(merged[1].key.as_str(), "age in years");
    }

    #[test]
    fn test_merge_missing_header_row() {
        let data = rows(&[&[Some("A"), Some("B")]]);
        let merged = merge_header_rows(&data, &HeaderRows::parse("1,3").unwrap());
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].raw, "B");
    }

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(MergedHeader::new("").display_name(2), "Column C");
        assert_eq!(MergedHeader::new("Stawka").display_name(2), "Stawka");
    }
}
