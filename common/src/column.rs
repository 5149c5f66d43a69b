//! 列の特定
//!
//! - 列記号 ⇔ 列番号の変換（A, B, …, Z, AA, …）
//! - 結合ヘッダーから対象列名に一致する全列を探す（同名列は全部返す）

use crate::error::{Error, Result};
use crate::header::{normalize_header, MergedHeader};
use crate::ignore::{matches_any, IgnorePattern};
use serde::{Deserialize, Serialize};

/// 0始まりの列番号を列記号に変換（0 → "A", 26 → "AA"）
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// 列記号を0始まりの列番号に変換（大文字小文字は無視）
pub fn column_index(letters: &str) -> Option<usize> {
    let letters = letters.trim();
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut result = 0usize;
    for c in letters.to_ascii_uppercase().bytes() {
        result = result.checked_mul(26)?.checked_add((c - b'A' + 1) as usize)?;
    }
    Some(result - 1)
}

/// 列指定を解釈する: 英字なら列記号、数字なら1始まりの位置
pub fn parse_column_identifier(identifier: &str) -> Result<usize> {
    let trimmed = identifier.trim();
    if let Some(index) = column_index(trimmed) {
        return Ok(index);
    }
    match trimmed.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(Error::InvalidColumn(identifier.to_string())),
    }
}

/// A1形式のセル番地
pub fn cell_address(row: usize, column: usize) -> String {
    format!("{}{}", column_letter(column), row + 1)
}

/// 対象列名に一致する列番号を昇順で返す
///
/// 列名の比較は正規化後の完全一致のみ。無視パターンは結合ヘッダーの
/// 表示文字列に対して適用する。空の列名はどの列にも一致しない。
pub fn resolve_columns(
    headers: &[MergedHeader],
    target_name: &str,
    ignore: &[IgnorePattern],
) -> Vec<usize> {
    let target = normalize_header(target_name);
    if target.is_empty() {
        return Vec::new();
    }

    headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.key == target)
        .filter(|(_, h)| !matches_any(ignore, &h.raw))
        .map(|(i, _)| i)
        .collect()
}

/// 無視パターンに当たらない全列
pub fn resolve_all_columns(headers: &[MergedHeader], ignore: &[IgnorePattern]) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !matches_any(ignore, &h.raw))
        .map(|(i, _)| i)
        .collect()
}

/// 検索対象列の選び方
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnSelector {
    /// 全列
    All,
    /// 列名（同名列はすべて）
    Named(String),
}

impl ColumnSelector {
    /// CLI入力から作成（"ALL" は全列）
    pub fn from_arg(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("all") {
            ColumnSelector::All
        } else {
            ColumnSelector::Named(value.to_string())
        }
    }

    pub fn resolve(&self, headers: &[MergedHeader], ignore: &[IgnorePattern]) -> Vec<usize> {
        match self {
            ColumnSelector::All => resolve_all_columns(headers, ignore),
            ColumnSelector::Named(name) => resolve_columns(headers, name, ignore),
        }
    }
}
