//! 値検索
//!
//! 出力順は シート順 → 行順（上から）→ 列順（左から）で固定。
//! ヘッダー行より下の行だけを対象にする。

use crate::cancel::CancelToken;
use crate::column::ColumnSelector;
use crate::compare::normalize_number_string;
use crate::error::Result;
use crate::header::{merge_sheet_headers, HeaderRows};
use crate::ignore::{matches_any, IgnorePattern};
use crate::types::{SearchResult, TabularSheet};
use regex::{Regex, RegexBuilder};
use tracing::{debug, info};

/// 検索条件
#[derive(Debug, Clone)]
pub enum QueryPredicate {
    /// 部分一致
    Substring { needle: String, case_sensitive: bool },
    /// 正規表現（構築時にコンパイル済み）
    Regex(Regex),
}

impl QueryPredicate {
    /// 大文字小文字を区別しない部分一致
    pub fn substring(needle: impl Into<String>) -> Self {
        QueryPredicate::Substring {
            needle: needle.into(),
            case_sensitive: false,
        }
    }

    /// 正規表現をコンパイルする。不正なパターンは `Error::InvalidRegex`
    pub fn regex(pattern: &str, case_sensitive: bool) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()?;
        Ok(QueryPredicate::Regex(regex))
    }

    /// CLI引数から作成
    pub fn from_args(query: &str, use_regex: bool, case_sensitive: bool) -> Result<Self> {
        if use_regex {
            Self::regex(query, case_sensitive)
        } else {
            Ok(QueryPredicate::Substring {
                needle: query.to_string(),
                case_sensitive,
            })
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            QueryPredicate::Regex(regex) => regex.is_match(value),
            QueryPredicate::Substring {
                needle,
                case_sensitive,
            } => {
                let hit = if *case_sensitive {
                    value.contains(needle.as_str())
                } else {
                    value.to_lowercase().contains(&needle.to_lowercase())
                };
                hit || numeric_fallback(needle, value)
            }
        }
    }
}

/// "12 345" で "12345" を見つけるための数字列比較
fn numeric_fallback(needle: &str, value: &str) -> bool {
    let has_digit = |s: &str| s.chars().any(|c| c.is_ascii_digit());
    if !has_digit(needle) || !has_digit(value) {
        return false;
    }
    let needle = normalize_number_string(needle);
    if needle.is_empty() {
        return false;
    }
    normalize_number_string(value).contains(&needle)
}

/// 1シート分を検索する
pub fn search_sheet(
    sheet: &TabularSheet,
    column: &ColumnSelector,
    query: &QueryPredicate,
    ignore: &[IgnorePattern],
    header_rows: &HeaderRows,
) -> Vec<SearchResult> {
    let headers = merge_sheet_headers(sheet, header_rows);
    let columns = column.resolve(&headers, ignore);
    if columns.is_empty() {
        debug!(sheet = %sheet.name, "no matching columns");
        return Vec::new();
    }

    let mut results = Vec::new();
    for row_index in header_rows.data_start()..sheet.row_count() {
        for &column_index in &columns {
            let Some(value) = sheet.cell(row_index, column_index).as_text() else {
                continue;
            };
            if value.trim().is_empty() || matches_any(ignore, value) {
                continue;
            }
            if query.matches(value) {
                results.push(SearchResult {
                    sheet_name: sheet.name.clone(),
                    column_name: headers[column_index].display_name(column_index),
                    column_index,
                    row_index,
                    matched_value: value.to_string(),
                });
            }
        }
    }

    debug!(sheet = %sheet.name, columns = columns.len(), hits = results.len(), "sheet searched");
    results
}

/// 全シートを検索する
pub fn search(
    sheets: &[TabularSheet],
    column: &ColumnSelector,
    query: &QueryPredicate,
    ignore: &[IgnorePattern],
    header_rows: &HeaderRows,
) -> Vec<SearchResult> {
    let results: Vec<SearchResult> = sheets
        .iter()
        .flat_map(|sheet| search_sheet(sheet, column, query, ignore, header_rows))
        .collect();
    info!(sheets = sheets.len(), hits = results.len(), "search finished");
    results
}

/// キャンセル可能な検索。キャンセル時は途中結果を捨てて `Error::Cancelled`
pub fn search_cancellable(
    sheets: &[TabularSheet],
    column: &ColumnSelector,
    query: &QueryPredicate,
    ignore: &[IgnorePattern],
    header_rows: &HeaderRows,
    cancel: &CancelToken,
) -> Result<Vec<SearchResult>> {
    let mut results = Vec::new();
    for sheet in sheets {
        cancel.check()?;
        results.extend(search_sheet(sheet, column, query, ignore, header_rows));
    }
    info!(sheets = sheets.len(), hits = results.len(), "search finished");
    Ok(results)
}
