//! 重複値の検出
//!
//! 対象列ごとに独立して、正規化したセル値でグループ化する。
//! 同名の列が複数ある場合はラベルに列記号を付けて区別する。

use crate::cancel::CancelToken;
use crate::column::{column_letter, resolve_columns};
use crate::error::Result;
use crate::header::{merge_sheet_headers, normalize_header, HeaderRows, NormalizedKey};
use crate::ignore::{matches_any, IgnorePattern};
use crate::types::{DuplicateGroup, TabularSheet};
use std::collections::HashMap;
use tracing::{debug, info};

/// 1シート分の重複グループ（列順 → 初出行順）
pub fn find_duplicates(
    sheet: &TabularSheet,
    target_name: &str,
    ignore: &[IgnorePattern],
    header_rows: &HeaderRows,
) -> Vec<DuplicateGroup> {
    let headers = merge_sheet_headers(sheet, header_rows);
    let columns = resolve_columns(&headers, target_name, ignore);
    let disambiguate = columns.len() > 1;

    let mut groups = Vec::new();
    for &column in &columns {
        let label = if disambiguate {
            format!("{} (kolumna {})", headers[column].raw, column_letter(column))
        } else {
            headers[column].raw.clone()
        };

        // 値キー → (表示値, 出現行)
        let mut order: Vec<NormalizedKey> = Vec::new();
        let mut seen: HashMap<NormalizedKey, (String, Vec<usize>)> = HashMap::new();

        for row in header_rows.data_start()..sheet.row_count() {
            let Some(value) = sheet.cell(row, column).as_text() else {
                continue;
            };
            let trimmed = value.trim();
            if trimmed.is_empty() || matches_any(ignore, value) {
                continue;
            }
            let key = normalize_header(trimmed);
            seen.entry(key.clone())
                .or_insert_with(|| {
                    order.push(key);
                    (trimmed.to_string(), Vec::new())
                })
                .1
                .push(row);
        }

        for key in order {
            if let Some((value, occurrences)) = seen.remove(&key) {
                if occurrences.len() > 1 {
                    groups.push(DuplicateGroup {
                        sheet_name: sheet.name.clone(),
                        column_label: label.clone(),
                        value,
                        occurrences,
                    });
                }
            }
        }
    }

    debug!(sheet = %sheet.name, columns = columns.len(), groups = groups.len(), "duplicates scanned");
    groups
}

/// 全シート分（シート順）
pub fn find_duplicates_in_sheets(
    sheets: &[TabularSheet],
    target_name: &str,
    ignore: &[IgnorePattern],
    header_rows: &HeaderRows,
) -> Vec<DuplicateGroup> {
    let groups: Vec<DuplicateGroup> = sheets
        .iter()
        .flat_map(|sheet| find_duplicates(sheet, target_name, ignore, header_rows))
        .collect();
    info!(sheets = sheets.len(), groups = groups.len(), "duplicate scan finished");
    groups
}

/// キャンセル可能版。キャンセル時は途中結果を捨てる
pub fn find_duplicates_in_sheets_cancellable(
    sheets: &[TabularSheet],
    target_name: &str,
    ignore: &[IgnorePattern],
    header_rows: &HeaderRows,
    cancel: &CancelToken,
) -> Result<Vec<DuplicateGroup>> {
    let mut groups = Vec::new();
    for sheet in sheets {
        cancel.check()?;
        groups.extend(find_duplicates(sheet, target_name, ignore, header_rows));
    }
    info!(sheets = sheets.len(), groups = groups.len(), "duplicate scan finished");
    Ok(groups)
}
