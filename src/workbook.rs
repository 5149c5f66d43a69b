//! ブック読み込み
//!
//! - xlsx/xlsm/xls/ods: calamine で全シートを表示順に読む
//! - csv: ファイル名（拡張子なし）を名前とする1シート
//!
//! 空セルは `Cell::Absent`。範囲がA1から始まらないシートは左上を埋めて
//! 行・列位置をシート上の番地と一致させる。

use crate::error::{AppError, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use sheet_recon_common::{Cell, TabularSheet};
use std::path::Path;
use tracing::{debug, info};

/// 数値セルの文字列化（整数値は ".0" を付けない）
pub fn render_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Absent,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Text(render_number(*f)),
        Data::Int(i) => Cell::Text(i.to_string()),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        other => Cell::Text(other.to_string()),
    }
}

fn range_to_rows(range: &Range<Data>) -> Vec<Vec<Cell>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); start_row as usize];
    for source in range.rows() {
        let mut row = vec![Cell::Absent; start_col as usize];
        row.extend(source.iter().map(to_cell));
        while matches!(row.last(), Some(Cell::Absent)) {
            row.pop();
        }
        rows.push(row);
    }
    rows
}

fn read_spreadsheet(path: &Path) -> Result<Vec<TabularSheet>> {
    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names().to_vec();

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name)?;
        let rows = range_to_rows(&range);
        debug!(sheet = %name, rows = rows.len(), "sheet loaded");
        sheets.push(TabularSheet::new(name, rows));
    }
    Ok(sheets)
}

fn read_csv(path: &Path) -> Result<Vec<TabularSheet>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Vec<Cell> = record
            .iter()
            .map(|value| {
                if value.is_empty() {
                    Cell::Absent
                } else {
                    Cell::text(value)
                }
            })
            .collect();
        rows.push(row);
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1")
        .to_string();
    Ok(vec![TabularSheet::new(name, rows)])
}

/// 拡張子（小文字）
pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// ブックを読み込んで全シートを返す
pub fn load_workbook(path: &Path) -> Result<Vec<TabularSheet>> {
    if !path.exists() {
        return Err(AppError::FileNotFound(path.display().to_string()));
    }

    let sheets = match extension_of(path).as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_spreadsheet(path)?,
        "csv" => read_csv(path)?,
        other => return Err(AppError::UnsupportedFormat(other.to_string())),
    };

    info!(path = %path.display(), sheets = sheets.len(), "workbook loaded");
    Ok(sheets)
}

/// 指定シートだけを残す（ブックの表示順を保持）。空指定なら全シート
pub fn select_sheets(sheets: Vec<TabularSheet>, names: &[String]) -> Result<Vec<TabularSheet>> {
    if names.is_empty() {
        return Ok(sheets);
    }

    if let Some(missing) = names.iter().find(|n| !sheets.iter().any(|s| &s.name == *n)) {
        return Err(AppError::SheetNotFound(missing.clone()));
    }

    Ok(sheets
        .into_iter()
        .filter(|s| names.contains(&s.name))
        .collect())
}
