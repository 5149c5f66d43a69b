//! 外部レコードの読み込み（CSV / JSON）

use crate::error::{AppError, Result};
use crate::workbook::{extension_of, render_number};
use serde_json::Value;
use sheet_recon_common::ExternalRecord;
use std::path::Path;
use tracing::info;

/// CSV: 1行目がフィールド名。空欄は値なし
fn read_csv_records(path: &Path) -> Result<Vec<ExternalRecord>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let fields = headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = row.get(i).filter(|v| !v.is_empty()).map(str::to_string);
                (name.clone(), value)
            })
            .collect();
        records.push(ExternalRecord::new(fields));
    }
    Ok(records)
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if n.is_f64() => render_number(f),
            _ => n.to_string(),
        }),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// JSON: オブジェクトの配列（フィールド順は記述順）
fn read_json_records(path: &Path) -> Result<Vec<ExternalRecord>> {
    let content = std::fs::read_to_string(path)?;
    let items: Vec<serde_json::Map<String, Value>> = serde_json::from_str(&content)?;

    Ok(items
        .iter()
        .map(|item| {
            ExternalRecord::new(
                item.iter()
                    .map(|(name, value)| (name.clone(), render_value(value)))
                    .collect(),
            )
        })
        .collect())
}

/// レコードファイルを読み込む
pub fn load_records(path: &Path) -> Result<Vec<ExternalRecord>> {
    if !path.exists() {
        return Err(AppError::FileNotFound(path.display().to_string()));
    }

    let records = match extension_of(path).as_str() {
        "csv" => read_csv_records(path)?,
        "json" => read_json_records(path)?,
        other => return Err(AppError::UnsupportedFormat(other.to_string())),
    };

    info!(path = %path.display(), records = records.len(), "records loaded");
    Ok(records)
}
