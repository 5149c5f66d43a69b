pub mod excel;
pub mod table;
pub mod text;

use crate::error::{AppError, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use table::Table;
use tracing::info;

/// 出力形式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
    Xlsx,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "text" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "xlsx" | "excel" => Ok(OutputFormat::Xlsx),
            _ => Err(format!("Unknown format: {}. Use table, json, csv, or xlsx", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Xlsx => write!(f, "xlsx"),
        }
    }
}

/// 書き出し先（ファイル指定がなければ stdout）
fn with_output<F>(output: Option<&Path>, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    match output {
        Some(path) => {
            let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
            write(&mut file)?;
            file.flush()?;
            info!(path = %path.display(), "output written");
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            write(&mut lock)?;
        }
    }
    Ok(())
}

/// 結果を書き出す
///
/// - `table`: 画面表示用の表（table/csv/xlsx で使う）
/// - `json`: JSON出力する値
pub fn export_results<T: Serialize>(
    table: &Table,
    json: &T,
    format: OutputFormat,
    output: Option<&Path>,
    sheet_name: &str,
) -> Result<()> {
    match format {
        OutputFormat::Table => with_output(output, |w| {
            w.write_all(text::render_text(table).as_bytes())?;
            Ok(())
        }),
        OutputFormat::Csv => with_output(output, |w| text::write_csv(table, w)),
        OutputFormat::Json => with_output(output, |w| text::write_json(json, w)),
        OutputFormat::Xlsx => {
            let path = output.ok_or_else(|| {
                AppError::Config("xlsx 形式は --output の指定が必要です".into())
            })?;
            excel::generate_excel(table, path, sheet_name)?;
            info!(path = %path.display(), "xlsx written");
            Ok(())
        }
    }
}
