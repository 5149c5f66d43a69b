use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("未対応のファイル形式です: {0}（xlsx/xlsm/xls/ods/csv/json）")]
    UnsupportedFormat(String),

    #[error("シートが見つかりません: {0}")]
    SheetNotFound(String),

    #[error("キーフィールドが見つかりません（利用可能: {0}）。--key-field で指定してください")]
    FieldNotFound(String),

    #[error(transparent)]
    Core(#[from] sheet_recon_common::Error),

    #[error("ブック読み込みエラー: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("CSVエラー: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(#[from] rust_xlsxwriter::XlsxError),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
