//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    /// ヘッダー行が1つも指定されていない
    #[error("Config error: at least one header row must be designated")]
    NoHeaderRows,

    #[error("Config error: invalid header row '{0}' (expected a positive row number)")]
    InvalidHeaderRow(String),

    #[error("Invalid column identifier: '{0}'")]
    InvalidColumn(String),

    #[error("Invalid regular expression: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// キャンセルされた（部分結果は破棄済み）
    #[error("Operation cancelled")]
    Cancelled,
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
