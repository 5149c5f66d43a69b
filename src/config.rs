use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use sheet_recon_common::{
    parse_ignore_patterns, ColumnNameMapping, CompareMode, HeaderRows, IgnorePattern,
    RecordFieldMapping,
};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 設定ファイル（~/.config/sheet-recon/settings.json）
///
/// 起動時に1回だけ読み込み、必要な処理に値として渡す。
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// 照合結果表の表示名
    pub column_names: Option<ColumnNameMapping>,
    /// レコードのフィールド対応
    pub record_fields: RecordFieldMapping,
    /// 既定のヘッダー行（"1" / "1,2"）
    pub header_rows: Option<String>,
    /// 既定の無視パターン
    pub ignore: Option<String>,
    /// 既定の照合モード
    pub mode: Option<CompareMode>,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let path = Self::settings_path()?;
        Self::load_from(&path)
    }

    /// 指定パスから読み込む。ファイルが無ければ既定値、壊れていれば警告して既定値
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "settings file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str::<Settings>(&content) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed settings file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn settings_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| AppError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("sheet-recon").join("settings.json"))
    }

    /// CLI指定 → 設定ファイル → "1" の順で決める
    pub fn header_rows(&self, cli: Option<&str>) -> Result<HeaderRows> {
        let text = cli.or(self.header_rows.as_deref()).unwrap_or("1");
        Ok(HeaderRows::parse(text)?)
    }

    pub fn ignore_patterns(&self, cli: Option<&str>) -> Vec<IgnorePattern> {
        cli.or(self.ignore.as_deref())
            .map(parse_ignore_patterns)
            .unwrap_or_default()
    }

    pub fn mode(&self, cli: Option<CompareMode>) -> CompareMode {
        cli.or(self.mode).unwrap_or_default()
    }
}
