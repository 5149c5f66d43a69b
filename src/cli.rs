use crate::export::OutputFormat;
use clap::{Parser, Subcommand};
use sheet_recon_common::CompareMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sheet-recon")]
#[command(about = "複数タブの表データを列名で検索し、外部キーリストと照合するツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力（-v: info, -vv: debug, -vvv: trace）
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 列名で値を検索
    Search {
        /// ブック（xlsx/xlsm/xls/ods/csv）
        #[arg(required = true)]
        workbook: PathBuf,

        /// 対象列名（ALL で全列）
        #[arg(short, long)]
        column: String,

        /// 検索文字列
        #[arg(short, long)]
        query: String,

        /// 検索文字列を正規表現として扱う
        #[arg(long)]
        regex: bool,

        /// 大文字小文字を区別する
        #[arg(long)]
        case_sensitive: bool,

        /// 無視パターン（カンマ・セミコロン・改行区切り、* でワイルドカード）
        #[arg(short, long)]
        ignore: Option<String>,

        /// ヘッダー行（例: 1 / 1,2）
        #[arg(long)]
        header_rows: Option<String>,

        /// 対象シート（複数指定可、省略時は全シート）
        #[arg(short, long)]
        sheet: Vec<String>,

        /// 出力形式 (table/json/csv/xlsx)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,

        /// 出力ファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 列内の重複値を検出
    Duplicates {
        /// ブック（xlsx/xlsm/xls/ods/csv）
        #[arg(required = true)]
        workbook: PathBuf,

        /// 対象列名
        #[arg(short, long)]
        column: String,

        /// 無視パターン
        #[arg(short, long)]
        ignore: Option<String>,

        /// ヘッダー行（例: 1 / 1,2）
        #[arg(long)]
        header_rows: Option<String>,

        /// 対象シート（複数指定可）
        #[arg(short, long)]
        sheet: Vec<String>,

        /// 出力形式 (table/json/csv/xlsx)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,

        /// 出力ファイル
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 外部レコード（CSV/JSON）のキーをブックと照合
    Reconcile {
        /// ブック（xlsx/xlsm/xls/ods/csv）
        #[arg(required = true)]
        workbook: PathBuf,

        /// レコードファイル（csv/json）
        #[arg(short, long)]
        records: PathBuf,

        /// キーフィールド（名前・列記号・1始まりの番号、省略時は自動検出）
        #[arg(short, long)]
        key_field: Option<String>,

        /// 照合モード (exact/substring)
        #[arg(short, long)]
        mode: Option<CompareMode>,

        /// 対象列名（複数指定可、省略時は全列）
        #[arg(short, long)]
        column: Vec<String>,

        /// 対象シート（複数指定可）
        #[arg(short, long)]
        sheet: Vec<String>,

        /// 無視パターン
        #[arg(short, long)]
        ignore: Option<String>,

        /// ヘッダー行（例: 1 / 1,2）
        #[arg(long)]
        header_rows: Option<String>,

        /// 表示名マッピング（JSONオブジェクト/配列、またはカンマ区切り）
        #[arg(long)]
        column_names: Option<String>,

        /// 出力形式 (table/json/csv/xlsx)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,

        /// 出力ファイル
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 設定を表示
    Config {
        /// 有効な設定を表示
        #[arg(long)]
        show: bool,

        /// 設定ファイルのパスを表示
        #[arg(long)]
        path: bool,
    },
}
