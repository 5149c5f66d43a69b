//! sheet-recon
//!
//! コア（sheet-recon-common）の周りのアダプタ群:
//! CLI定義、設定ファイル、ブック/レコード読み込み、結果の書き出し、ログ初期化。

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod records;
pub mod workbook;

