//! Sheet Recon Common Library
//!
//! 表データのヘッダー照合・無視パターン・重複検出・外部キー照合のコア。
//! ファイルの読み書きや画面出力は持たず、メモリ上の表だけを扱う。

pub mod alias;
pub mod cancel;
pub mod column;
pub mod compare;
pub mod duplicates;
pub mod error;
pub mod header;
pub mod ignore;
pub mod recon;
pub mod search;
pub mod types;

pub use alias::{
    detect_alias, resolve_display_names, ColumnNameMapping, FieldAliases, FieldMapper,
    RecordFieldMapping, ResolvedFields, DEFAULT_RECON_HEADERS,
};
pub use cancel::CancelToken;
pub use column::{
    cell_address, column_index, column_letter, parse_column_identifier, resolve_all_columns,
    resolve_columns, ColumnSelector,
};
pub use compare::{canonical_decimal, exact_equals, substring_matches, CompareMode};
pub use duplicates::{find_duplicates, find_duplicates_in_sheets, find_duplicates_in_sheets_cancellable};
pub use error::{Error, Result};
pub use header::{merge_header_rows, merge_sheet_headers, normalize_header, HeaderRows, MergedHeader, NormalizedKey};
pub use ignore::{matches_any, parse_ignore_patterns, IgnorePattern, PatternKind};
pub use recon::{reconcile, reconcile_cancellable, reconcile_with_progress, CellScan, ReconOptions};
pub use search::{search, search_cancellable, search_sheet, QueryPredicate};
pub use types::{
    Cell, DuplicateGroup, ExternalRecord, MatchStatus, Provenance, ReconSummary, ReconciledKey,
    ReconciliationResult, SearchResult, TabularSheet,
};
