//! 外部キーリストと表データの照合
//!
//! キーごとに シート → 列（左から）→ 行（上から）の順で走査し、
//! 最初に一致したセルで Found が確定する。最後まで無ければ Missing。
//! 走査順は `CellScan` にまとめてあり、照合側はそれを消費するだけ。

use crate::cancel::CancelToken;
use crate::column::{resolve_all_columns, resolve_columns};
use crate::compare::CompareMode;
use crate::error::{Error, Result};
use crate::header::{merge_sheet_headers, HeaderRows, MergedHeader};
use crate::ignore::{matches_any, IgnorePattern};
use crate::types::{
    Provenance, ReconSummary, ReconciledKey, ReconciliationResult, TabularSheet,
};
use tracing::{debug, info};

/// 照合の設定
#[derive(Debug, Clone, Default)]
pub struct ReconOptions {
    pub mode: CompareMode,
    /// 対象列名。空なら全列
    pub columns: Vec<String>,
    pub ignore: Vec<IgnorePattern>,
    pub header_rows: HeaderRows,
}

/// シートごとの走査計画（ヘッダー結合と列解決は1回の照合で1回だけ）
#[derive(Debug)]
pub struct SheetPlan<'a> {
    pub sheet: &'a TabularSheet,
    pub headers: Vec<MergedHeader>,
    pub columns: Vec<usize>,
    pub data_start: usize,
}

impl<'a> SheetPlan<'a> {
    pub fn new(sheet: &'a TabularSheet, options: &ReconOptions) -> Self {
        let headers = merge_sheet_headers(sheet, &options.header_rows);
        let columns = if options.columns.is_empty() {
            resolve_all_columns(&headers, &options.ignore)
        } else {
            let mut columns: Vec<usize> = options
                .columns
                .iter()
                .flat_map(|name| resolve_columns(&headers, name, &options.ignore))
                .collect();
            columns.sort_unstable();
            columns.dedup();
            columns
        };
        Self {
            sheet,
            headers,
            columns,
            data_start: options.header_rows.data_start(),
        }
    }

    fn column_name(&self, column: usize) -> String {
        self.headers
            .get(column)
            .map(|h| h.display_name(column))
            .unwrap_or_else(|| MergedHeader::new("").display_name(column))
    }
}

/// 走査対象のセル1個
#[derive(Debug, Clone, Copy)]
pub struct ScanCell<'a> {
    pub plan: &'a SheetPlan<'a>,
    pub column: usize,
    pub row: usize,
    pub value: &'a str,
}

impl ScanCell<'_> {
    fn provenance(&self) -> Provenance {
        Provenance {
            sheet_name: self.plan.sheet.name.clone(),
            column_name: self.plan.column_name(self.column),
            column_index: self.column,
            row_index: self.row,
            matched_value: self.value.to_string(),
        }
    }
}

/// (シート, 列, 行) の順にセルを返す遅延イテレータ
///
/// 値のないセルと無視パターンに当たる値は飛ばす。キャンセルはシートに
/// 入るときだけ確認し、キャンセル済みなら以降は何も返さない。
pub struct CellScan<'a> {
    plans: &'a [SheetPlan<'a>],
    ignore: &'a [IgnorePattern],
    cancel: Option<&'a CancelToken>,
    sheet: usize,
    column: usize,
    row: usize,
    entered: bool,
    cancelled: bool,
}

impl<'a> CellScan<'a> {
    pub fn new(plans: &'a [SheetPlan<'a>], ignore: &'a [IgnorePattern]) -> Self {
        Self {
            plans,
            ignore,
            cancel: None,
            sheet: 0,
            column: 0,
            row: 0,
            entered: false,
            cancelled: false,
        }
    }

    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// シート境界でキャンセルを検出して止まったか
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl<'a> Iterator for CellScan<'a> {
    type Item = ScanCell<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.cancelled {
                return None;
            }
            let plan = self.plans.get(self.sheet)?;

            if !self.entered {
                if self.cancel.is_some_and(CancelToken::is_cancelled) {
                    self.cancelled = true;
                    return None;
                }
                self.entered = true;
                self.column = 0;
                self.row = plan.data_start;
            }

            let Some(&column) = plan.columns.get(self.column) else {
                self.sheet += 1;
                self.entered = false;
                continue;
            };

            if self.row >= plan.sheet.row_count() {
                self.column += 1;
                self.row = plan.data_start;
                continue;
            }

            let row = self.row;
            self.row += 1;

            let Some(value) = plan.sheet.cell(row, column).as_text() else {
                continue;
            };
            if matches_any(self.ignore, value) {
                continue;
            }
            return Some(ScanCell {
                plan,
                column,
                row,
                value,
            });
        }
    }
}

/// シートごとの走査計画を作る（シート順を保持）
pub fn plan_sheets<'a>(sheets: &'a [TabularSheet], options: &ReconOptions) -> Vec<SheetPlan<'a>> {
    sheets
        .iter()
        .map(|sheet| {
            let plan = SheetPlan::new(sheet, options);
            debug!(sheet = %sheet.name, columns = plan.columns.len(), "sheet planned");
            plan
        })
        .collect()
}

fn settle(key: &ReconciledKey, hit: Option<ScanCell<'_>>) -> ReconciliationResult {
    match hit {
        Some(cell) => ReconciliationResult::found(key, cell.provenance()),
        None => ReconciliationResult::missing(key),
    }
}

fn log_summary(results: &[ReconciliationResult]) {
    let summary = ReconSummary::from_results(results);
    info!(
        total = summary.total,
        found = summary.found,
        missing = summary.missing,
        "reconciliation finished"
    );
}

/// 全キーを照合する（結果はキーの入力順）
pub fn reconcile(
    keys: &[ReconciledKey],
    sheets: &[TabularSheet],
    options: &ReconOptions,
) -> Vec<ReconciliationResult> {
    let plans = plan_sheets(sheets, options);
    let results: Vec<ReconciliationResult> = keys
        .iter()
        .map(|key| {
            let hit = CellScan::new(&plans, &options.ignore)
                .find(|cell| options.mode.matches(&key.key_value, cell.value));
            settle(key, hit)
        })
        .collect();
    log_summary(&results);
    results
}

/// 照合（キーごとに進捗を通知）
///
/// キャンセル時は途中結果を捨てて `Error::Cancelled`。
pub fn reconcile_with_progress<F>(
    keys: &[ReconciledKey],
    sheets: &[TabularSheet],
    options: &ReconOptions,
    cancel: &CancelToken,
    mut on_result: F,
) -> Result<Vec<ReconciliationResult>>
where
    F: FnMut(&ReconciliationResult),
{
    let plans = plan_sheets(sheets, options);
    let mut results = Vec::with_capacity(keys.len());

    for key in keys {
        let mut scan = CellScan::new(&plans, &options.ignore).with_cancel(cancel);
        let hit = scan.find(|cell| options.mode.matches(&key.key_value, cell.value));
        if scan.was_cancelled() {
            debug!(completed = results.len(), "reconciliation cancelled");
            return Err(Error::Cancelled);
        }
        let result = settle(key, hit);
        on_result(&result);
        results.push(result);
    }

    log_summary(&results);
    Ok(results)
}

/// キャンセル可能な照合
pub fn reconcile_cancellable(
    keys: &[ReconciledKey],
    sheets: &[TabularSheet],
    options: &ReconOptions,
    cancel: &CancelToken,
) -> Result<Vec<ReconciliationResult>> {
    reconcile_with_progress(keys, sheets, options, cancel, |_| {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ignore::parse_ignore_patterns;
    use crate::types::MatchStatus;

    fn sheet(name: &str, rows: &[&[&str]]) -> TabularSheet {
        let rows: Vec<Vec<&str>> = rows.iter().map(|r| r.to_vec()).collect();
        TabularSheet::from_strings(name, &rows)
    }

    fn keys(values: &[&str]) -> Vec<ReconciledKey> {
        values.iter().map(|v| ReconciledKey::new(*v)).collect()
    }

    #[test]
    fn test_found_and_missing_in_key_order() {
        let s = sheet(
            "Sheet1",
            &[
                &["Lp", "Zlecenie"],
                &["1", "100"],
                &["2", "200"],
                &["3", "300"],
                &["4", "400"],
                &["5", "12345"],
            ],
        );
        let results = reconcile(&keys(&["12345", "99999"]), &[s], &ReconOptions::default());
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status, MatchStatus::Found);
        assert_eq!(results[0].column_index, Some(1));
        assert_eq!(results[0].row_index, Some(5));
        assert_eq!(results[0].column_name, "Zlecenie");
        assert_eq!(results[0].notes, "Found in Sheet1 at B6");
        assert_eq!(results[1].status, MatchStatus::Missing);
        assert_eq!(results[1].notes, "Missing");
    }

    #[test]
    fn test_column_major_first_match_wins() {
        // A3 と B2 の両方に一致 → 列順が優先で A3
        let s = sheet("S", &[&["A", "B"], &["x", "7"], &["7", "y"]]);
        let results = reconcile(&keys(&["7"]), &[s], &ReconOptions::default());
        assert_eq!(results[0].column_index, Some(0));
        assert_eq!(results[0].row_index, Some(2));
    }

    #[test]
    fn test_sheet_order_precedence() {
        let a = sheet("A", &[&["Nr"], &["5"]]);
        let b = sheet("B", &[&["Nr"], &["5"]]);
        let results = reconcile(&keys(&["5"]), &[b, a], &ReconOptions::default());
        assert_eq!(results[0].sheet_name, "B");
    }

    #[test]
    fn test_exact_mode_numeric() {
        let s = sheet("S", &[&["Nr"], &["12 345,00"]]);
        let results = reconcile(&keys(&["12345"]), &[s], &ReconOptions::default());
        assert!(results[0].is_found());
        assert_eq!(results[0].matched_value, "12 345,00");
    }

    #[test]
    fn test_substring_mode() {
        let s = sheet("S", &[&["Opis"], &["Zlecenie 123/2024"]]);
        let exact = reconcile(&keys(&["123"]), std::slice::from_ref(&s), &ReconOptions::default());
        assert!(!exact[0].is_found());

        let options = ReconOptions {
            mode: CompareMode::Substring,
            ..Default::default()
        };
        let sub = reconcile(&keys(&["123"]), &[s], &options);
        assert!(sub[0].is_found());
    }

    #[test]
    fn test_restricted_columns() {
        let s = sheet(
            "S",
            &[&["Uwagi", "Zlecenie", "Inne", "Zlecenie"], &["5", "1", "5", "5"]],
        );
        let options = ReconOptions {
            columns: vec!["zlecenie".into()],
            ..Default::default()
        };
        let results = reconcile(&keys(&["5"]), &[s], &options);
        assert_eq!(results[0].column_index, Some(3));
        assert_eq!(results[0].notes, "Found in S at D2");
    }

    #[test]
    fn test_header_row_not_matched() {
        let s = sheet("S", &[&["12345"], &["x"]]);
        let results = reconcile(&keys(&["12345"]), &[s], &ReconOptions::default());
        assert!(!results[0].is_found());
    }

    #[test]
    fn test_ignore_headers_and_values() {
        let s = sheet("S", &[&["Old_Nr", "Nr"], &["5", "x"], &["y", "5 temp"]]);
        let options = ReconOptions {
            mode: CompareMode::Substring,
            ignore: parse_ignore_patterns("old*, *temp"),
            ..Default::default()
        };
        let results = reconcile(&keys(&["5"]), &[s], &options);
        assert!(!results[0].is_found());
    }

    #[test]
    fn test_unnamed_column_name() {
        let s = sheet("S", &[&["", "Nr"], &["9", ""]]);
        let results = reconcile(&keys(&["9"]), &[s], &ReconOptions::default());
        assert_eq!(results[0].column_name, "Column A");
    }

    #[test]
    fn test_aux_values_carried() {
        let s = sheet("S", &[&["Nr"]]);
        let key = ReconciledKey {
            key_value: "1".into(),
            stawka: "150".into(),
            czesci: "2".into(),
            platnik: "ACME".into(),
        };
        let results = reconcile(&[key], &[s], &ReconOptions::default());
        assert_eq!(results[0].stawka, "150");
        assert_eq!(results[0].czesci, "2");
        assert_eq!(results[0].platnik, "ACME");
        assert_eq!(results[0].dbf_value, "1");
    }

    #[test]
    fn test_scan_order() {
        let s1 = sheet("S1", &[&["A", "B"], &["a2", "b2"], &["a3", "b3"]]);
        let s2 = sheet("S2", &[&["A"], &["c2"]]);
        let sheets = [s1, s2];
        let options = ReconOptions::default();
        let plans = plan_sheets(&sheets, &options);
        let values: Vec<&str> = CellScan::new(&plans, &[]).map(|c| c.value).collect();
        assert_eq!(values, vec!["a2", "a3", "b2", "b3", "c2"]);
    }

    #[test]
    fn test_cancelled_reconcile() {
        let s = sheet("S", &[&["Nr"], &["1"]]);
        let token = CancelToken::new();
        token.cancel();
        let result = reconcile_cancellable(&keys(&["1"]), &[s], &ReconOptions::default(), &token);
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_progress_callback() {
        let s = sheet("S", &[&["Nr"], &["1"]]);
        let token = CancelToken::new();
        let mut seen = Vec::new();
        let results = reconcile_with_progress(
            &keys(&["1", "2"]),
            &[s],
            &ReconOptions::default(),
            &token,
            |r| seen.push(r.status),
        )
        .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(seen, vec![MatchStatus::Found, MatchStatus::Missing]);
    }

    #[test]
    fn test_no_sheets_all_missing() {
        let results = reconcile(&keys(&["1", "2"]), &[], &ReconOptions::default());
        assert!(results.iter().all(|r| !r.is_found()));
    }

    #[test]
    fn test_long_numeric_keys_differing_in_last_digit() {
        let s = sheet("S", &[&["Nr"], &["12345678901234567890"], &["12345678901234567891"]]);
        let results = reconcile(&keys(&["12345678901234567891"]), &[s], &ReconOptions::default());

        assert_eq!(results[0].status, MatchStatus::Found);
        assert_eq!(results[0].notes, "Found in S at A3");
    }
}
