//! 値の一致判定（照合用）
//!
//! - Exact: trim + 空白の1個化 + 小文字化。両方が数値として読めれば10進の正準形で比較
//! - Substring: trim + 小文字化のみ。どちらかがもう一方を含めば一致

use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static::lazy_static! {
    static ref DECIMAL_RE: Regex = Regex::new(r"^[+-]?\d+(\.\d+)?$").unwrap();
    static ref NON_NUMERIC_RE: Regex = Regex::new(r"[^\d.\-]").unwrap();
}

/// 桁区切りとして扱う文字（空白類・アポストロフィ）
fn is_grouping_char(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\u{00A0}' | '\u{202F}' | '\u{2009}' | '\'' | '\u{2019}')
}

/// 桁区切りを除いた10進数の正準形（例: "-001 234,50" → "-1234.5"）
///
/// `,` と `.` が両方あれば後ろにある方を小数点とみなす。
/// `,` だけなら1個のときは小数点、複数なら桁区切り（`.` も同様）。
/// 桁数に上限はない。長い番号同士も1桁違えば別の値になる。
pub fn canonical_decimal(value: &str) -> Option<String> {
    let cleaned: String = value.chars().filter(|c| !is_grouping_char(*c)).collect();
    if cleaned.is_empty() {
        return None;
    }

    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');
    let canonical = match (last_comma, last_dot) {
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) if cleaned.matches(',').count() == 1 => cleaned.replace(',', "."),
        (Some(_), None) => cleaned.replace(',', ""),
        (None, Some(_)) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned,
    };

    if !DECIMAL_RE.is_match(&canonical) {
        return None;
    }

    let (negative, unsigned) = match canonical.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, canonical.trim_start_matches('+')),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let int_part = int_part.trim_start_matches('0');
    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::with_capacity(unsigned.len() + 1);
    if negative && (int_part != "0" || !frac_part.is_empty()) {
        out.push('-');
    }
    out.push_str(int_part);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    Some(out)
}

/// 桁区切りを除いて10進数として解釈する（f64 に丸める）
pub fn parse_decimal(value: &str) -> Option<f64> {
    canonical_decimal(value)?.parse::<f64>().ok()
}

/// 数字列の正規化（空白・NBSP除去、`,`→`.`、数字/`.`/`-` 以外を除去）
///
/// 検索時の数値フォールバック用。何も残らなければ空文字列。
pub fn normalize_number_string(value: &str) -> String {
    let without_spaces: String = value
        .chars()
        .filter(|c| !matches!(c, '\u{00A0}' | '\u{202F}' | ' '))
        .collect();
    let dotted = without_spaces.replace(',', ".");
    NON_NUMERIC_RE.replace_all(&dotted, "").into_owned()
}

fn collapse(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 完全一致（数値は区切り文字を無視して数値比較）
pub fn exact_equals(a: &str, b: &str) -> bool {
    let a = collapse(a);
    let b = collapse(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    match (canonical_decimal(&a), canonical_decimal(&b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// 部分一致（双方向）
pub fn substring_matches(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

/// 照合モード
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareMode {
    #[default]
    Exact,
    Substring,
}

impl CompareMode {
    pub fn matches(self, key: &str, cell: &str) -> bool {
        match self {
            CompareMode::Exact => exact_equals(key, cell),
            CompareMode::Substring => substring_matches(key, cell),
        }
    }
}

impl std::str::FromStr for CompareMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" | "e" => Ok(CompareMode::Exact),
            "substring" | "sub" | "s" => Ok(CompareMode::Substring),
            _ => Err(format!("Unknown mode: {}. Use exact or substring", s)),
        }
    }
}

impl std::fmt::Display for CompareMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareMode::Exact => write!(f, "exact"),
            CompareMode::Substring => write!(f, "substring"),
        }
    }
}
