//! 無視パターン（「Ignoruj」欄）
//!
//! カンマ・セミコロン・改行区切りのテキストを解析し、
//! ヘッダーとセル値の両方に同じ規則で適用する。
//!
//! | 書式        | 種別      | 判定             |
//! |-------------|-----------|------------------|
//! | `temp`      | Substring | 部分一致         |
//! | `temp*`     | Prefix    | 前方一致         |
//! | `*temp`     | Suffix    | 後方一致         |
//! | `*temp*`    | Contains  | 部分一致         |
//!
//! 比較は trim + 小文字化のみ（`_` の置換やUnicode正規化はしない）。

use crate::types::Cell;
use serde::{Deserialize, Serialize};

/// パターン種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Substring,
    Prefix,
    Suffix,
    Contains,
}

/// 解析済みの無視パターン
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnorePattern {
    pub raw: String,
    pub kind: PatternKind,
    pub needle: String,
}

impl IgnorePattern {
    /// 1トークンを分類する（trim済みの前提）
    pub fn from_token(token: &str) -> Self {
        let starts = token.starts_with('*');
        let ends = token.ends_with('*');

        let (kind, needle) = if !token.contains('*') {
            (PatternKind::Substring, token)
        } else if starts && ends && token.chars().count() > 2 {
            (PatternKind::Contains, &token[1..token.len() - 1])
        } else if starts {
            (PatternKind::Suffix, &token[1..])
        } else if ends {
            (PatternKind::Prefix, &token[..token.len() - 1])
        } else {
            // 途中にだけ * がある場合は文字として扱う
            (PatternKind::Substring, token)
        };

        // "*" や "**" は残りの * も落として空needle = 全一致
        let needle = if needle.chars().all(|c| c == '*') {
            String::new()
        } else {
            needle.to_string()
        };

        Self {
            raw: token.to_string(),
            kind,
            needle,
        }
    }

    /// 候補文字列がこのパターンに一致するか
    pub fn matches(&self, candidate: &str) -> bool {
        let candidate = fold(candidate);
        let needle = fold(&self.needle);
        match self.kind {
            PatternKind::Substring | PatternKind::Contains => candidate.contains(&needle),
            PatternKind::Prefix => candidate.starts_with(&needle),
            PatternKind::Suffix => candidate.ends_with(&needle),
        }
    }
}

fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

/// 設定テキストをパターン列に変換する（空トークンは捨てる、順序保持）
pub fn parse_ignore_patterns(text: &str) -> Vec<IgnorePattern> {
    text.split([',', ';', '\n'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(IgnorePattern::from_token)
        .collect()
}

/// いずれかのパターンに一致するか（パターンが空なら常に false）
pub fn matches_any(patterns: &[IgnorePattern], candidate: &str) -> bool {
    patterns.iter().any(|p| p.matches(candidate))
}

/// セル値版。Absentは無視対象にならない
pub fn cell_is_ignored(patterns: &[IgnorePattern], cell: &Cell) -> bool {
    match cell.as_text() {
        Some(text) => matches_any(patterns, text),
        None => false,
    }
}
