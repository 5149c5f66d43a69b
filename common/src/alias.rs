//! 表示名マッピングとレコードフィールドのエイリアス解決
//!
//! - ColumnNameMapping: 結果表の見出しを利用者の呼び名に置き換える
//! - FieldMapper: 外部レコードのフィールド名のゆれを吸収して照合キーを作る

use crate::column::parse_column_identifier;
use crate::error::Result;
use crate::types::{ExternalRecord, ReconciledKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

/// 照合結果表の既定見出し（表示順）
pub const DEFAULT_RECON_HEADERS: [&str; 9] = [
    "Arkusz",
    "Płatnik",
    "Numer z DBF",
    "Stawka",
    "Czesci",
    "Status",
    "Kolumna",
    "Wiersz",
    "Uwagi",
];

/// 表示名の設定（元の名前→表示名 の対応表、または位置順の表示名リスト）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnNameMapping {
    Map(BTreeMap<String, String>),
    List(Vec<String>),
}

impl ColumnNameMapping {
    /// JSONファイルから読み込み
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// JSON文字列から読み込み
    pub fn from_json(json: &str) -> Result<Self> {
        let mapping: Self = serde_json::from_str(json)?;
        Ok(mapping)
    }

    /// CLI引数を解釈する
    ///
    /// JSONオブジェクト/配列、またはカンマ区切りのリスト。
    /// 空文字列やカンマを含まない不正JSONは None。
    pub fn parse_arg(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(mapping) = Self::from_json(trimmed) {
            return Some(mapping);
        }
        if trimmed.contains(',') {
            let names: Vec<String> = trimmed.split(',').map(|s| s.trim().to_string()).collect();
            return Some(ColumnNameMapping::List(names));
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ColumnNameMapping::Map(map) => map.is_empty(),
            ColumnNameMapping::List(list) => list.is_empty(),
        }
    }
}

/// 表示名比較用の畳み込み（NFC + trim + 小文字化）
fn fold_name(name: &str) -> String {
    name.nfc().collect::<String>().trim().to_lowercase()
}

/// 既定の見出しに表示名マッピングを適用する
///
/// 常に元の `default_names` を引くため、同じ設定で何度適用しても結果は同じ。
pub fn resolve_display_names<S: AsRef<str>>(
    default_names: &[S],
    mapping: Option<&ColumnNameMapping>,
) -> Vec<String> {
    let defaults = default_names.iter().map(|n| n.as_ref().to_string());
    let Some(mapping) = mapping.filter(|m| !m.is_empty()) else {
        return defaults.collect();
    };

    match mapping {
        ColumnNameMapping::List(names) => defaults
            .enumerate()
            .map(|(i, default)| names.get(i).cloned().unwrap_or(default))
            .collect(),
        ColumnNameMapping::Map(map) => defaults
            .map(|default| {
                let key = fold_name(&default);
                map.iter()
                    .find(|(from, _)| fold_name(from) == key)
                    .map(|(_, to)| to.clone())
                    .unwrap_or(default)
            })
            .collect(),
    }
}

/// 候補リストの先頭から順に、存在するフィールド名を探す（大文字小文字は無視、非ASCII含む）
///
/// 返すのは `available` 側の実際の名前。
pub fn detect_alias<'a, S: AsRef<str>>(available: &'a [S], candidates: &[&str]) -> Option<&'a str> {
    candidates.iter().find_map(|candidate| {
        let wanted = fold_name(candidate);
        available
            .iter()
            .map(AsRef::as_ref)
            .find(|name| fold_name(name) == wanted)
    })
}

/// フィールドごとの既定エイリアス（優先順）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAliases {
    pub numer: Vec<String>,
    pub stawka: Vec<String>,
    pub czesci: Vec<String>,
    pub platnik: Vec<String>,
}

impl Default for FieldAliases {
    fn default() -> Self {
        let list = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        Self {
            numer: list(&["NUMER", "NR", "NUMER_ZLEC", "ZLECENIE", "ORDER", "ORDER_NUM", "NUMBER"]),
            stawka: list(&["STAWKA", "STAW", "CENA", "RATE", "PRICE"]),
            czesci: list(&["CZESCI", "CZESC", "PARTS", "PART"]),
            platnik: list(&["PLATNIK", "PAYER"]),
        }
    }
}

/// 利用者指定のフィールド対応（設定ファイルの `recordFields`）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFieldMapping {
    pub numer_dbf: Option<String>,
    pub stawka: Option<String>,
    pub czesci: Option<String>,
    pub platnik: Option<String>,
}

/// 解決済みのフィールド名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFields {
    pub key: String,
    pub stawka: Option<String>,
    pub czesci: Option<String>,
    pub platnik: Option<String>,
}

/// 外部レコード → 照合キー
#[derive(Debug, Clone, Default)]
pub struct FieldMapper {
    pub aliases: FieldAliases,
    pub user: RecordFieldMapping,
    /// 明示されたキーフィールド（名前・列記号・1始まりの番号）
    pub key_field: Option<String>,
}

impl FieldMapper {
    pub fn new(user: RecordFieldMapping) -> Self {
        Self {
            user,
            ..Default::default()
        }
    }

    pub fn with_key_field(mut self, key_field: impl Into<String>) -> Self {
        self.key_field = Some(key_field.into());
        self
    }

    /// 利用者指定が存在すればそれを、なければエイリアス検出
    fn pick<S: AsRef<str>>(available: &[S], user: Option<&str>, aliases: &[String]) -> Option<String> {
        if let Some(name) = user.filter(|n| !n.trim().is_empty()) {
            if let Some(found) = detect_alias(available, &[name]) {
                return Some(found.to_string());
            }
        }
        let candidates: Vec<&str> = aliases.iter().map(String::as_str).collect();
        detect_alias(available, &candidates).map(str::to_string)
    }

    /// 明示キーフィールドの解決（名前で見つからなければ列指定として読む）
    fn explicit_key<S: AsRef<str>>(&self, available: &[S]) -> Result<Option<String>> {
        let Some(field) = self.key_field.as_deref() else {
            return Ok(None);
        };
        if let Some(found) = detect_alias(available, &[field]) {
            return Ok(Some(found.to_string()));
        }
        let index = parse_column_identifier(field)?;
        Ok(available.get(index).map(|n| n.as_ref().to_string()))
    }

    /// フィールド名一覧からキー・補助フィールドを決める
    ///
    /// キーフィールドが見つからなければ `Ok(None)`。
    pub fn resolve_fields<S: AsRef<str>>(&self, available: &[S]) -> Result<Option<ResolvedFields>> {
        let key = match self.explicit_key(available)? {
            Some(key) => Some(key),
            None if self.key_field.is_some() => None,
            None => Self::pick(available, self.user.numer_dbf.as_deref(), &self.aliases.numer),
        };
        let Some(key) = key else {
            return Ok(None);
        };

        Ok(Some(ResolvedFields {
            key,
            stawka: Self::pick(available, self.user.stawka.as_deref(), &self.aliases.stawka),
            czesci: Self::pick(available, self.user.czesci.as_deref(), &self.aliases.czesci),
            platnik: Self::pick(available, self.user.platnik.as_deref(), &self.aliases.platnik),
        }))
    }

    /// 1レコードを照合キーに変換する（キー値が空なら None）
    pub fn to_reconciled_key(&self, record: &ExternalRecord, fields: &ResolvedFields) -> Option<ReconciledKey> {
        let value = |name: &Option<String>| {
            name.as_deref()
                .and_then(|n| record.get(n))
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };

        let key_value = record.get(&fields.key).map(str::trim).unwrap_or_default();
        if key_value.is_empty() {
            return None;
        }

        Some(ReconciledKey {
            key_value: key_value.to_string(),
            stawka: value(&fields.stawka),
            czesci: value(&fields.czesci),
            platnik: value(&fields.platnik),
        })
    }

    /// 全レコードを変換する（入力順、キーが空・不明なレコードは除外）
    pub fn reconciled_keys(&self, records: &[ExternalRecord]) -> Result<Vec<ReconciledKey>> {
        let mut keys = Vec::with_capacity(records.len());
        let mut skipped = 0usize;

        for record in records {
            let names = record.field_names();
            let key = match self.resolve_fields(&names)? {
                Some(fields) => self.to_reconciled_key(record, &fields),
                None => None,
            };
            match key {
                Some(key) => keys.push(key),
                None => skipped += 1,
            }
        }

        debug!(keys = keys.len(), skipped, "records converted to keys");
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[(&str, &str)]) -> ExternalRecord {
        fields.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_display_names_absent_config() {
        let names = resolve_display_names(&DEFAULT_RECON_HEADERS, None);
        assert_eq!(names, DEFAULT_RECON_HEADERS.to_vec());

        let empty = ColumnNameMapping::List(vec![]);
        assert_eq!(resolve_display_names(&["A"], Some(&empty)), vec!["A"]);
    }

    #[test]
    fn test_display_names_list() {
        let mapping = ColumnNameMapping::List(vec!["Sheet".into(), "Payer".into()]);
        let names = resolve_display_names(&["Arkusz", "Płatnik", "Status"], Some(&mapping));
        assert_eq!(names, vec!["Sheet", "Payer", "Status"]);

        let long = ColumnNameMapping::List(vec!["1".into(), "2".into(), "3".into()]);
        assert_eq!(resolve_display_names(&["a", "b"], Some(&long)), vec!["1", "2"]);
    }

    #[test]
    fn test_display_names_map_case_insensitive() {
        let mapping = ColumnNameMapping::from_json(
            r#"{"NUMER Z DBF": "Order Number", " status ": "State"}"#,
        )
        .unwrap();
        let names = resolve_display_names(&DEFAULT_RECON_HEADERS, Some(&mapping));
        assert_eq!(names[2], "Order Number");
        assert_eq!(names[5], "State");
        assert_eq!(names[0], "Arkusz");
    }

    #[test]
    fn test_display_names_map_unicode_forms() {
        // 分解済みの "ó" をキーにしても合成済みの見出しに当たる
        let mapping = ColumnNameMapping::from_json("{\"Komo\u{0301}rka\": \"Cell\"}").unwrap();
        let names = resolve_display_names(&["Komórka", "Wiersz"], Some(&mapping));
        assert_eq!(names, vec!["Cell", "Wiersz"]);
    }

    #[test]
    fn test_display_names_idempotent() {
        let mapping = ColumnNameMapping::from_json(r#"{"Arkusz": "Status", "Status": "Arkusz"}"#).unwrap();
        let first = resolve_display_names(&DEFAULT_RECON_HEADERS, Some(&mapping));
        let second = resolve_display_names(&DEFAULT_RECON_HEADERS, Some(&mapping));
        assert_eq!(first, second);
        assert_eq!(first[0], "Status");
        assert_eq!(first[5], "Arkusz");
    }

    #[test]
    fn test_parse_arg() {
        assert_eq!(
            ColumnNameMapping::parse_arg(r#"["ID", "Nazwa"]"#),
            Some(ColumnNameMapping::List(vec!["ID".into(), "Nazwa".into()]))
        );
        assert_eq!(
            ColumnNameMapping::parse_arg(" ID arkusza , Nazwa , Komórka "),
            Some(ColumnNameMapping::List(vec![
                "ID arkusza".into(),
                "Nazwa".into(),
                "Komórka".into()
            ]))
        );
        assert!(matches!(
            ColumnNameMapping::parse_arg(r#"{"cell": "Komórka"}"#),
            Some(ColumnNameMapping::Map(_))
        ));
        assert_eq!(ColumnNameMapping::parse_arg(""), None);
        assert_eq!(ColumnNameMapping::parse_arg("not valid json"), None);
    }

    #[test]
    fn test_detect_alias_priority() {
        let available = ["nr", "Numer", "Cena"];
        assert_eq!(detect_alias(&available, &["NUMER", "NR"]), Some("Numer"));
        assert_eq!(detect_alias(&available, &["STAWKA", "CENA"]), Some("Cena"));
        assert_eq!(detect_alias(&available, &["PARTS"]), None);
    }

    #[test]
    fn test_detect_alias_folds_non_ascii_case() {
        let available = ["Numer", "PŁATNIK"];
        assert_eq!(detect_alias(&available, &["Płatnik"]), Some("PŁATNIK"));

        let mapper = FieldMapper::new(RecordFieldMapping {
            platnik: Some("płatnik".into()),
            ..Default::default()
        });
        let fields = mapper.resolve_fields(&available).unwrap().unwrap();
        assert_eq!(fields.platnik.as_deref(), Some("PŁATNIK"));
    }

    #[test]
    fn test_missing_aux_fields_are_empty() {
        let mapper = FieldMapper::default();
        let keys = mapper.reconciled_keys(&[record(&[("NUMER", "12345")])]).unwrap();
        assert_eq!(keys, vec![ReconciledKey::new("12345")]);
    }

    #[test]
    fn test_aliases_resolve_aux_fields() {
        let mapper = FieldMapper::default();
        let keys = mapper
            .reconciled_keys(&[record(&[
                ("order_num", " 77 "),
                ("Price", "150.00"),
                ("Part", "2"),
                ("Payer", "ACME"),
            ])])
            .unwrap();
        assert_eq!(keys[0].key_value, "77");
        assert_eq!(keys[0].stawka, "150.00");
        assert_eq!(keys[0].czesci, "2");
        assert_eq!(keys[0].platnik, "ACME");
    }

    #[test]
    fn test_user_mapping_takes_precedence() {
        let mapper = FieldMapper::new(RecordFieldMapping {
            numer_dbf: Some("ID_ZLEC".into()),
            stawka: Some("MISSING".into()),
            ..Default::default()
        });
        let keys = mapper
            .reconciled_keys(&[record(&[("NUMER", "1"), ("ID_ZLEC", "2"), ("STAWKA", "9")])])
            .unwrap();
        assert_eq!(keys[0].key_value, "2");
        // 指定フィールドが無ければエイリアス検出に戻る
        assert_eq!(keys[0].stawka, "9");
    }

    #[test]
    fn test_explicit_key_field_by_position() {
        let mapper = FieldMapper::default().with_key_field("B");
        let keys = mapper.reconciled_keys(&[record(&[("A1", "x"), ("B1", "y")])]).unwrap();
        assert_eq!(keys[0].key_value, "y");

        let mapper = FieldMapper::default().with_key_field("b1");
        let keys = mapper.reconciled_keys(&[record(&[("A1", "x"), ("B1", "y")])]).unwrap();
        assert_eq!(keys[0].key_value, "y");
    }

    #[test]
    fn test_empty_keys_skipped_in_order() {
        let mapper = FieldMapper::default();
        let keys = mapper
            .reconciled_keys(&[
                record(&[("NR", "3")]),
                record(&[("NR", "  ")]),
                record(&[("OTHER", "x")]),
                record(&[("NR", "1")]),
            ])
            .unwrap();
        let values: Vec<&str> = keys.iter().map(|k| k.key_value.as_str()).collect();
        assert_eq!(values, vec!["3", "1"]);
    }

    #[test]
    fn test_resolve_fields_no_key() {
        let mapper = FieldMapper::default();
        assert_eq!(mapper.resolve_fields(&["X", "Y"]).unwrap(), None);
    }
}
