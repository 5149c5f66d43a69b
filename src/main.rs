use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use sheet_recon::cli::{Cli, Commands};
use sheet_recon::config::Settings;
use sheet_recon::error::{AppError, Result};
use sheet_recon::export::{self, table};
use sheet_recon::logging::{init_logging, LogConfig};
use sheet_recon::{records, workbook};
use sheet_recon_common::{
    find_duplicates_in_sheets, reconcile_with_progress, search, CancelToken, ColumnNameMapping,
    ColumnSelector, FieldMapper, QueryPredicate, ReconOptions, ReconSummary,
};
use std::io::IsTerminal;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_verbosity(cli.verbose).with_ansi(std::io::stderr().is_terminal()));
    let settings = Settings::load()?;

    match cli.command {
        Commands::Search {
            workbook: path,
            column,
            query,
            regex,
            case_sensitive,
            ignore,
            header_rows,
            sheet,
            format,
            output,
        } => {
            eprintln!("🔎 sheet-recon - 検索\n");

            let header_rows = settings.header_rows(header_rows.as_deref())?;
            let ignore = settings.ignore_patterns(ignore.as_deref());
            let query = QueryPredicate::from_args(&query, regex, case_sensitive)?;

            eprintln!("[1/2] ブックを読み込み中...");
            let sheets = workbook::select_sheets(workbook::load_workbook(&path)?, &sheet)?;
            eprintln!("✔ {}シートを読み込み\n", sheets.len());

            eprintln!("[2/2] 検索中...");
            let selector = ColumnSelector::from_arg(&column);
            let results = search(&sheets, &selector, &query, &ignore, &header_rows);
            eprintln!("✔ {}件ヒット\n", results.len());

            export::export_results(
                &table::search_table(&results),
                &results,
                format,
                output.as_deref(),
                "Wyniki",
            )?;
        }

        Commands::Duplicates {
            workbook: path,
            column,
            ignore,
            header_rows,
            sheet,
            format,
            output,
        } => {
            eprintln!("🔁 sheet-recon - 重複検出\n");

            let header_rows = settings.header_rows(header_rows.as_deref())?;
            let ignore = settings.ignore_patterns(ignore.as_deref());

            eprintln!("[1/2] ブックを読み込み中...");
            let sheets = workbook::select_sheets(workbook::load_workbook(&path)?, &sheet)?;
            eprintln!("✔ {}シートを読み込み\n", sheets.len());

            eprintln!("[2/2] 重複を検出中...");
            let groups = find_duplicates_in_sheets(&sheets, &column, &ignore, &header_rows);
            eprintln!("✔ {}件の重複グループ\n", groups.len());

            export::export_results(
                &table::duplicates_table(&groups),
                &groups,
                format,
                output.as_deref(),
                "Duplikaty",
            )?;
        }

        Commands::Reconcile {
            workbook: path,
            records: records_path,
            key_field,
            mode,
            column,
            sheet,
            ignore,
            header_rows,
            column_names,
            format,
            output,
        } => {
            eprintln!("📋 sheet-recon - 照合\n");

            let options = ReconOptions {
                mode: settings.mode(mode),
                columns: column,
                ignore: settings.ignore_patterns(ignore.as_deref()),
                header_rows: settings.header_rows(header_rows.as_deref())?,
            };
            let mapping = match column_names.as_deref() {
                Some(arg) => ColumnNameMapping::parse_arg(arg),
                None => settings.column_names.clone(),
            };

            // 1. レコード
            eprintln!("[1/3] レコードを読み込み中...");
            let records = records::load_records(&records_path)?;
            let mut mapper = FieldMapper::new(settings.record_fields.clone());
            if let Some(field) = key_field {
                mapper = mapper.with_key_field(field);
            }
            if let Some(first) = records.first() {
                if mapper.resolve_fields(&first.field_names())?.is_none() {
                    return Err(AppError::FieldNotFound(first.field_names().join(", ")));
                }
            }
            let keys = mapper.reconciled_keys(&records)?;
            eprintln!("✔ {}件のキー（{}レコード）\n", keys.len(), records.len());

            // 2. ブック
            eprintln!("[2/3] ブックを読み込み中...");
            let sheets = workbook::select_sheets(workbook::load_workbook(&path)?, &sheet)?;
            eprintln!("✔ {}シートを読み込み\n", sheets.len());

            // 3. 照合
            eprintln!("[3/3] 照合中... (モード: {})", options.mode);
            let progress = ProgressBar::new(keys.len() as u64);
            if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}") {
                progress.set_style(style);
            }
            let cancel = CancelToken::new();
            let results = reconcile_with_progress(&keys, &sheets, &options, &cancel, |result| {
                progress.set_message(result.dbf_value.clone());
                progress.inc(1);
            })?;
            progress.finish_and_clear();

            let summary = ReconSummary::from_results(&results);
            eprintln!(
                "✔ 照合完了: {}件中 Found {} / Missing {}\n",
                summary.total, summary.found, summary.missing
            );

            let display = match format {
                export::OutputFormat::Csv => table::recon_export_table(&results, mapping.as_ref()),
                _ => table::recon_display_table(&results, mapping.as_ref()),
            };
            let json = table::recon_export_table(&results, mapping.as_ref()).to_json();
            export::export_results(&display, &json, format, output.as_deref(), "Quadra")?;
        }

        Commands::Config { show, path } => {
            if path || !show {
                println!("{}", Settings::settings_path()?.display());
            }

            if show {
                println!("設定:");
                println!("{}", serde_json::to_string_pretty(&settings)?);
            }
        }
    }

    Ok(())
}
