//! Excel出力（rust_xlsxwriter）
//!
//! 結果表を1シートに書き出す。見出し行は固定表示、列幅は内容に合わせる。

use super::table::Table;
use crate::error::Result;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use serde_json::Value;
use std::path::Path;

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_color(Color::RGB(0x333333))
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xAAAAAA))
}

fn value_format() -> Format {
    Format::new()
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xCCCCCC))
}

fn write_table(worksheet: &mut Worksheet, table: &Table) -> Result<()> {
    let header = header_format();
    let value = value_format();

    for (col, name) in table.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header)?;
    }

    for (i, row) in table.rows.iter().enumerate() {
        let row_num = (i + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Value::Null => {
                    worksheet.write_blank(row_num, col, &value)?;
                }
                Value::Number(n) => match n.as_f64() {
                    Some(f) => {
                        worksheet.write_number_with_format(row_num, col, f, &value)?;
                    }
                    None => {
                        worksheet.write_string_with_format(row_num, col, n.to_string(), &value)?;
                    }
                },
                Value::String(s) => {
                    worksheet.write_string_with_format(row_num, col, s, &value)?;
                }
                other => {
                    worksheet.write_string_with_format(row_num, col, other.to_string(), &value)?;
                }
            }
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofit();
    Ok(())
}

/// 結果表を xlsx として保存
pub fn generate_excel(table: &Table, output_path: &Path, sheet_name: &str) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;
    write_table(worksheet, table)?;
    workbook.save(output_path)?;
    Ok(())
}
