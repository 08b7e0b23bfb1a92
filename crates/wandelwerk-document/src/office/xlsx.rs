// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spreadsheets — every sheet of an .xlsx/.xls workbook as rows of display
// strings, and a single-sheet .xlsx writer.

use std::fmt::Write as _;
use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use tracing::{debug, instrument, warn};
use wandelwerk_core::error::{Result, WandelwerkError};

use super::package::{PackageWriter, xml_escape};

/// One worksheet's cells, formatted for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

/// Read every sheet of a workbook, in workbook order. Sheets that cannot be
/// read are skipped with a warning.
#[instrument(skip(bytes), fields(bytes_len = bytes.len()))]
pub fn read_workbook(bytes: &[u8]) -> Result<Vec<Sheet>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|err| WandelwerkError::decode("spreadsheet", err))?;

    let names = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(names.len());
    for (index, name) in names.into_iter().enumerate() {
        let range = match workbook.worksheet_range(&name) {
            Ok(range) => range,
            Err(err) => {
                warn!(index, %name, %err, "worksheet unreadable, skipping");
                continue;
            }
        };
        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        sheets.push(Sheet { name, rows });
    }

    debug!(sheets = sheets.len(), "workbook read");
    Ok(sheets)
}

/// Display text of a cell. Whole floats drop their fractional part.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => format!("{dt}"),
        Data::Error(e) => format!("#ERR:{e:?}"),
    }
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

/// Write rows of text as a one-sheet .xlsx workbook. Every non-empty cell is
/// an inline string.
#[instrument(skip(rows), fields(rows = rows.len()))]
pub fn write_xlsx(sheet_name: &str, rows: &[Vec<String>]) -> Result<Vec<u8>> {
    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        xml_escape(sheet_name)
    );

    let mut sheet_data = String::new();
    for (r, row) in rows.iter().enumerate() {
        let row_number = r + 1;
        let _ = write!(sheet_data, r#"<row r="{row_number}">"#);
        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let _ = write!(
                sheet_data,
                r#"<c r="{}{row_number}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                column_name(c),
                xml_escape(value)
            );
        }
        sheet_data.push_str("</row>");
    }
    let worksheet = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{sheet_data}</sheetData></worksheet>"#
    );

    let mut package = PackageWriter::new("xlsx");
    package.add("[Content_Types].xml", CONTENT_TYPES.as_bytes())?;
    package.add("_rels/.rels", ROOT_RELS.as_bytes())?;
    package.add("xl/workbook.xml", workbook.as_bytes())?;
    package.add("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes())?;
    package.add("xl/worksheets/sheet1.xml", worksheet.as_bytes())?;
    package.finish()
}

/// Spreadsheet column letters for a zero-based index: 0 → A, 25 → Z, 26 → AA.
pub fn column_name(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn column_names_roll_over_after_z() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn written_workbook_reads_back() {
        let rows = vec![
            row(&["Name", "Total"]),
            row(&["Widgets & Co", "42"]),
            row(&["x < y", ""]),
        ];
        let bytes = write_xlsx("Converted PDF", &rows).unwrap();

        let sheets = read_workbook(&bytes).unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, "Converted PDF");
        assert_eq!(sheets[0].rows[0], row(&["Name", "Total"]));
        assert_eq!(sheets[0].rows[1], row(&["Widgets & Co", "42"]));
        assert_eq!(sheets[0].rows[2][0], "x < y");
    }

    #[test]
    fn cells_format_for_display() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::Float(10.0)), "10");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::Bool(true)), "TRUE");
    }

    #[test]
    fn non_workbook_bytes_fail_to_decode() {
        let err = read_workbook(b"just some text").unwrap_err();
        assert_eq!(err.kind(), wandelwerk_core::ErrorKind::DecodeFailure);
    }
}
