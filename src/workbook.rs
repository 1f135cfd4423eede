//! XLSX serialization of a cell grid.
//!
//! An .xlsx file is a zip container with a handful of fixed XML parts and
//! one worksheet part. This writer emits exactly that: text as inline
//! strings, counts as native numeric cells, no styling. The result is a
//! byte buffer the caller either saves as a download or base64-encodes
//! for an on-screen preview.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use std::io::{Cursor, Write};

use crate::error::SlipError;
use crate::sheet::{Cell, CellGrid};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Spreadsheet column reference for a zero-based index (0 -> A, 26 -> AA).
fn column_ref(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#,
        xml_escape(sheet_name)
    )
}

fn sheet_xml(grid: &CellGrid) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>"#,
    );
    for (row_index, row) in grid.iter().enumerate() {
        let row_ref = row_index + 1;
        if row.is_empty() {
            xml.push_str(&format!("<row r=\"{row_ref}\"/>"));
            continue;
        }
        xml.push_str(&format!("<row r=\"{row_ref}\">"));
        for (col_index, cell) in row.iter().enumerate() {
            let cell_ref = format!("{}{row_ref}", column_ref(col_index));
            match cell {
                Cell::Text(text) => xml.push_str(&format!(
                    "<c r=\"{cell_ref}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                    xml_escape(text)
                )),
                Cell::Int(n) => xml.push_str(&format!("<c r=\"{cell_ref}\"><v>{n}</v></c>")),
                Cell::Float(f) => xml.push_str(&format!("<c r=\"{cell_ref}\"><v>{f}</v></c>")),
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Worksheet names are capped at 31 characters and may not contain
/// `[ ] : * ? / \`.
fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => ' ',
            other => other,
        })
        .collect();
    let trimmed = cleaned.trim();
    let capped: String = trimmed.chars().take(31).collect();
    if capped.is_empty() {
        "Sheet1".to_string()
    } else {
        capped
    }
}

/// Serialize a grid into XLSX bytes with a single worksheet.
pub fn write_workbook(grid: &CellGrid, sheet_name: &str) -> Result<Vec<u8>, SlipError> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    let parts: [(&str, String); 5] = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("xl/workbook.xml", workbook_xml(&sanitize_sheet_name(sheet_name))),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
        ("xl/worksheets/sheet1.xml", sheet_xml(grid)),
    ];

    for (name, content) in parts {
        zip.start_file(name, options)
            .map_err(|e| SlipError::Workbook(e.to_string()))?;
        zip.write_all(content.as_bytes())
            .map_err(|e| SlipError::Workbook(e.to_string()))?;
    }

    let cursor = zip
        .finish()
        .map_err(|e| SlipError::Workbook(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// Serialize a grid and base64-encode it for the on-screen preview path.
pub fn workbook_base64(grid: &CellGrid, sheet_name: &str) -> Result<String, SlipError> {
    let bytes = write_workbook(grid, sheet_name)?;
    Ok(BASE64_STANDARD.encode(bytes))
}

/// Download filename for a route slip: `<ReportType>-Route-<routeName>.xlsx`
/// with spaces stripped from the report type.
pub fn slip_filename(report_type: &str, route_name: &str) -> String {
    let compact: String = report_type.chars().filter(|c| !c.is_whitespace()).collect();
    format!("{compact}-Route-{route_name}.xlsx")
}
