//! Output workbook writer.
//!
//! The artifact is a single-sheet `.xlsx` with the three-row layout the
//! downstream loader expects: machine keys, descriptive labels (both with a
//! leading blank cell over the date column), then date plus values. The
//! workbook is assembled directly as a ZIP of OOXML parts; inline strings
//! keep it to five parts with no shared-string table.

use std::{fs::File, io::Write, path::Path};

use anyhow::{Context, Result};
use tracing::info;
use zip::{write::SimpleFileOptions, ZipWriter};

use crate::map::schema::{fit_to_schema, OutputRow, FIXED_SCHEMA};

/// `2025-08` → `IMFEOD_DATA_202508_OUTPUT.xlsx`.
pub fn output_filename(selected_date: &str) -> String {
    format!("IMFEOD_DATA_{}_OUTPUT.xlsx", selected_date.replace('-', ""))
}

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

/// Write the three-row workbook for one projected output row.
pub fn write_workbook(row: &OutputRow, path: &Path) -> Result<()> {
    let mut values = row.values.clone();
    fit_to_schema(&mut values);

    let sheet = sheet_xml(&row.date_value, &values);

    let file = File::create(path)
        .with_context(|| format!("creating output workbook {}", path.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", ROOT_RELS_XML),
        ("xl/workbook.xml", WORKBOOK_XML),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML),
    ] {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }
    zip.start_file("xl/worksheets/sheet1.xml", options)?;
    zip.write_all(sheet.as_bytes())?;
    zip.finish()?;

    info!(file = %path.display(), columns = values.len() + 1, "wrote output workbook");
    Ok(())
}

/// 0-based column index → spreadsheet column letters (0 → A, 30 → AE).
fn col_ref(mut col: usize) -> String {
    let mut s = String::new();
    loop {
        s.insert(0, (b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    s
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn push_text_cell(out: &mut String, col: usize, row: usize, text: &str) {
    out.push_str(&format!(
        r#"<c r="{}{}" t="inlineStr"><is><t>{}</t></is></c>"#,
        col_ref(col),
        row,
        xml_escape(text)
    ));
}

fn push_number_cell(out: &mut String, col: usize, row: usize, value: f64) {
    out.push_str(&format!(r#"<c r="{}{}"><v>{}</v></c>"#, col_ref(col), row, value));
}

fn sheet_xml(date_value: &str, values: &[f64]) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    // Row 1: machine keys, blank cell over the date column.
    out.push_str(r#"<row r="1">"#);
    for (i, column) in FIXED_SCHEMA.iter().enumerate() {
        push_text_cell(&mut out, i + 1, 1, column.machine_key);
    }
    out.push_str("</row>");

    // Row 2: descriptive labels, blank cell over the date column.
    out.push_str(r#"<row r="2">"#);
    for (i, column) in FIXED_SCHEMA.iter().enumerate() {
        push_text_cell(&mut out, i + 1, 2, column.label);
    }
    out.push_str("</row>");

    // Row 3: reporting date plus the projected values.
    out.push_str(r#"<row r="3">"#);
    push_text_cell(&mut out, 0, 3, date_value);
    for (i, value) in values.iter().enumerate() {
        push_number_cell(&mut out, i + 1, 3, *value);
    }
    out.push_str("</row>");

    out.push_str("</sheetData></worksheet>");
    out
}
