//! Flat-file table codec
//!
//! Comma-separated text with a header row. Reading is tolerant (synonym
//! headers, unknown columns dropped, short rows padded with missing cells);
//! writing always produces the canonical layout
//! `date,level,rainfall,extraction,id`.

use crate::error::RecordError;
use crate::measurement::Measurement;
use crate::normalize::{normalize, Column, RawRow};

/// UTF-8 byte-order mark some spreadsheet exports prepend
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Read table bytes into raw rows
///
/// # Errors
/// Returns error if the bytes are not well-formed CSV
pub fn decode_table(bytes: &[u8]) -> Result<Vec<RawRow>, RecordError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let columns: Vec<Option<Column>> = reader.headers()?.iter().map(Column::from_label).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = RawRow::default();
        for (column, cell) in columns.iter().zip(record.iter()) {
            if let Some(column) = column {
                row.set(*column, cell);
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Read and normalise table bytes in one step
///
/// # Errors
/// Returns error if the bytes are not well-formed CSV
pub fn decode_measurements(bytes: &[u8]) -> Result<Vec<Measurement>, RecordError> {
    Ok(normalize(decode_table(bytes)?))
}

/// Write measurements in the canonical layout
///
/// An empty slice still produces the header row, so an empty collection is
/// correctly shaped on disk.
///
/// # Errors
/// Returns error if the CSV writer fails
pub fn encode_table(rows: &[Measurement]) -> Result<Vec<u8>, RecordError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(Column::PERSISTED.iter().map(|column| column.name()))?;
    for row in rows {
        writer.write_record([
            row.date_str(),
            number_cell(row.level),
            number_cell(row.rainfall),
            number_cell(row.extraction),
            row.id.to_string(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| RecordError::CsvBuffer(e.to_string()))
}

/// Shortest round-trip representation, empty when missing
fn number_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn encodes_canonical_header_for_empty_table() {
        let bytes = encode_table(&[]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "date,level,rainfall,extraction,id\n");
    }

    #[test]
    fn encodes_rows_in_fixed_order() {
        let m = Measurement::new(NaiveDate::from_ymd_opt(2024, 4, 3), Some(5.03), Some(12.0), None);
        let text = String::from_utf8(encode_table(std::slice::from_ref(&m)).unwrap()).unwrap();
        let expected = format!("date,level,rainfall,extraction,id\n03/04/2024,5.03,12,,{}\n", m.id);
        assert_eq!(text, expected);
    }

    #[test]
    fn decodes_legacy_headers_and_drops_unknown_columns() {
        let input = "\u{feff}FECHA,NIVEL DE AGUA (MTS.),LLUVIA CAIDA (MM),VOLUMEN EXTRAIDO (LTS.),NOTAS\n\
                     03/04/2024,5.03,12,300,seco\n";
        let rows = decode_measurements(input.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id.as_str(), "5fee6c2346a79467");
    }

    #[test]
    fn short_rows_are_padded_with_missing() {
        let input = "date,level,rainfall,extraction\n03/04/2024,5.03\n";
        let rows = decode_measurements(input.as_bytes()).unwrap();
        assert_eq!(rows[0].rainfall, None);
        assert_eq!(rows[0].extraction, None);
    }

    #[test]
    fn missing_columns_are_created() {
        let input = "fecha,nivel\n03/04/2024,5.03\n";
        let rows = decode_table(input.as_bytes()).unwrap();
        assert_eq!(rows[0].rainfall, None);
        assert_eq!(rows[0].level.as_deref(), Some("5.03"));
    }

    #[test]
    fn stored_ids_are_ignored_on_read() {
        let input = "date,level,rainfall,extraction,id\n03/04/2024,5.03,12,300,0000000000000000\n";
        let rows = decode_measurements(input.as_bytes()).unwrap();
        assert_eq!(rows[0].id.as_str(), "5fee6c2346a79467");
    }

    #[test]
    fn empty_input_is_an_empty_table() {
        assert!(decode_measurements(b"").unwrap().is_empty());
    }
}
