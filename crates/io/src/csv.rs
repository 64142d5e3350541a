// CSV/TSV table import/export

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use mergeguard_frame::{Column, ColumnType, Table};

use crate::infer::{infer_column_type, parse_cell};

/// Load a headed CSV file into a typed table.
///
/// `hints` pins the type of named columns; every other column is inferred.
pub fn read_table(path: &Path, hints: &BTreeMap<String, ColumnType>) -> Result<Table, String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    read_table_from_str(&content, delimiter, hints).map_err(|e| format!("{}: {e}", path.display()))
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Header line must split
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Consistent lines times field count; wider wins ties
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| format!("{}: {e}", path.display()))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            // Excel-exported CSVs are usually Windows-1252
            log::debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

pub fn read_table_from_str(
    content: &str,
    delimiter: u8,
    hints: &BTreeMap<String, ColumnType>,
) -> Result<Table, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err("missing header row".to_string());
    }
    if let Some(unknown) = hints.keys().find(|k| !headers.contains(k)) {
        return Err(format!("type given for unknown column '{unknown}'"));
    }

    let width = headers.len();
    let mut records: Vec<Vec<String>> = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| e.to_string())?;
        if record.len() > width {
            // +2: one for the header, one for 1-based line numbers
            return Err(format!("line {}: {} fields, header has {width}", idx + 2, record.len()));
        }
        let mut cells: Vec<String> = record.iter().map(String::from).collect();
        // Trailing empty cells are often dropped by spreadsheet exports
        cells.resize(width, String::new());
        records.push(cells);
    }

    let columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let dtype = hints
                .get(name)
                .copied()
                .unwrap_or_else(|| infer_column_type(records.iter().map(|r| r[i].as_str())));
            Column::new(name.clone(), dtype)
        })
        .collect();

    let mut table = Table::new(columns.clone()).map_err(|e| e.to_string())?;
    for (idx, cells) in records.iter().enumerate() {
        let row = cells
            .iter()
            .zip(&columns)
            .map(|(cell, col)| parse_cell(cell, col.dtype).map_err(|e| format!("line {}, column '{}': {e}", idx + 2, col.name)))
            .collect::<Result<Vec<_>, _>>()?;
        table.push_row(row).map_err(|e| e.to_string())?;
    }

    log::debug!("read {} rows x {} columns", table.len(), width);
    Ok(table)
}

pub fn write_table(table: &Table, path: &Path) -> Result<(), String> {
    write_table_with_delimiter(table, path, b',')
}

pub fn write_table_tsv(table: &Table, path: &Path) -> Result<(), String> {
    write_table_with_delimiter(table, path, b'\t')
}

fn write_table_with_delimiter(table: &Table, path: &Path, delimiter: u8) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| format!("{}: {e}", path.display()))?;

    writer
        .write_record(table.column_names())
        .map_err(|e| e.to_string())?;
    for row in table.rows() {
        writer
            .write_record(row.iter().map(|v| v.raw_display()))
            .map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    use mergeguard_frame::Value;

    fn no_hints() -> BTreeMap<String, ColumnType> {
        BTreeMap::new()
    }

    #[test]
    fn test_sniff_semicolon_delimiter() {
        let content = "Name;Age;City\nAlice;30;Paris\nBob;25;London\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_comma_delimiter() {
        let content = "Name,Age,City\nAlice,30,Paris\nBob,25,London\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn test_sniff_tab_delimiter() {
        let content = "Name\tAge\tCity\nAlice\t30\tParis\nBob\t25\tLondon\n";
        assert_eq!(sniff_delimiter(content), b'\t');
    }

    #[test]
    fn test_sniff_semicolon_with_commas_in_values() {
        let content = "Name;Address;City\n\"Doe, Jane\";\"123 Main St, Apt 4\";Paris\nBob;\"456 Elm\";London\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_semicolon_csv_import_infers_types() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("people.csv");
        fs::write(&path, "Name;Age;Joined\nAlice;30;2021-03-01\nBob;;2022-07-15\n").unwrap();

        let table = read_table(&path, &no_hints()).unwrap();
        assert_eq!(table.column("Name").unwrap().dtype, ColumnType::Text);
        assert_eq!(table.column("Age").unwrap().dtype, ColumnType::Int);
        assert_eq!(table.column("Joined").unwrap().dtype, ColumnType::Date);
        assert_eq!(table.values("Age").unwrap(), vec![&Value::from(30), &Value::Null]);
    }

    #[test]
    fn test_hint_overrides_inference() {
        let mut hints = BTreeMap::new();
        hints.insert("zip".to_string(), ColumnType::Text);
        let table = read_table_from_str("zip,n\n02134,1\n", b',', &hints).unwrap();
        assert_eq!(table.values("zip").unwrap(), vec![&Value::from("02134")]);
        assert_eq!(table.column("n").unwrap().dtype, ColumnType::Int);
    }

    #[test]
    fn test_hint_for_unknown_column() {
        let mut hints = BTreeMap::new();
        hints.insert("nope".to_string(), ColumnType::Int);
        let err = read_table_from_str("a,b\n1,2\n", b',', &hints).unwrap_err();
        assert!(err.contains("unknown column 'nope'"), "{err}");
    }

    #[test]
    fn test_hint_that_does_not_parse() {
        let mut hints = BTreeMap::new();
        hints.insert("a".to_string(), ColumnType::Int);
        let err = read_table_from_str("a,b\n1,2\nx,3\n", b',', &hints).unwrap_err();
        assert!(err.starts_with("line 3, column 'a'"), "{err}");
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = read_table_from_str("a,b,c\n1,2\n", b',', &no_hints()).unwrap();
        assert_eq!(table.row(0).unwrap()[2], Value::Null);
    }

    #[test]
    fn test_long_rows_rejected() {
        let err = read_table_from_str("a,b\n1,2,3\n", b',', &no_hints()).unwrap_err();
        assert!(err.contains("line 2"), "{err}");
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        // "café" with 0xE9 for é
        fs::write(&path, b"name,n\ncaf\xe9,1\n").unwrap();
        let table = read_table(&path, &no_hints()).unwrap();
        assert_eq!(table.values("name").unwrap(), vec![&Value::from("café")]);
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let table = read_table_from_str("id,amount,when\n1,2.5,2024-01-01\n2,,2024-01-02\n", b',', &no_hints()).unwrap();

        write_table(&table, &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "id,amount,when\n1,2.5,2024-01-01\n2,,2024-01-02\n");

        let back = read_table(&path, &no_hints()).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_large_int_ids_round_trip_exactly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ids.csv");
        let input = "id\n9007199254740992\n9007199254740993\n";
        let table = read_table_from_str(input, b',', &no_hints()).unwrap();
        assert_eq!(table.column("id").unwrap().dtype, ColumnType::Int);
        let ids = table.values("id").unwrap();
        assert_ne!(ids[0], ids[1]);
        assert_eq!(ids[1], &Value::Int(9_007_199_254_740_993));

        write_table(&table, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), input);
        assert_eq!(read_table(&path, &no_hints()).unwrap(), table);
    }

    #[test]
    fn test_tsv_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.tsv");
        let table = read_table_from_str("a,b\nx,y\n", b',', &no_hints()).unwrap();
        write_table_tsv(&table, &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "a\tb\nx\ty\n");
    }
}
