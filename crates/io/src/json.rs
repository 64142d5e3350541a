// JSON export

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde_json::{Map, Value as Json};

use mergeguard_frame::Table;

/// Export table as a JSON array of row objects keyed by column name.
pub fn export(table: &Table, path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &to_records(table)?).map_err(|e| e.to_string())?;
    Ok(())
}

pub fn to_records(table: &Table) -> Result<Vec<Json>, String> {
    let names: Vec<&str> = table.column_names().collect();
    table
        .rows()
        .iter()
        .map(|row| {
            let mut obj = Map::new();
            for (name, value) in names.iter().zip(row) {
                obj.insert((*name).to_string(), serde_json::to_value(value).map_err(|e| e.to_string())?);
            }
            Ok(Json::Object(obj))
        })
        .collect()
}
