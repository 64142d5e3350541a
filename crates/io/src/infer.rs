// Column type inference and cell parsing

use chrono::{NaiveDate, NaiveDateTime};

use mergeguard_frame::{ColumnType, Value};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

fn is_blank(cell: &str) -> bool {
    cell.trim().is_empty()
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_date(cell: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(cell.trim(), DATE_FORMAT).ok()
}

fn parse_datetime(cell: &str) -> Option<NaiveDateTime> {
    let cell = cell.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cell, fmt).ok())
}

/// Narrowest type every non-blank cell parses as.
///
/// Order: Int, Float, Bool, Date, DateTime, then Text. A column with no
/// non-blank cells is Float.
pub fn infer_column_type<'a>(cells: impl Iterator<Item = &'a str> + Clone) -> ColumnType {
    let mut present = cells.filter(|c| !is_blank(c));
    if present.clone().next().is_none() {
        return ColumnType::Float;
    }

    if present.clone().all(|c| c.trim().parse::<i64>().is_ok()) {
        ColumnType::Int
    } else if present.clone().all(|c| c.trim().parse::<f64>().is_ok()) {
        ColumnType::Float
    } else if present.clone().all(|c| parse_bool(c).is_some()) {
        ColumnType::Bool
    } else if present.clone().all(|c| parse_date(c).is_some()) {
        ColumnType::Date
    } else if present.all(|c| parse_datetime(c).is_some()) {
        ColumnType::DateTime
    } else {
        ColumnType::Text
    }
}

/// Convert one cell to a value of `dtype`. Blank cells are `Null`.
pub fn parse_cell(cell: &str, dtype: ColumnType) -> Result<Value, String> {
    if is_blank(cell) {
        return Ok(Value::Null);
    }
    let trimmed = cell.trim();
    let parsed = match dtype {
        ColumnType::Text | ColumnType::Categorical => Some(Value::from(cell)),
        ColumnType::Int => trimmed.parse::<i64>().ok().map(Value::from),
        ColumnType::Float => trimmed.parse::<f64>().ok().map(Value::from),
        ColumnType::Bool => parse_bool(trimmed).map(Value::from),
        ColumnType::Date => parse_date(trimmed).map(Value::from),
        ColumnType::DateTime => parse_datetime(trimmed)
            .or_else(|| parse_date(trimmed).and_then(|d| d.and_hms_opt(0, 0, 0)))
            .map(Value::from),
    };
    parsed.ok_or_else(|| format!("cannot read '{cell}' as {dtype}"))
}
