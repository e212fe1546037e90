//! Hotel dataset input.
//!
//! Datasets arrive as JSON, either a list of records or an object keyed by
//! hotel identifier. CSV exports are converted to the list form once with
//! [`csv_to_json`].

use crate::error::{RecommenderError, Result};
use crate::normalize::normalize;
use serde_json::{Map, Number, Value};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

/// One hotel's sparse attribute mapping
pub type RawHotelRecord = Map<String, Value>;

/// Key holding a hotel's identity
pub const NAME_KEY: &str = "name";

/// Parse a dataset document.
///
/// Accepts a JSON array of objects, or an object mapping hotel identifier to
/// attributes. In the keyed form the identifier becomes `name` when the
/// record has none.
pub fn parse_dataset(document: Value) -> Result<Vec<RawHotelRecord>> {
    match document {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| match item {
                Value::Object(record) => Ok(record),
                other => Err(RecommenderError::Validation(format!(
                    "Hotel #{} is not an object: {}",
                    idx, other
                ))),
            })
            .collect(),
        Value::Object(keyed) => keyed
            .into_iter()
            .map(|(id, item)| match item {
                Value::Object(mut record) => {
                    if hotel_name(&record).is_none() {
                        record.insert(NAME_KEY.to_string(), Value::String(id));
                    }
                    Ok(record)
                }
                other => Err(RecommenderError::Validation(format!(
                    "Hotel '{}' is not an object: {}",
                    id, other
                ))),
            })
            .collect(),
        other => Err(RecommenderError::Validation(format!(
            "Dataset must be a JSON array or object, got {}",
            type_name(&other)
        ))),
    }
}

/// Load a JSON dataset from disk.
pub fn load_dataset(path: &Path) -> Result<Vec<RawHotelRecord>> {
    let content = std::fs::read_to_string(path)?;
    let hotels = parse_dataset(serde_json::from_str(&content)?)?;

    let unnamed = hotels.iter().filter(|h| hotel_name(h).is_none()).count();
    if unnamed > 0 {
        warn!(unnamed, "Some hotels have no name and cannot be ranked");
    }
    info!(count = hotels.len(), path = ?path, "Loaded hotel dataset");
    Ok(hotels)
}

/// Hotel identity, if present.
///
/// Prefers an exact `name` key, then any key that normalizes to it.
pub fn hotel_name(record: &RawHotelRecord) -> Option<&str> {
    record
        .get(NAME_KEY)
        .or_else(|| {
            record
                .iter()
                .find(|(key, _)| normalize(key) == NAME_KEY)
                .map(|(_, value)| value)
        })
        .and_then(Value::as_str)
}

/// Normalized names of every column appearing in at least one record
pub fn column_universe(hotels: &[RawHotelRecord]) -> BTreeSet<String> {
    hotels
        .iter()
        .flat_map(|h| h.keys())
        .map(|k| normalize(k))
        .filter(|k| !k.is_empty())
        .collect()
}

/// Convert a CSV export into a JSON list of records.
///
/// Integer and float cells become JSON numbers so amenity flags read as
/// `1`/`0`; everything else stays a string. Returns the number of records
/// written.
pub fn csv_to_json(csv_path: &Path, json_path: &Path) -> Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)?;
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record: RawHotelRecord = headers
            .iter()
            .zip(row.iter())
            .map(|(key, cell)| (key.to_string(), cell_value(cell)))
            .collect();
        records.push(Value::Object(record));
    }

    let count = records.len();
    std::fs::write(json_path, serde_json::to_string_pretty(&records)?)?;
    info!(count, from = ?csv_path, to = ?json_path, "Converted CSV dataset");
    Ok(count)
}

fn cell_value(cell: &str) -> Value {
    let trimmed = cell.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::Number(int.into());
    }
    match trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(number) if trimmed.chars().any(|c| c.is_ascii_digit()) => Value::Number(number),
        _ => Value::String(cell.to_string()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_list_dataset() -> Result<()> {
        let hotels = parse_dataset(json!([
            {"name": "Grand Hotel", "rating": 4.5},
            {"name": "Budget Inn", "Innenpool": 0}
        ]))?;
        assert_eq!(hotels.len(), 2);
        assert_eq!(hotel_name(&hotels[1]), Some("Budget Inn"));
        Ok(())
    }

    #[test]
    fn test_parse_keyed_dataset_fills_missing_name() -> Result<()> {
        let hotels = parse_dataset(json!({
            "Spa Resort": {"rating": 4.2},
            "Grand Hotel": {"name": "Grand Hotel Central", "rating": 4.5}
        }))?;
        let names: Vec<_> = hotels.iter().filter_map(hotel_name).collect();
        assert!(names.contains(&"Spa Resort"));
        assert!(names.contains(&"Grand Hotel Central"));
        Ok(())
    }

    #[test]
    fn test_hotel_name_accepts_capitalized_key() -> Result<()> {
        let hotels = parse_dataset(json!({
            "hotel-17": {"Name": "Seeblick", "rating": 4.0},
            "hotel-18": {"NAME": "Bergblick", "name": "Bergblick Lodge"}
        }))?;
        assert_eq!(hotel_name(&hotels[0]), Some("Seeblick"));
        assert!(!hotels[0].contains_key(NAME_KEY));
        assert_eq!(hotel_name(&hotels[1]), Some("Bergblick Lodge"));
        Ok(())
    }

    #[test]
    fn test_parse_rejects_scalars() {
        assert!(parse_dataset(json!("hotels")).is_err());
        assert!(parse_dataset(json!([1, 2])).is_err());
    }

    #[test]
    fn test_column_universe_normalizes_keys() -> Result<()> {
        let hotels = parse_dataset(json!([
            {"name": "A", "Innenpool": 1, "Price-Per-Night": 80},
            {"name": "B", "innenpool": 0, "Frühstück": 1}
        ]))?;
        let universe: Vec<_> = column_universe(&hotels).into_iter().collect();
        assert_eq!(universe, vec!["fruehstueck", "innenpool", "name", "price_per_night"]);
        Ok(())
    }

    #[test]
    fn test_csv_to_json() -> Result<()> {
        let mut csv_file = NamedTempFile::new()?;
        writeln!(csv_file, "name,pricepernight,Sauna,roomconfiguration,notes")?;
        writeln!(csv_file, "Hotel Nord,112.36,1,2A1C,")?;
        writeln!(csv_file, "Budget Inn,83,0,1A,nan")?;
        let json_file = NamedTempFile::new()?;

        let count = csv_to_json(csv_file.path(), json_file.path())?;
        assert_eq!(count, 2);

        let hotels = load_dataset(json_file.path())?;
        assert_eq!(hotels[0]["pricepernight"], json!(112.36));
        assert_eq!(hotels[0]["Sauna"], json!(1));
        assert_eq!(hotels[0]["roomconfiguration"], json!("2A1C"));
        assert_eq!(hotels[0]["notes"], json!(""));
        assert_eq!(hotels[1]["pricepernight"], json!(83));
        assert_eq!(hotels[1]["notes"], json!("nan"));
        Ok(())
    }
}
