//! Record reshaping.
//!
//! Turns raw hotel records into the compact form the ranker sees: accepted
//! attributes as-is, amenity flags collapsed into `amenities`, other boolean
//! flags collapsed into `additional_info`, ignored columns gone.

use crate::classifier::{ColumnClassification, ColumnKind};
use crate::dataset::{RawHotelRecord, NAME_KEY};
use crate::normalize::normalize;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

const AMENITIES_KEY: &str = "amenities";
const ADDITIONAL_INFO_KEY: &str = "additional_info";

/// Hotel record as handed to the ranker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedHotelRecord {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub amenities: Vec<String>,
    pub additional_info: Vec<String>,
}

impl NormalizedHotelRecord {
    pub fn name(&self) -> Option<&str> {
        self.fields.get(NAME_KEY).and_then(Value::as_str)
    }

    /// Flatten back into a raw record with `amenities` and `additional_info`
    /// as list-valued keys.
    pub fn into_raw(self) -> RawHotelRecord {
        let mut raw = self.fields;
        raw.insert(AMENITIES_KEY.to_string(), string_list(self.amenities));
        raw.insert(ADDITIONAL_INFO_KEY.to_string(), string_list(self.additional_info));
        raw
    }
}

/// How a single value reads as a flag
enum Flag {
    One,
    Zero,
    /// null, empty string, empty list or object
    Blank,
    Other,
}

fn flag(value: &Value) -> Flag {
    match value {
        Value::Bool(true) => Flag::One,
        Value::Bool(false) => Flag::Zero,
        Value::Number(n) => match n.as_f64() {
            Some(x) if x == 1.0 => Flag::One,
            Some(x) if x == 0.0 => Flag::Zero,
            _ => Flag::Other,
        },
        Value::String(s) => match s.trim() {
            "" => Flag::Blank,
            t => match t.parse::<f64>() {
                Ok(x) if x == 1.0 => Flag::One,
                Ok(x) if x == 0.0 => Flag::Zero,
                _ => Flag::Other,
            },
        },
        Value::Null => Flag::Blank,
        Value::Array(a) if a.is_empty() => Flag::Blank,
        Value::Object(o) if o.is_empty() => Flag::Blank,
        _ => Flag::Other,
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn empty_marker() -> Value {
    Value::Array(Vec::new())
}

fn string_list(items: Vec<String>) -> Value {
    Value::Array(items.into_iter().map(Value::String).collect())
}

fn push_unique(list: &mut Vec<String>, item: String) {
    if !list.contains(&item) {
        list.push(item);
    }
}

/// Reshape one raw record against a column classification.
///
/// Record keys are looked up through the normalizer; keys whose column is not
/// in `universe` are skipped. Kept values stay under the record's own key,
/// while collapsed flags are listed by normalized column name. The identity
/// column is always carried over, re-keyed to `name`. Existing `amenities`/`additional_info` lists are
/// merged rather than reclassified, so reshaping a reshaped record is a no-op
/// for those lists.
pub fn reshape(
    record: &RawHotelRecord,
    universe: &BTreeSet<String>,
    classification: &ColumnClassification,
) -> NormalizedHotelRecord {
    let mut out = NormalizedHotelRecord::default();

    for (key, value) in record {
        let column = normalize(key);

        if column == AMENITIES_KEY || column == ADDITIONAL_INFO_KEY {
            if let Some(items) = value.as_array() {
                let target = if column == AMENITIES_KEY {
                    &mut out.amenities
                } else {
                    &mut out.additional_info
                };
                for item in items.iter().filter_map(Value::as_str) {
                    push_unique(target, item.to_string());
                }
                continue;
            }
        }

        if !universe.contains(&column) {
            continue;
        }
        if column == NAME_KEY {
            // Identity always lives under `name`; an exact `name` key wins
            // over spellings like `Name`.
            if key == NAME_KEY {
                out.fields.insert(NAME_KEY.to_string(), value.clone());
            } else {
                out.fields
                    .entry(NAME_KEY.to_string())
                    .or_insert_with(|| value.clone());
            }
            continue;
        }

        match classification.kind(&column) {
            ColumnKind::Amenity => collapse_flag(key, value, column, &mut out.amenities, &mut out.fields),
            ColumnKind::Accepted => {
                let kept = if is_falsy(value) { empty_marker() } else { value.clone() };
                out.fields.insert(key.clone(), kept);
            }
            ColumnKind::Residual => {
                collapse_flag(key, value, column, &mut out.additional_info, &mut out.fields)
            }
            ColumnKind::Ignored => {}
        }
    }

    out
}

fn collapse_flag(
    key: &str,
    value: &Value,
    column: String,
    list: &mut Vec<String>,
    fields: &mut Map<String, Value>,
) {
    match flag(value) {
        Flag::One => push_unique(list, column),
        Flag::Zero => {}
        // Graded values ("3 pools", "partial") stay as attributes
        Flag::Other => {
            fields.insert(key.to_string(), value.clone());
        }
        Flag::Blank => {
            fields.insert(key.to_string(), empty_marker());
        }
    }
}

/// Reshape every record of a dataset
pub fn reshape_all(
    hotels: &[RawHotelRecord],
    universe: &BTreeSet<String>,
    classification: &ColumnClassification,
) -> Vec<NormalizedHotelRecord> {
    hotels
        .iter()
        .map(|h| reshape(h, universe, classification))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::column_universe;
    use serde_json::json;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn record(value: Value) -> RawHotelRecord {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {}", other),
        }
    }

    fn classification() -> ColumnClassification {
        ColumnClassification {
            accepted: set(&["pricepernight", "rating", "roomconfiguration"]),
            ignored: set(&["latitude"]),
            amenity: set(&["innenpool", "sauna", "parking"]),
        }
    }

    #[test]
    fn test_reshape_collapses_flags() {
        let raw = record(json!({
            "name": "Spa Resort",
            "pricepernight": 152.2,
            "rating": 0,
            "roomconfiguration": "2A1C",
            "Innenpool": 1,
            "Sauna": 0,
            "parking": "paid",
            "latitude": 55.67,
            "extrabed": "1",
            "petsallowed": 0,
            "view": "sea"
        }));
        let universe = column_universe(std::slice::from_ref(&raw));

        let out = reshape(&raw, &universe, &classification());

        assert_eq!(out.name(), Some("Spa Resort"));
        assert_eq!(out.amenities, vec!["innenpool"]);
        assert_eq!(out.additional_info, vec!["extrabed"]);
        assert_eq!(out.fields["pricepernight"], json!(152.2));
        assert_eq!(out.fields["rating"], json!([]));
        assert_eq!(out.fields["roomconfiguration"], json!("2A1C"));
        assert_eq!(out.fields["parking"], json!("paid"));
        assert_eq!(out.fields["view"], json!("sea"));
        assert!(!out.fields.contains_key("latitude"));
        assert!(!out.fields.contains_key("Sauna"));
        assert!(!out.fields.contains_key("petsallowed"));
    }

    #[test]
    fn test_identity_column_rekeyed_to_name() {
        let raw = record(json!({"Name": "Hotel Nord", "Sauna": 1}));
        let universe = column_universe(std::slice::from_ref(&raw));
        let out = reshape(&raw, &universe, &classification());

        assert_eq!(out.name(), Some("Hotel Nord"));
        assert!(!out.fields.contains_key("Name"));

        let both = record(json!({"Name": "Alias", "name": "Hotel Nord"}));
        let out = reshape(&both, &set(&["name"]), &classification());
        assert_eq!(out.name(), Some("Hotel Nord"));
        assert_eq!(out.fields.len(), 1);
    }

    #[test]
    fn test_reshape_skips_columns_outside_universe() {
        let raw = record(json!({"name": "Budget Inn", "sauna": 1, "gym": 1}));
        let out = reshape(&raw, &set(&["name", "sauna"]), &classification());

        assert_eq!(out.amenities, vec!["sauna"]);
        assert!(out.additional_info.is_empty());
        assert!(!out.fields.contains_key("gym"));
    }

    #[test]
    fn test_reshape_always_emits_lists() -> serde_json::Result<()> {
        let raw = record(json!({"name": "Plain"}));
        let out = reshape(&raw, &set(&["name"]), &ColumnClassification::default());

        let json = serde_json::to_value(&out)?;
        assert_eq!(json, json!({"name": "Plain", "amenities": [], "additional_info": []}));
        Ok(())
    }

    #[test]
    fn test_blank_flag_becomes_empty_marker() {
        let raw = record(json!({"name": "X", "sauna": "", "notes": null}));
        let out = reshape(&raw, &set(&["name", "sauna", "notes"]), &classification());

        assert_eq!(out.fields["sauna"], json!([]));
        assert_eq!(out.fields["notes"], json!([]));
    }

    #[test]
    fn test_reshape_twice_keeps_lists() {
        let raw = record(json!({
            "name": "Familienhotel",
            "innenpool": 1,
            "sauna": 1,
            "kinderbetreuung": 1,
            "rating": 4.4
        }));
        let universe = column_universe(std::slice::from_ref(&raw));
        let first = reshape(&raw, &universe, &classification());

        let again = first.clone().into_raw();
        let mut second_classification = classification();
        second_classification
            .accepted
            .extend(["amenities".to_string(), "additional_info".to_string()]);
        let second_universe = column_universe(std::slice::from_ref(&again));
        let second = reshape(&again, &second_universe, &second_classification);

        assert_eq!(first.amenities, vec!["innenpool", "sauna"]);
        assert_eq!(first.additional_info, vec!["kinderbetreuung"]);
        assert_eq!(second.amenities, first.amenities);
        assert_eq!(second.additional_info, first.additional_info);
        assert_eq!(second, first);
    }
}
