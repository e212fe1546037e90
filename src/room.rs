//! Room configuration codes.
//!
//! Catalogs describe occupancy with compact codes: `2A` is two adults,
//! `2A1C` two adults and one child. A configuration satisfies an adult
//! requirement only when the adult count is exact; child capacity on top of
//! that does not matter. Codes are uppercase only, so prose like German
//! "1a Lage" is not read as one.

use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::RecommenderError;

fn code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b(\d+)A(?:(\d+)C)?\b").expect("valid room configuration pattern")
    })
}

/// Parsed `<N>A[<M>C]` code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoomConfiguration {
    pub adults: u32,
    pub children: u32,
}

impl RoomConfiguration {
    /// True when the adult count is exactly `adults`
    pub fn satisfies_adults(&self, adults: u32) -> bool {
        self.adults == adults
    }

    /// Every code appearing in free text, in order of appearance
    pub fn find_all(text: &str) -> Vec<Self> {
        code_pattern()
            .captures_iter(text)
            .filter_map(|caps| {
                let adults = caps.get(1)?.as_str().parse().ok()?;
                let children = match caps.get(2) {
                    Some(m) => m.as_str().parse().ok()?,
                    None => 0,
                };
                Some(Self { adults, children })
            })
            .collect()
    }

    /// Codes found in the string values of a hotel record
    pub fn in_record(record: &serde_json::Map<String, Value>) -> Vec<Self> {
        record
            .values()
            .filter_map(Value::as_str)
            .flat_map(Self::find_all)
            .collect()
    }
}

impl FromStr for RoomConfiguration {
    type Err = RecommenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        match Self::find_all(code).as_slice() {
            [single] if single.to_string() == code => Ok(*single),
            _ => Err(RecommenderError::Validation(format!(
                "Invalid room configuration code: '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for RoomConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.children == 0 {
            write!(f, "{}A", self.adults)
        } else {
            write!(f, "{}A{}C", self.adults, self.children)
        }
    }
}

/// Adult count required by a query, if it spells one out as a code
pub fn required_adults(query: &str) -> Option<u32> {
    RoomConfiguration::find_all(query).first().map(|c| c.adults)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(code: &str) -> RoomConfiguration {
        code.parse().unwrap_or_else(|e| panic!("{}: {}", code, e))
    }

    #[test]
    fn test_parse_codes() {
        assert_eq!(parse("2A"), RoomConfiguration { adults: 2, children: 0 });
        assert_eq!(parse("2A1C"), RoomConfiguration { adults: 2, children: 1 });
        assert_eq!(parse(" 10A2C "), RoomConfiguration { adults: 10, children: 2 });
        assert!("2a1c".parse::<RoomConfiguration>().is_err());
        assert!("2C".parse::<RoomConfiguration>().is_err());
        assert!("2A 3A".parse::<RoomConfiguration>().is_err());
        assert!("".parse::<RoomConfiguration>().is_err());
    }

    #[test]
    fn test_adult_requirement_is_exact() {
        let required = 2;
        assert!(parse("2A1C").satisfies_adults(required));
        assert!(parse("2A").satisfies_adults(required));
        assert!(!parse("1A").satisfies_adults(required));
        assert!(!parse("3A").satisfies_adults(required));
    }

    #[test]
    fn test_required_adults_from_query() {
        assert_eq!(required_adults("double room, 2A, near the old town"), Some(2));
        assert_eq!(required_adults("a quiet hotel for a couple"), None);
        assert_eq!(required_adults("Hotel in 1a Lage am See"), None);
    }

    #[test]
    fn test_codes_in_record() {
        let record = json!({
            "name": "Hotel Nord",
            "roomconfiguration": "2A1C",
            "rating": 4.5
        });
        let configs = RoomConfiguration::in_record(record.as_object().expect("object literal"));
        assert_eq!(configs, vec![RoomConfiguration { adults: 2, children: 1 }]);
    }

    #[test]
    fn test_display_round_trip() {
        assert_eq!(parse("3A2C").to_string(), "3A2C");
        assert_eq!(parse("1A").to_string(), "1A");
    }
}
