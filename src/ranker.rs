//! Hotel filtering and ranking.
//!
//! The oracle filters and orders the reshaped hotels under a rubric supplied
//! as a [`RankingPolicy`]. This module only enforces the output contract:
//! at most [`MAX_RESULTS`] entries, at most [`MAX_FEATURES`] features each,
//! and only hotels that exist in the input.

use crate::error::{RecommenderError, Result};
use crate::oracle::{ask, extract_json, ChatMessage, Oracle, RetryPolicy};
use crate::prompts::hotel_ranker::{build_user_prompt, DEFAULT_RUBRIC, SYSTEM_PROMPT};
use crate::reshape::NormalizedHotelRecord;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Maximum number of hotels returned
pub const MAX_RESULTS: usize = 10;

/// Maximum number of features per ranked hotel
pub const MAX_FEATURES: usize = 3;

/// Answers whose bracket span is shorter than this mean "no matches"
const MIN_LIST_SPAN: usize = 6;

/// A ranked hotel with the factors behind its position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedHotel {
    pub name: String,
    #[serde(default)]
    pub features: Vec<String>,
}

/// Oracles sometimes answer with bare names instead of objects
#[derive(Deserialize)]
#[serde(untagged)]
enum RankedEntry {
    Full(RankedHotel),
    Name(String),
}

impl From<RankedEntry> for RankedHotel {
    fn from(entry: RankedEntry) -> Self {
        match entry {
            RankedEntry::Full(hotel) => hotel,
            RankedEntry::Name(name) => RankedHotel {
                name,
                features: Vec::new(),
            },
        }
    }
}

/// Ranking rubric handed to the oracle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingPolicy {
    rubric: String,
}

impl RankingPolicy {
    pub fn new(rubric: impl Into<String>) -> Self {
        Self {
            rubric: rubric.into(),
        }
    }

    /// Load a replacement rubric from a text file
    pub fn from_file(path: &Path) -> Result<Self> {
        let rubric = std::fs::read_to_string(path).map_err(|e| {
            RecommenderError::Config(format!("Cannot read ranking rubric {:?}: {}", path, e))
        })?;
        if rubric.trim().is_empty() {
            return Err(RecommenderError::Config(format!(
                "Ranking rubric {:?} is empty",
                path
            )));
        }
        Ok(Self::new(rubric.trim()))
    }

    pub fn rubric(&self) -> &str {
        &self.rubric
    }
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RUBRIC)
    }
}

/// Oracle-backed hotel ranker
pub struct HotelRanker {
    oracle: Arc<dyn Oracle>,
    policy: RankingPolicy,
    retry: RetryPolicy,
}

impl HotelRanker {
    pub fn new(oracle: Arc<dyn Oracle>, policy: RankingPolicy, retry: RetryPolicy) -> Self {
        Self {
            oracle,
            policy,
            retry,
        }
    }

    /// Filter and rank `hotels` against `query`, best match first.
    ///
    /// An answer with a near-empty bracket span counts as "no matches" and is
    /// not retried. Other unparsable answers are retried under the retry
    /// policy.
    ///
    /// # Errors
    ///
    /// [`RecommenderError::RankingUnparsed`] carries the last raw answer when
    /// the retry budget runs out.
    pub async fn rank_hotels(
        &self,
        hotels: &[NormalizedHotelRecord],
        query: &str,
    ) -> Result<Vec<RankedHotel>> {
        if hotels.is_empty() {
            return Ok(Vec::new());
        }

        let hotels_json = serde_json::to_string(hotels)?;
        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_user_prompt(self.policy.rubric(), query, &hotels_json)),
        ];

        info!(hotels = hotels.len(), "Ranking hotels");
        let ranked = ask(
            self.oracle.as_ref(),
            "hotel ranking",
            &messages,
            &self.retry,
            parse_ranking,
        )
        .await
        .map_err(|e| match e {
            RecommenderError::MalformedOutput { attempts, raw, .. } => {
                RecommenderError::RankingUnparsed { attempts, raw }
            }
            other => other,
        })?;

        let ranked = enforce_contract(ranked, hotels);
        info!(ranked = ranked.len(), "Ranking complete");
        Ok(ranked)
    }
}

fn parse_ranking(content: &str) -> Option<Vec<RankedHotel>> {
    if let Ok(entries) = serde_json::from_str::<Vec<RankedEntry>>(extract_json(content)) {
        return Some(entries.into_iter().map(RankedHotel::from).collect());
    }
    if list_span(content) < MIN_LIST_SPAN {
        return Some(Vec::new());
    }
    None
}

/// Distance between the first `[` and the last `]`, 0 when there is none
fn list_span(content: &str) -> usize {
    match (content.find('['), content.rfind(']')) {
        (Some(start), Some(end)) if end > start => end - start,
        _ => 0,
    }
}

/// Drop unknown and duplicate hotels, cap list and feature counts.
///
/// Names are compared with surrounding whitespace trimmed on both sides;
/// the result carries the input's exact name.
fn enforce_contract(ranked: Vec<RankedHotel>, hotels: &[NormalizedHotelRecord]) -> Vec<RankedHotel> {
    let known: HashMap<&str, &str> = hotels
        .iter()
        .filter_map(NormalizedHotelRecord::name)
        .map(|name| (name.trim(), name))
        .collect();
    let mut seen = HashSet::new();
    let mut result = Vec::new();

    for mut hotel in ranked {
        let Some(&exact) = known.get(hotel.name.trim()) else {
            warn!(name = %hotel.name, "Dropping ranked hotel absent from the input");
            continue;
        };
        if !seen.insert(exact) {
            continue;
        }
        hotel.name = exact.to_string();
        hotel.features.truncate(MAX_FEATURES);
        result.push(hotel);
        if result.len() == MAX_RESULTS {
            break;
        }
    }
    result
}
