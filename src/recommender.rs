//! End-to-end hotel recommendation.
//!
//! validate query → classify columns (cached per schema) → reshape records →
//! rank. Every stage depends on the previous one, so they run in sequence.

use crate::classifier::{ClassificationCache, ColumnClassification, ColumnClassifier};
use crate::config::SeedColumns;
use crate::dataset::{column_universe, hotel_name, RawHotelRecord};
use crate::error::Result;
use crate::oracle::{Oracle, RetryPolicy};
use crate::ranker::{HotelRanker, RankedHotel, RankingPolicy};
use crate::reshape::reshape_all;
use crate::room::{required_adults, RoomConfiguration};
use crate::validator::QueryValidator;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Hotel recommendation pipeline over one oracle
pub struct HotelRecommender {
    validator: QueryValidator,
    classifier: ColumnClassifier,
    ranker: HotelRanker,
    cache: ClassificationCache,
    query_as_amenity_hint: bool,
}

impl HotelRecommender {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        seeds: SeedColumns,
        policy: RankingPolicy,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            validator: QueryValidator::new(Arc::clone(&oracle), retry.clone()),
            classifier: ColumnClassifier::new(Arc::clone(&oracle), seeds, retry.clone()),
            ranker: HotelRanker::new(oracle, policy, retry),
            cache: ClassificationCache::default(),
            query_as_amenity_hint: false,
        }
    }

    /// Pass each query to amenity detection as a hint.
    ///
    /// Catches amenity columns only the current query cares about, at the
    /// cost of reclassifying whenever the query changes.
    pub fn with_query_amenity_hint(mut self, enabled: bool) -> Self {
        self.query_as_amenity_hint = enabled;
        self
    }

    /// Recommend hotels for `query`.
    ///
    /// Returns `Ok(None)` when the query is not a bookable accommodation
    /// request, otherwise up to 10 hotels, best first.
    pub async fn find_matching_hotels(
        &self,
        query: &str,
        hotels: &[RawHotelRecord],
    ) -> Result<Option<Vec<RankedHotel>>> {
        if query.trim().is_empty() {
            info!("Empty query rejected");
            return Ok(None);
        }
        if !self.validator.is_valid_booking_request(query).await? {
            info!("Query is not a booking request");
            return Ok(None);
        }

        let universe = column_universe(hotels);
        let hint = self.query_as_amenity_hint.then_some(query);
        let classification = self
            .cache
            .get_or_classify(&self.classifier, &universe, hint)
            .await?;

        let reshaped = reshape_all(hotels, &universe, &classification);
        let ranked = self.ranker.rank_hotels(&reshaped, query).await?;

        for name in room_configuration_conflicts(query, &ranked, hotels) {
            warn!(hotel = %name, "Ranked hotel has no room configuration matching the requested adults");
        }

        Ok(Some(ranked))
    }

    /// Query validation on its own
    pub async fn validate(&self, query: &str) -> Result<bool> {
        self.validator.is_valid_booking_request(query).await
    }

    /// Column classification for a dataset, through the cache
    pub async fn classify_columns(&self, hotels: &[RawHotelRecord]) -> Result<ColumnClassification> {
        let universe = column_universe(hotels);
        self.cache
            .get_or_classify(&self.classifier, &universe, None)
            .await
    }
}

/// Ranked hotels whose room configurations all miss an explicit adult count
/// in the query. Hotels without any configuration code are not reported.
pub fn room_configuration_conflicts(
    query: &str,
    ranked: &[RankedHotel],
    hotels: &[RawHotelRecord],
) -> Vec<String> {
    let Some(adults) = required_adults(query) else {
        return Vec::new();
    };

    let by_name: HashMap<&str, &RawHotelRecord> = hotels
        .iter()
        .filter_map(|h| hotel_name(h).map(|name| (name, h)))
        .collect();

    ranked
        .iter()
        .filter(|hotel| {
            by_name.get(hotel.name.as_str()).is_some_and(|record| {
                let configs = RoomConfiguration::in_record(record);
                !configs.is_empty() && !configs.iter().any(|c| c.satisfies_adults(adults))
            })
        })
        .map(|hotel| hotel.name.clone())
        .collect()
}
