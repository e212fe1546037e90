//! Column classification.
//!
//! Splits the column universe of a dataset into accepted attributes, ignored
//! attributes and amenity flags. Semantic judgment comes from the oracle;
//! this module keeps its answers honest:
//!
//! - answers naming columns outside the candidate set are discarded,
//! - exact seed-list members are always kept, even if the oracle omits them,
//! - each stage only sees the columns earlier stages left over, so the three
//!   sets never overlap.

use crate::config::SeedColumns;
use crate::error::Result;
use crate::normalize::normalize;
use crate::oracle::{ask, parse_string_list, ChatMessage, Oracle, RetryPolicy};
use crate::prompts::column_classifier::{build_amenity_prompt, build_reference_prompt, SYSTEM_PROMPT};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Which bucket a column landed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Accepted,
    Ignored,
    Amenity,
    /// Not claimed by any stage; reshaped as additional info
    Residual,
}

/// Result of classifying one column universe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnClassification {
    pub accepted: BTreeSet<String>,
    pub ignored: BTreeSet<String>,
    pub amenity: BTreeSet<String>,
}

impl ColumnClassification {
    pub fn kind(&self, column: &str) -> ColumnKind {
        if self.amenity.contains(column) {
            ColumnKind::Amenity
        } else if self.accepted.contains(column) {
            ColumnKind::Accepted
        } else if self.ignored.contains(column) {
            ColumnKind::Ignored
        } else {
            ColumnKind::Residual
        }
    }

    /// Columns of `universe` that no stage claimed
    pub fn residual<'a>(&self, universe: &'a BTreeSet<String>) -> Vec<&'a String> {
        universe
            .iter()
            .filter(|c| self.kind(c) == ColumnKind::Residual)
            .collect()
    }
}

/// Oracle-backed column classifier
pub struct ColumnClassifier {
    oracle: Arc<dyn Oracle>,
    seeds: SeedColumns,
    retry: RetryPolicy,
}

impl ColumnClassifier {
    pub fn new(oracle: Arc<dyn Oracle>, seeds: SeedColumns, retry: RetryPolicy) -> Self {
        Self { oracle, seeds, retry }
    }

    pub fn seeds(&self) -> &SeedColumns {
        &self.seeds
    }

    /// Columns related to the accepted reference list.
    pub async fn classify_accepted(&self, columns: &[String], seed: &[String]) -> Result<Vec<String>> {
        self.classify_against("accepted columns", "accepted", columns, seed)
            .await
    }

    /// Columns related to the ignored reference list.
    pub async fn classify_ignored(&self, columns: &[String], seed: &[String]) -> Result<Vec<String>> {
        self.classify_against("ignored columns", "ignored", columns, seed)
            .await
    }

    /// Amenity columns among those not already accepted or ignored.
    ///
    /// `hint` is free text describing amenities the current request cares
    /// about; it widens what the oracle counts as an amenity.
    pub async fn classify_amenities(
        &self,
        columns: &[String],
        already_accepted: &[String],
        already_ignored: &[String],
        hint: Option<&str>,
    ) -> Result<Vec<String>> {
        let candidates: Vec<String> = columns
            .iter()
            .filter(|c| !already_accepted.contains(c) && !already_ignored.contains(c))
            .cloned()
            .collect();
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_amenity_prompt(&candidates, hint)),
        ];
        let answer = ask(
            self.oracle.as_ref(),
            "amenity columns",
            &messages,
            &self.retry,
            parse_string_list,
        )
        .await?;

        Ok(restrict_to_candidates(&candidates, answer))
    }

    /// Run the three stages over a column universe.
    pub async fn classify(
        &self,
        universe: &BTreeSet<String>,
        hint: Option<&str>,
    ) -> Result<ColumnClassification> {
        let all: Vec<String> = universe.iter().cloned().collect();

        let accepted = self.classify_accepted(&all, &self.seeds.accepted).await?;

        let remaining: Vec<String> = all
            .iter()
            .filter(|c| !accepted.contains(c))
            .cloned()
            .collect();
        let ignored = self.classify_ignored(&remaining, &self.seeds.ignored).await?;

        let amenity = self
            .classify_amenities(&all, &accepted, &ignored, hint)
            .await?;

        let classification = ColumnClassification {
            accepted: accepted.into_iter().collect(),
            ignored: ignored.into_iter().collect(),
            amenity: amenity.into_iter().collect(),
        };

        info!(
            columns = universe.len(),
            accepted = classification.accepted.len(),
            ignored = classification.ignored.len(),
            amenity = classification.amenity.len(),
            residual = classification.residual(universe).len(),
            "Column classification complete"
        );

        Ok(classification)
    }

    async fn classify_against(
        &self,
        task: &'static str,
        kind: &str,
        columns: &[String],
        reference: &[String],
    ) -> Result<Vec<String>> {
        if columns.is_empty() {
            return Ok(Vec::new());
        }

        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_reference_prompt(kind, columns, reference)),
        ];
        let answer = ask(self.oracle.as_ref(), task, &messages, &self.retry, parse_string_list).await?;

        let mut selected = restrict_to_candidates(columns, answer);
        for column in columns {
            if reference.contains(column) && !selected.contains(column) {
                debug!(column = %column, task, "Adding seed column the oracle omitted");
                selected.push(column.clone());
            }
        }
        Ok(selected)
    }
}

/// Map oracle answers onto candidate names, dropping anything unknown.
///
/// Answers are matched exactly first, then through the normalizer, since
/// oracles like to echo column names with their original capitalization.
fn restrict_to_candidates(candidates: &[String], answer: Vec<String>) -> Vec<String> {
    let mut selected: Vec<String> = Vec::new();
    for item in answer {
        let column = if candidates.contains(&item) {
            item
        } else {
            let normalized = normalize(&item);
            if !candidates.contains(&normalized) {
                debug!(column = %item, "Discarding column outside the candidate set");
                continue;
            }
            normalized
        };

        if !selected.contains(&column) {
            selected.push(column);
        }
    }
    selected
}

#[derive(Debug)]
struct CachedClassification {
    universe: BTreeSet<String>,
    hint: Option<String>,
    classification: ColumnClassification,
}

/// Single-slot cache of the last classification.
///
/// The lock is held while a classification runs, so concurrent requests for
/// the same schema wait for one writer instead of classifying twice. A
/// request with a different column universe or hint replaces the slot.
#[derive(Debug, Default)]
pub struct ClassificationCache {
    slot: Mutex<Option<CachedClassification>>,
}

impl ClassificationCache {
    pub async fn get_or_classify(
        &self,
        classifier: &ColumnClassifier,
        universe: &BTreeSet<String>,
        hint: Option<&str>,
    ) -> Result<ColumnClassification> {
        let mut slot = self.slot.lock().await;

        if let Some(cached) = slot.as_ref() {
            if cached.universe == *universe && cached.hint.as_deref() == hint {
                debug!(columns = universe.len(), "Classification cache hit");
                return Ok(cached.classification.clone());
            }
            debug!("Column universe changed, reclassifying");
        }

        let classification = classifier.classify(universe, hint).await?;
        *slot = Some(CachedClassification {
            universe: universe.clone(),
            hint: hint.map(str::to_string),
            classification: classification.clone(),
        });
        Ok(classification)
    }

    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}
