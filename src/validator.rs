//! Booking-request validation.
//!
//! Rejects queries that are not plausible accommodation requests before any
//! dataset work happens. Whether a date has passed or a location exists is
//! left entirely to the oracle.

use crate::error::Result;
use crate::oracle::{ask, ChatMessage, Oracle, RetryPolicy};
use crate::prompts::query_validator::{build_user_prompt, INVALID_TOKEN, SYSTEM_PROMPT, VALID_TOKEN};
use std::sync::Arc;
use tracing::info;

/// Oracle-backed query validator
pub struct QueryValidator {
    oracle: Arc<dyn Oracle>,
    retry: RetryPolicy,
}

impl QueryValidator {
    pub fn new(oracle: Arc<dyn Oracle>, retry: RetryPolicy) -> Self {
        Self { oracle, retry }
    }

    /// Ask the oracle whether `query` is a genuine booking request.
    ///
    /// Answers other than exactly `VALID` or `INVALID` are retried under the
    /// retry policy.
    pub async fn is_valid_booking_request(&self, query: &str) -> Result<bool> {
        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_user_prompt(query)),
        ];

        let valid = ask(
            self.oracle.as_ref(),
            "query validation",
            &messages,
            &self.retry,
            parse_verdict,
        )
        .await?;

        info!(valid, "Query validated");
        Ok(valid)
    }
}

fn parse_verdict(content: &str) -> Option<bool> {
    match content.trim() {
        VALID_TOKEN => Some(true),
        INVALID_TOKEN => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecommenderError;
    use crate::oracle::testing::ScriptedOracle;

    fn validator(oracle: &Arc<ScriptedOracle>, attempts: u32) -> QueryValidator {
        let oracle: Arc<dyn Oracle> = oracle.clone();
        QueryValidator::new(oracle, RetryPolicy::immediate(attempts))
    }

    #[test]
    fn test_parse_verdict() {
        assert_eq!(parse_verdict("VALID"), Some(true));
        assert_eq!(parse_verdict("  INVALID\n"), Some(false));
        assert_eq!(parse_verdict("valid"), None);
        assert_eq!(parse_verdict("Answer: VALID"), None);
    }

    #[tokio::test]
    async fn test_valid_and_invalid() -> Result<()> {
        let oracle = Arc::new(ScriptedOracle::new(["VALID", "INVALID"]));
        let validator = validator(&oracle, 1);

        assert!(validator.is_valid_booking_request("hotel in Rome next week").await?);
        assert!(!validator.is_valid_booking_request("what's the weather").await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_unexpected_answer_is_retried() -> Result<()> {
        let oracle = Arc::new(ScriptedOracle::new(["Probably valid?", "VALID"]));
        let validator = validator(&oracle, 3);

        assert!(validator.is_valid_booking_request("2 nights in Graz").await?);
        assert_eq!(oracle.calls(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_gives_up_after_budget() {
        let oracle = Arc::new(ScriptedOracle::new(["maybe", "maybe", "maybe"]));
        let validator = validator(&oracle, 3);

        let result = validator.is_valid_booking_request("2 nights in Graz").await;
        assert!(matches!(
            result,
            Err(RecommenderError::MalformedOutput { attempts: 3, .. })
        ));
    }
}
