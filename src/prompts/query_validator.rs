//! Booking-request validation prompts.

use super::fill_template;

/// System prompt for query validation
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that classifies hotel booking requests.";

/// Accepted answer for a bookable request
pub const VALID_TOKEN: &str = "VALID";

/// Accepted answer for anything else
pub const INVALID_TOKEN: &str = "INVALID";

/// User prompt template. Placeholder: {query}
pub const USER_PROMPT_TEMPLATE: &str = r#"You are a classification system. Given a user input, decide whether it is a valid accommodation booking request.

- A valid request can mention accommodation preferences, amenities, budget, stay details, planned activities, or similar relevant information.
- Anything unrelated to booking accommodation, impossible, or nonsensical is not valid. This includes stays in the past and physically impossible locations or constraints.

Respond only with:
- "VALID" if it is a valid hotel booking request
- "INVALID" if it is not

Examples:
- User Input: "I want to book a hotel in Paris from May 5 to May 10 with a pool at 30000 feet"
  Answer: INVALID

- User Input: "What's the weather like in Paris?"
  Answer: INVALID

- User Input: "Book me a hotel in New York near Central Park for next weekend"
  Answer: VALID

- User Input: "Book me a hotel in New York near Central Park for last weekend"
  Answer: INVALID

- User Input: "dghasjkdhgasdjkhg"
  Answer: INVALID

Now classify the following input:
User Input: "{query}"
Answer:"#;

/// Build user prompt for a query
pub fn build_user_prompt(query: &str) -> String {
    fill_template(USER_PROMPT_TEMPLATE, &[("query", query)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_user_prompt() {
        let prompt = build_user_prompt("a quiet room in Vienna");
        assert!(prompt.ends_with("User Input: \"a quiet room in Vienna\"\nAnswer:"));
    }
}
