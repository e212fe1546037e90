//! Hotel filtering and ranking prompts.
//!
//! The rubric is a policy document: [`DEFAULT_RUBRIC`] is what ships, but the
//! ranker accepts any replacement text through
//! [`RankingPolicy`](crate::ranker::RankingPolicy).

use super::fill_template;

/// System prompt for hotel ranking
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that ranks hotels.";

/// Built-in ranking rubric
pub const DEFAULT_RUBRIC: &str = r#"Your task:

1. Understand the user query and infer all explicit and implicit preferences (e.g. "luxury" implies higher star category and amenities like spa or wellness center).
2. Filter the hotels according to the user's requirements exactly, unless the user relaxes them. A perfect match fulfils all key preferences; partial matches are allowed only if the user signals flexibility.
3. Rank the matching hotels from best to worst by how well they satisfy the query. The strongest matches come first.
4. Return up to 10 hotels in decreasing order of match quality. The list may be shorter than 10, or empty if nothing matches reasonably well.

Important notes:

1. All user queries are valid hotel booking requests.
2. Amenities and additional_info may use German terms (e.g. "schwimmbad" = swimming pool). Match by meaning, not by spelling: "pool" matches "schwimmbad".
3. Be flexible with minor variations in spelling or phrasing.
4. Prioritize user preferences over general popularity or star category.
5. Do not invent hotels and do not change any data field.
6. Match the query as closely as possible, even if that leaves fewer than 10 or zero matches.
7. Consider the context of hotel properties, not only exact values.
8. Values like "2A" or "2A1C" are room configurations: "<N>A<M>C" means N adults and M children. A hotel satisfies a request for "kA" only if its adult count is exactly k; extra child capacity does not disqualify it. "2A1C" matches "2A", while "1A" and "3A" do not. If no exact configuration exists, accept one with more beds only when no exact or smaller suitable option exists, preferably when an extra bed is available at no added cost.
9. Be consistent: the same query and the same hotel list must always produce the same hotels in the same order.

Ranking criteria, in priority order after the hard requirements above:

- Budget-oriented queries: prefer lower price per night, plus free meals, free cancellation and other free amenities that save money. These never outrank luxury features the user explicitly asked for.
- Location-oriented queries: use popular_location_rank or any absolute location score. If a specific place is mentioned, prefer hotels within a reasonable distance of it.
- Users who mention a car or parking weight free parking higher. Users who do not mention a car weight short distance to points of interest higher.
- Luxury or special-adjective queries: prefer higher star category and exclusive amenities beyond the necessary ones.
- Family queries: prefer family- and kid-friendly amenities, activities and nearby places.
- Business queries: prefer meeting rooms, business centers and free Wi-Fi.
- Fun queries: prefer entertainment, nightlife, bars or pubs, activities and proximity to attractions.
- Couple queries: prefer spas, pools and romantic or adults-only settings.
- Pet queries: prefer hotels that allow pets and offer pet amenities.
- Wellness or relaxation queries: prefer spas, wellness centers and fitness facilities.
- Among hotels of similar relevance, prefer the one with more ratings (ratingscount).
- If two hotels are still tied, prefer the one with the higher ltr score when present."#;

/// User prompt template. Placeholders: {rubric}, {query}, {hotels}
pub const USER_PROMPT_TEMPLATE: &str = r#"You are a hotel booking assistant.

Input:

1. A user query describing what they want in a hotel booking (e.g. "a 4-star hotel near the beach with free breakfast and spa").
2. A JSON list of hotel objects with attributes such as name, price, rating, star category, amenities and additional_info. Some hotels have extra keys; the amenities and additional_info lists can be empty.

{rubric}

Output format: a JSON list of up to 10 objects sorted from best to worst match, or an empty JSON list if nothing matches. Each object has exactly these fields:
- "name": the hotel name, copied exactly from the input
- "features": up to 3 short strings naming the top factors behind this hotel's rank

**Important:**
- ONLY return a plain JSON list.
- Do NOT add any headings, explanations, code blocks or extra text.

Input:
User query: "{query}"
Hotel list: {hotels}
Output:"#;

/// Build user prompt from rubric, query and serialized hotels
pub fn build_user_prompt(rubric: &str, query: &str, hotels_json: &str) -> String {
    fill_template(
        USER_PROMPT_TEMPLATE,
        &[("rubric", rubric), ("query", query), ("hotels", hotels_json)],
    )
}
