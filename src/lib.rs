//! # hotelmatch
//!
//! LLM-assisted hotel recommender: filters and ranks a hotel catalog against
//! a free-text accommodation request.
//!
//! ## Modules
//!
//! - [`recommender`] - End-to-end pipeline (`find_matching_hotels`)
//! - [`validator`] - Booking-request validation
//! - [`classifier`] - Column classification into accepted / ignored / amenity
//! - [`reshape`] - Raw record to ranker input
//! - [`ranker`] - Hotel filtering and ranking
//! - [`oracle`] - LLM boundary, retry policy
//! - [`normalize`] - Column name / amenity text normalization
//! - [`room`] - Room configuration codes (`2A1C`)
//! - [`dataset`] - Dataset loading and CSV conversion
//! - [`config`] - LLM settings and seed column lists
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hotelmatch::{config::{LlmConfig, SeedColumns}, dataset, oracle::HttpOracle};
//! use hotelmatch::{ranker::RankingPolicy, recommender::HotelRecommender};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = LlmConfig::new("https://api.openai.com/v1", "sk-...", "gpt-4o-mini");
//!     let oracle = Arc::new(HttpOracle::new(&config)?);
//!     let recommender = HotelRecommender::new(
//!         oracle,
//!         SeedColumns::new(["name", "pricepernight", "rating"], ["latitude", "longitude"]),
//!         RankingPolicy::default(),
//!         config.retry.clone(),
//!     );
//!
//!     let hotels = dataset::load_dataset("hotels.json".as_ref())?;
//!     match recommender.find_matching_hotels("family hotel near a lake", &hotels).await? {
//!         Some(ranked) => println!("{} hotels", ranked.len()),
//!         None => println!("not a booking request"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod dataset;
pub mod error;
pub mod normalize;
pub mod oracle;
pub mod prompts;
pub mod ranker;
pub mod recommender;
pub mod reshape;
pub mod room;
pub mod validator;

pub use error::{RecommenderError, Result};
pub use ranker::RankedHotel;
pub use recommender::HotelRecommender;
