//! hotelmatch - LLM-assisted hotel recommender
//!
//! ## Usage
//!
//! ```bash
//! hotelmatch recommend "quiet family hotel near the forest" --hotels data/hotels.json
//! hotelmatch validate "book me a room for last weekend"
//! hotelmatch classify --hotels data/hotels.json
//! hotelmatch convert data/hotels.csv data/hotels.json
//! ```
//!
//! LLM settings come from flags or the environment (`LLM_BASE_URL`,
//! `LLM_API_KEY`, `LLM_MODEL`, `AZURE_OPENAI_API_VERSION`); a `.env` file in
//! the working directory is loaded first.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use hotelmatch::config::{LlmConfig, SeedColumns};
use hotelmatch::oracle::{HttpOracle, Oracle, RetryPolicy};
use hotelmatch::ranker::RankingPolicy;
use hotelmatch::{dataset, HotelRecommender, RecommenderError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// LLM-assisted hotel recommender
#[derive(Parser)]
#[command(name = "hotelmatch")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend hotels for a free-text request
    Recommend {
        /// Accommodation request
        query: String,

        /// Hotel dataset (JSON list or object keyed by hotel name)
        #[arg(long)]
        hotels: PathBuf,

        #[command(flatten)]
        seeds: SeedArgs,

        /// Replacement ranking rubric (plain text)
        #[arg(long)]
        rubric: Option<PathBuf>,

        /// Also use the query as a hint for amenity detection
        #[arg(long)]
        amenity_hint: bool,

        /// Directory to save the ranked result as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Check whether a query is a valid booking request
    Validate {
        /// Accommodation request
        query: String,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Show how the dataset's columns are classified
    Classify {
        /// Hotel dataset (JSON list or object keyed by hotel name)
        #[arg(long)]
        hotels: PathBuf,

        #[command(flatten)]
        seeds: SeedArgs,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Convert a CSV hotel export to the JSON dataset format
    Convert {
        /// Input CSV file
        csv: PathBuf,

        /// Output JSON file
        json: PathBuf,
    },
}

#[derive(Args)]
struct SeedArgs {
    /// Seed list of accepted columns (first line, comma-separated)
    #[arg(long, default_value = "accepted_columns.txt")]
    accepted_columns: PathBuf,

    /// Seed list of ignored columns (first line, comma-separated)
    #[arg(long, default_value = "ignored_columns.txt")]
    ignored_columns: PathBuf,
}

#[derive(Args)]
struct LlmArgs {
    /// LLM API base URL (OpenAI-compatible, or the Azure resource endpoint)
    #[arg(long, env = "LLM_BASE_URL", default_value = "https://api.openai.com/v1")]
    llm_base_url: String,

    /// LLM API key
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    llm_key: String,

    /// LLM model name (deployment name on Azure)
    #[arg(long, env = "LLM_MODEL", default_value = "gpt-4o-mini")]
    llm_model: String,

    /// Azure OpenAI API version; switches to Azure deployment routing
    #[arg(long, env = "AZURE_OPENAI_API_VERSION")]
    azure_api_version: Option<String>,

    /// Fixed sampling seed for repeatable rankings
    #[arg(long)]
    seed: Option<u64>,

    /// Attempts per oracle call before giving up
    #[arg(long, default_value = "4")]
    max_attempts: u32,

    /// Timeout per oracle call in seconds
    #[arg(long, default_value = "90")]
    timeout_secs: u64,
}

impl LlmArgs {
    fn to_config(&self) -> LlmConfig {
        let mut config = LlmConfig::new(&self.llm_base_url, &self.llm_key, &self.llm_model);
        config.azure_api_version = self.azure_api_version.clone();
        config.seed = self.seed;
        config.retry = RetryPolicy {
            max_attempts: self.max_attempts,
            call_timeout: Duration::from_secs(self.timeout_secs),
            ..RetryPolicy::default()
        };
        config
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for results
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if cli.log_json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Recommend {
            query,
            hotels,
            seeds,
            rubric,
            amenity_hint,
            output,
            llm,
        } => {
            let policy = match rubric {
                Some(path) => RankingPolicy::from_file(&path)?,
                None => RankingPolicy::default(),
            };
            run_recommend(&query, &hotels, &seeds, policy, amenity_hint, output.as_deref(), &llm).await
        }
        Commands::Validate { query, llm } => run_validate(&query, &llm).await,
        Commands::Classify { hotels, seeds, llm } => run_classify(&hotels, &seeds, &llm).await,
        Commands::Convert { csv, json } => {
            let count = dataset::csv_to_json(&csv, &json)
                .with_context(|| format!("Failed to convert {:?}", csv))?;
            println!("Converted {} hotels to {:?}", count, json);
            Ok(())
        }
    }
}

fn build_oracle(llm: &LlmArgs) -> Result<(LlmConfig, Arc<HttpOracle>)> {
    let config = llm.to_config();
    let oracle = HttpOracle::new(&config).context("Failed to set up LLM client")?;
    info!(model = %config.model, endpoint = %config.endpoint()?, "LLM client ready");
    Ok((config, Arc::new(oracle)))
}

fn build_recommender(
    config: &LlmConfig,
    oracle: &Arc<HttpOracle>,
    seeds: &SeedArgs,
    policy: RankingPolicy,
) -> Result<HotelRecommender> {
    let seeds = SeedColumns::from_files(&seeds.accepted_columns, &seeds.ignored_columns)
        .context("Failed to load seed column lists")?;
    let oracle: Arc<dyn Oracle> = oracle.clone();
    Ok(HotelRecommender::new(oracle, seeds, policy, config.retry.clone()))
}

// ============================================================================
// Commands
// ============================================================================

async fn run_recommend(
    query: &str,
    hotels_path: &Path,
    seeds: &SeedArgs,
    policy: RankingPolicy,
    amenity_hint: bool,
    output: Option<&Path>,
    llm: &LlmArgs,
) -> Result<()> {
    let hotels = dataset::load_dataset(hotels_path)
        .with_context(|| format!("Failed to load hotels from {:?}", hotels_path))?;
    let (config, oracle) = build_oracle(llm)?;
    let recommender =
        build_recommender(&config, &oracle, seeds, policy)?.with_query_amenity_hint(amenity_hint);

    let result = match recommender.find_matching_hotels(query, &hotels).await {
        Ok(result) => result,
        Err(RecommenderError::RankingUnparsed { raw, .. }) => {
            // Best effort: hand back what the oracle said
            eprintln!("The ranking answer could not be parsed; raw output follows.");
            println!("{}", raw);
            print_usage(&oracle);
            return Ok(());
        }
        Err(e) => return Err(e).context("Recommendation failed"),
    };

    let json = serde_json::to_string_pretty(&result)?;
    println!("{}", json);

    match &result {
        None => eprintln!("Query is not a valid booking request."),
        Some(ranked) => eprintln!("{} matching hotels.", ranked.len()),
    }

    if let Some(dir) = output {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {:?}", dir))?;
        let path = dir.join(format!(
            "recommendation_{}.json",
            Local::now().format("%Y%m%d_%H%M%S")
        ));
        std::fs::write(&path, &json).context("Failed to write recommendation")?;
        eprintln!("Saved: {:?}", path);
    }

    print_usage(&oracle);
    Ok(())
}

async fn run_validate(query: &str, llm: &LlmArgs) -> Result<()> {
    let (config, oracle) = build_oracle(llm)?;
    let validator = hotelmatch::validator::QueryValidator::new(oracle.clone(), config.retry.clone());

    let valid = validator
        .is_valid_booking_request(query)
        .await
        .context("Validation failed")?;
    println!("{}", if valid { "VALID" } else { "INVALID" });
    Ok(())
}

async fn run_classify(hotels_path: &Path, seeds: &SeedArgs, llm: &LlmArgs) -> Result<()> {
    let hotels = dataset::load_dataset(hotels_path)
        .with_context(|| format!("Failed to load hotels from {:?}", hotels_path))?;
    let (config, oracle) = build_oracle(llm)?;
    let recommender = build_recommender(&config, &oracle, seeds, RankingPolicy::default())?;

    let classification = recommender
        .classify_columns(&hotels)
        .await
        .context("Column classification failed")?;
    let universe = dataset::column_universe(&hotels);
    let residual = classification.residual(&universe);

    println!("{}", serde_json::to_string_pretty(&classification)?);
    eprintln!("Unclassified (reshaped as additional info): {:?}", residual);
    print_usage(&oracle);
    Ok(())
}

fn print_usage(oracle: &HttpOracle) {
    let usage = oracle.usage();
    eprintln!(
        "Token usage: {} prompt + {} completion = {} total",
        usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
    );
}
