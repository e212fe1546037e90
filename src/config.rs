//! Runtime configuration: LLM endpoint settings and seed column lists.

use crate::error::{RecommenderError, Result};
use crate::normalize::normalize;
use crate::oracle::RetryPolicy;
use std::path::Path;
use tracing::info;
use url::Url;

/// LLM configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API root, e.g. `https://api.openai.com/v1` or an Azure resource endpoint
    pub base_url: String,
    pub api_key: String,
    /// Model name, or deployment name when talking to Azure
    pub model: String,
    /// Switches to Azure OpenAI deployment routing when set
    pub azure_api_version: Option<String>,
    pub temperature: f32,
    /// Fixed sampling seed for repeatable rankings
    pub seed: Option<u64>,
    pub retry: RetryPolicy,
}

impl LlmConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            azure_api_version: None,
            temperature: 0.0,
            seed: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Chat-completion endpoint for this configuration
    pub fn endpoint(&self) -> Result<Url> {
        let base = format!("{}/", self.base_url.trim_end_matches('/'));
        let base = Url::parse(&base)
            .map_err(|e| RecommenderError::Config(format!("Invalid base URL '{}': {}", self.base_url, e)))?;

        let path = match self.azure_api_version {
            Some(_) => format!("openai/deployments/{}/chat/completions", self.model),
            None => "chat/completions".to_string(),
        };
        let mut url = base
            .join(&path)
            .map_err(|e| RecommenderError::Config(format!("Invalid endpoint path: {}", e)))?;

        if let Some(version) = &self.azure_api_version {
            url.query_pairs_mut().append_pair("api-version", version);
        }
        Ok(url)
    }
}

/// Reference column names that steer the column classifier.
///
/// Items are stored normalized. Each request gets its own copy, so nothing a
/// request does can leak into the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedColumns {
    pub accepted: Vec<String>,
    pub ignored: Vec<String>,
}

impl SeedColumns {
    pub fn new<A, I, S, T>(accepted: A, ignored: I) -> Self
    where
        A: IntoIterator<Item = S>,
        I: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            accepted: normalize_items(accepted),
            ignored: normalize_items(ignored),
        }
    }

    /// Load both lists from their line-oriented files.
    pub fn from_files(accepted_path: &Path, ignored_path: &Path) -> Result<Self> {
        let seeds = Self {
            accepted: read_seed_file(accepted_path)?,
            ignored: read_seed_file(ignored_path)?,
        };
        info!(
            accepted = seeds.accepted.len(),
            ignored = seeds.ignored.len(),
            "Loaded seed columns"
        );
        Ok(seeds)
    }
}

/// Read the first line of a seed file as a comma-separated column list.
pub fn read_seed_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        RecommenderError::Config(format!("Cannot read seed file {:?}: {}", path, e))
    })?;
    Ok(parse_seed_line(content.lines().next().unwrap_or("")))
}

fn parse_seed_line(line: &str) -> Vec<String> {
    normalize_items(line.trim().split(','))
}

fn normalize_items<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| normalize(item.as_ref().trim()))
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_openai_endpoint() -> Result<()> {
        let config = LlmConfig::new("https://api.openai.com/v1/", "key", "gpt-4o-mini");
        assert_eq!(
            config.endpoint()?.as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
        Ok(())
    }

    #[test]
    fn test_azure_endpoint() -> Result<()> {
        let mut config = LlmConfig::new("https://example.openai.azure.com", "key", "gpt-4o-eu");
        config.azure_api_version = Some("2025-01-01-preview".to_string());
        assert_eq!(
            config.endpoint()?.as_str(),
            "https://example.openai.azure.com/openai/deployments/gpt-4o-eu/chat/completions?api-version=2025-01-01-preview"
        );
        Ok(())
    }

    #[test]
    fn test_invalid_base_url() {
        let config = LlmConfig::new("not a url", "key", "m");
        assert!(matches!(config.endpoint(), Err(RecommenderError::Config(_))));
    }

    #[test]
    fn test_seed_file_reads_first_line_only() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "Price-Per-Night, Rating ,Stars,")?;
        writeln!(file, "second,line")?;

        let seeds = read_seed_file(file.path())?;
        assert_eq!(seeds, vec!["price_per_night", "rating", "stars"]);
        Ok(())
    }

    #[test]
    fn test_missing_seed_file() {
        let result = read_seed_file(Path::new("/nonexistent/accepted_columns.txt"));
        assert!(matches!(result, Err(RecommenderError::Config(_))));
    }

    #[test]
    fn test_seed_columns_from_files() -> Result<()> {
        let mut accepted = NamedTempFile::new()?;
        writeln!(accepted, "name,rating")?;
        let mut ignored = NamedTempFile::new()?;
        writeln!(ignored, "Längengrad,Breitengrad")?;

        let seeds = SeedColumns::from_files(accepted.path(), ignored.path())?;
        assert_eq!(seeds, SeedColumns::new(["name", "rating"], ["laengengrad", "breitengrad"]));
        Ok(())
    }
}
