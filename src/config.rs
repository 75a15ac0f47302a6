use anyhow::{Context, Result};

use crate::strategy::FragmentStyle;

pub const DEFAULT_SEARCH_URL: &str = "https://api.perplexity.ai/chat/completions";
pub const DEFAULT_PLAN_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Clone)]
pub struct Config {
    pub search_api_key: String,
    pub search_api_url: String,
    pub search_model: String,
    pub plan_api_key: String,
    pub plan_api_url: String,
    pub plan_model: String,
    pub plan_temperature: f32,
    pub strategy_style: FragmentStyle,
    pub session_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Missing API keys are not fatal; the API will reject the request.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());

        let config = Self {
            search_api_key: var("PERPLEXITY_API_KEY", ""),
            search_api_url: var("SEARCH_API_URL", DEFAULT_SEARCH_URL),
            search_model: var("SEARCH_MODEL", "llama-3.1-70b-instruct"),
            plan_api_key: var("OPENAI_API_KEY", ""),
            plan_api_url: var("PLAN_API_URL", DEFAULT_PLAN_URL),
            plan_model: var("PLAN_MODEL", "gpt-4o-mini"),
            plan_temperature: var("PLAN_TEMPERATURE", "0.7")
                .parse()
                .context("PLAN_TEMPERATURE must be a number")?,
            strategy_style: var("STRATEGY_STYLE", "ranked")
                .parse()
                .context("STRATEGY_STYLE must be listed or ranked")?,
            session_ttl_secs: var("SESSION_TTL_SECS", "3600")
                .parse()
                .context("SESSION_TTL_SECS must be a number")?,
        };

        if config.search_api_key.is_empty() {
            tracing::warn!("PERPLEXITY_API_KEY is not set; searches will be rejected by the API");
        }
        if config.plan_api_key.is_empty() {
            tracing::warn!("OPENAI_API_KEY is not set; plan requests will be rejected by the API");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.search_api_url, DEFAULT_SEARCH_URL);
        assert_eq!(config.search_model, "llama-3.1-70b-instruct");
        assert_eq!(config.plan_api_url, DEFAULT_PLAN_URL);
        assert_eq!(config.plan_temperature, 0.7);
        assert_eq!(config.strategy_style, FragmentStyle::Ranked);
        assert_eq!(config.session_ttl_secs, 3600);
        assert!(config.search_api_key.is_empty());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PERPLEXITY_API_KEY", "pplx"),
            ("OPENAI_API_KEY", "sk"),
            ("STRATEGY_STYLE", "listed"),
            ("PLAN_TEMPERATURE", "0.2"),
        ]))
        .unwrap();
        assert_eq!(config.search_api_key, "pplx");
        assert_eq!(config.plan_api_key, "sk");
        assert_eq!(config.strategy_style, FragmentStyle::Listed);
        assert_eq!(config.plan_temperature, 0.2);
    }

    #[test]
    fn test_bad_numbers_are_errors() {
        assert!(Config::from_lookup(lookup(&[("SESSION_TTL_SECS", "soon")])).is_err());
        assert!(Config::from_lookup(lookup(&[("STRATEGY_STYLE", "random")])).is_err());
    }
}
