pub mod planner;
pub mod searcher;

use std::time::Instant;

use crate::config::Config;
use crate::llm::{LlmClient, LlmError};
use crate::strategy::StrategyWeights;

pub use planner::{DayCount, Planner};
pub use searcher::Searcher;

/// Both outbound calls, wired from config.
pub struct ContentFinder {
    searcher: Searcher,
    planner: Planner,
}

impl ContentFinder {
    pub fn new(config: &Config) -> Self {
        let search_llm = LlmClient::new(&config.search_api_key, &config.search_api_url);
        let plan_llm = LlmClient::new(&config.plan_api_key, &config.plan_api_url);

        Self {
            searcher: Searcher::new(search_llm, config.search_model.clone(), config.strategy_style),
            planner: Planner::new(
                plan_llm,
                config.plan_model.clone(),
                config.plan_temperature,
                config.strategy_style,
            ),
        }
    }

    pub async fn search(&self, topic: &str, weights: &StrategyWeights) -> Result<String, LlmError> {
        let start = Instant::now();
        let result = self.searcher.search(topic, weights).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(text) => tracing::info!(latency_ms, chars = text.len(), "Search completed"),
            Err(e) => tracing::warn!(latency_ms, kind = %e.kind(), "Search failed: {}", e),
        }
        result
    }

    pub async fn plan(
        &self,
        results: &str,
        days: DayCount,
        weights: &StrategyWeights,
    ) -> Result<String, LlmError> {
        let start = Instant::now();
        let result = self.planner.plan(results, days, weights).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(text) => tracing::info!(latency_ms, days = days.get(), chars = text.len(), "Plan completed"),
            Err(e) => tracing::warn!(latency_ms, kind = %e.kind(), "Plan failed: {}", e),
        }
        result
    }
}
