use crate::llm::{ChatCompletionRequest, ChatMessage, LlmClient, LlmError};
use crate::strategy::{FragmentStyle, StrategyWeights};

pub const MIN_DAYS: u32 = 1;
pub const MAX_DAYS: u32 = 30;
pub const DEFAULT_DAYS: u32 = 7;

const PLAN_TEMPLATE: &str = r#"You are an experienced teacher building a lesson plan.

Using the following educational content:
{results}

Create a {days}-day learning plan that follows these learning strategy preferences: {strategies}.

For each day, write a heading in the form "Day N:" and include:
- the learning objective for the day
- the activities, referring to the content and links above where they fit
- how the activities reflect the weighted learning strategies
- a short check for understanding

Keep the plan practical for a classroom and do not skip any day."#;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("number of days must be between 1 and 30, got {0}")]
pub struct DayCountError(pub i64);

/// Length of a learning plan, always in `1..=30`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCount(u32);

impl DayCount {
    pub fn new(days: i64) -> Result<Self, DayCountError> {
        if (i64::from(MIN_DAYS)..=i64::from(MAX_DAYS)).contains(&days) {
            Ok(Self(days as u32))
        } else {
            Err(DayCountError(days))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for DayCount {
    fn default() -> Self {
        Self(DEFAULT_DAYS)
    }
}

pub struct Planner {
    llm: LlmClient,
    model: String,
    temperature: f32,
    style: FragmentStyle,
}

impl Planner {
    pub fn new(llm: LlmClient, model: String, temperature: f32, style: FragmentStyle) -> Self {
        Self {
            llm,
            model,
            temperature,
            style,
        }
    }

    pub fn build_request(
        &self,
        results: &str,
        days: DayCount,
        weights: &StrategyWeights,
    ) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(render_plan_prompt(
                results,
                days,
                &weights.prompt_fragment(self.style),
            ))],
            temperature: Some(self.temperature),
        }
    }

    /// The returned plan is not checked for per-day sections.
    pub async fn plan(
        &self,
        results: &str,
        days: DayCount,
        weights: &StrategyWeights,
    ) -> Result<String, LlmError> {
        let request = self.build_request(results, days, weights);
        self.llm.complete(&request).await
    }
}

pub fn render_plan_prompt(results: &str, days: DayCount, strategies: &str) -> String {
    // Single pass so braces inside `results` are never treated as placeholders.
    let mut out = String::with_capacity(PLAN_TEMPLATE.len() + results.len());
    let mut rest = PLAN_TEMPLATE;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let (value, consumed) = if tail.starts_with("{results}") {
            (results.to_string(), "{results}".len())
        } else if tail.starts_with("{days}") {
            (days.get().to_string(), "{days}".len())
        } else if tail.starts_with("{strategies}") {
            (strategies.to_string(), "{strategies}".len())
        } else {
            ("{".to_string(), 1)
        };
        out.push_str(&value);
        rest = &tail[consumed..];
    }
    out.push_str(rest);
    out
}
