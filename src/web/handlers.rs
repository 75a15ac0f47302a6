//! HTTP handlers for the form

use axum::extract::{Form, State};
use axum::response::Html;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::{page, AppState};
use crate::finder::DayCount;
use crate::session::{BusyGuard, Warning};
use crate::strategy::{StrategyWeights, WeightError, DEFAULT_WEIGHT};

const SESSION_COOKIE: &str = "session";

fn default_weight() -> u32 {
    u32::from(DEFAULT_WEIGHT)
}

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub topic: String,
    #[serde(default = "default_weight")]
    pub apprentice: u32,
    #[serde(default = "default_weight")]
    pub incidental: u32,
    #[serde(default = "default_weight")]
    pub inductive: u32,
    #[serde(default = "default_weight")]
    pub deductive: u32,
    #[serde(default = "default_weight")]
    pub discovery: u32,
}

impl SearchForm {
    pub fn weights(&self) -> Result<StrategyWeights, WeightError> {
        StrategyWeights::new([
            self.apprentice,
            self.incidental,
            self.inductive,
            self.deductive,
            self.discovery,
        ])
    }
}

/// `days` stays text so a blank or non-numeric box becomes an inline warning
/// instead of an extractor rejection.
#[derive(Debug, Deserialize)]
pub struct PlanForm {
    #[serde(default)]
    pub days: Option<String>,
}

impl PlanForm {
    pub fn days(&self) -> Result<DayCount, String> {
        let raw = self.days.as_deref().map(str::trim).unwrap_or_default();
        if raw.is_empty() {
            return Err("Please enter the number of days for the learning plan.".to_string());
        }
        let days: i64 = raw
            .parse()
            .map_err(|_| format!("number of days must be a whole number, got '{}'", raw))?;
        DayCount::new(days).map_err(|e| e.to_string())
    }
}

/// Reads the session cookie, issuing a fresh id if absent or unparsable.
fn session_id(jar: CookieJar) -> (CookieJar, Uuid) {
    if let Some(id) = jar
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
    {
        return (jar, id);
    }

    let id = Uuid::new_v4();
    let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    (jar.add(cookie), id)
}

/// Handler for GET /
pub async fn index(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Html<String>) {
    let (jar, id) = session_id(jar);
    let html = state.sessions.with_session(id, page::render);
    (jar, Html(html))
}

/// Handler for POST /search
pub async fn search(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<SearchForm>,
) -> (CookieJar, Html<String>) {
    let (jar, id) = session_id(jar);
    run_search(&state, id, form).await;
    let html = state.sessions.with_session(id, page::render);
    (jar, Html(html))
}

/// Handler for POST /plan
pub async fn plan(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<PlanForm>,
) -> (CookieJar, Html<String>) {
    let (jar, id) = session_id(jar);
    run_plan(&state, id, form).await;
    let html = state.sessions.with_session(id, page::render);
    (jar, Html(html))
}

/// Validates the form and, if the session accepts it, runs the search.
pub async fn run_search(state: &AppState, id: Uuid, form: SearchForm) {
    let query = state.sessions.with_session(id, |session| match form.weights() {
        Ok(weights) => session.begin_search(&form.topic, weights).ok(),
        Err(e) => {
            session.warn(Warning::InvalidInput(e.to_string()));
            None
        }
    });
    let Some(query) = query else {
        return;
    };

    let guard = BusyGuard::new(&state.sessions, id);
    tracing::info!(session = %id, topic = %query.topic, "Searching for content");
    let outcome = state.finder.search(&query.topic, &query.weights).await;
    guard.complete(|session| session.finish_search(outcome));
}

/// Validates the day count and, if the session has results, runs the planner.
pub async fn run_plan(state: &AppState, id: Uuid, form: PlanForm) {
    let query = state.sessions.with_session(id, |session| match form.days() {
        Ok(days) => session.begin_plan(days).ok(),
        Err(e) => {
            session.warn(Warning::InvalidInput(e));
            None
        }
    });
    let Some(query) = query else {
        return;
    };

    let guard = BusyGuard::new(&state.sessions, id);
    tracing::info!(session = %id, days = query.days.get(), "Creating learning plan");
    let outcome = state
        .finder
        .plan(&query.results, query.days, &query.weights)
        .await;
    guard.complete(|session| session.finish_plan(outcome));
}
