//! Dashboard service routes

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::{
    error::{ApiError, ApiResult},
    models::{Filter, Limit, Order, User, UserView},
    state::AppState,
    stats::DashboardStats,
};

/// Create the router for the dashboard service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/users", get(get_users))
        .route("/users/search", get(search_users))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub store: bool,
}

/// Users returned by a listing or a search
#[derive(Debug, Serialize)]
pub struct UsersResponse<T> {
    pub users: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// Single filter plus optional limit, as query parameters
#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    pub field: Option<String>,
    /// JSON literal (`42`, `true`, `null`) or bare text
    pub value: Option<String>,
    /// eq, lte or gte (default: eq)
    pub op: Option<String>,
    pub limit: Option<u32>,
    pub order: Option<Order>,
    pub limit_by: Option<String>,
}

impl FilterParams {
    fn filters(&self) -> ApiResult<Vec<Filter>> {
        match (&self.field, &self.value) {
            (Some(field), Some(value)) => {
                let op = self.op.as_deref().unwrap_or("eq");
                Ok(Filter::parse_all([(field.clone(), parse_value(value), op)]))
            }
            (Some(field), None) => Err(ApiError::BadRequest(format!(
                "Missing value for filter on {}",
                field
            ))),
            (None, _) => Ok(Vec::new()),
        }
    }

    fn limit(&self) -> Option<Limit> {
        self.limit.map(|count| {
            Limit::new(count)
                .order(self.order.unwrap_or_default())
                .by(self.limit_by.clone().unwrap_or_else(|| "user_id".to_string()))
        })
    }
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.user_repository.health_check().await.unwrap_or_else(|e| {
        error!("Store health check failed: {}", e);
        false
    });

    Json(HealthResponse {
        status: "ok",
        service: "dashboard",
        store,
    })
}

/// Summary statistics
pub async fn get_dashboard(State(state): State<AppState>) -> ApiResult<Json<DashboardStats>> {
    let stats = state.aggregator.summarize(Utc::now()).await?;
    Ok(Json(stats))
}

/// Search users by ID, name, social handle or username
pub async fn search_users(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<UsersResponse<UserView>>> {
    let keyword = params.q.unwrap_or_default();
    let users = state.lookup.resolve(&keyword).await?;
    Ok(Json(UsersResponse { users }))
}

/// List users matching a filter or the first/last users by a field
pub async fn get_users(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<UsersResponse<User>>> {
    let filters = params.filters()?;
    let limit = params.limit();

    let users = state
        .user_repository
        .get_filtered_users(&filters, limit.as_ref())
        .await?;
    Ok(Json(UsersResponse { users }))
}
