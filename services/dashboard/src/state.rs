//! Application state shared across handlers

use crate::{lookup::LookupResolver, repositories::UserRepository, stats::DashboardAggregator};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_repository: UserRepository,
    pub aggregator: DashboardAggregator,
    pub lookup: LookupResolver,
}

impl AppState {
    /// Wire every component around one repository
    pub fn new(user_repository: UserRepository, settings: crate::stats::StatsSettings) -> Self {
        Self {
            aggregator: DashboardAggregator::new(user_repository.clone(), settings),
            lookup: LookupResolver::new(user_repository.clone()),
            user_repository,
        }
    }
}
