//! User repository for record store queries

use std::{collections::HashSet, sync::Arc};

use common::{Query, RecordStore, SENTINEL, Snapshot, StoreError};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{Filter, Limit, SocialKind, User};

/// Errors raised while reading users
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The record store could not be queried
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A stored record does not describe a user
    #[error("Malformed user record {key}: {source}")]
    MalformedRecord {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Type alias for Result with RepositoryError
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn RecordStore>,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Check if the underlying store is reachable
    pub async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.store.health_check().await?)
    }

    /// Get all users with their count, in store order
    pub async fn get_all_users(&self) -> RepositoryResult<(usize, Vec<User>)> {
        let users = self.query_users(&Query::all()).await?;
        Ok((users.len(), users))
    }

    /// Get users by social account.
    ///
    /// Returns users linked to at least one of `kinds`. With `exclusive`, or
    /// when `kinds` is empty, only users linked to none of the other tracked
    /// kinds are kept; an empty `kinds` therefore yields the users with no
    /// social account at all.
    pub async fn get_social_users(
        &self,
        kinds: &[SocialKind],
        exclusive: bool,
    ) -> RepositoryResult<Vec<User>> {
        let unlinked = self.unlinked_to_all(kinds).await?;
        let (_, all_users) = self.get_all_users().await?;

        let mut users: Vec<User> = match unlinked {
            Some(ids) => all_users
                .into_iter()
                .filter(|user| !ids.contains(&user.user_id))
                .collect(),
            None => all_users,
        };

        if exclusive || kinds.is_empty() {
            let others = SocialKind::complement(kinds);
            if let Some(ids) = self.unlinked_to_all(&others).await? {
                users.retain(|user| ids.contains(&user.user_id));
            }
        }

        debug!(
            "{} users linked to {:?} (exclusive: {})",
            users.len(),
            kinds,
            exclusive
        );
        Ok(users)
    }

    /// Get users matching filters, or the first/last users by a field.
    ///
    /// Filters run one after another and only the last one's result is kept.
    /// A limit re-queries the whole collection and replaces any filter result.
    /// With neither, every user is returned.
    pub async fn get_filtered_users(
        &self,
        filters: &[Filter],
        limit: Option<&Limit>,
    ) -> RepositoryResult<Vec<User>> {
        if filters.len() > 1 {
            debug!(
                "{} filters given, only the last one ({}) applies",
                filters.len(),
                filters[filters.len() - 1].field
            );
        }

        let mut users = None;
        for filter in filters {
            users = Some(self.query_users(&filter.to_query()).await?);
        }

        if let Some(limit) = limit.filter(|limit| limit.count > 0) {
            debug!(
                "Limiting to {} users by {} ({:?})",
                limit.count, limit.by, limit.order
            );
            users = Some(self.query_users(&limit.to_query()).await?);
        }

        match users {
            Some(users) => Ok(users),
            None => Ok(self.get_all_users().await?.1),
        }
    }

    /// Find a user by ID
    pub async fn get_user_by_id(&self, user_id: i64) -> RepositoryResult<Option<User>> {
        info!("Finding user by ID: {}", user_id);
        self.find_one("user_id", user_id.into()).await
    }

    /// Find all users sharing a name
    pub async fn get_users_by_name(&self, name: &str) -> RepositoryResult<Vec<User>> {
        info!("Finding users by name: {}", name);
        self.query_users(&Query::order_by("name").equal_to(name))
            .await
    }

    /// Find a user by Instagram handle
    pub async fn get_user_by_insta(&self, handle: &str) -> RepositoryResult<Option<User>> {
        self.find_by_handle(SocialKind::Instagram, handle).await
    }

    /// Find a user by Twitter handle
    pub async fn get_user_by_twitter(&self, handle: &str) -> RepositoryResult<Option<User>> {
        self.find_by_handle(SocialKind::Twitter, handle).await
    }

    /// Find a user by username
    pub async fn get_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        info!("Finding user by username: {}", username);
        self.find_one("username", username.into()).await
    }

    async fn find_by_handle(
        &self,
        kind: SocialKind,
        handle: &str,
    ) -> RepositoryResult<Option<User>> {
        // the sentinel would match every unlinked user
        if handle.is_empty() || handle == SENTINEL {
            return Ok(None);
        }
        info!("Finding user by {} handle: {}", kind.field(), handle);
        self.find_one(kind.field(), handle.into()).await
    }

    async fn find_one(&self, field: &str, value: Value) -> RepositoryResult<Option<User>> {
        let users = self
            .query_users(&Query::order_by(field).equal_to(value))
            .await?;
        Ok(users.into_iter().next())
    }

    /// IDs of users linked to none of `kinds`; `None` when `kinds` is empty
    async fn unlinked_to_all(
        &self,
        kinds: &[SocialKind],
    ) -> RepositoryResult<Option<HashSet<i64>>> {
        let mut unlinked: Option<HashSet<i64>> = None;
        for kind in kinds {
            let ids: HashSet<i64> = self
                .query_users(&Query::order_by(kind.field()).is_unset())
                .await?
                .into_iter()
                .map(|user| user.user_id)
                .collect();

            unlinked = Some(match unlinked {
                Some(acc) => acc.intersection(&ids).copied().collect(),
                None => ids,
            });
        }
        Ok(unlinked)
    }

    async fn query_users(&self, query: &Query) -> RepositoryResult<Vec<User>> {
        let snapshot = self.store.fetch(query).await?;
        to_users(snapshot)
    }
}

fn to_users(snapshot: Snapshot) -> RepositoryResult<Vec<User>> {
    snapshot
        .into_iter()
        .map(|(key, record)| {
            User::try_from(record).map_err(|source| RepositoryError::MalformedRecord { key, source })
        })
        .collect()
}
