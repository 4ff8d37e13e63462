//! Shared fixtures for the service tests

use std::sync::Arc;

use async_trait::async_trait;
use common::{MemoryStore, Query, RecordStore, Snapshot, StoreError, StoreResult};
use serde_json::json;

use crate::repositories::UserRepository;

/// Six users covering every social combination and both referral states.
///
/// | id | username | name  | instagram | twitter | followers | referrer |
/// |----|----------|-------|-----------|---------|-----------|----------|
/// | 1  | alice    | Alice | alice_ig  | -       | 120       | -        |
/// | 2  | bob      | bob   | -         | bob_tw  | 15        | 1        |
/// | 3  | carol    | carol | -         | -       | 300       | -        |
/// | 4  | dave     | dave  | dave_ig   | dave_tw | 42        | 1        |
/// | 5  | erin     | bob   | -         | -       | 7         | 3        |
/// | 6  | 42       | frank | -         | -       | 0         | -        |
pub fn directory_store() -> MemoryStore {
    MemoryStore::from_value(json!({
        "-Mu1": {
            "user_id": 1, "username": "alice", "name": "Alice",
            "instagram": "alice_ig", "twitter": "null",
            "num_followers": 120, "num_following": 10,
            "invited_by_user_profile": "null",
            "time_created": "2020-04-01T08:00:00.000000+00:00"
        },
        "-Mu2": {
            "user_id": 2, "username": "bob", "name": "bob",
            "instagram": "null", "twitter": "bob_tw",
            "num_followers": 15, "num_following": 3,
            "invited_by_user_profile": "1",
            "time_created": "2020-06-12T09:30:00.000000+00:00"
        },
        "-Mu3": {
            "user_id": 3, "username": "carol", "name": "carol",
            "instagram": "null", "twitter": "null",
            "num_followers": 300, "num_following": 1,
            "invited_by_user_profile": "null",
            "time_created": "2021-01-20T10:00:00.000000+00:00"
        },
        "-Mu4": {
            "user_id": 4, "username": "dave", "name": "dave",
            "instagram": "dave_ig", "twitter": "dave_tw",
            "num_followers": 42, "num_following": 12,
            "invited_by_user_profile": 1,
            "time_created": "2021-07-05T11:00:00.000000+00:00"
        },
        "-Mu5": {
            "user_id": 5, "username": "erin", "name": "bob",
            "instagram": "null", "twitter": "null",
            "num_followers": 7, "num_following": 70,
            "invited_by_user_profile": "3",
            "time_created": "2022-02-14T12:00:00.000000+00:00",
            "photo_url": "https://cdn.example.com/erin.png"
        },
        "-Mu6": {
            "user_id": 6, "username": "42", "name": "frank",
            "instagram": "null", "twitter": "null",
            "num_followers": 0, "num_following": 0,
            "invited_by_user_profile": "null",
            "time_created": "2022-03-01T00:00:00.000000+00:00"
        }
    }))
    .expect("fixture collection is valid")
}

pub fn directory_repository() -> UserRepository {
    UserRepository::new(Arc::new(directory_store()))
}

/// Store whose every query fails
pub struct UnavailableStore;

#[async_trait]
impl RecordStore for UnavailableStore {
    async fn fetch(&self, _query: &Query) -> StoreResult<Snapshot> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(false)
    }
}

pub fn ids<'a, I>(users: I) -> Vec<i64>
where
    I: IntoIterator<Item = &'a crate::models::User>,
{
    let mut ids: Vec<i64> = users.into_iter().map(|user| user.user_id).collect();
    ids.sort_unstable();
    ids
}
