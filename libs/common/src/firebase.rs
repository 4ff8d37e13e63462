//! Firebase Realtime Database backend
//!
//! This module provides configuration, client construction and health checks
//! for the REST interface of the Realtime Database. Queries are sent as
//! `orderBy`/`equalTo`/`startAt`/`endAt`/`limitTo*` parameters and the
//! returned object is filtered and sorted again client-side.

use std::{env, time::Duration};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::{
    error::{StoreError, StoreResult},
    query::Query,
    store::{RecordStore, Snapshot},
};

/// Firebase connection configuration
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    /// Database URL (e.g., "https://project-default-rtdb.firebaseio.com")
    pub database_url: String,
    /// Path of the collection under the database root
    pub root_path: String,
    /// Database secret or ID token sent as the `auth` parameter
    pub auth_token: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl FirebaseConfig {
    /// Create a new FirebaseConfig from environment variables
    ///
    /// # Environment Variables
    /// - `FIREBASE_DATABASE_URL`: Realtime Database URL
    /// - `FIREBASE_ROOT_PATH`: Collection path (default: "Users")
    /// - `FIREBASE_AUTH_TOKEN`: Optional auth token
    /// - `FIREBASE_TIMEOUT_SECS`: Request timeout in seconds (default: 30)
    pub fn from_env() -> StoreResult<Self> {
        let database_url = env::var("FIREBASE_DATABASE_URL").map_err(|_| {
            StoreError::Configuration("FIREBASE_DATABASE_URL environment variable not set".into())
        })?;

        let root_path = env::var("FIREBASE_ROOT_PATH").unwrap_or_else(|_| "Users".to_string());

        let auth_token = env::var("FIREBASE_AUTH_TOKEN")
            .ok()
            .filter(|token| !token.is_empty());

        let timeout_secs = env::var("FIREBASE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            database_url,
            root_path,
            auth_token,
            timeout_secs,
        })
    }

    /// REST endpoint of the configured collection
    pub fn collection_url(&self) -> String {
        format!(
            "{}/{}.json",
            self.database_url.trim_end_matches('/'),
            self.root_path.trim_matches('/')
        )
    }
}

/// Record store backed by the Realtime Database REST API
///
/// An unset-field query is sent as a range ending at the sentinel, so records
/// missing the field match like they do in [`crate::MemoryStore`].
#[derive(Clone)]
pub struct FirebaseStore {
    client: reqwest::Client,
    collection_url: String,
    auth_token: Option<String>,
}

impl FirebaseStore {
    /// Build the HTTP client for the configured database
    pub fn new(config: &FirebaseConfig) -> StoreResult<Self> {
        if !config.database_url.starts_with("https://")
            && !config.database_url.starts_with("http://")
        {
            return Err(StoreError::Configuration(format!(
                "Invalid database URL: {}",
                config.database_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Configuration(format!("Invalid HTTP client: {}", e)))?;

        let collection_url = config.collection_url();
        info!("Firebase store initialized for {}", collection_url);

        Ok(Self {
            client,
            collection_url,
            auth_token: config.auth_token.clone(),
        })
    }

    fn params(&self, query: &Query) -> Vec<(&'static str, String)> {
        let mut params = query.to_remote().to_params();
        if let Some(token) = &self.auth_token {
            params.push(("auth", token.clone()));
        }
        params
    }

    async fn get(&self, params: &[(&'static str, String)]) -> StoreResult<Value> {
        let response = self
            .client
            .get(&self.collection_url)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Unavailable(format!("HTTP {}: {}", status, body)));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl RecordStore for FirebaseStore {
    async fn fetch(&self, query: &Query) -> StoreResult<Snapshot> {
        debug!("Querying {} with {:?}", self.collection_url, query);

        let body = self.get(&self.params(query)).await?;
        let entries = Snapshot::from_value(body)?.into_entries();
        let snapshot = Snapshot::new(query.evaluate(entries));

        debug!("Query returned {} records", snapshot.len());
        Ok(snapshot)
    }

    async fn health_check(&self) -> StoreResult<bool> {
        let mut params = vec![("shallow", "true".to_string())];
        if let Some(token) = &self.auth_token {
            params.push(("auth", token.clone()));
        }

        match self.get(&params).await {
            Ok(_) => {
                info!("Firebase health check successful");
                Ok(true)
            }
            Err(e) => {
                error!("Firebase health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn config(url: &str) -> FirebaseConfig {
        FirebaseConfig {
            database_url: url.to_string(),
            root_path: "/Users/".to_string(),
            auth_token: None,
            timeout_secs: 5,
        }
    }

    #[test]
    #[serial]
    fn test_firebase_config_from_env() {
        unsafe {
            std::env::set_var("FIREBASE_DATABASE_URL", "https://example.firebaseio.com");
        }

        let config = FirebaseConfig::from_env().unwrap();
        assert_eq!(config.database_url, "https://example.firebaseio.com");
        assert_eq!(config.root_path, "Users");
        assert_eq!(config.auth_token, None);
        assert_eq!(config.timeout_secs, 30);

        unsafe {
            std::env::remove_var("FIREBASE_DATABASE_URL");
        }
    }

    #[test]
    #[serial]
    fn test_firebase_config_from_env_with_custom_values() {
        unsafe {
            std::env::set_var("FIREBASE_DATABASE_URL", "https://example.firebaseio.com/");
            std::env::set_var("FIREBASE_ROOT_PATH", "Staging/Users");
            std::env::set_var("FIREBASE_AUTH_TOKEN", "secret");
            std::env::set_var("FIREBASE_TIMEOUT_SECS", "7");
        }

        let config = FirebaseConfig::from_env().unwrap();
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.timeout_secs, 7);
        assert_eq!(
            config.collection_url(),
            "https://example.firebaseio.com/Staging/Users.json"
        );

        unsafe {
            std::env::remove_var("FIREBASE_DATABASE_URL");
            std::env::remove_var("FIREBASE_ROOT_PATH");
            std::env::remove_var("FIREBASE_AUTH_TOKEN");
            std::env::remove_var("FIREBASE_TIMEOUT_SECS");
        }
    }

    #[test]
    #[serial]
    fn test_firebase_config_requires_url() {
        unsafe {
            std::env::remove_var("FIREBASE_DATABASE_URL");
        }

        let err = FirebaseConfig::from_env().unwrap_err();
        assert!(matches!(err, StoreError::Configuration(_)));
    }

    #[test]
    fn test_collection_url_trims_slashes() {
        assert_eq!(
            config("https://example.firebaseio.com/").collection_url(),
            "https://example.firebaseio.com/Users.json"
        );
    }

    #[test]
    fn test_store_rejects_invalid_url() {
        let result = FirebaseStore::new(&config("example.firebaseio.com"));
        assert!(matches!(result, Err(StoreError::Configuration(_))));
    }

    #[test]
    fn test_auth_token_is_appended_to_params() {
        let mut cfg = config("https://example.firebaseio.com");
        cfg.auth_token = Some("secret".to_string());
        let store = FirebaseStore::new(&cfg).unwrap();

        let params = store.params(&Query::order_by("user_id").equal_to(1));
        assert_eq!(params.last(), Some(&("auth", "secret".to_string())));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_unset_query_is_sent_as_range() {
        let store = FirebaseStore::new(&config("https://example.firebaseio.com")).unwrap();

        let params = store.params(&Query::order_by("instagram").is_unset());
        assert!(params.iter().all(|(name, _)| *name != "equalTo"));
        assert!(params.contains(&("endAt", "\"null\"".to_string())));
    }
}
