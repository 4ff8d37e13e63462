//! Resolve a search keyword to users

use tracing::info;

use crate::{
    models::{User, UserView},
    repositories::{RepositoryResult, UserRepository},
};

/// Tries identity predicates in priority order until one matches
#[derive(Clone)]
pub struct LookupResolver {
    repository: UserRepository,
}

impl LookupResolver {
    pub fn new(repository: UserRepository) -> Self {
        Self { repository }
    }

    /// Resolve `keyword` to users ready for display.
    ///
    /// An all-digit keyword is first tried as a user ID. Otherwise, and if no
    /// user has that ID, the lowercased keyword is matched against name,
    /// Instagram handle, Twitter handle and username, in that order. Only the
    /// first matching predicate's users are returned.
    pub async fn resolve(&self, keyword: &str) -> RepositoryResult<Vec<UserView>> {
        let users = self.find(keyword).await?;
        Ok(users.into_iter().map(UserView::from).collect())
    }

    async fn find(&self, keyword: &str) -> RepositoryResult<Vec<User>> {
        if keyword.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(user_id) = parse_user_id(keyword) {
            if let Some(user) = self.repository.get_user_by_id(user_id).await? {
                info!("Keyword {:?} matched a user ID", keyword);
                return Ok(vec![user]);
            }
        }

        let keyword = keyword.to_lowercase();

        let users = self.repository.get_users_by_name(&keyword).await?;
        if !users.is_empty() {
            info!("Keyword {:?} matched {} names", keyword, users.len());
            return Ok(users);
        }

        if let Some(user) = self.repository.get_user_by_insta(&keyword).await? {
            info!("Keyword {:?} matched an instagram handle", keyword);
            return Ok(vec![user]);
        }

        if let Some(user) = self.repository.get_user_by_twitter(&keyword).await? {
            info!("Keyword {:?} matched a twitter handle", keyword);
            return Ok(vec![user]);
        }

        if let Some(user) = self.repository.get_user_by_username(&keyword).await? {
            info!("Keyword {:?} matched a username", keyword);
            return Ok(vec![user]);
        }

        info!("No user matches {:?}", keyword);
        Ok(Vec::new())
    }
}

fn parse_user_id(keyword: &str) -> Option<i64> {
    if keyword.bytes().all(|b| b.is_ascii_digit()) {
        keyword.parse().ok()
    } else {
        None
    }
}
