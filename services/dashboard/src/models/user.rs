//! User model and related functionality

use chrono::DateTime;
use common::{Record, SENTINEL};
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;
use tracing::warn;

/// Social networks a user can link to their profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialKind {
    Instagram,
    Twitter,
}

impl SocialKind {
    /// Every social network tracked by the dashboard
    pub const ALL: [SocialKind; 2] = [SocialKind::Instagram, SocialKind::Twitter];

    /// Stored field holding the handle
    pub fn field(&self) -> &'static str {
        match self {
            SocialKind::Instagram => "instagram",
            SocialKind::Twitter => "twitter",
        }
    }

    /// Tracked kinds that are not in `kinds`
    pub fn complement(kinds: &[SocialKind]) -> Vec<SocialKind> {
        Self::ALL
            .into_iter()
            .filter(|kind| !kinds.contains(kind))
            .collect()
    }
}

/// User entity as stored in the directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub name: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub instagram: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub twitter: Option<String>,
    pub num_followers: i64,
    pub num_following: i64,
    /// Referring user, `None` for a direct signup
    #[serde(default, deserialize_with = "optional_text")]
    pub invited_by_user_profile: Option<String>,
    pub time_created: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub photo_url: Option<String>,
}

impl TryFrom<Record> for User {
    type Error = serde_json::Error;

    fn try_from(record: Record) -> Result<Self, Self::Error> {
        serde_json::from_value(Value::Object(record))
    }
}

/// Optional text field: JSON null, a missing field and the sentinel are all
/// `None`. Numbers are kept in their decimal form.
fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s == SENTINEL => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}

/// Reformat a stored timestamp as `DD Month YYYY`, in its own offset
pub fn display_date(raw: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|created| created.format("%d %B %Y").to_string())
}

/// User as handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserView {
    pub user_id: i64,
    pub username: String,
    pub name: String,
    pub instagram: Option<String>,
    pub twitter: Option<String>,
    pub num_followers: i64,
    pub num_following: i64,
    pub invited_by_user_profile: Option<String>,
    /// Creation date in display form (e.g. "04 March 2021")
    pub time_created: String,
    pub photo_url: Option<String>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        let time_created = display_date(&user.time_created).unwrap_or_else(|| {
            warn!(
                "Unparseable time_created {:?} for user {}",
                user.time_created, user.user_id
            );
            user.time_created.clone()
        });

        Self {
            user_id: user.user_id,
            username: user.username,
            name: user.name,
            instagram: user.instagram,
            twitter: user.twitter,
            num_followers: user.num_followers,
            num_following: user.num_following,
            invited_by_user_profile: user.invited_by_user_profile,
            time_created,
            photo_url: user.photo_url,
        }
    }
}
