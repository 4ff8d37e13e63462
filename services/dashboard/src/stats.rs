//! Summary statistics for the dashboard page

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    models::{Filter, Limit, Order, SocialKind, User},
    repositories::{RepositoryResult, UserRepository},
};

/// Cumulative signup histogram layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramSettings {
    /// Days between the start of the current month and the newest point
    pub base_offset_days: i64,
    /// Days between two consecutive points
    pub step_days: i64,
    pub points: u32,
}

/// Longest span the histogram may cover, in days
pub const MAX_HISTOGRAM_SPAN_DAYS: i64 = 36_500;

impl HistogramSettings {
    /// Days between the anchor and the oldest point, `None` on overflow
    pub fn span_days(&self) -> Option<i64> {
        let steps = i64::from(self.points.saturating_sub(1));
        self.step_days
            .checked_mul(steps)
            .and_then(|span| span.checked_add(self.base_offset_days))
    }

    /// Reject negative offsets and spans longer than [`MAX_HISTOGRAM_SPAN_DAYS`]
    pub fn validate(&self) -> Result<(), String> {
        if self.base_offset_days < 0 || self.step_days < 0 {
            return Err(format!(
                "histogram offsets must not be negative (base {}, step {})",
                self.base_offset_days, self.step_days
            ));
        }
        match self.span_days() {
            Some(span) if span <= MAX_HISTOGRAM_SPAN_DAYS => Ok(()),
            _ => Err(format!(
                "histogram spans more than {} days",
                MAX_HISTOGRAM_SPAN_DAYS
            )),
        }
    }
}

impl Default for HistogramSettings {
    fn default() -> Self {
        Self {
            base_offset_days: 430,
            step_days: 30,
            points: 7,
        }
    }
}

/// Aggregation settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSettings {
    /// Number of users listed by follower count
    pub top_followers: u32,
    /// Reference date for the "joined since" figure
    pub since: NaiveDate,
    pub histogram: HistogramSettings,
}

impl Default for StatsSettings {
    fn default() -> Self {
        Self {
            top_followers: 5,
            since: NaiveDate::from_ymd_opt(2020, 5, 1).unwrap_or_default(),
            histogram: HistogramSettings::default(),
        }
    }
}

/// Users created on or before a cutoff
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlySignups {
    /// Month of the cutoff, e.g. "March-21"
    pub label: String,
    pub cutoff: String,
    pub count: usize,
}

/// Statistics bundle rendered on the summary page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_users: usize,
    pub users_with_instagram: usize,
    pub users_without_instagram: usize,
    pub users_with_twitter: usize,
    pub users_without_twitter: usize,
    pub users_with_any_social: usize,
    pub instagram_only_users: usize,
    pub twitter_only_users: usize,
    pub non_social_users: usize,
    /// Oldest cutoff first
    pub monthly_signups: Vec<MonthlySignups>,
    /// Highest follower count first
    pub top_followers: Vec<User>,
    pub direct_users: usize,
    pub referred_users: usize,
    pub users_since: usize,
    /// Reference date as MM-DD-YY
    pub since_label: String,
}

/// Builds the dashboard statistics from repository queries
#[derive(Clone)]
pub struct DashboardAggregator {
    repository: UserRepository,
    settings: StatsSettings,
}

impl DashboardAggregator {
    pub fn new(repository: UserRepository, settings: StatsSettings) -> Self {
        Self {
            repository,
            settings,
        }
    }

    /// Compute every dashboard figure as of `now`.
    ///
    /// Queries run one after another; the first failure aborts the summary.
    pub async fn summarize(&self, now: DateTime<Utc>) -> RepositoryResult<DashboardStats> {
        info!("Computing dashboard statistics");
        let repository = &self.repository;

        let (total_users, _) = repository.get_all_users().await?;

        let users_with_instagram = repository
            .get_social_users(&[SocialKind::Instagram], false)
            .await?
            .len();
        let users_with_twitter = repository
            .get_social_users(&[SocialKind::Twitter], false)
            .await?
            .len();
        let users_with_any_social = repository
            .get_social_users(&SocialKind::ALL, false)
            .await?
            .len();
        let instagram_only_users = repository
            .get_social_users(&[SocialKind::Instagram], true)
            .await?
            .len();
        let twitter_only_users = repository
            .get_social_users(&[SocialKind::Twitter], true)
            .await?
            .len();
        let non_social_users = repository.get_social_users(&[], false).await?.len();

        let monthly_signups = self.monthly_signups(now).await?;
        let top_followers = self.top_followers().await?;

        let direct_users = repository
            .get_filtered_users(&[Filter::unset("invited_by_user_profile")], None)
            .await?
            .len();

        let since = midnight_utc(self.settings.since);
        let users_since = repository
            .get_filtered_users(&[Filter::gte("time_created", format_cutoff(since))], None)
            .await?
            .len();

        Ok(DashboardStats {
            total_users,
            users_with_instagram,
            users_without_instagram: total_users.saturating_sub(users_with_instagram),
            users_with_twitter,
            users_without_twitter: total_users.saturating_sub(users_with_twitter),
            users_with_any_social,
            instagram_only_users,
            twitter_only_users,
            non_social_users,
            monthly_signups,
            top_followers,
            direct_users,
            referred_users: total_users.saturating_sub(direct_users),
            users_since,
            since_label: self.settings.since.format("%m-%d-%y").to_string(),
        })
    }

    /// Cumulative signups at each histogram cutoff, oldest first
    pub async fn monthly_signups(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<MonthlySignups>> {
        let mut buckets = Vec::new();
        for cutoff in histogram_cutoffs(now, &self.settings.histogram) {
            let cutoff_str = format_cutoff(cutoff);
            let count = self
                .repository
                .get_filtered_users(&[Filter::lte("time_created", cutoff_str.clone())], None)
                .await?
                .len();

            buckets.push(MonthlySignups {
                label: cutoff.format("%B-%y").to_string(),
                cutoff: cutoff_str,
                count,
            });
        }
        Ok(buckets)
    }

    /// Users with the most followers, highest first
    pub async fn top_followers(&self) -> RepositoryResult<Vec<User>> {
        // a zero limit would fall back to every user
        if self.settings.top_followers == 0 {
            return Ok(Vec::new());
        }
        let limit = Limit::new(self.settings.top_followers)
            .order(Order::Desc)
            .by("num_followers");

        // the store returns the last N in ascending order
        let mut users = self.repository.get_filtered_users(&[], Some(&limit)).await?;
        users.reverse();
        Ok(users)
    }
}

/// Histogram cutoffs, oldest first.
///
/// Anchored on the first day of `now`'s month at midnight UTC; point `i`
/// sits `base_offset_days + step_days * (points - 1 - i)` days before it.
/// Points that fall outside the representable date range are skipped.
pub fn histogram_cutoffs(now: DateTime<Utc>, settings: &HistogramSettings) -> Vec<DateTime<Utc>> {
    let today = now.date_naive();
    let anchor = midnight_utc(today - Days::new(u64::from(today.day0())));
    let points = i64::from(settings.points);

    (0..points)
        .filter_map(|i| {
            let cutoff = settings
                .step_days
                .checked_mul(points - 1 - i)
                .and_then(|days| days.checked_add(settings.base_offset_days))
                .and_then(TimeDelta::try_days)
                .and_then(|offset| anchor.checked_sub_signed(offset));
            if cutoff.is_none() {
                warn!("Skipping histogram point {} outside the date range", i);
            }
            cutoff
        })
        .collect()
}

/// Format a cutoff the way `time_created` is stored, for string comparison
pub fn format_cutoff(cutoff: DateTime<Utc>) -> String {
    cutoff.format("%Y-%m-%dT%H:%M:%S+00:00").to_string()
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}
