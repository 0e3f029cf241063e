use async_trait::async_trait;
use uuid::Uuid;

use crate::error::MetricsResult;
use crate::goals::GoalSet;
use crate::models::{
    channel, ActivityRecord, DailyMetric, DateRange, DatedEntry, HydrationRecord, MealRecord,
    MetricKind, Profile, WeeklySummary,
};

/// Read/write boundary between the aggregation core and persistent storage.
///
/// Reads may return rows in any order; callers sort where order matters.
#[async_trait]
pub trait MetricsStore: Send + Sync {
    async fn fetch_daily_metrics(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> MetricsResult<Vec<DailyMetric>>;

    async fn fetch_hydration(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> MetricsResult<Vec<HydrationRecord>>;

    async fn fetch_activities(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> MetricsResult<Vec<ActivityRecord>>;

    async fn fetch_meals(&self, user_id: Uuid, range: DateRange) -> MetricsResult<Vec<MealRecord>>;

    async fn fetch_profile(&self, user_id: Uuid) -> MetricsResult<Option<Profile>>;

    /// Stored goals, or the defaults when the user never set any.
    async fn fetch_goals(&self, user_id: Uuid) -> MetricsResult<GoalSet>;

    /// Creates or overwrites the summary keyed by `(user_id, week_start)`.
    async fn upsert_weekly_summary(
        &self,
        user_id: Uuid,
        summary: &WeeklySummary,
    ) -> MetricsResult<()>;

    /// Most recent week first.
    async fn fetch_weekly_summaries(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> MetricsResult<Vec<WeeklySummary>>;

    async fn fetch_entries(
        &self,
        user_id: Uuid,
        metric: MetricKind,
        range: DateRange,
    ) -> MetricsResult<Vec<DatedEntry>> {
        let records = self.fetch_daily_metrics(user_id, range).await?;
        Ok(channel(&records, metric))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryStore;
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 5, d).unwrap()
    }

    #[tokio::test]
    async fn entries_project_one_channel_within_range() {
        let user = Uuid::new_v4();
        let store = MemoryStore::default();
        for (day, water) in [(1, 1800.0), (2, 2600.0), (9, 2000.0)] {
            store
                .add_daily(
                    user,
                    DailyMetric {
                        date: date(day),
                        calories: 2000.0,
                        water,
                        activity: 30.0,
                        weight: 70.0,
                    },
                )
                .await;
        }

        let mut entries = store
            .fetch_entries(user, MetricKind::Water, DateRange::week_from(date(1)))
            .await
            .unwrap();
        entries.sort_by_key(|entry| entry.date);
        assert_eq!(
            entries,
            vec![DatedEntry::new(date(1), 1800.0), DatedEntry::new(date(2), 2600.0)]
        );
    }

    #[tokio::test]
    async fn goals_default_when_unset() {
        let store = MemoryStore::default();
        let goals = store.fetch_goals(Uuid::new_v4()).await.unwrap();
        assert_eq!(goals, GoalSet::default());
    }

    #[tokio::test]
    async fn stored_goals_are_per_user() {
        let store = MemoryStore::default();
        let user = Uuid::new_v4();
        let custom = GoalSet {
            water_goal: 3000.0,
            ..GoalSet::default()
        };
        store.set_goals(user, custom).await;

        assert_eq!(store.fetch_goals(user).await.unwrap(), custom);
        assert_eq!(store.fetch_goals(Uuid::new_v4()).await.unwrap(), GoalSet::default());
    }
}
