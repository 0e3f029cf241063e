use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::MetricsResult;
use crate::goals::GoalSet;
use crate::models::{
    ActivityRecord, DailyMetric, DateRange, HydrationRecord, MealRecord, Profile, WeeklySummary,
};
use crate::store::MetricsStore;

/// In-memory store for exercising the core without Postgres.
#[derive(Default)]
pub struct MemoryStore {
    daily: Mutex<HashMap<Uuid, Vec<DailyMetric>>>,
    hydration: Mutex<HashMap<Uuid, Vec<HydrationRecord>>>,
    activities: Mutex<HashMap<Uuid, Vec<ActivityRecord>>>,
    meals: Mutex<HashMap<Uuid, Vec<MealRecord>>>,
    profiles: Mutex<HashMap<Uuid, Profile>>,
    goals: Mutex<HashMap<Uuid, GoalSet>>,
    weekly: Mutex<HashMap<(Uuid, NaiveDate), WeeklySummary>>,
}

impl MemoryStore {
    pub async fn add_daily(&self, user_id: Uuid, record: DailyMetric) {
        self.daily.lock().await.entry(user_id).or_default().push(record);
    }

    pub async fn add_hydration(&self, user_id: Uuid, record: HydrationRecord) {
        self.hydration.lock().await.entry(user_id).or_default().push(record);
    }

    pub async fn add_activity(&self, user_id: Uuid, record: ActivityRecord) {
        self.activities.lock().await.entry(user_id).or_default().push(record);
    }

    pub async fn add_meal(&self, user_id: Uuid, record: MealRecord) {
        self.meals.lock().await.entry(user_id).or_default().push(record);
    }

    pub async fn set_profile(&self, profile: Profile) {
        self.profiles.lock().await.insert(profile.user_id, profile);
    }

    pub async fn set_goals(&self, user_id: Uuid, goals: GoalSet) {
        self.goals.lock().await.insert(user_id, goals);
    }
}

fn in_range<T: Clone>(
    rows: Option<&Vec<T>>,
    range: DateRange,
    date_of: impl Fn(&T) -> NaiveDate,
) -> Vec<T> {
    rows.map(|rows| {
        rows.iter()
            .filter(|row| range.contains(date_of(row)))
            .cloned()
            .collect()
    })
    .unwrap_or_default()
}

#[async_trait]
impl MetricsStore for MemoryStore {
    async fn fetch_daily_metrics(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> MetricsResult<Vec<DailyMetric>> {
        Ok(in_range(self.daily.lock().await.get(&user_id), range, |row| row.date))
    }

    async fn fetch_hydration(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> MetricsResult<Vec<HydrationRecord>> {
        Ok(in_range(self.hydration.lock().await.get(&user_id), range, |row| row.date))
    }

    async fn fetch_activities(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> MetricsResult<Vec<ActivityRecord>> {
        Ok(in_range(self.activities.lock().await.get(&user_id), range, |row| row.date))
    }

    async fn fetch_meals(&self, user_id: Uuid, range: DateRange) -> MetricsResult<Vec<MealRecord>> {
        Ok(in_range(self.meals.lock().await.get(&user_id), range, |row| row.date))
    }

    async fn fetch_profile(&self, user_id: Uuid) -> MetricsResult<Option<Profile>> {
        Ok(self.profiles.lock().await.get(&user_id).cloned())
    }

    async fn fetch_goals(&self, user_id: Uuid) -> MetricsResult<GoalSet> {
        Ok(self.goals.lock().await.get(&user_id).copied().unwrap_or_default())
    }

    async fn upsert_weekly_summary(
        &self,
        user_id: Uuid,
        summary: &WeeklySummary,
    ) -> MetricsResult<()> {
        self.weekly
            .lock()
            .await
            .insert((user_id, summary.week_start), *summary);
        Ok(())
    }

    async fn fetch_weekly_summaries(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> MetricsResult<Vec<WeeklySummary>> {
        let mut summaries: Vec<WeeklySummary> = self
            .weekly
            .lock()
            .await
            .iter()
            .filter(|((owner, _), _)| *owner == user_id)
            .map(|(_, summary)| *summary)
            .collect();
        summaries.sort_by(|a, b| b.week_start.cmp(&a.week_start));
        summaries.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(summaries)
    }
}
