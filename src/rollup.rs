use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::MetricsResult;
use crate::models::{channel, DailyMetric, DateRange, MetricKind, WeeklySummary};
use crate::store::MetricsStore;
use crate::trend::{average, weekly_bucket};

/// First day of the week containing `date`, for weeks starting on `week_start`.
pub fn week_start_for(date: NaiveDate, week_start: Weekday) -> NaiveDate {
    let offset =
        (7 + date.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7;
    date - Duration::days(i64::from(offset))
}

/// True on the first day of a new week.
pub fn is_rollup_day(today: NaiveDate, week_start: Weekday) -> bool {
    today.weekday() == week_start
}

/// Start of the last fully elapsed week before `today`.
pub fn previous_week_start(today: NaiveDate, week_start: Weekday) -> NaiveDate {
    week_start_for(today, week_start) - Duration::days(7)
}

/// Averages each channel over the seven days starting at `week_start`.
pub fn roll_up_week(daily: &[DailyMetric], week_start: NaiveDate) -> WeeklySummary {
    let week = DateRange::week_from(week_start);
    let channel_average = |kind: MetricKind| {
        let entries = channel(daily, kind);
        average(&weekly_bucket(&entries, week.start, week.end))
    };

    WeeklySummary {
        week_start,
        average_calories: channel_average(MetricKind::Calories),
        average_water: channel_average(MetricKind::Water),
        average_activity: channel_average(MetricKind::ActivityMinutes),
    }
}

/// Reads the week's daily metrics and upserts its summary.
///
/// Returns `None` without writing when the week has no logged days.
pub async fn run_weekly_rollup<S>(
    store: &S,
    user_id: Uuid,
    week_start: NaiveDate,
) -> MetricsResult<Option<WeeklySummary>>
where
    S: MetricsStore + ?Sized,
{
    let week = DateRange::week_from(week_start);
    let daily = store.fetch_daily_metrics(user_id, week).await?;

    if !daily.iter().any(|record| week.contains(record.date)) {
        debug!(%user_id, %week_start, "no daily metrics in week, skipping rollup");
        return Ok(None);
    }

    let summary = roll_up_week(&daily, week_start);
    store.upsert_weekly_summary(user_id, &summary).await?;
    info!(
        %user_id,
        %week_start,
        days = daily.len(),
        "weekly summary stored"
    );
    Ok(Some(summary))
}

/// Rolls up the week that just ended when `today` starts a new week.
pub async fn maybe_roll_up<S>(
    store: &S,
    user_id: Uuid,
    today: NaiveDate,
    week_start: Weekday,
) -> MetricsResult<Option<WeeklySummary>>
where
    S: MetricsStore + ?Sized,
{
    if !is_rollup_day(today, week_start) {
        return Ok(None);
    }
    run_weekly_rollup(store, user_id, previous_week_start(today, week_start)).await
}

/// Averages and weight extremes over a range of daily metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeAggregate {
    pub avg_calories: Option<f64>,
    pub avg_water: Option<f64>,
    pub avg_activity: Option<f64>,
    pub avg_weight: Option<f64>,
    pub min_weight: Option<f64>,
    pub max_weight: Option<f64>,
    pub total_days: usize,
}

pub fn aggregate(records: &[DailyMetric]) -> RangeAggregate {
    if records.is_empty() {
        return RangeAggregate {
            avg_calories: None,
            avg_water: None,
            avg_activity: None,
            avg_weight: None,
            min_weight: None,
            max_weight: None,
            total_days: 0,
        };
    }

    let mean = |kind: MetricKind| Some(average(&channel(records, kind)));
    let weights = records.iter().map(|record| record.weight);

    RangeAggregate {
        avg_calories: mean(MetricKind::Calories),
        avg_water: mean(MetricKind::Water),
        avg_activity: mean(MetricKind::ActivityMinutes),
        avg_weight: mean(MetricKind::Weight),
        min_weight: weights.clone().reduce(f64::min),
        max_weight: weights.reduce(f64::max),
        total_days: records.len(),
    }
}
